//! schema-migrate CLI - operational surface for the migration engine.
//!
//! The migration registry itself belongs to the embedding application; this
//! binary covers the surrounding operations: inspecting the recorded schema
//! version, checking connectivity, and provisioning throwaway databases for
//! test environments.

use clap::{Parser, Subcommand};
use schema_migrate::{bootstrap, Config, MigrateError, VersionStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-migrate")]
#[command(about = "Cross-dialect SQL schema migration engine")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the database's recorded schema version
    Status {
        /// Output JSON to stdout
        #[arg(long)]
        output_json: bool,
    },

    /// Test the database connection
    HealthCheck,

    /// Drop and recreate the configured database (destructive)
    PrepareDb {
        /// Confirm the destructive operation
        #[arg(long)]
        yes: bool,
    },
}

fn init_logging(format: &str, verbosity: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity));
    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_format, &cli.verbosity);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> schema_migrate::Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Status { output_json } => {
            let mut sess = bootstrap::connect(&config.database).await?;
            let store = VersionStore::new();
            store.ensure(sess.as_mut()).await?;
            let version = store.get(sess.as_mut()).await?;
            if output_json {
                println!("{}", serde_json::json!({ "version": version }));
            } else {
                match version {
                    Some(v) => println!("schema version: {}", v),
                    None => println!("schema version: not initialized"),
                }
            }
        }
        Commands::HealthCheck => {
            bootstrap::health_check(&config.database).await?;
            println!("ok");
        }
        Commands::PrepareDb { yes } => {
            if !yes {
                return Err(MigrateError::config(
                    "refusing to drop the database without --yes",
                ));
            }
            info!("dropping and recreating the configured database");
            bootstrap::recreate_database(&config.database).await?;
            println!("database recreated");
        }
    }

    Ok(())
}
