//! PartsDesk: parts distribution server and bulk-import CLI.

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use partsdesk::cli::{self, CliError, ReportArgs, ReportKind};
use partsdesk::config::Config;
use partsdesk::partsdesk_core::ImportOptions;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "partsdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "PARTSDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(short, long, global = true, env = "PARTSDESK_DATABASE")]
    database: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty database
    Init {
        /// Replace an existing database file
        #[arg(long)]
        force: bool,
    },

    /// Run the HTTP API
    Serve {
        /// Listen address, e.g. 0.0.0.0:3000
        #[arg(long, env = "PARTSDESK_BIND")]
        bind: Option<String>,

        /// Secret used to sign session tokens
        #[arg(long, env = "PARTSDESK_SESSION_SECRET", hide_env_values = true)]
        session_secret: Option<String>,
    },

    /// Import `<table>.csv` files or directories of them
    Import {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Empty the tables being imported (and their dependents) first
        #[arg(long)]
        truncate: bool,

        /// Skip rows whose key already exists instead of replacing them
        #[arg(long)]
        insert_only: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a CSV file against a table without importing it
    Validate {
        file: PathBuf,

        /// Target table; defaults to the file name
        #[arg(long)]
        table: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print a sales or stock report
    Report {
        #[arg(value_enum)]
        kind: ReportKind,

        /// Garage for local-sales
        #[arg(long)]
        garage: Option<u64>,

        /// garage or warehouse, for local-stock
        #[arg(long)]
        location_type: Option<String>,

        #[arg(long)]
        location_id: Option<u64>,

        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Print the password_hash column value for a password
    HashPassword { password: String },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Commands::Init { force } => {
            cli::cmd_init(&config.database, force)?;
            println!("created {}", config.database.display());
        }
        Commands::Serve {
            bind,
            session_secret,
        } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if session_secret.is_some() {
                config.session_secret = session_secret;
            }
            cli::cmd_serve(&config).await?;
        }
        Commands::Import {
            inputs,
            truncate,
            insert_only,
            json,
        } => {
            let options = ImportOptions {
                truncate,
                update_existing: !insert_only,
            };
            let summary = cli::cmd_import(&config.database, &inputs, options)?;
            if json {
                print_json(&summary)?;
            } else {
                print!("{}", cli::render_import(&summary));
            }
            if !summary.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Validate { file, table, json } => {
            let report = cli::cmd_validate(&file, table.as_deref())?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", cli::render_validation(&report));
            }
            if !report.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Report {
            kind,
            garage,
            location_type,
            location_id,
            from,
            to,
            json,
        } => {
            let args = ReportArgs {
                garage,
                location_type,
                location_id,
                from,
                to,
            };
            let report = cli::cmd_report(&config.database, kind, &args)?;
            if json {
                print_json(&report.to_json()?)?;
            } else {
                print!("{}", report.render());
            }
        }
        Commands::HashPassword { password } => {
            println!("{}", cli::cmd_hash_password(&password));
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
