//! dexcache - a command-line Pokémon browser backed by a local cache.
//!
//! The listing and detail views are answered from the on-disk cache and
//! only go to PokéAPI on a miss, so everything seen once works offline.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use dexcache_core::{Config, LoadState, Partition};
use ui::render;

#[derive(Parser, Debug)]
#[command(name = "dexcache", version, about = "Browse PokéAPI through a local cache")]
struct Cli {
    /// Cache directory (overrides config and DEXCACHE_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Finish cache writes before printing results
    #[arg(long, global = true)]
    await_writes: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the Pokémon listing
    List,
    /// Show details for one Pokémon by its listing id
    Show { id: u32 },
    /// Fetch and cache details for every listed Pokémon
    Warm,
    /// Show record counts and cache age
    Status,
    /// Remove cached records
    Clear {
        #[arg(value_enum, default_value_t = ClearTarget::All)]
        target: ClearTarget,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ClearTarget {
    Summary,
    Detail,
    All,
}

impl ClearTarget {
    fn partitions(self) -> Vec<Partition> {
        match self {
            ClearTarget::Summary => vec![Partition::Summary],
            ClearTarget::Detail => vec![Partition::Detail],
            ClearTarget::All => Partition::ALL.to_vec(),
        }
    }
}

#[derive(Serialize)]
struct PartitionStatus {
    records: usize,
    age: String,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(ref dir) = cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if cli.await_writes {
        config.await_cache_writes = true;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a resolved value, or the failure message on stderr.
fn print_state<T: Serialize>(
    state: &LoadState<T>,
    json: bool,
    render: impl Fn(&LoadState<T>) -> String,
) -> Result<ExitCode> {
    match state {
        LoadState::Resolved(value) if json => print_json(value)?,
        LoadState::Resolved(_) => print!("{}", render(state)),
        _ => {
            eprintln!("{}", render(state));
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(app: &App, command: Command, json: bool) -> Result<ExitCode> {
    match command {
        Command::List => {
            if !json {
                eprintln!("{}", render::render_list(&LoadState::Pending));
            }
            let state = app.list().await;
            print_state(&state, json, render::render_list)
        }
        Command::Show { id } => {
            if !json {
                eprintln!("{}", render::render_detail(&LoadState::Pending));
            }
            let state = app.show(id).await;
            print_state(&state, json, render::render_detail)
        }
        Command::Warm => match app.warm().await {
            Ok(report) if json => {
                print_json(&serde_json::json!({
                    "loaded": report.loaded,
                    "failed": report.failed,
                }))?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(report) => {
                print!("{}", render::render_warm(&report));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Status => {
            let stats = app.status().await?;
            if json {
                print_json(&serde_json::json!({
                    "cache_dir": app.config().cache_dir()?,
                    "summary": PartitionStatus {
                        records: stats.summary.records,
                        age: stats.summary.age_display(),
                    },
                    "detail": PartitionStatus {
                        records: stats.detail.records,
                        age: stats.detail.age_display(),
                    },
                }))?;
            } else {
                print!("{}", render::render_status(&stats));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear { target } => {
            app.clear(&target.partitions()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing();
    info!("dexcache starting");

    let config = load_config(&cli)?;
    let app = App::open(config).await?;

    let result = run(&app, cli.command, cli.json).await;

    app.shutdown().await;
    info!("dexcache shutting down");
    result
}
