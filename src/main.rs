use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use doorwatch::config::Config;
use doorwatch::door::DoorStatus;
use doorwatch::monitor::{self, HttpStatusSource};
use doorwatch::renderer;
use doorwatch::report::{self, HistoryReport};
use doorwatch::store::DoorDb;
use doorwatch::{logging, timefmt};

/// Upstream requests give up after this long and count as `unknown`.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "doorwatch")]
#[command(about = "Door status monitor and open-hours history", long_about = None)]
struct Cli {
    /// Data directory holding door.sqlite and logs/ (default: $DOORWATCH_DATA_DIR or .doorwatch)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the upstream status endpoint and record every change
    Monitor {
        /// Upstream status URL (default: $DOORWATCH_STATUS_URL or the common room endpoint)
        #[arg(long)]
        url: Option<String>,
        /// Seconds between polls (default: $DOORWATCH_POLL_SECS or 5)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Show the current door status
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a status by hand; nothing is written if it is unchanged
    Record {
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Build the last-year history report
    History {
        /// Read events from a JSON file instead of the database
        #[arg(long)]
        events: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Md)]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seed for the fun unit in the summary (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Name of the place, used in headings and the summary sentence
        #[arg(long, default_value = "common room")]
        place: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Open,
    Closed,
    Unknown,
}

impl From<StatusArg> for DoorStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => DoorStatus::Open,
            StatusArg::Closed => DoorStatus::Closed,
            StatusArg::Unknown => DoorStatus::Unknown,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Md,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor { url, interval_secs } => {
            let config = Config::resolve(cli.data_dir, url, interval_secs)?;
            logging::init_logging(&config.data_dir, "monitor")?;
            run_monitor(config)
        }
        Commands::Status { json } => {
            let config = Config::resolve(cli.data_dir, None, None)?;
            logging::init_logging(&config.data_dir, "status")?;
            let db = DoorDb::init(&config.data_dir)?;
            let current = db.current_status(Utc::now())?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&current)
                        .context("Failed to serialize door status")?
                );
            } else {
                print!("{}", renderer::md::render_current_only(&current));
            }
            Ok(())
        }
        Commands::Record { status } => {
            let config = Config::resolve(cli.data_dir, None, None)?;
            logging::init_logging(&config.data_dir, "record")?;
            let db = DoorDb::init(&config.data_dir)?;
            let now = Utc::now();

            match db.record_if_changed(status.into(), now)? {
                Some(t) => eprintln!(
                    "Recorded {} -> {} at {}",
                    t.from,
                    t.to,
                    timefmt::format_timestamp(t.at.timestamp_millis())
                ),
                None => eprintln!("Status unchanged, nothing recorded"),
            }
            Ok(())
        }
        Commands::History {
            events,
            format,
            output,
            seed,
            place,
        } => {
            let config = Config::resolve(cli.data_dir, None, None)?;
            logging::init_logging(&config.data_dir, "history")?;
            let now = Utc::now();

            let (events, current) = match events {
                Some(path) => (report::load_events_from_file(&path)?, None),
                None => {
                    let db = DoorDb::init(&config.data_dir)?;
                    (db.history_events(now)?, Some(db.current_status(now)?))
                }
            };

            let seed = seed.unwrap_or_else(rand::random);
            let report = HistoryReport::build(&events, current, now, &Local, seed)?;
            let rendered = match format {
                Format::Md => renderer::md::render(&report, &place)?,
                Format::Json => report.to_json()?,
            };

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent).with_context(|| {
                            format!("Failed to create output directory: {}", parent.display())
                        })?;
                    }
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write report: {}", path.display()))?;
                    eprintln!("History report written to: {}", path.display());
                }
                None => print!("{}", rendered),
            }
            Ok(())
        }
    }
}

fn run_monitor(config: Config) -> Result<()> {
    let db = DoorDb::init(&config.data_dir)?;
    let mut source = HttpStatusSource::new(config.status_url.clone(), FETCH_TIMEOUT)?;

    tracing::info!(
        url = %config.status_url,
        data_dir = %config.data_dir.display(),
        "Starting door monitor"
    );

    tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")?
        .block_on(monitor::run(
            &db,
            &mut source,
            config.poll_interval,
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            },
        ))
}
