//! regdash - a terminal dashboard for event registrations.
//!
//! Pulls every registration record from a paginated table API (or a CSV
//! export) and shows totals, age groups, gender split, and affiliations.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use regdash_core::{snapshot, Config, FetchOutcome, RecordCache, Summary};

use app::{App, AppState, DataSource};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name inside the log directory
const LOG_FILE: &str = "regdash.log";

const USAGE: &str = "\
Usage: regdash [--csv <path> | --tally <path> --key <col> --value <col>] [--dump]

  --csv <path>    Read records from a CSV export instead of the API
  --tally <path>  Read a pre-aggregated CSV, summing <value> per <key>
  --key <col>     Grouping column of the tally
  --value <col>   Numeric column of the tally
  --dump          Print the summary as JSON and exit
  -h, --help      Show this help

Environment: REGDASH_API_URL, REGDASH_API_TOKEN, REGDASH_TOKEN_HEADER,
REGDASH_PAGE_SIZE, RUST_LOG";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    csv: Option<PathBuf>,
    tally: Option<PathBuf>,
    key: Option<String>,
    value: Option<String>,
    dump: bool,
    help: bool,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value_of = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
            };
            match arg.as_str() {
                "--csv" => parsed.csv = Some(PathBuf::from(value_of("--csv")?)),
                "--tally" => parsed.tally = Some(PathBuf::from(value_of("--tally")?)),
                "--key" => parsed.key = Some(value_of("--key")?),
                "--value" => parsed.value = Some(value_of("--value")?),
                "--dump" => parsed.dump = true,
                "-h" | "--help" => parsed.help = true,
                other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
            }
        }
        Ok(parsed)
    }
}

/// Log to stderr. Used when the terminal is not taken over by the UI.
fn init_stderr_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a file in the cache directory, since the UI owns the terminal.
/// The returned guard flushes the writer when dropped.
fn init_file_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

fn data_source(config: &Config, args: &Args) -> Result<DataSource> {
    match (&args.csv, &args.tally) {
        (Some(_), Some(_)) => anyhow::bail!("--csv and --tally cannot be combined"),
        (Some(path), None) => Ok(DataSource::Snapshot(path.clone())),
        (None, Some(path)) => Ok(DataSource::Tally {
            path: path.clone(),
            key_column: args
                .key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--tally requires --key <col>"))?,
            value_column: args
                .value
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--tally requires --value <col>"))?,
        }),
        (None, None) => Ok(DataSource::Api {
            url: config.api_url()?.to_string(),
            headers: config.headers()?,
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let source = data_source(&config, &args)?;

    if args.dump {
        init_stderr_tracing();
        return dump_summary(&config, &source).await;
    }

    let _log_guard = init_file_tracing(&config)?;
    info!("regdash starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, source, Arc::new(RecordCache::new()))?;
    app.load();

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("regdash shutting down");
    Ok(())
}

/// Print the summary of the configured source as JSON to stdout
async fn dump_summary(config: &Config, source: &DataSource) -> Result<()> {
    let records = match source {
        DataSource::Tally {
            path,
            key_column,
            value_column,
        } => {
            let tally = snapshot::load_tally(path, key_column, value_column)?;
            if tally.is_empty() {
                eprintln!("No data found.");
            }
            println!("{}", serde_json::to_string_pretty(&tally)?);
            return Ok(());
        }
        DataSource::Snapshot(path) => snapshot::load_records(path)?,
        DataSource::Api { url, headers } => {
            let api = regdash_core::ApiClient::new(config.fetch_options())?;
            eprintln!("Fetching data from database...");
            match api.fetch_records(url, headers).await {
                FetchOutcome::Records(records) => records,
                FetchOutcome::Failed(e) => {
                    return Err(anyhow::Error::new(e).context("Error fetching data"));
                }
            }
        }
    };

    if records.is_empty() {
        eprintln!("No data found.");
    }

    let summary = Summary::from_records(&records);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background fetches
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(args(&[]).expect("parse"), Args::default());
    }

    #[test]
    fn test_parse_csv_and_dump() {
        let parsed = args(&["--csv", "regs.csv", "--dump"]).expect("parse");
        assert_eq!(parsed.csv, Some(PathBuf::from("regs.csv")));
        assert!(parsed.dump);
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&["--csv"]).is_err());
        assert!(args(&["--tally", "t.csv", "--key"]).is_err());
        assert!(args(&["--bogus"]).is_err());
    }

    #[test]
    fn test_tally_source() {
        let config = Config::default();
        let parsed = args(&["--tally", "t.csv", "--key", "College", "--value", "Registrations"]).expect("parse");
        match data_source(&config, &parsed).expect("tally source") {
            DataSource::Tally {
                path,
                key_column,
                value_column,
            } => {
                assert_eq!(path, PathBuf::from("t.csv"));
                assert_eq!(key_column, "College");
                assert_eq!(value_column, "Registrations");
            }
            other => panic!("unexpected source {:?}", other),
        }

        let missing_value = args(&["--tally", "t.csv", "--key", "College"]).expect("parse");
        assert!(data_source(&config, &missing_value).is_err());

        let both = args(&["--csv", "r.csv", "--tally", "t.csv", "--key", "a", "--value", "b"]).expect("parse");
        assert!(data_source(&config, &both).is_err());
    }

    #[tokio::test]
    async fn test_dump_tally() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tally.csv");
        std::fs::write(&path, "College,Registrations\nIIT Delhi,3\n").expect("write tally");
        let source = DataSource::Tally {
            path,
            key_column: "College".to_string(),
            value_column: "Registrations".to_string(),
        };
        assert!(dump_summary(&Config::default(), &source).await.is_ok());

        let missing = DataSource::Tally {
            path: dir.path().join("absent.csv"),
            key_column: "College".to_string(),
            value_column: "Registrations".to_string(),
        };
        assert!(dump_summary(&Config::default(), &missing).await.is_err());
    }

    #[test]
    fn test_data_source_requires_credentials_for_api() {
        let config = Config::default();
        assert!(data_source(&config, &Args::default()).is_err());

        let snapshot_args = Args {
            csv: Some(PathBuf::from("regs.csv")),
            ..Default::default()
        };
        assert!(matches!(
            data_source(&config, &snapshot_args),
            Ok(DataSource::Snapshot(_))
        ));
    }
}
