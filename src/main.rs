//! CLI entry point for the subway realtime client.
//!
//! Provides subcommands for listing the available feeds, watching a live
//! departure board and showing a station's elevator/escalator status.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use subway_realtime::{
    accessibility::StationPanel,
    config::SessionConfig,
    controller::SessionController,
    feeds::{FeedKey, LineSelection},
    fetch::{BasicClient, HttpTransport, Transport, auth::ApiKey},
    output::{AccessibilityText, BoardText, print_json, print_pretty},
    session::RealtimeView,
    stations::{StationDirectory, StationLookup},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "subway_realtime")]
#[command(about = "Live subway arrivals and station accessibility", long_about = None)]
struct Cli {
    /// Base URL of the realtime API
    #[arg(
        long,
        env = "SUBWAY_API_BASE",
        default_value = "http://localhost:5000",
        global = true
    )]
    base_url: String,

    /// API key sent as the x-api-key header
    #[arg(long, env = "SUBWAY_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// GTFS stops.txt used to name stations
    #[arg(long, global = true)]
    stations: Option<PathBuf>,

    /// Time zone for arrival and update times
    #[arg(long, default_value = "America/New_York", global = true)]
    timezone: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available line feeds
    Feeds,
    /// Show a live departure board, refreshed in the background
    Watch {
        /// Feed to show (e.g. bdfm, ace, 1234567s)
        #[arg(short, long, default_value = "bdfm")]
        feed: FeedKey,

        /// Only show one route of the feed ("all" for every route)
        #[arg(short, long)]
        line: Option<String>,

        /// Seconds between background refreshes
        #[arg(
            short,
            long,
            default_value_t = 60,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval_secs: u64,

        /// Print every update as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show elevator and escalator status for a station
    Station {
        #[arg(value_name = "STATION_ID")]
        station_id: String,

        /// Print as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing()?;

    let cli = Cli::parse();
    let tz: Tz = cli
        .timezone
        .parse()
        .map_err(|e| anyhow!("invalid time zone '{}': {}", cli.timezone, e))?;

    match cli.command {
        Commands::Feeds => {
            for feed in FeedKey::ALL {
                let sub_lines: String = feed.sub_lines().iter().collect();
                println!("{:<10} {:<24} {}", feed.key(), feed.label(), sub_lines);
            }
        }
        Commands::Watch {
            feed,
            line,
            interval_secs,
            json,
        } => {
            let sub_line = match line.as_deref() {
                Some(raw) => LineSelection::parse_sub_line(raw)?,
                None => None,
            };
            let selection = LineSelection::new(feed).with_sub_line(sub_line)?;
            let config = SessionConfig::default()
                .with_selection(selection)
                .with_refresh_interval(std::time::Duration::from_secs(interval_secs))
                .with_timezone(tz);

            let transport = build_transport(&cli.base_url, cli.api_key.as_deref())?;
            let stations = load_stations(cli.stations.as_deref())?;
            watch(transport, stations, config, json).await?;
        }
        Commands::Station { station_id, json } => {
            let transport = build_transport(&cli.base_url, cli.api_key.as_deref())?;
            let mut panel = StationPanel::new();
            let state = panel.show(transport.as_ref(), &station_id).await;
            print_pretty(state);
            if json {
                print_json(state)?;
            } else {
                print!("{}", AccessibilityText(state));
            }
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/subway_realtime.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("subway_realtime.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn build_transport(base_url: &str, api_key: Option<&str>) -> Result<Arc<dyn Transport>> {
    let client = BasicClient::new().context("building HTTP client")?;
    let transport: Arc<dyn Transport> = match api_key {
        Some(key) => Arc::new(HttpTransport::new(
            ApiKey::with_default_header(client, key)?,
            base_url,
        )),
        None => Arc::new(HttpTransport::new(client, base_url)),
    };
    info!(base_url, authenticated = api_key.is_some(), "Transport ready");
    Ok(transport)
}

fn load_stations(path: Option<&Path>) -> Result<Arc<dyn StationLookup>> {
    Ok(match path {
        Some(path) => Arc::new(StationDirectory::load(path)?),
        None => {
            info!("No stations file given, showing raw stop ids");
            Arc::new(StationDirectory::empty())
        }
    })
}

/// A line typed on stdin while watching.
#[derive(Debug, PartialEq)]
enum UserCommand {
    Select(LineSelection),
    Refresh,
    Quit,
}

fn parse_command(line: &str, current: LineSelection) -> Result<UserCommand> {
    let mut words = line.split_whitespace();
    let command = match (words.next(), words.next()) {
        (Some("feed"), Some(key)) => UserCommand::Select(LineSelection::new(key.parse()?)),
        (Some("line"), Some(raw)) => {
            let sub_line = LineSelection::parse_sub_line(raw)?;
            UserCommand::Select(current.with_sub_line(sub_line)?)
        }
        (Some("refresh"), None) => UserCommand::Refresh,
        (Some("quit" | "exit"), None) => UserCommand::Quit,
        _ => bail!("expected one of: feed <key>, line <route|all>, refresh, quit"),
    };
    if words.next().is_some() {
        bail!("unexpected extra arguments in '{}'", line.trim());
    }
    Ok(command)
}

/// Runs the board until `quit` or Ctrl-C. End of stdin only stops reading
/// commands; the board keeps refreshing.
async fn watch(
    transport: Arc<dyn Transport>,
    stations: Arc<dyn StationLookup>,
    config: SessionConfig,
    json: bool,
) -> Result<()> {
    let controller = SessionController::spawn(transport, stations, config);
    let mut view = controller.subscribe();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut reading_input = true;

    render(&view.borrow_and_update().clone(), config.timezone, json)?;

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    warn!("Session stopped unexpectedly");
                    break;
                }
                let current = view.borrow_and_update().clone();
                render(&current, config.timezone, json)?;
            }
            line = input.next_line(), if reading_input => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_command(&line, controller.current().selection) {
                    Ok(UserCommand::Select(selection)) => controller.select(selection)?,
                    Ok(UserCommand::Refresh) => controller.refresh()?,
                    Ok(UserCommand::Quit) => break,
                    Err(e) => warn!(error = %e, "Ignoring command"),
                },
                None => reading_input = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.shutdown().await;
    Ok(())
}

fn render(view: &RealtimeView, tz: Tz, json: bool) -> Result<()> {
    if json {
        print_json(view)
    } else {
        println!("{}", "-".repeat(60));
        print!("{}", BoardText { view, tz });
        Ok(())
    }
}
