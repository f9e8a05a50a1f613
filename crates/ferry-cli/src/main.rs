use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap::builder::BoolishValueParser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ferry_client::{HtmlRecordSource, JsonFileExporter, NtfyNotifier};
use ferry_core::export::run_export;
use ferry_core::harbor;
use ferry_core::models::QueryConstraints;
use ferry_core::query::{DEFAULT_BASE_URL, QueryService};
use ferry_core::traits::RecordSource;
use ferry_core::util::{non_empty, parse_dates};
use ferry_core::watcher::{TracingWatchReporter, WatchConfig, WatchMode, WatchOutcome, Watcher};

#[derive(Parser, Debug)]
#[command(
    name = "ferry-watch",
    version,
    about = "Watches the ferry schedule for bookable crossings and sends push alerts"
)]
struct Cli {
    /// Departure harbor code (e.g. DEWYK = Wyk auf Föhr)
    #[arg(long, env = "DEPARTURE", default_value = "DEWYK")]
    departure: String,

    /// Arrival harbor code (e.g. DEDAG = Dagebüll)
    #[arg(long, env = "ARRIVAL", default_value = "DEDAG")]
    arrival: String,

    /// Comma-separated target dates, YYYY-MM-DD (defaults to today)
    #[arg(long, env = "TARGET_DATES")]
    dates: Option<String>,

    /// Earliest departure time to report, HH:MM
    #[arg(long, env = "TIME_FROM")]
    time_from: Option<String>,

    /// Latest departure time to report, HH:MM
    #[arg(long, env = "TIME_TO")]
    time_to: Option<String>,

    /// Seconds between check cycles
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 300)]
    interval: u64,

    /// ntfy topic to publish alerts to (alerts are only logged if unset)
    #[arg(long, env = "NTFY_TOPIC")]
    ntfy_topic: Option<String>,

    /// ntfy server
    #[arg(long, env = "NTFY_SERVER", default_value = ferry_client::ntfy::DEFAULT_NTFY_SERVER)]
    ntfy_server: String,

    /// Schedule lookup URL of the ferry operator
    #[arg(long, env = "FERRY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Run one check, write all matching connections to this JSON file and exit
    #[arg(long, env = "EXPORT_JSON")]
    export_json: Option<PathBuf>,

    /// Exit after the first alert instead of watching indefinitely
    #[arg(
        long,
        env = "STOP_ON_FIRST",
        action = clap::ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    stop_on_first: bool,

    /// Also report sailings for foot passengers only
    #[arg(long, default_value_t = false)]
    include_only_persons: bool,

    /// Render pages with headless Chromium (requires the `browser` feature)
    #[arg(long, default_value_t = false)]
    browser: bool,

    /// Seconds to wait for schedule rows per date
    #[arg(long, env = "WAIT_TIMEOUT", default_value_t = 30)]
    wait_timeout: u64,
}

/// Startup configuration, validated once before any work starts.
#[derive(Debug)]
struct Settings {
    constraints: QueryConstraints,
    watch: WatchConfig,
    base_url: String,
    ntfy_topic: Option<String>,
    ntfy_server: String,
    export_json: Option<PathBuf>,
    browser: bool,
    wait_timeout: Duration,
}

impl Settings {
    fn from_cli(cli: Cli) -> Result<Self> {
        let dates = match non_empty(cli.dates) {
            Some(raw) => parse_dates(&raw),
            None => vec![chrono::Local::now().format("%Y-%m-%d").to_string()],
        };

        let mut constraints = QueryConstraints::available(
            cli.departure.trim(),
            cli.arrival.trim(),
            dates,
        )
        .with_time_window(non_empty(cli.time_from), non_empty(cli.time_to));
        constraints.exclude_only_persons = !cli.include_only_persons;
        constraints
            .validate()
            .context("Invalid schedule query configuration")?;

        if cli.interval == 0 {
            bail!("CHECK_INTERVAL must be at least 1 second");
        }
        if cli.wait_timeout == 0 {
            bail!("WAIT_TIMEOUT must be at least 1 second");
        }

        url::Url::parse(&cli.base_url)
            .with_context(|| format!("Invalid FERRY_BASE_URL '{}'", cli.base_url))?;
        url::Url::parse(&cli.ntfy_server)
            .with_context(|| format!("Invalid NTFY_SERVER '{}'", cli.ntfy_server))?;

        for code in [&constraints.departure, &constraints.arrival] {
            if !harbor::is_known(code) {
                tracing::warn!(%code, "Unknown harbor code, querying anyway");
            }
        }

        let mode = if cli.stop_on_first {
            WatchMode::StopOnFirst
        } else {
            WatchMode::Continuous
        };

        Ok(Self {
            constraints,
            watch: WatchConfig {
                mode,
                poll_interval: Duration::from_secs(cli.interval),
            },
            base_url: cli.base_url,
            ntfy_topic: non_empty(cli.ntfy_topic),
            ntfy_server: cli.ntfy_server,
            export_json: cli.export_json,
            browser: cli.browser,
            wait_timeout: Duration::from_secs(cli.wait_timeout),
        })
    }

    fn log_banner(&self) {
        let c = &self.constraints;
        tracing::info!(
            "Route: {} → {}",
            harbor::display_name(&c.departure),
            harbor::display_name(&c.arrival)
        );
        tracing::info!("Target dates: {}", c.dates.join(", "));
        if c.time_from.is_some() || c.time_to.is_some() {
            tracing::info!(
                "Time filter: {} - {}",
                c.time_from.as_deref().unwrap_or("00:00"),
                c.time_to.as_deref().unwrap_or("23:59")
            );
        }
        match &self.export_json {
            Some(path) => tracing::info!("Export mode: writing {}", path.display()),
            None => {
                if self.ntfy_topic.is_none() {
                    tracing::warn!("NTFY_TOPIC is not set. Notifications will not be sent.");
                }
                tracing::info!(
                    "Mode: {}, check interval: {} seconds",
                    self.watch.mode,
                    self.watch.poll_interval.as_secs()
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ferry=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_cli(Cli::parse())?;
    settings.log_banner();

    if settings.browser {
        run_with_browser(&settings).await
    } else {
        let source = HtmlRecordSource::with_timeout(settings.wait_timeout)
            .context("Failed to create HTTP client")?;
        run(source, &settings).await
    }
}

#[cfg(feature = "browser")]
async fn run_with_browser(settings: &Settings) -> Result<()> {
    let source = ferry_client::BrowserRecordSource::with_timeouts(
        settings.wait_timeout * 2,
        settings.wait_timeout,
    )
    .await
    .context("Failed to launch headless browser")?;
    run(source, settings).await
}

#[cfg(not(feature = "browser"))]
async fn run_with_browser(_settings: &Settings) -> Result<()> {
    bail!("--browser requires ferry-watch to be built with the `browser` feature")
}

async fn run<R: RecordSource>(source: R, settings: &Settings) -> Result<()> {
    let service = QueryService::with_base_url(source, &settings.base_url);

    if let Some(path) = &settings.export_json {
        let exporter = JsonFileExporter::new(path);
        let count = run_export(&service, &settings.constraints, &exporter)
            .await
            .context("Export run failed")?;
        println!("Exported {count} connection(s) to {}", path.display());
        return Ok(());
    }

    let notifier = NtfyNotifier::with_server(settings.ntfy_topic.clone(), &settings.ntfy_server)
        .context("Failed to create notification client")?;

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            signal_token.cancel();
        }
    });

    let mut watcher = Watcher::new(
        service,
        notifier,
        settings.constraints.clone(),
        settings.watch.clone(),
    );

    match watcher.run(cancel_token, &TracingWatchReporter).await {
        WatchOutcome::Found(c) => {
            println!(
                "Found a connection on {} at {}: {}",
                c.date, c.departure_time, c.booking_url
            );
        }
        WatchOutcome::Cancelled => {
            println!(
                "Stopped after {} cycle(s), {} connection(s) notified",
                watcher.cycles(),
                watcher.notified().len()
            );
        }
    }

    Ok(())
}
