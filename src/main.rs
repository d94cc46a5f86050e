use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sentinel::config::LoggingConfig;
use sentinel::{
    LocationQuery, NotificationOutcome, Pipeline, RiskReport, SentinelConfig, SentinelError,
};

#[derive(Parser, Debug)]
#[command(
    name = "sentinel",
    version,
    about = "Atmospheric pressure and entropy risk monitor"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct LocationArgs {
    /// Place to monitor, e.g. "Galena, KS"
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    location: Option<String>,

    /// Manual latitude, used instead of a place name
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Manual longitude, used instead of a place name
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single refresh cycle and print the risk report
    Check {
        #[command(flatten)]
        location: LocationArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also send the score as a push notification
        #[arg(long)]
        notify: bool,
    },
    /// Refresh periodically until interrupted
    Watch {
        #[command(flatten)]
        location: LocationArgs,

        /// Seconds between refresh cycles
        #[arg(long)]
        interval: Option<u64>,

        /// Print each report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a test push notification with the current score
    NotifyTest {
        #[command(flatten)]
        location: LocationArgs,

        /// Push relay access token, overrides the configured one
        #[arg(long, env = "SENTINEL_PUSH_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

impl LocationArgs {
    fn to_query(&self, default_location: &str) -> Result<LocationQuery> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(LocationQuery::coordinates(lat, lon)?),
            _ => Ok(LocationQuery::ByName(
                self.location
                    .clone()
                    .unwrap_or_else(|| default_location.to_string()),
            )),
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sentinel={level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_report(report: &RiskReport, json: bool) -> Result<()> {
    if json {
        let body = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{body}");
    } else {
        println!("{}", report.render());
        if report.from_cache {
            println!("  (cached readings)");
        }
    }
    Ok(())
}

fn print_notice(outcome: &NotificationOutcome) {
    eprintln!("{}", outcome.user_notice());
}

async fn check(
    config: &SentinelConfig,
    location: &LocationArgs,
    json: bool,
    notify: bool,
) -> Result<()> {
    let query = location.to_query(&config.defaults.location)?;
    let mut pipeline = Pipeline::new(config)?;

    let report = pipeline.refresh(&query).await?;
    print_report(&report, json)?;

    if notify || pipeline.should_auto_notify(&report) {
        print_notice(&pipeline.notify(&report, None).await);
    }
    Ok(())
}

async fn watch(
    config: &SentinelConfig,
    location: &LocationArgs,
    interval: Option<u64>,
    json: bool,
) -> Result<()> {
    let query = location.to_query(&config.defaults.location)?;
    let mut pipeline = Pipeline::new(config)?;
    let period = Duration::from_secs(
        interval
            .filter(|secs| *secs > 0)
            .unwrap_or(config.defaults.watch_interval_seconds),
    );
    info!("Refreshing every {}s, press Ctrl-C to stop", period.as_secs());

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // One listener for the whole watch, so Ctrl-C during a cycle is not lost
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            result = watch_cycle(&mut pipeline, &query, json) => result?,
        }
    }
    debug!("Interrupted, stopping watch");
    Ok(())
}

async fn watch_cycle(pipeline: &mut Pipeline, query: &LocationQuery, json: bool) -> Result<()> {
    match pipeline.refresh(query).await {
        Ok(report) => {
            print_report(&report, json)?;
            if pipeline.should_auto_notify(&report) {
                print_notice(&pipeline.notify(&report, None).await);
            }
        }
        Err(e) => eprintln!("Error: {}", e.user_message()),
    }
    Ok(())
}

async fn notify_test(
    config: &SentinelConfig,
    location: &LocationArgs,
    token: Option<&str>,
) -> Result<()> {
    let query = location.to_query(&config.defaults.location)?;
    let mut pipeline = Pipeline::new(config)?;

    let report = pipeline.refresh(&query).await?;
    println!("{}", report.render());
    print_notice(&pipeline.notify(&report, token).await);
    Ok(())
}

async fn run(cli: Cli, config: SentinelConfig) -> Result<()> {
    match &cli.command {
        Command::Check {
            location,
            json,
            notify,
        } => check(&config, location, *json, *notify).await,
        Command::Watch {
            location,
            interval,
            json,
        } => watch(&config, location, *interval, *json).await,
        Command::NotifyTest { location, token } => {
            notify_test(&config, location, token.as_deref()).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SentinelConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging, cli.verbose);
    debug!("Loaded configuration: {:?}", config.endpoints);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SentinelError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
