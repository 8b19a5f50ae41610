use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use liveness_monitor::{InputValidator, MonitorConfig, MonitorService, config::read_config_file};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, long)]
    file: String,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_for: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new().with_targets(vec![("liveness_monitor", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)
        .with_context(|| format!("failed to load config from {}", args.file))?;
    let config = MonitorConfig::from_config(&config, &InputValidator).await;
    if config.is_empty() {
        anyhow::bail!("{} does not declare any valid services", args.file);
    }
    let config = Arc::new(config);

    let monitor = MonitorService::new(config.clone());
    let started = monitor.start_service_monitor();
    info!(
        "monitoring {started} service(s) with a {}ms grace period",
        config.grace_period_ms()
    );

    match args.run_for {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?,
    }

    monitor.shutdown().await;
    Ok(())
}
