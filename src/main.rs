use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{
    create_animation_driver, create_style_applier, spawn_scenario_cycler, FileSettingsStore,
    PanelController, SimulatedTopology,
};

#[derive(Parser, Debug)]
#[command(name = "dynamic-panel")]
#[command(about = "Adjusts panel opacity to the windows on the desktop")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "dynamic-panel.toml")]
    config: PathBuf,

    /// Log the panel style instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Log level, overrides [logging].level
    #[arg(long)]
    log_level: Option<String>,

    /// Write the panel stylesheet to this file
    #[arg(long)]
    style_output: Option<PathBuf>,

    /// CSS selector of the written rule
    #[arg(long, default_value = "#panel")]
    selector: String,

    /// Do not reload [panel] when the configuration file changes
    #[arg(long)]
    no_watch: bool,

    /// Period of the simulated desktop scenarios
    #[arg(long, default_value_t = 3000)]
    scenario_interval_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Starting dynamic-panel v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {:?}", args.config);

    if args.dry_run {
        warn!("Dry run: the panel style is logged, not written");
    }

    let mut settings = FileSettingsStore::open(&args.config)?;
    info!("Panel settings read from [panel] of {:?}", settings.path());
    if !args.no_watch {
        if let Err(e) = settings.watch() {
            warn!("Settings will not be reloaded: {}", e);
        }
    }

    let topology = SimulatedTopology::new();
    let cycler = spawn_scenario_cycler(
        topology.clone(),
        Duration::from_millis(args.scenario_interval_ms.max(1)),
    );

    let applier = create_style_applier(args.style_output.clone(), &args.selector, args.dry_run)?;
    let driver = create_animation_driver(&config.animation);

    let mut controller = PanelController::new(
        &config,
        Box::new(topology),
        Box::new(settings),
        applier,
        driver,
    );
    controller.start();

    controller
        .run_until(async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C"),
                Err(e) => error!("Failed to wait for shutdown signal: {}", e),
            }
        })
        .await;

    info!("Shutting down...");
    cycler.abort();

    let shutdown_timeout = Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        controller.stop();
        let _ = cycler.await;
    })
    .await;

    match shutdown_result {
        Ok(()) => info!("dynamic-panel stopped"),
        Err(_) => warn!("Timed out while shutting down"),
    }

    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
