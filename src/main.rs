// src/main.rs - Run a G-code test program against the simulated gantry and LED strip
use clap::Parser;
use tokio::sync::watch;

use gantry_host::config::{self, Config, FailureMode};
use gantry_host::file_manager::FileManager;
use gantry_host::hardware::{SimulatedGantry, SimulatedLedStrip};
use gantry_host::Runner;

#[derive(Debug, Parser)]
#[command(name = "gantry-run", version, about = "Run a G-code motion/LED test program")]
struct Cli {
    /// G-code program to run (`-` reads stdin)
    program: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Abort on the first malformed, incomplete or unsupported line
    #[arg(long)]
    strict: bool,

    /// Pause after every command, in milliseconds
    #[arg(long)]
    line_delay_ms: Option<u64>,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    tracing::info!("Starting gantry-run v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path, e);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
            })?
        }
        None => Config::default(),
    };
    if cli.strict {
        config.runner.failure_mode = FailureMode::Error;
    }
    if let Some(delay) = cli.line_delay_ms {
        config.runner.line_delay_ms = delay;
    }

    tracing::info!("LEDs: {}", config.leds.count);
    tracing::info!("Lead screw: {} mm/rev", config.motion.lead_mm);
    tracing::info!("Failure mode: {:?}", config.runner.failure_mode);

    let program = FileManager::new().read_program(&cli.program).await.map_err(|e| {
        tracing::error!("Failed to read program '{}': {}", cli.program, e);
        e
    })?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current command");
            let _ = stop_tx.send(true);
        }
    });

    let mut runner = Runner::new(
        config.runner.clone(),
        SimulatedGantry::new(config.motion.lead_mm),
        SimulatedLedStrip::new(config.leds.count),
    )
    .with_stop_signal(stop_rx);
    runner.load(program)?;

    match runner.run().await {
        Ok(summary) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}
