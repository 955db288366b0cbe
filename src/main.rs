use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ecosim::{
    config::{ConfigLoader, SimulationConfig},
    engine::TickReport,
    scheduler::{HostEvent, Scheduler},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Fox and chicken grid ecosystem")]
struct Cli {
    /// Path to a simulation YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bootstrap seed
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Emit one JSON object per event instead of text
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ecosim=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::new(".").load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.tick_interval_ms = interval_ms;
    }
    config.validate()?;
    Ok(config)
}

fn print_report(report: &TickReport) {
    let counts: Vec<String> = report
        .census
        .iter()
        .map(|(tag, count)| format!("{tag:?}={count}"))
        .collect();
    println!("move {:>5}  {}", report.move_counter, counts.join(" "));
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut scheduler = Scheduler::from_config(&config)?;
    let mut events = BroadcastStream::new(scheduler.subscribe());
    scheduler.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                scheduler.stop().await;
            }
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if cli.json {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    match event {
                        HostEvent::Tick(report) => {
                            if !cli.json {
                                print_report(&report);
                            }
                            if cli.ticks.is_some_and(|limit| report.move_counter >= limit) {
                                scheduler.stop().await;
                            }
                        }
                        HostEvent::Closed { reason } => {
                            if !cli.json {
                                println!("closed: {reason:?}");
                            }
                            break;
                        }
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(skipped, "host fell behind, events dropped");
                }
                None => break,
            }
        }
    }

    info!(move_counter = scheduler.move_counter(), "run finished");
    Ok(())
}
