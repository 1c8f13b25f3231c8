#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![forbid(unsafe_code)]

//! Command-line interface for running relay simulations
//!
//! # Usage
//!
//! Run the default four leg relay:
//! ```bash
//! switchy_relay race
//! ```
//!
//! Run a longer relay on tokio tasks, giving up if a hand-off stalls:
//! ```bash
//! switchy_relay race --legs 10 --backend tokio --hand-off-timeout-ms 500
//! ```
//!
//! Count up and down on two threads:
//! ```bash
//! switchy_relay count --to 100
//! ```

use std::{process, sync::Arc, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use switchy_relay::{
    ConsoleReporter, RaceConfig, RaceSummary, count_up_and_down,
    config::DEFAULT_LEGS,
    counters::{DEFAULT_COUNT_TO, DEFAULT_PAUSE},
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[clap(rename_all = "kebab_case")]
enum Backend {
    Thread,
    #[cfg(feature = "tokio")]
    Tokio,
}

/// Relay hand-off simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Pass a baton between runners until the final leg is received
    Race {
        /// Number of legs, and therefore runners
        #[arg(
            long,
            env = "RELAY_LEGS",
            default_value_t = DEFAULT_LEGS,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        legs: u32,

        /// Buffer size of the relay channel, 0 for a rendezvous
        #[arg(long, env = "RELAY_CAPACITY", default_value_t = 0)]
        capacity: usize,

        /// Give up on a send or receive after this many milliseconds
        #[arg(long, env = "RELAY_HAND_OFF_TIMEOUT_MS")]
        hand_off_timeout_ms: Option<u64>,

        /// Give up waiting for the final leg after this many milliseconds
        #[arg(long, env = "RELAY_FINISH_TIMEOUT_MS")]
        finish_timeout_ms: Option<u64>,

        #[arg(long, env = "RELAY_BACKEND", value_enum, default_value_t = Backend::Thread)]
        backend: Backend,
    },
    /// Count up and down on two threads at the same time
    Count {
        #[arg(long, env = "RELAY_COUNT_TO", default_value_t = DEFAULT_COUNT_TO)]
        to: u32,

        /// Pause between numbers, in milliseconds
        #[arg(long, env = "RELAY_COUNT_PAUSE_MS")]
        pause_ms: Option<u64>,
    },
}

fn init_logging() {
    #[cfg(debug_assertions)]
    const DEFAULT_LOG_LEVEL: &str = "switchy_relay=trace";
    #[cfg(not(debug_assertions))]
    const DEFAULT_LOG_LEVEL: &str = "switchy_relay=info";

    let filter = std::env::var("SWITCHY_RELAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    env_logger::Builder::new().parse_filters(&filter).init();
}

fn race(
    config: &RaceConfig,
    backend: Backend,
) -> Result<RaceSummary, Box<dyn std::error::Error>> {
    let reporter = Arc::new(ConsoleReporter);

    Ok(match backend {
        Backend::Thread => switchy_relay::run_race(config, reporter)?,
        #[cfg(feature = "tokio")]
        Backend::Tokio => tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?
            .block_on(switchy_relay::async_relay::run_race(config, reporter))?,
    })
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.cmd {
        Commands::Race {
            legs,
            capacity,
            hand_off_timeout_ms,
            finish_timeout_ms,
            backend,
        } => {
            let config = RaceConfig::builder()
                .legs(legs)
                .capacity(capacity)
                .hand_off_timeout(hand_off_timeout_ms.map(Duration::from_millis))
                .finish_timeout(finish_timeout_ms.map(Duration::from_millis))
                .build()?;

            let summary = race(&config, backend)?;
            log::info!(
                "Race finished: {} legs, {} runners in {:?}",
                summary.legs,
                summary.runners_spawned,
                summary.elapsed
            );
        }
        Commands::Count { to, pause_ms } => {
            let pause = pause_ms.map_or(DEFAULT_PAUSE, Duration::from_millis);
            let summary = count_up_and_down(to, pause, Arc::new(ConsoleReporter))?;
            log::info!("Counting finished in {:?}", summary.elapsed);
        }
    }

    Ok(())
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
