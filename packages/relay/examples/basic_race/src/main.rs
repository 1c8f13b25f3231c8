#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Basic usage example for `switchy_relay`
//!
//! This example demonstrates:
//! - Running the four leg relay with console output
//! - Recording a longer relay and inspecting what each runner saw
//! - Bounding a relay with deadlines

use std::{sync::Arc, time::Duration};

use switchy_relay::{ConsoleReporter, RaceConfig, RecordingReporter, RelayError, run_race};

fn main() -> Result<(), RelayError> {
    env_logger::init();

    // The reference race: four runners, rendezvous hand-offs
    println!("Running the default relay:");
    let summary = run_race(&RaceConfig::default(), Arc::new(ConsoleReporter))?;
    println!(
        "{} runners finished {} legs in {:?}",
        summary.runners_spawned, summary.legs, summary.elapsed
    );
    println!();

    // A longer race, recorded instead of printed
    let reporter = Arc::new(RecordingReporter::new());
    let config = RaceConfig::builder().legs(10).build()?;
    run_race(&config, reporter.clone())?;
    println!("Legs seen by the recorded relay: {:?}", reporter.legs());
    println!();

    // Deadlines turn a stalled hand-off into an error instead of a hang
    let config = RaceConfig::builder()
        .legs(6)
        .hand_off_timeout(Duration::from_secs(1))
        .finish_timeout(Duration::from_secs(5))
        .build()?;
    let summary = run_race(&config, Arc::new(ConsoleReporter))?;
    log::info!("Bounded relay finished in {:?}", summary.elapsed);

    Ok(())
}
