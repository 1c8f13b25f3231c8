#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![forbid(unsafe_code)]

//! # `switchy_relay`
//!
//! A relay race between concurrently scheduled runners. A single baton
//! ([`Token`]) is handed from runner to runner over a rendezvous
//! [`RelayChannel`]. Every runner spawns its successor before passing the
//! baton on, and the runner that receives the final leg releases a
//! [`Latch`] the coordinating thread is blocked on.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use switchy_relay::{RaceConfig, RecordingReporter, run_race};
//!
//! let config = RaceConfig::builder().legs(4).build().unwrap();
//! let reporter = Arc::new(RecordingReporter::new());
//!
//! let summary = run_race(&config, reporter.clone()).unwrap();
//!
//! assert_eq!(summary.runners_spawned, 4);
//! assert_eq!(reporter.legs(), vec![1, 2, 3, 4]);
//! ```
//!
//! # Features
//!
//! *   `cli`: builds the `switchy_relay` binary
//! *   `tokio`: adds [`async_relay`], which runs runners as tokio tasks

use std::time::Duration;

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod counters;
pub mod latch;
pub mod report;
pub mod runner;
pub mod token;

#[cfg(feature = "tokio")]
pub mod async_relay;

pub use channel::RelayChannel;
pub use config::RaceConfig;
pub use coordinator::{RaceSummary, run_race};
pub use counters::{CountSummary, count_up_and_down};
pub use latch::{Latch, LatchGuard};
pub use report::{ConsoleReporter, RecordingReporter, RelayEvent, Reporter};
pub use runner::{RaceStats, Runner, RunnerState, Track};
pub use token::Token;

/// The blocking operation that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Send,
    Receive,
    Wait,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Wait => "wait",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Relay channel disconnected")]
    Disconnected,
    #[error("Timed out on {operation} after {after:?}")]
    Timeout {
        operation: Operation,
        after: Duration,
    },
    #[error("Latch signaled after it was already released")]
    LatchOverSignaled,
    #[error("Invalid token value {0}, tokens start at 1")]
    InvalidToken(u32),
    #[error("Invalid race config: {0}")]
    InvalidConfig(String),
    #[error("Failed to spawn runner: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Worker {0} panicked")]
    WorkerPanicked(String),
}
