//! Reporting sinks for race progress.
//!
//! Reporting is a side channel: nothing in the relay reads back what was
//! reported. Lines from different runners may interleave in any order; only
//! the token order is guaranteed.

use std::sync::Mutex;

use crate::Token;

pub trait Reporter: Send + Sync {
    /// A runner is in position and about to wait for the baton.
    fn runner_ready(&self);

    /// A runner received the baton and is running `token`'s leg.
    fn running_leg(&self, token: Token);

    /// The coordinator observed the end of the race.
    fn race_over(&self);

    /// A counter worker identified by `id` reached `value`.
    fn counted(&self, id: &str, value: u32);
}

/// Writes every event as a line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn runner_ready(&self) {
        println!("New runner ready to receive the baton");
    }

    fn running_leg(&self, token: Token) {
        println!("Runner is running leg {}", token.get());
    }

    fn race_over(&self) {
        println!("The race is over");
    }

    fn counted(&self, id: &str, value: u32) {
        println!("{id} {value}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    RunnerReady,
    RunningLeg(Token),
    RaceOver,
    Counted { id: String, value: u32 },
}

/// Keeps every event in memory, in the order the reporter saw them.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RelayEvent>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: RelayEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Snapshot of everything recorded so far.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn events(&self) -> Vec<RelayEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The legs reported by runners, in reporting order.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn legs(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RelayEvent::RunningLeg(token) => Some(token.get()),
                _ => None,
            })
            .collect()
    }

    /// The values reported by the counter named `id`, in reporting order.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn counts(&self, id: &str) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RelayEvent::Counted { id: counter, value } if counter == id => Some(value),
                _ => None,
            })
            .collect()
    }

    /// How many times `wanted` was recorded.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn count_of(&self, wanted: &RelayEvent) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| *event == wanted)
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn runner_ready(&self) {
        self.push(RelayEvent::RunnerReady);
    }

    fn running_leg(&self, token: Token) {
        self.push(RelayEvent::RunningLeg(token));
    }

    fn race_over(&self) {
        self.push(RelayEvent::RaceOver);
    }

    fn counted(&self, id: &str, value: u32) {
        self.push(RelayEvent::Counted {
            id: id.to_string(),
            value,
        });
    }
}
