//! Two workers counting in opposite directions at the same time.
//!
//! The coordinator blocks on a [`Latch`] with one pending event per worker.
//! Each worker holds a [`crate::LatchGuard`] so the latch is signaled however
//! the worker exits.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crate::{Latch, RelayError, Reporter};

pub const UP: &str = "up";
pub const DOWN: &str = "down";

pub const DEFAULT_COUNT_TO: u32 = 100;
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSummary {
    pub up: Vec<u32>,
    pub down: Vec<u32>,
    pub elapsed: Duration,
}

fn count<I>(
    id: &'static str,
    values: I,
    pause: Duration,
    latch: &Latch,
    reporter: &dyn Reporter,
) -> Vec<u32>
where
    I: Iterator<Item = u32>,
{
    let _done = latch.guard();

    values
        .inspect(|&value| {
            // Gives the scheduler a chance to switch between workers.
            if !pause.is_zero() {
                thread::sleep(pause);
            }
            reporter.counted(id, value);
        })
        .collect()
}

/// Counts `1..=to` and `to..=1` on two threads and waits for both.
///
/// # Errors
///
/// * If either worker thread could not be spawned
/// * If a worker panicked
pub fn count_up_and_down(
    to: u32,
    pause: Duration,
    reporter: Arc<dyn Reporter>,
) -> Result<CountSummary, RelayError> {
    let start = Instant::now();
    let latch = Latch::new(2);

    log::debug!("count_up_and_down: to={to} pause={pause:?}");

    let (up, down) = thread::scope(|scope| -> Result<_, RelayError> {
        let up = thread::Builder::new()
            .name(format!("counter-{UP}"))
            .spawn_scoped(scope, || count(UP, 1..=to, pause, &latch, reporter.as_ref()))?;
        let down = thread::Builder::new()
            .name(format!("counter-{DOWN}"))
            .spawn_scoped(scope, || {
                count(DOWN, (1..=to).rev(), pause, &latch, reporter.as_ref())
            });

        let down = match down {
            Ok(down) => down,
            Err(e) => {
                // The up worker still holds its share of the latch; let it finish.
                let _ = up.join();
                return Err(RelayError::Spawn(e));
            }
        };

        latch.wait();
        log::trace!("count_up_and_down: latch released");

        // Both are joined before either result is inspected, so a panicked
        // worker is never left for the scope to join.
        let (up, down) = (up.join(), down.join());

        Ok((
            up.map_err(|_| worker_panicked(UP))?,
            down.map_err(|_| worker_panicked(DOWN))?,
        ))
    })?;

    Ok(CountSummary {
        up,
        down,
        elapsed: start.elapsed(),
    })
}

fn worker_panicked(id: &str) -> RelayError {
    RelayError::WorkerPanicked(format!("counter-{id}"))
}
