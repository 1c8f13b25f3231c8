//! Sets up a race, starts it and waits for it to finish.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{RaceConfig, RelayError, Reporter, Token, runner::Runner, runner::Track};

/// What a finished race looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceSummary {
    pub legs: u32,
    pub runners_spawned: u32,
    pub hand_offs: u32,
    pub finishers: u32,
    pub elapsed: Duration,
}

impl RaceSummary {
    pub(crate) fn from_track(track: &Track, elapsed: Duration) -> Self {
        Self {
            legs: track.terminal.get(),
            runners_spawned: track.stats.spawned(),
            hand_offs: track.stats.forwarded(),
            finishers: track.stats.finished(),
            elapsed,
        }
    }
}

/// Runs a relay on OS threads and blocks until the final leg is received.
///
/// The first runner is put in position before the opening hand-off, which
/// may block until that runner is ready to receive. Every later runner is
/// started by its predecessor.
///
/// # Errors
///
/// * If the first runner could not be spawned
/// * If the opening hand-off or the final wait exceeded its deadline
pub fn run_race(
    config: &RaceConfig,
    reporter: Arc<dyn Reporter>,
) -> Result<RaceSummary, RelayError> {
    let start = Instant::now();
    let track = Arc::new(Track::new(config, reporter));

    log::debug!(
        "run_race: legs={} capacity={}",
        config.legs(),
        config.capacity
    );

    drop(Runner::first(track.clone()).spawn()?);

    track
        .channel
        .send_within(Token::FIRST, config.hand_off_timeout)?;
    log::trace!("run_race: opening hand-off accepted");

    track.latch.wait_within(config.finish_timeout)?;

    track.reporter.race_over();

    let summary = RaceSummary::from_track(&track, start.elapsed());
    log::debug!("run_race: finished {summary:?}");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use std::thread;

    use super::*;
    use crate::{ConsoleReporter, Operation, RecordingReporter, RelayEvent};

    /// Runners that take their time getting in position.
    struct SlowStart(Duration);

    impl Reporter for SlowStart {
        fn runner_ready(&self) {
            thread::sleep(self.0);
        }

        fn running_leg(&self, _token: Token) {}

        fn race_over(&self) {}

        fn counted(&self, _id: &str, _value: u32) {}
    }

    #[test_log::test]
    fn four_leg_race_reports_each_leg_in_order() {
        let reporter = Arc::new(RecordingReporter::new());
        let config = RaceConfig::default();

        let summary = run_race(&config, reporter.clone()).unwrap();

        assert_eq!(reporter.legs(), vec![1, 2, 3, 4]);
        assert_eq!(summary.legs, 4);
        assert_eq!(summary.runners_spawned, 4);
        assert_eq!(summary.hand_offs, 3);
        assert_eq!(summary.finishers, 1);
    }

    #[test_log::test]
    fn race_over_is_reported_once_and_last() {
        let reporter = Arc::new(RecordingReporter::new());

        run_race(&RaceConfig::default(), reporter.clone()).unwrap();

        let events = reporter.events();
        assert_eq!(reporter.count_of(&RelayEvent::RaceOver), 1);
        assert_eq!(events.last(), Some(&RelayEvent::RaceOver));
        assert_eq!(reporter.count_of(&RelayEvent::RunnerReady), 4);
    }

    #[test_log::test]
    fn single_leg_race_has_no_hand_offs() {
        let reporter = Arc::new(RecordingReporter::new());
        let config = RaceConfig::builder().legs(1).build().unwrap();

        let summary = run_race(&config, reporter.clone()).unwrap();

        assert_eq!(reporter.legs(), vec![1]);
        assert_eq!(summary.runners_spawned, 1);
        assert_eq!(summary.hand_offs, 0);
        assert_eq!(summary.finishers, 1);
    }

    #[test_log::test]
    fn console_reporter_race_completes() {
        let summary = run_race(&RaceConfig::default(), Arc::new(ConsoleReporter)).unwrap();

        assert_eq!(summary.finishers, 1);
    }

    #[test_log::test]
    fn opening_hand_off_without_a_ready_runner_times_out() {
        let config = RaceConfig::builder()
            .legs(2)
            .hand_off_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let result = run_race(&config, Arc::new(SlowStart(Duration::from_millis(200))));

        assert!(matches!(
            result,
            Err(RelayError::Timeout {
                operation: Operation::Send,
                after,
            }) if after == Duration::from_millis(20)
        ));
    }
}
