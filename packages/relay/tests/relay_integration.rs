use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    thread,
    time::Duration,
};

use pretty_assertions::assert_eq;
use switchy_relay::{
    Operation, RaceConfig, RecordingReporter, RelayError, RelayEvent, Reporter, Token, run_race,
};

/// Records which thread reported each leg.
#[derive(Default)]
struct ThreadTrackingReporter {
    legs: Mutex<Vec<(u32, Option<String>)>>,
    ready: AtomicU32,
    over: AtomicU32,
}

impl Reporter for ThreadTrackingReporter {
    fn runner_ready(&self) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }

    fn running_leg(&self, token: Token) {
        let name = thread::current().name().map(ToString::to_string);
        self.legs.lock().unwrap().push((token.get(), name));
    }

    fn race_over(&self) {
        self.over.fetch_add(1, Ordering::SeqCst);
    }

    fn counted(&self, _id: &str, _value: u32) {}
}

/// Takes its time on every leg.
struct SlowReporter(Duration);

impl Reporter for SlowReporter {
    fn runner_ready(&self) {}

    fn running_leg(&self, _token: Token) {
        thread::sleep(self.0);
    }

    fn race_over(&self) {}

    fn counted(&self, _id: &str, _value: u32) {}
}

/// Every runner after the first takes `delay` to get in position.
struct LateSuccessors {
    ready: AtomicU32,
    delay: Duration,
}

impl Reporter for LateSuccessors {
    fn runner_ready(&self) {
        if self.ready.fetch_add(1, Ordering::SeqCst) > 0 {
            thread::sleep(self.delay);
        }
    }

    fn running_leg(&self, _token: Token) {}

    fn race_over(&self) {}

    fn counted(&self, _id: &str, _value: u32) {}
}

#[test_log::test]
fn every_leg_count_observes_tokens_in_order() {
    for legs in 1..=12 {
        let reporter = Arc::new(RecordingReporter::new());
        let config = RaceConfig::builder().legs(legs).build().unwrap();

        let summary = run_race(&config, reporter.clone()).unwrap();

        assert_eq!(reporter.legs(), (1..=legs).collect::<Vec<_>>(), "legs={legs}");
        assert_eq!(summary.runners_spawned, legs);
        assert_eq!(summary.hand_offs, legs - 1);
        assert_eq!(summary.finishers, 1);
    }
}

#[test_log::test]
fn each_leg_is_run_by_a_different_runner_thread() {
    let reporter = Arc::new(ThreadTrackingReporter::default());

    run_race(&RaceConfig::default(), reporter.clone()).unwrap();

    let legs = reporter.legs.lock().unwrap().clone();
    assert_eq!(
        legs,
        vec![
            (1, Some("relay-runner-1".to_string())),
            (2, Some("relay-runner-2".to_string())),
            (3, Some("relay-runner-3".to_string())),
            (4, Some("relay-runner-4".to_string())),
        ]
    );
    assert_eq!(reporter.ready.load(Ordering::SeqCst), 4);
    assert_eq!(reporter.over.load(Ordering::SeqCst), 1);
}

#[test_log::test]
fn buffered_channel_keeps_the_same_order() {
    for capacity in [1, 2, 8] {
        let reporter = Arc::new(RecordingReporter::new());
        let config = RaceConfig::builder()
            .legs(6)
            .capacity(capacity)
            .build()
            .unwrap();

        let summary = run_race(&config, reporter.clone()).unwrap();

        assert_eq!(reporter.legs(), vec![1, 2, 3, 4, 5, 6], "capacity={capacity}");
        assert_eq!(summary.runners_spawned, 6);
        assert_eq!(summary.finishers, 1);
    }
}

#[test_log::test]
fn race_over_follows_every_leg() {
    let reporter = Arc::new(RecordingReporter::new());

    run_race(&RaceConfig::default(), reporter.clone()).unwrap();

    let events = reporter.events();
    let over = events
        .iter()
        .position(|event| *event == RelayEvent::RaceOver)
        .unwrap();
    let last_leg = events
        .iter()
        .rposition(|event| matches!(event, RelayEvent::RunningLeg(_)))
        .unwrap();

    assert!(last_leg < over);
    assert_eq!(over, events.len() - 1);
}

#[test_log::test]
fn generous_deadlines_do_not_change_the_outcome() {
    let reporter = Arc::new(RecordingReporter::new());
    let config = RaceConfig::builder()
        .legs(8)
        .hand_off_timeout(Duration::from_secs(5))
        .finish_timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let summary = run_race(&config, reporter.clone()).unwrap();

    assert_eq!(reporter.legs(), (1..=8).collect::<Vec<_>>());
    assert_eq!(summary.finishers, 1);
}

#[test_log::test]
fn stalled_race_is_reported_by_the_finish_deadline() {
    let config = RaceConfig::builder()
        .legs(4)
        .finish_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let result = run_race(&config, Arc::new(SlowReporter(Duration::from_millis(100))));

    assert!(matches!(
        result,
        Err(RelayError::Timeout {
            operation: Operation::Wait,
            after,
        }) if after == Duration::from_millis(20)
    ));
}

#[test_log::test]
fn failed_hand_off_leaves_the_race_unfinished() {
    let config = RaceConfig::builder()
        .legs(3)
        .hand_off_timeout(Duration::from_millis(20))
        .finish_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let reporter = Arc::new(LateSuccessors {
        ready: AtomicU32::new(0),
        delay: Duration::from_millis(200),
    });

    let result = run_race(&config, reporter);

    assert!(matches!(
        result,
        Err(RelayError::Timeout {
            operation: Operation::Wait,
            ..
        })
    ));
}

#[test_log::test]
fn invalid_config_is_rejected_before_the_race_starts() {
    assert!(matches!(
        RaceConfig::builder().legs(0).build(),
        Err(RelayError::InvalidConfig(_))
    ));
}

#[cfg(feature = "tokio")]
mod tokio_backend {
    use pretty_assertions::assert_eq;
    use switchy_relay::async_relay;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn every_leg_count_observes_tokens_in_order() {
        for legs in 1..=12 {
            let reporter = Arc::new(RecordingReporter::new());
            let config = RaceConfig::builder().legs(legs).build().unwrap();

            let summary = async_relay::run_race(&config, reporter.clone())
                .await
                .unwrap();

            assert_eq!(reporter.legs(), (1..=legs).collect::<Vec<_>>(), "legs={legs}");
            assert_eq!(summary.runners_spawned, legs);
            assert_eq!(summary.finishers, 1);
        }
    }

    #[test_log::test(tokio::test)]
    async fn buffered_channel_keeps_the_same_order() {
        let reporter = Arc::new(RecordingReporter::new());
        let config = RaceConfig::builder()
            .legs(5)
            .capacity(3)
            .build()
            .unwrap();

        async_relay::run_race(&config, reporter.clone())
            .await
            .unwrap();

        assert_eq!(reporter.legs(), vec![1, 2, 3, 4, 5]);
        assert_eq!(reporter.count_of(&RelayEvent::RaceOver), 1);
    }

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
    async fn stalled_race_is_reported_by_the_finish_deadline() {
        let config = RaceConfig::builder()
            .legs(4)
            .finish_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let result =
            async_relay::run_race(&config, Arc::new(SlowReporter(Duration::from_millis(100))))
                .await;

        assert!(matches!(
            result,
            Err(RelayError::Timeout {
                operation: Operation::Wait,
                ..
            })
        ));
    }
}
