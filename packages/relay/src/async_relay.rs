//! The same relay with runners as tokio tasks.
//!
//! Runners follow [`RunnerState::advance`] exactly as the threaded ones do;
//! only the waiting is different. Hand-offs and the final wait suspend the
//! task instead of blocking a thread, so the race also completes on a
//! current-thread runtime.

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

use crate::{
    Operation, RaceConfig, RaceSummary, RelayError, Reporter, RunnerState, Token, runner::Track,
};

async fn within<T, F>(
    operation: Operation,
    timeout: Option<Duration>,
    future: F,
) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    match timeout {
        Some(after) => tokio::time::timeout(after, future)
            .await
            .map_err(|_| RelayError::Timeout { operation, after })?,
        None => future.await,
    }
}

/// Starts runner `position` as a new task on the current runtime.
///
/// # Panics
///
/// * If called outside of a tokio runtime
pub fn spawn_runner(
    position: u32,
    track: Arc<Track>,
) -> JoinHandle<Result<RunnerState, RelayError>> {
    log::trace!("spawn_runner: runner {position}");
    let stats_track = track.clone();

    let handle = tokio::spawn(async move {
        run_runner(position, track)
            .await
            .inspect_err(|e| log::error!("Runner {position} failed: {e}"))
    });
    stats_track.stats.record_spawn();

    handle
}

/// Drives one runner through its states.
///
/// Boxed because a forwarding runner spawns a task running this same future.
///
/// # Errors
///
/// * If a hand-off deadline elapsed or the channel disconnected
/// * If the race was already released
pub fn run_runner(
    position: u32,
    track: Arc<Track>,
) -> BoxFuture<'static, Result<RunnerState, RelayError>> {
    Box::pin(async move {
        let mut state = RunnerState::Waiting;
        let mut exit = RunnerState::Done;

        loop {
            log::trace!("runner {position}: {state:?}");

            state = match state {
                RunnerState::Waiting => {
                    track.reporter.runner_ready();
                    let token = within(
                        Operation::Receive,
                        track.hand_off_timeout,
                        track.channel.recv_async(),
                    )
                    .await?;
                    track.stats.record_arrival(token);
                    RunnerState::receive(token)
                }
                RunnerState::Holding(token) => {
                    track.reporter.running_leg(token);
                    state.advance(track.terminal)
                }
                RunnerState::Terminal(token) => {
                    track.finish(token)?;
                    exit = state;
                    state.advance(track.terminal)
                }
                RunnerState::Forwarding { next, .. } => {
                    drop(spawn_runner(position.saturating_add(1), track.clone()));
                    within(
                        Operation::Send,
                        track.hand_off_timeout,
                        track.channel.send_async(next),
                    )
                    .await?;
                    exit = state;
                    state.advance(track.terminal)
                }
                RunnerState::Done => break,
            };
        }

        log::debug!("runner {position} done: {exit:?}");

        Ok(exit)
    })
}

/// Runs a relay on tokio tasks and resolves once the final leg is received.
///
/// # Errors
///
/// * If the opening hand-off or the final wait exceeded its deadline
///
/// # Panics
///
/// * If called outside of a tokio runtime
pub async fn run_race(
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

    drop(spawn_runner(1, track.clone()));

    within(
        Operation::Send,
        config.hand_off_timeout,
        track.channel.send_async(Token::FIRST),
    )
    .await?;
    log::trace!("run_race: opening hand-off accepted");

    within(Operation::Wait, config.finish_timeout, async {
        track.latch.wait_async().await;
        Ok(())
    })
    .await?;

    track.reporter.race_over();

    let summary = RaceSummary::from_track(&track, start.elapsed());
    log::debug!("run_race: finished {summary:?}");

    Ok(summary)
}
