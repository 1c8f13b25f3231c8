//! Runners and the state machine they follow.
//!
//! A runner waits on the [`RelayChannel`] for the baton, reports the leg it
//! received, then takes exactly one of two exits:
//!
//! *   the final leg releases the race [`Latch`] and ends there
//! *   any other leg puts the next runner in position, advances the baton by
//!     one and hands it over
//!
//! The decision itself is [`RunnerState::advance`]; the blocking parts live
//! in [`Runner::run`] for OS threads and in [`crate::async_relay`] for tokio
//! tasks.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{Latch, RaceConfig, RelayChannel, RelayError, Reporter, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// In position, waiting for the baton.
    Waiting,
    /// Received the baton and has not decided yet.
    Holding(Token),
    /// Received the final leg.
    Terminal(Token),
    /// Passing the baton on as `next`.
    Forwarding { held: Token, next: Token },
    Done,
}

impl RunnerState {
    /// The state a waiting runner moves to once `token` arrives.
    #[must_use]
    pub const fn receive(token: Token) -> Self {
        Self::Holding(token)
    }

    /// Moves one step forward without performing any side effects.
    ///
    /// `Waiting` only leaves through [`RunnerState::receive`], so it is
    /// returned unchanged, as is `Done`.
    #[must_use]
    pub fn advance(self, terminal: Token) -> Self {
        match self {
            Self::Holding(held) if held.is_terminal(terminal) => Self::Terminal(held),
            Self::Holding(held) => held
                .next()
                .map_or(Self::Done, |next| Self::Forwarding { held, next }),
            Self::Terminal(_) | Self::Forwarding { .. } => Self::Done,
            Self::Waiting | Self::Done => self,
        }
    }

    #[must_use]
    pub const fn held(self) -> Option<Token> {
        match self {
            Self::Holding(token) | Self::Terminal(token) | Self::Forwarding { held: token, .. } => {
                Some(token)
            }
            Self::Waiting | Self::Done => None,
        }
    }
}

/// Counters shared by every runner in a race.
#[derive(Debug, Default)]
pub struct RaceStats {
    spawned: AtomicU32,
    forwarded: AtomicU32,
    finished: AtomicU32,
}

impl RaceStats {
    pub(crate) fn record_spawn(&self) {
        self.spawned.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts `token` as a completed hand-off once a runner has received it.
    /// The opening leg comes from the coordinator and is not counted.
    pub(crate) fn record_arrival(&self, token: Token) {
        if token != Token::FIRST {
            self.forwarded.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn record_finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    /// Runners put in position, including the first.
    #[must_use]
    pub fn spawned(&self) -> u32 {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Hand-offs between runners that reached the receiving runner. The
    /// coordinator's opening send is not counted.
    #[must_use]
    pub fn forwarded(&self) -> u32 {
        self.forwarded.load(Ordering::SeqCst)
    }

    /// Runners that signaled the end of the race.
    #[must_use]
    pub fn finished(&self) -> u32 {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Everything the runners of one race share.
pub struct Track {
    pub channel: RelayChannel,
    pub latch: Latch,
    pub terminal: Token,
    pub hand_off_timeout: Option<Duration>,
    pub reporter: Arc<dyn Reporter>,
    pub stats: RaceStats,
}

impl Track {
    #[must_use]
    pub fn new(config: &RaceConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            channel: RelayChannel::with_capacity(config.capacity),
            latch: Latch::new(1),
            terminal: config.terminal,
            hand_off_timeout: config.hand_off_timeout,
            reporter,
            stats: RaceStats::default(),
        }
    }

    /// Releases the race on behalf of the runner holding the final leg.
    ///
    /// # Errors
    ///
    /// * If the race was already released
    pub(crate) fn finish(&self, token: Token) -> Result<(), RelayError> {
        log::debug!("finish: {token} is the final leg");
        self.stats.record_finish();
        self.latch.signal()?;
        Ok(())
    }
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("channel", &self.channel)
            .field("latch", &self.latch)
            .field("terminal", &self.terminal)
            .field("hand_off_timeout", &self.hand_off_timeout)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// One participant of the relay, running on its own OS thread.
#[derive(Debug, Clone)]
pub struct Runner {
    position: u32,
    track: Arc<Track>,
}

impl Runner {
    /// The runner the coordinator puts in position.
    #[must_use]
    pub const fn first(track: Arc<Track>) -> Self {
        Self { position: 1, track }
    }

    /// The runner this one puts in position before handing over.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self {
            position: self.position.saturating_add(1),
            track: self.track.clone(),
        }
    }

    /// 1-based place in the chain. Only used to name threads and log lines.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Starts this runner on a new thread named `relay-runner-{position}`.
    ///
    /// Dropping the returned handle detaches the runner; failures are still
    /// logged.
    ///
    /// # Errors
    ///
    /// * If the OS fails to spawn the thread
    pub fn spawn(self) -> Result<JoinHandle<Result<RunnerState, RelayError>>, RelayError> {
        let position = self.position;
        log::trace!("spawn: runner {position}");
        let track = self.track.clone();

        let handle = thread::Builder::new()
            .name(format!("relay-runner-{position}"))
            .spawn(move || {
                self.run()
                    .inspect_err(|e| log::error!("Runner {position} failed: {e}"))
            })?;
        track.stats.record_spawn();

        Ok(handle)
    }

    /// Runs the state machine to completion on the current thread.
    ///
    /// Returns the state the runner left through: [`RunnerState::Terminal`]
    /// or [`RunnerState::Forwarding`].
    ///
    /// # Errors
    ///
    /// * If a hand-off deadline elapsed or the channel disconnected
    /// * If the successor could not be spawned
    /// * If the race was already released
    pub fn run(self) -> Result<RunnerState, RelayError> {
        let track = &self.track;
        let mut state = RunnerState::Waiting;
        let mut exit = RunnerState::Done;

        loop {
            log::trace!("runner {}: {state:?}", self.position);

            state = match state {
                RunnerState::Waiting => {
                    track.reporter.runner_ready();
                    let token = track.channel.recv_within(track.hand_off_timeout)?;
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
                    drop(self.successor().spawn()?);
                    track.channel.send_within(next, track.hand_off_timeout)?;
                    exit = state;
                    state.advance(track.terminal)
                }
                RunnerState::Done => break,
            };
        }

        log::debug!("runner {} done: {exit:?}", self.position);

        Ok(exit)
    }
}
