//! Race parameters.

use std::{num::NonZeroU32, time::Duration};

use crate::{RelayError, Token};

pub const DEFAULT_LEGS: u32 = 4;

const DEFAULT_TERMINAL: NonZeroU32 = NonZeroU32::new(DEFAULT_LEGS).unwrap();

/// Validated parameters for a single race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceConfig {
    pub terminal: Token,
    /// `0` is a rendezvous channel.
    pub capacity: usize,
    /// Bound on every send and receive. `None` blocks indefinitely.
    pub hand_off_timeout: Option<Duration>,
    /// Bound on the coordinator's wait for the final leg.
    pub finish_timeout: Option<Duration>,
}

impl RaceConfig {
    #[must_use]
    pub const fn builder() -> RaceConfigBuilder {
        RaceConfigBuilder {
            legs: DEFAULT_LEGS,
            capacity: 0,
            hand_off_timeout: None,
            finish_timeout: None,
        }
    }

    #[must_use]
    pub const fn legs(&self) -> u32 {
        self.terminal.get()
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            terminal: Token::from_non_zero(DEFAULT_TERMINAL),
            capacity: 0,
            hand_off_timeout: None,
            finish_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RaceConfigBuilder {
    legs: u32,
    capacity: usize,
    hand_off_timeout: Option<Duration>,
    finish_timeout: Option<Duration>,
}

impl RaceConfigBuilder {
    pub const fn legs(&mut self, legs: u32) -> &mut Self {
        self.legs = legs;
        self
    }

    pub const fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn hand_off_timeout<T: Into<Option<Duration>>>(&mut self, timeout: T) -> &mut Self {
        self.hand_off_timeout = timeout.into();
        self
    }

    pub fn finish_timeout<T: Into<Option<Duration>>>(&mut self, timeout: T) -> &mut Self {
        self.finish_timeout = timeout.into();
        self
    }

    /// # Errors
    ///
    /// * If `legs` is 0
    /// * If a configured timeout is zero
    pub fn build(&self) -> Result<RaceConfig, RelayError> {
        let terminal = Token::new(self.legs).map_err(|_| {
            RelayError::InvalidConfig("a race needs at least one leg".to_string())
        })?;

        if self.hand_off_timeout.is_some_and(|x| x.is_zero())
            || self.finish_timeout.is_some_and(|x| x.is_zero())
        {
            return Err(RelayError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(RaceConfig {
            terminal,
            capacity: self.capacity,
            hand_off_timeout: self.hand_off_timeout,
            finish_timeout: self.finish_timeout,
        })
    }
}
