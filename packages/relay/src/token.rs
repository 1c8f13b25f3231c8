//! The baton handed between runners.

use std::{fmt, num::NonZeroU32};

use crate::RelayError;

/// Which leg of the relay is in progress.
///
/// Tokens start at [`Token::FIRST`] and only ever move forward by one. A
/// runner that receives a token owns that value for the rest of its
/// execution; advancing produces a new token rather than mutating the held
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(NonZeroU32);

impl Token {
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// # Errors
    ///
    /// * If `value` is `0`
    pub fn new(value: u32) -> Result<Self, RelayError> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(RelayError::InvalidToken(value))
    }

    #[must_use]
    pub const fn from_non_zero(value: NonZeroU32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The token for the following leg, or `None` once `u32::MAX` is reached.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self, terminal: Self) -> bool {
        self == terminal
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::FIRST
    }
}

impl From<NonZeroU32> for Token {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl TryFrom<u32> for Token {
    type Error = RelayError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leg {}", self.0)
    }
}
