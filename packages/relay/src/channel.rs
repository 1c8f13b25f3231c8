//! The conduit runners pass the [`Token`] over.
//!
//! This wraps a flume channel that is shared, both ends together, by every
//! participant in the race. With zero capacity a send only completes once a
//! receiver takes the value, so at most one runner ever holds the token.

use std::time::Duration;

use flume::{RecvTimeoutError, SendTimeoutError};

use crate::{Operation, RelayError, Token};

/// Shared sending and receiving handle for the relay.
///
/// Cloning is cheap; every clone addresses the same underlying channel.
#[derive(Debug, Clone)]
pub struct RelayChannel {
    sender: flume::Sender<Token>,
    receiver: flume::Receiver<Token>,
    capacity: usize,
}

impl RelayChannel {
    /// Creates an unbuffered channel where every send waits for a receive.
    #[must_use]
    pub fn rendezvous() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a channel that buffers up to `capacity` tokens.
    ///
    /// A `capacity` of `0` is equivalent to [`RelayChannel::rendezvous`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn is_rendezvous(&self) -> bool {
        self.capacity == 0
    }

    /// Hands `token` to the next receiver, blocking until one accepts it.
    ///
    /// # Errors
    ///
    /// * If every receiver has been dropped
    pub fn send(&self, token: Token) -> Result<(), RelayError> {
        log::trace!("send: {token}");
        self.sender
            .send(token)
            .map_err(|_| RelayError::Disconnected)
    }

    /// Blocks until a token is handed over.
    ///
    /// # Errors
    ///
    /// * If every sender has been dropped
    pub fn recv(&self) -> Result<Token, RelayError> {
        let token = self.receiver.recv().map_err(|_| RelayError::Disconnected)?;
        log::trace!("recv: {token}");
        Ok(token)
    }

    /// Like [`RelayChannel::send`], giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// * If no receiver accepted the token within `timeout`
    /// * If every receiver has been dropped
    pub fn send_timeout(&self, token: Token, timeout: Duration) -> Result<(), RelayError> {
        log::trace!("send_timeout: {token} timeout={timeout:?}");
        self.sender
            .send_timeout(token, timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => RelayError::Timeout {
                    operation: Operation::Send,
                    after: timeout,
                },
                SendTimeoutError::Disconnected(_) => RelayError::Disconnected,
            })
    }

    /// Like [`RelayChannel::recv`], giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// * If no token arrived within `timeout`
    /// * If every sender has been dropped
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Token, RelayError> {
        let token = self.receiver.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => RelayError::Timeout {
                operation: Operation::Receive,
                after: timeout,
            },
            RecvTimeoutError::Disconnected => RelayError::Disconnected,
        })?;
        log::trace!("recv_timeout: {token}");
        Ok(token)
    }

    /// Sends with the optional deadline applied.
    ///
    /// # Errors
    ///
    /// * See [`RelayChannel::send`] and [`RelayChannel::send_timeout`]
    pub fn send_within(&self, token: Token, timeout: Option<Duration>) -> Result<(), RelayError> {
        match timeout {
            Some(timeout) => self.send_timeout(token, timeout),
            None => self.send(token),
        }
    }

    /// Receives with the optional deadline applied.
    ///
    /// # Errors
    ///
    /// * See [`RelayChannel::recv`] and [`RelayChannel::recv_timeout`]
    pub fn recv_within(&self, timeout: Option<Duration>) -> Result<Token, RelayError> {
        match timeout {
            Some(timeout) => self.recv_timeout(timeout),
            None => self.recv(),
        }
    }

    /// Hands `token` over without blocking a runtime worker.
    ///
    /// # Errors
    ///
    /// * If every receiver has been dropped
    #[cfg(feature = "tokio")]
    pub async fn send_async(&self, token: Token) -> Result<(), RelayError> {
        log::trace!("send_async: {token}");
        self.sender
            .send_async(token)
            .await
            .map_err(|_| RelayError::Disconnected)
    }

    /// Waits for a token without blocking a runtime worker.
    ///
    /// # Errors
    ///
    /// * If every sender has been dropped
    #[cfg(feature = "tokio")]
    pub async fn recv_async(&self) -> Result<Token, RelayError> {
        let token = self
            .receiver
            .recv_async()
            .await
            .map_err(|_| RelayError::Disconnected)?;
        log::trace!("recv_async: {token}");
        Ok(token)
    }
}

impl Default for RelayChannel {
    fn default() -> Self {
        Self::rendezvous()
    }
}
