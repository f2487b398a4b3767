// SPDX-License-Identifier: Apache-2.0

//! Errors for the channels.

/// Errors that can occur sending a value into a channel.
#[derive(thiserror::Error, Debug)]
pub enum SendError<T> {
    /// The channel is at capacity and the value could not be sent.
    #[error("channel is full and the value could not be sent")]
    Full(T),

    /// Every receiver has been dropped.
    #[error("channel is closed and the value could not be sent")]
    Closed(T),
}

impl<T> SendError<T> {
    /// Returns the value that failed to send, discarding which error it was.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(t) | Self::Closed(t) => t,
        }
    }
}

/// Errors that can occur receiving a value from a channel.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// Every sender has been dropped and the buffer is drained.
    #[error("channel is closed")]
    Closed,

    /// No value is available right now, but senders remain.
    #[error("channel is empty")]
    Empty,

    /// A blocking receive waited longer than the given timeout.
    #[error("receive timed out")]
    Timeout,
}
