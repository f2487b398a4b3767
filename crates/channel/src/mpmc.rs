// SPDX-License-Identifier: Apache-2.0

//! Multiple-producer, multiple-consumer bounded channel, `Send` across OS
//! threads. Used by the controller as the unit task queue every worker
//! thread pulls from.

use crate::error::{RecvError, SendError};
use std::time::Duration;

/// Creates a bounded MPMC channel.
#[must_use]
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (Sender { inner: tx }, Receiver { inner: rx })
}

/// The sending half. `Clone` for multiple producers.
#[derive(Clone)]
pub struct Sender<T> {
    inner: crossbeam_channel::Sender<T>,
}

/// The receiving half. `Clone` for multiple consumers: each value is
/// delivered to exactly one clone, never broadcast.
#[derive(Clone)]
pub struct Receiver<T> {
    inner: crossbeam_channel::Receiver<T>,
}

impl<T> Sender<T> {
    /// Sends a value, blocking while the channel is full.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.inner.send(value).map_err(|e| SendError::Closed(e.0))
    }

    /// Sends a value without blocking.
    pub fn try_send(&self, value: T) -> Result<(), SendError<T>> {
        self.inner.try_send(value).map_err(|e| match e {
            crossbeam_channel::TrySendError::Full(v) => SendError::Full(v),
            crossbeam_channel::TrySendError::Disconnected(v) => SendError::Closed(v),
        })
    }
}

impl<T> Receiver<T> {
    /// Receives a value without blocking.
    pub fn try_recv(&self) -> Result<T, RecvError> {
        self.inner.try_recv().map_err(|e| match e {
            crossbeam_channel::TryRecvError::Empty => RecvError::Empty,
            crossbeam_channel::TryRecvError::Disconnected => RecvError::Closed,
        })
    }

    /// Receives a value, blocking until one is available or every sender
    /// and every other clone of this receiver drops.
    pub fn recv(&self) -> Result<T, RecvError> {
        self.inner.recv().map_err(|_| RecvError::Closed)
    }

    /// Receives a value, blocking at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        self.inner.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => RecvError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => RecvError::Closed,
        })
    }
}
