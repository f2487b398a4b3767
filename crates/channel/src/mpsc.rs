// SPDX-License-Identifier: Apache-2.0

//! Multiple-producer, single-consumer bounded channel, `Send` across OS
//! threads. Used by the controller to collect one unit-result per worker
//! back to the joining thread.

use crate::error::{RecvError, SendError};
use std::time::Duration;

/// Creates a bounded MPSC channel. `capacity` of `0` is a rendezvous channel:
/// `send` blocks until a receiver is ready for that value.
#[must_use]
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (Sender { inner: tx }, Receiver { inner: rx })
}

/// The sending half. Cloning increments the channel's sender count; the
/// channel closes once every clone is dropped.
#[derive(Clone)]
pub struct Sender<T> {
    inner: crossbeam_channel::Sender<T>,
}

/// The receiving half. Not `Clone`: only one consumer drains this channel.
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

    /// Receives a value, blocking until one is available or every sender drops.
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

    /// Iterates over every value until the channel closes, blocking between
    /// values.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn send_then_receive_preserves_order() {
        let (tx, rx) = bounded::<u32>(4);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(rx.recv().unwrap(), 1);
        assert_eq!(rx.recv().unwrap(), 2);
    }

    #[test]
    fn try_send_fails_full_when_at_capacity() {
        let (tx, _rx) = bounded::<u32>(1);
        tx.try_send(1).unwrap();
        assert!(matches!(tx.try_send(2), Err(SendError::Full(2))));
    }

    #[test]
    fn dropping_every_sender_closes_the_channel() {
        let (tx, rx) = bounded::<u32>(1);
        drop(tx);
        assert!(matches!(rx.recv(), Err(RecvError::Closed)));
    }

    #[test]
    fn multiple_producer_threads_all_deliver() {
        let (tx, rx) = bounded::<u32>(8);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tx = tx.clone();
                thread::spawn(move || tx.send(i).unwrap())
            })
            .collect();
        drop(tx);
        for h in handles {
            h.join().unwrap();
        }
        let mut received: Vec<u32> = rx.iter().collect();
        received.sort_unstable();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }

    #[test]
    fn recv_timeout_reports_timeout_on_empty_channel() {
        let (_tx, rx) = bounded::<u32>(1);
        assert!(matches!(rx.recv_timeout(Duration::from_millis(1)), Err(RecvError::Timeout)));
    }
}
