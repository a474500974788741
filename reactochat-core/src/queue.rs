//! Blocking Message Queue (§4.E)
//!
//! A thread-safe FIFO used to hand accepted chat messages from the I/O
//! thread to the chat-room worker thread. The reference implementation is a
//! hand-rolled `mutex` + `condition_variable` template (`push` locks, pushes,
//! notifies one waiter; `wait_and_pop` blocks on the condition until
//! non-empty, then pops). `flume`'s bounded/unbounded channel gives the same
//! contract — its blocking `recv()` already parks on an internal mutex and
//! condvar — so this module is a thin, named wrapper rather than a
//! reimplementation.

use flume::{Receiver, Sender, TryRecvError};

/// FIFO queue of `T`, cloneable on the sending side for multiple producers.
pub struct MessageQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> MessageQueue<T> {
    /// Create an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Push a value and wake one waiter, matching the reference `push`.
    pub fn push(&self, value: T) {
        // An unbounded sender only fails if every receiver has been dropped,
        // which cannot happen while `self` still holds `rx`.
        let _ = self.tx.send(value);
    }

    /// Non-blocking pop. Matches the reference `try_pop`.
    #[must_use]
    pub fn try_pop(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(v) => Some(v),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until a value is available, then pop it. Matches the reference
    /// `wait_and_pop`.
    ///
    /// Returns `None` only if every [`Sender`] clone has been dropped, which
    /// does not happen during normal operation since the reactor holds one
    /// for the process lifetime.
    #[must_use]
    pub fn wait_and_pop(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// True if no values are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Number of values currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// A cloneable handle for additional producers.
    #[must_use]
    pub fn sender(&self) -> Sender<T> {
        self.tx.clone()
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
