use crate::error::{Error, Result};

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A unit of work handed to the event loop.
pub(crate) enum Entry {
    /// Poll the spawned task stored at this slab index.
    Wake(usize),

    /// Poll the future passed to `block_on`.
    Main,

    /// Run a callback submitted through a `LoopHandle`.
    Call(Box<dyn FnOnce() + Send>),
}

struct Queue {
    entries: VecDeque<Entry>,
    closed: bool,
}

/// Thread-safe FIFO queue feeding the event loop.
///
/// Every wake-up and every cross-thread callback goes through the injector,
/// which gives the loop a single, strictly ordered source of work. The loop
/// thread parks on the condition variable while the queue is empty; any
/// push wakes it.
///
/// Once closed, the injector rejects further pushes with
/// [`Error::LoopClosed`].
pub(crate) struct Injector {
    /// Pending entries and the closed flag, guarded together so that a push
    /// can never slip in after `close`.
    queue: Mutex<Queue>,

    /// Wakes the parked loop thread.
    condvar: Condvar,
}

impl Injector {
    /// Creates a new empty injector.
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(Queue {
                entries: VecDeque::new(),
                closed: false,
            }),
            condvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry and wakes the loop.
    pub(crate) fn push(&self, entry: Entry) -> Result<()> {
        let mut queue = self.lock();

        if queue.closed {
            // `entry` is dropped after the guard, outside the lock.
            drop(queue);
            return Err(Error::LoopClosed);
        }

        queue.entries.push_back(entry);
        drop(queue);

        self.condvar.notify_one();
        Ok(())
    }

    /// Takes every entry queued so far.
    ///
    /// Entries pushed while the batch is being processed land in the next
    /// batch, so a callback that schedules another callback can not starve
    /// the loop.
    pub(crate) fn take_batch(&self) -> VecDeque<Entry> {
        std::mem::take(&mut self.lock().entries)
    }

    /// Puts unprocessed entries back at the front, preserving their order.
    pub(crate) fn requeue_front(&self, rest: VecDeque<Entry>) {
        if rest.is_empty() {
            return;
        }

        let mut queue = self.lock();
        let newer = std::mem::replace(&mut queue.entries, rest);
        queue.entries.extend(newer);
    }

    /// Parks the loop thread until an entry arrives or `timeout` elapses.
    ///
    /// Returns immediately if work is already queued.
    pub(crate) fn park(&self, timeout: Duration) {
        let queue = self.lock();

        if !queue.entries.is_empty() || queue.closed {
            return;
        }

        let _ = self
            .condvar
            .wait_timeout(queue, timeout)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Closes the injector and discards anything still queued.
    ///
    /// Returns the number of discarded entries.
    pub(crate) fn close(&self) -> usize {
        let discarded = {
            let mut queue = self.lock();
            queue.closed = true;
            std::mem::take(&mut queue.entries)
        };

        self.condvar.notify_all();
        discarded.len()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
