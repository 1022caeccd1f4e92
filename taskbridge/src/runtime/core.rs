use super::builder::{EventLoopBuilder, Unhandled};
use super::context;
use super::handle::LoopHandle;
use super::injector::{Entry, Injector};
use super::task::waker::{Target, WakeHandle, make_waker};
use super::task::{LocalFuture, Task};
use crate::error::{Error, Result};
use crate::utils::catch_unwind::panic_message;
use crate::utils::slab::Slab;

use std::cell::RefCell;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Initial capacity of the task table.
const INITIAL_TASK_SLOTS: usize = 64;

/// Loop state shared by the `EventLoop` and the thread-local context.
pub(crate) struct Core {
    /// Name attached to log records.
    name: Arc<str>,

    /// Queue of wake-ups and cross-thread callbacks.
    injector: Arc<Injector>,

    /// Spawned tasks, indexed by the id their wakers carry.
    tasks: RefCell<Slab<Task>>,

    /// Destination of failures nobody awaits.
    unhandled: Unhandled,

    /// Upper bound on an idle park.
    park_timeout: Duration,
}

impl Core {
    pub(crate) fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    pub(crate) fn unhandled(&self) -> Unhandled {
        self.unhandled.clone()
    }

    pub(crate) fn handle(&self) -> LoopHandle {
        LoopHandle::new(self.name.clone(), self.injector.clone())
    }

    /// Stores a future in the task table and queues its first poll.
    pub(crate) fn spawn(&self, future: LocalFuture) -> usize {
        let (id, wake) = {
            let mut tasks = self.tasks.borrow_mut();
            let task = Task::new(tasks.vacant_index(), future, self);
            let wake = task.wake.clone();
            (tasks.insert(task), wake)
        };

        tracing::trace!(event_loop = %self.name, task = id, "task spawned");

        // The first poll is queued like any other wake-up, which keeps
        // scheduling strictly FIFO.
        wake.wake();
        id
    }

    /// Polls the task stored at `id`, if it still exists.
    fn run_task(&self, id: usize) {
        let taken = self.tasks.borrow_mut().get_mut(id).and_then(|task| {
            task.future
                .take()
                .map(|future| (future, task.waker.clone(), task.wake.clone()))
        });

        // Stale wake-up, or the task is already being polled further up.
        let Some((mut future, waker, wake)) = taken else {
            return;
        };

        let poll = panic::catch_unwind(AssertUnwindSafe(|| {
            Task::poll_detached(&mut future, &wake, &waker)
        }));

        match poll {
            Ok(Poll::Pending) => {
                if let Some(task) = self.tasks.borrow_mut().get_mut(id) {
                    task.future = Some(future);
                }
            }
            Ok(Poll::Ready(())) => {
                let task = self.tasks.borrow_mut().remove(id);
                drop(task);
                drop(future);

                tracing::trace!(event_loop = %self.name, task = id, "task finished");
            }
            Err(payload) => {
                let task = self.tasks.borrow_mut().remove(id);
                drop(task);
                drop(future);

                self.unhandled
                    .report(&Error::Panicked(panic_message(&*payload)));
            }
        }
    }

    /// Runs a callback submitted through a `LoopHandle`.
    fn run_callback(&self, callback: Box<dyn FnOnce() + Send>) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            self.unhandled
                .report(&Error::Panicked(panic_message(&*payload)));
        }
    }

    /// Drives `future` to completion, processing every queued entry along
    /// the way.
    ///
    /// Each turn takes a snapshot of the injector and processes it in FIFO
    /// order. Entries produced during the turn are handled on the next one.
    /// With nothing queued, the thread parks until a push arrives.
    fn run_until<F: Future>(&self, future: F) -> F::Output {
        let mut future = pin!(future);

        let main = WakeHandle::new(Target::Main, self.injector.clone());
        let waker = make_waker(main.clone());
        let mut cx = Context::from_waker(&waker);

        main.reset();
        if let Poll::Ready(out) = future.as_mut().poll(&mut cx) {
            return out;
        }

        loop {
            let mut batch = self.injector.take_batch();

            if batch.is_empty() {
                self.injector.park(self.park_timeout);
                continue;
            }

            while let Some(entry) = batch.pop_front() {
                match entry {
                    Entry::Wake(id) => self.run_task(id),
                    Entry::Call(callback) => self.run_callback(callback),
                    Entry::Main => {
                        main.reset();

                        if let Poll::Ready(out) = future.as_mut().poll(&mut cx) {
                            // Leave the rest for the next `block_on`.
                            self.injector.requeue_front(batch);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Drops every remaining task and closes the injector.
    fn shutdown(&self) {
        let discarded = self.injector.close();

        let tasks = self.tasks.borrow_mut().drain();
        let dropped = tasks.len();
        drop(tasks);

        tracing::debug!(
            event_loop = %self.name,
            dropped_tasks = dropped,
            discarded_entries = discarded,
            "event loop closed"
        );
    }
}

/// A single-threaded cooperative event loop.
///
/// `EventLoop` is responsible for:
/// - driving spawned tasks, one poll at a time, in FIFO wake-up order,
/// - running callbacks handed off from other threads through a
///   [`LoopHandle`],
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// The loop is `!Send`: it lives on the thread that built it. Other threads
/// interact with it exclusively through [`LoopHandle`].
///
/// Dropping the loop drops every task that has not finished and closes the
/// hand-off queue; later submissions fail with [`Error::LoopClosed`].
pub struct EventLoop {
    core: Rc<Core>,
}

impl EventLoop {
    /// Creates an event loop with the default configuration.
    pub fn new() -> Self {
        EventLoopBuilder::new().build()
    }

    pub(crate) fn from_parts(name: Arc<str>, park_timeout: Duration, unhandled: Unhandled) -> Self {
        let core = Core {
            name,
            injector: Arc::new(Injector::new()),
            tasks: RefCell::new(Slab::new(INITIAL_TASK_SLOTS)),
            unhandled,
            park_timeout,
        };

        Self {
            core: Rc::new(core),
        }
    }

    /// Returns a thread-safe handle to this loop.
    pub fn handle(&self) -> LoopHandle {
        self.core.handle()
    }

    /// Returns the loop's name.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn pending_tasks(&self) -> usize {
        self.core.tasks.borrow().len()
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// While the future runs, this loop is the thread's current loop:
    /// [`spawn_local`](crate::spawn_local),
    /// [`TaskCompletionSource::new`](crate::task::TaskCompletionSource::new)
    /// and [`start`](crate::task::start) all bind to it. Tasks that are
    /// still pending when the future completes stay on the loop and resume
    /// on the next call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NestedLoop`] if an event loop (this one or another)
    /// is already running on this thread.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let event_loop = EventLoop::new();
    /// let answer = event_loop.block_on(async { 42 })?;
    /// assert_eq!(answer, 42);
    /// ```
    pub fn block_on<F: IntoFuture>(&self, future: F) -> Result<F::Output> {
        if context::is_active() {
            tracing::debug!(event_loop = %self.core.name, "rejected nested block_on");
            return Err(Error::NestedLoop);
        }

        tracing::debug!(event_loop = %self.core.name, "entering event loop");

        let out = context::enter(self.core.clone(), || {
            self.core.run_until(future.into_future())
        });

        tracing::debug!(event_loop = %self.core.name, "leaving event loop");
        Ok(out)
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.core.shutdown();
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("name", &self.core.name)
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}
