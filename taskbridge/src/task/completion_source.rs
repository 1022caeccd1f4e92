use super::promise::{Outcome, Promise};
use crate::error::{Error, Fault, Result};
use crate::runtime::LoopHandle;

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

struct Inner<T> {
    /// Loop that owns the cell; every transition is marshalled onto it.
    handle: LoopHandle,

    /// The result cell observed through `Task`.
    promise: Arc<Promise<T>>,

    /// Set by the first terminal transition, on the producer's thread.
    settled: AtomicBool,
}

/// The producer side of a [`Task`].
///
/// A `TaskCompletionSource` lets code that learns about a result later
/// (a callback, another thread, an external API) hand a not-yet-available
/// value to code that awaits it. Exactly one of
/// [`set_result`](Self::set_result), [`set_cancelled`](Self::set_cancelled)
/// and [`set_exception`](Self::set_exception) succeeds; later calls fail
/// with [`Error::AlreadyCompleted`] and leave the outcome untouched.
///
/// The transitions may be called from any thread. They never touch the
/// result cell directly: the mutation is handed off to the owning loop
/// and runs on the loop's thread during its next turn.
///
/// Clones share the same completion.
///
/// # Examples
///
/// ```rust,ignore
/// let event_loop = EventLoop::new();
///
/// let value = event_loop.block_on(async {
///     let source = TaskCompletionSource::new()?;
///     let task = source.get_task();
///
///     let producer = source.clone();
///     std::thread::spawn(move || producer.set_result(7));
///
///     task.await
/// })??;
///
/// assert_eq!(value, 7);
/// ```
pub struct TaskCompletionSource<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> TaskCompletionSource<T> {
    /// Creates a pending completion source bound to the loop running on
    /// this thread.
    ///
    /// # Errors
    ///
    /// [`Error::NoActiveLoop`] outside
    /// [`EventLoop::block_on`](crate::EventLoop::block_on).
    pub fn new() -> Result<Self> {
        Ok(Self::with_handle(&LoopHandle::current()?))
    }

    /// Creates a pending completion source bound to an explicit loop.
    ///
    /// Unlike [`new`](Self::new), this works from any thread.
    pub fn with_handle(handle: &LoopHandle) -> Self {
        Self {
            inner: Arc::new(Inner {
                handle: handle.clone(),
                promise: Arc::new(Promise::new()),
                settled: AtomicBool::new(false),
            }),
        }
    }

    /// Transitions the task to the completed state with `value`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyCompleted`] if a transition was already applied,
    /// - [`Error::LoopClosed`] if the owning loop has been dropped.
    pub fn set_result(&self, value: T) -> Result<()> {
        self.transition(Outcome::Completed(value))
    }

    /// Transitions the task to the cancelled state.
    ///
    /// Observers receive [`Error::Cancelled`].
    ///
    /// # Errors
    ///
    /// Same as [`set_result`](Self::set_result).
    pub fn set_cancelled(&self) -> Result<()> {
        self.transition(Outcome::Cancelled)
    }

    /// Transitions the task to the faulted state, binding `error`.
    ///
    /// Observers receive [`Error::Faulted`] carrying the same error.
    ///
    /// # Errors
    ///
    /// Same as [`set_result`](Self::set_result).
    pub fn set_exception<E>(&self, error: E) -> Result<()>
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        self.transition(Outcome::Faulted(Fault::new(error)))
    }

    fn transition(&self, outcome: Outcome<T>) -> Result<()> {
        let kind = outcome.kind();

        if self.inner.settled.swap(true, Ordering::AcqRel) {
            tracing::debug!(transition = kind, "completion source already settled");
            return Err(Error::AlreadyCompleted);
        }

        let promise = self.inner.promise.clone();

        self.inner.handle.call_soon_threadsafe(move || {
            if promise.settle(outcome) {
                tracing::trace!(transition = kind, "completion source settled");
            }
        })
    }
}

impl<T> TaskCompletionSource<T> {
    /// Returns an awaitable view of the completion.
    ///
    /// Every call returns an independent handle onto the same outcome, so
    /// any number of observers can await it.
    pub fn get_task(&self) -> Task<T> {
        Task {
            promise: self.inner.promise.clone(),
        }
    }

    /// Returns `true` once a terminal transition has been requested.
    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::Acquire)
    }

    /// Returns the handle of the owning loop.
    pub fn handle(&self) -> &LoopHandle {
        &self.inner.handle
    }
}

impl<T> Clone for TaskCompletionSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for TaskCompletionSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCompletionSource")
            .field("event_loop", &self.inner.handle.name())
            .field("settled", &self.is_settled())
            .field("promise", &self.inner.promise)
            .finish()
    }
}

/// The consumer side of a [`TaskCompletionSource`].
///
/// Resolves to:
/// - `Ok(value)` after [`set_result`](TaskCompletionSource::set_result),
/// - `Err(Error::Cancelled)` after
///   [`set_cancelled`](TaskCompletionSource::set_cancelled),
/// - `Err(Error::Faulted(_))` after
///   [`set_exception`](TaskCompletionSource::set_exception).
///
/// Observers waiting on the same completion are resumed in the order they
/// started waiting. A `Task` can be cloned and awaited any number of times;
/// every observer receives a clone of the same outcome.
pub struct Task<T> {
    promise: Arc<Promise<T>>,
}

impl<T> Task<T> {
    /// Returns `true` once the outcome is available.
    pub fn is_completed(&self) -> bool {
        self.promise.is_done()
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T: Clone> Future for Task<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.promise.poll_result(cx)
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("promise", &self.promise).finish()
    }
}
