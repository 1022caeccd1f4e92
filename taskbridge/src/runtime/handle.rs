use super::context;
use super::injector::{Entry, Injector};
use crate::error::Result;

use std::fmt;
use std::sync::Arc;

/// A thread-safe handle to an [`EventLoop`](crate::EventLoop).
///
/// The loop itself can only be touched from its own thread. A `LoopHandle`
/// is `Send + Sync + Clone` and is the one way other threads reach it: it
/// submits closures that the loop runs on its own thread, in submission
/// order, during its next turn.
#[derive(Clone)]
pub struct LoopHandle {
    name: Arc<str>,
    injector: Arc<Injector>,
}

impl LoopHandle {
    pub(crate) fn new(name: Arc<str>, injector: Arc<Injector>) -> Self {
        Self { name, injector }
    }

    /// Returns a handle to the loop running on this thread.
    ///
    /// # Errors
    ///
    /// [`Error::NoActiveLoop`](crate::Error::NoActiveLoop) outside
    /// [`EventLoop::block_on`](crate::EventLoop::block_on).
    pub fn current() -> Result<Self> {
        Ok(context::current()?.handle())
    }

    /// Schedules `callback` to run on the loop's thread.
    ///
    /// Safe to call from any thread, including the loop's own. Callbacks
    /// run in the order they were submitted.
    ///
    /// # Errors
    ///
    /// [`Error::LoopClosed`](crate::Error::LoopClosed) once the loop has
    /// been dropped; `callback` is then dropped without running.
    pub fn call_soon_threadsafe<F>(&self, callback: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.injector
            .push(Entry::Call(Box::new(callback)))
            .inspect_err(|err| {
                tracing::warn!(event_loop = %self.name, error = %err, "hand-off rejected");
            })
    }

    /// Returns `true` once the loop has been dropped.
    pub fn is_closed(&self) -> bool {
        self.injector.is_closed()
    }

    /// Returns the loop's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if both handles point at the same loop.
    pub fn same_loop(&self, other: &LoopHandle) -> bool {
        Arc::ptr_eq(&self.injector, &other.injector)
    }
}

impl fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
