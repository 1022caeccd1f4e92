//! Error type shared by the event loop, completion sources and bridges.
//!
//! Three families of failure flow through [`Error`]:
//! - usage errors (`NoActiveLoop`, `NestedLoop`, `AlreadyCompleted`), returned
//!   immediately to the caller that misused the API,
//! - propagated outcomes (`Cancelled`, `Faulted`, `Panicked`), delivered to
//!   each observer at its await point,
//! - scheduling errors (`LoopClosed`), returned when a hand-off targets a loop
//!   that has already been torn down.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Convenience alias used by every awaitable in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by `taskbridge`.
///
/// `Error` is `Clone` so that a single outcome can be handed to every
/// observer of the same completion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No event loop is running on the current thread.
    #[error("no event loop is running on the current thread")]
    NoActiveLoop,

    /// A blocking bridge was called from code already driven by a loop.
    #[error("cannot block on a new event loop from inside a running event loop")]
    NestedLoop,

    /// A terminal transition was requested on an already settled source.
    #[error("the completion source has already been settled")]
    AlreadyCompleted,

    /// The owning event loop has been torn down.
    #[error("the event loop is closed")]
    LoopClosed,

    /// The producer cancelled the task.
    #[error("the task was cancelled")]
    Cancelled,

    /// The producer faulted the task with an error.
    #[error("the task faulted: {0}")]
    Faulted(#[source] Fault),

    /// The task panicked while being polled.
    #[error("the task panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// Wraps an arbitrary error as a [`Error::Faulted`].
    pub fn faulted<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error::Faulted(Fault::new(error))
    }

    /// Returns `true` for [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns `true` for [`Error::Faulted`].
    pub fn is_faulted(&self) -> bool {
        matches!(self, Error::Faulted(_))
    }

    /// Returns `true` for errors caused by misuse of the API.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::NoActiveLoop | Error::NestedLoop | Error::AlreadyCompleted
        )
    }

    /// Returns the bound fault, if any.
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Error::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}

/// An error bound to a faulted task.
///
/// The inner error is reference counted so that every observer of the same
/// completion receives the very same error value.
#[derive(Clone)]
pub struct Fault(Arc<dyn StdError + Send + Sync>);

impl Fault {
    /// Creates a fault from any error (or string) value.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Fault(Arc::from(error.into()))
    }

    /// Returns the bound error.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// Attempts to downcast the bound error to a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Returns `true` if both faults share the same bound error.
    pub fn ptr_eq(&self, other: &Fault) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}
