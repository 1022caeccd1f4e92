//! .NET-style tasks on top of the event loop.
//!
//! This module provides:
//! - [`TaskCompletionSource`] and its awaitable view [`Task`], a value
//!   that a producer settles exactly once, from any thread,
//! - [`zero`] and [`from_result`], already completed awaitables,
//! - [`get_awaiter`], which runs an awaitable as its own task,
//! - [`get_result`] and [`run_synchronously`], blocking bridges from
//!   synchronous code,
//! - [`start`] and [`start_on`], fire-and-forget scheduling.
//!
//! Every awaitable here resolves to [`Result<T>`](crate::Result).
//! Cancellation is reported as [`Error::Cancelled`](crate::Error::Cancelled)
//! and a bound error as [`Error::Faulted`](crate::Error::Faulted), so
//! observers can tell them apart.

mod bridge;
mod completion_source;
mod promise;

pub use bridge::{from_result, get_awaiter, get_result, run_synchronously, start, start_on, zero};
pub use completion_source::{Task, TaskCompletionSource};
