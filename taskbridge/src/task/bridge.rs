use crate::error::{Error, Result};
use crate::runtime::task::{spawn_detached, spawn_local};
use crate::runtime::{EventLoop, LoopHandle, context};

use std::future::{self, Future, IntoFuture, Ready};

/// Returns an awaitable that completes immediately with no value.
pub fn zero() -> Ready<Result<()>> {
    future::ready(Ok(()))
}

/// Returns an awaitable that completes immediately with `value`.
pub fn from_result<T>(value: T) -> Ready<Result<T>> {
    future::ready(Ok(value))
}

/// Wraps an awaitable so that it runs as its own task.
///
/// When the returned future is driven, `awaitable` is spawned on the loop
/// running on this thread and its result (or failure) is forwarded.
///
/// # Errors
///
/// The returned future resolves to [`Error::NoActiveLoop`] if it is driven
/// outside a loop, and to [`Error::Panicked`] if the spawned task panics.
pub fn get_awaiter<F, T>(awaitable: F) -> impl Future<Output = Result<T>>
where
    F: IntoFuture<Output = Result<T>> + 'static,
    F::IntoFuture: 'static,
    T: 'static,
{
    async move { spawn_local(awaitable)?.await? }
}

/// Blocks the current thread until `awaitable` resolves.
///
/// A dedicated event loop is built, drives `awaitable` to completion and is
/// torn down before returning. Tasks the awaitable spawned but did not wait
/// for are dropped with it.
///
/// # Errors
///
/// - [`Error::NestedLoop`] if an event loop is already running on this
///   thread (call it from synchronous code only),
/// - otherwise whatever `awaitable` resolved to.
///
/// # Examples
///
/// ```rust,ignore
/// assert_eq!(get_result(from_result(5))?, 5);
/// ```
pub fn get_result<F, T>(awaitable: F) -> Result<T>
where
    F: IntoFuture<Output = Result<T>>,
{
    if context::is_active() {
        tracing::debug!("get_result called from inside a running event loop");
        return Err(Error::NestedLoop);
    }

    let event_loop = EventLoop::new();
    event_loop.block_on(awaitable)?
}

/// Blocks the current thread until `awaitable` completes, discarding its
/// value.
///
/// # Errors
///
/// Same as [`get_result`].
pub fn run_synchronously<F, T>(awaitable: F) -> Result<()>
where
    F: IntoFuture<Output = Result<T>>,
{
    get_result(awaitable).map(drop)
}

/// Schedules `awaitable` on the loop running on this thread without
/// waiting for it.
///
/// A failure of the awaitable never reaches the caller: it is reported to
/// the loop's unhandled-failure handler (see
/// [`EventLoopBuilder::on_unhandled`](crate::EventLoopBuilder::on_unhandled)).
///
/// # Errors
///
/// [`Error::NoActiveLoop`] outside a loop.
pub fn start<F, T>(awaitable: F) -> Result<()>
where
    F: IntoFuture<Output = Result<T>>,
    F::IntoFuture: 'static,
    T: 'static,
{
    let core = context::current()?;
    spawn_detached(&core, awaitable.into_future());
    Ok(())
}

/// Schedules `awaitable` on the loop behind `handle` without waiting for
/// it.
///
/// Unlike [`start`], this can be called from any thread; the spawn itself
/// is handed off to the loop.
///
/// # Errors
///
/// [`Error::LoopClosed`] if the loop has been dropped.
pub fn start_on<F, T>(handle: &LoopHandle, awaitable: F) -> Result<()>
where
    F: IntoFuture<Output = Result<T>> + Send + 'static,
    F::IntoFuture: 'static,
    T: 'static,
{
    handle.call_soon_threadsafe(move || match context::current() {
        Ok(core) => spawn_detached(&core, awaitable.into_future()),
        Err(err) => tracing::error!(error = %err, "start_on callback ran outside its loop"),
    })
}
