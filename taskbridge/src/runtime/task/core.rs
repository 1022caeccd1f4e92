use super::JoinHandle;
use super::handle::JoinSlot;
use super::waker::{Target, WakeHandle, make_waker};
use crate::error::Result;
use crate::runtime::context;
use crate::runtime::core::Core;
use crate::utils::catch_unwind::CatchUnwind;

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// A type-erased, pinned future owned by the loop.
pub(crate) type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A spawned task as stored in the loop's task table.
///
/// The future is taken out of its slot while it is being polled, which lets
/// the task spawn further tasks (or be woken) without re-borrowing the table.
pub(crate) struct Task {
    /// The future, or `None` while it is being polled.
    pub(crate) future: Option<LocalFuture>,

    /// Waker handed to the future on every poll.
    pub(crate) waker: Waker,

    /// State behind `waker`, used to re-arm it before each poll.
    pub(crate) wake: Arc<WakeHandle>,
}

impl Task {
    pub(crate) fn new(id: usize, future: LocalFuture, core: &Core) -> Self {
        let wake = WakeHandle::new(Target::Task(id), core.injector().clone());

        Self {
            future: Some(future),
            waker: make_waker(wake.clone()),
            wake,
        }
    }

    /// Polls a future that was taken out of its slot.
    pub(crate) fn poll_detached(
        future: &mut LocalFuture,
        wake: &WakeHandle,
        waker: &Waker,
    ) -> Poll<()> {
        wake.reset();

        let mut cx = Context::from_waker(waker);
        future.as_mut().poll(&mut cx)
    }
}

/// Spawns a future onto the event loop running on this thread.
///
/// The future does not need to be `Send`: it is only ever polled by the
/// loop's own thread. The returned [`JoinHandle`] resolves to the future's
/// output, or to an error if the task panicked or was dropped with the loop.
///
/// Dropping the `JoinHandle` does **not** cancel the task.
///
/// # Errors
///
/// Returns [`Error::NoActiveLoop`](crate::Error::NoActiveLoop) when called
/// outside [`EventLoop::block_on`](crate::EventLoop::block_on).
pub fn spawn_local<F>(future: F) -> Result<JoinHandle<F::Output>>
where
    F: IntoFuture,
    F::IntoFuture: 'static,
    F::Output: 'static,
{
    let core = context::current()?;

    let slot = Rc::new(JoinSlot::new());
    let completer = slot.completer();
    let future = CatchUnwind::new(future.into_future());

    core.spawn(Box::pin(async move {
        completer.complete(future.await);
    }));

    Ok(JoinHandle::new(slot))
}

/// Spawns a fallible future whose outcome nobody awaits.
///
/// An `Err` (or a panic) is reported to the loop's unhandled-failure
/// handler.
pub(crate) fn spawn_detached<F, T>(core: &Core, future: F)
where
    F: Future<Output = Result<T>> + 'static,
    T: 'static,
{
    let unhandled = core.unhandled();
    let future = CatchUnwind::new(future);

    core.spawn(Box::pin(async move {
        if let Err(err) = future.await.and_then(|out| out) {
            unhandled.report(&err);
        }
    }));
}
