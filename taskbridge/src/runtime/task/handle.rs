use crate::error::{Error, Result};

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Output cell shared between a spawned task and its [`JoinHandle`].
pub(crate) struct JoinSlot<T> {
    result: RefCell<Option<Result<T>>>,
    waiter: RefCell<Option<Waker>>,
}

impl<T> JoinSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            result: RefCell::new(None),
            waiter: RefCell::new(None),
        }
    }

    /// Creates the producer side of the slot.
    pub(crate) fn completer(self: &Rc<Self>) -> Completer<T> {
        Completer {
            slot: Some(self.clone()),
        }
    }

    fn fill(&self, result: Result<T>) {
        self.result.replace(Some(result));

        if let Some(waker) = self.waiter.take() {
            waker.wake();
        }
    }
}

/// Producer side of a [`JoinSlot`], owned by the task's future.
///
/// If the task is dropped before it completes (the loop was torn down), the
/// handle resolves to [`Error::Cancelled`].
pub(crate) struct Completer<T> {
    slot: Option<Rc<JoinSlot<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: Result<T>) {
        if let Some(slot) = self.slot.take() {
            slot.fill(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.fill(Err(Error::Cancelled));
        }
    }
}

/// A handle to a task spawned with [`spawn_local`](crate::spawn_local).
///
/// A `JoinHandle` implements [`Future`] and resolves once the task has
/// finished:
/// - `Ok(output)` when the task ran to completion,
/// - `Err(Error::Panicked(_))` when it panicked,
/// - `Err(Error::Cancelled)` when it was dropped with its loop.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result.
pub struct JoinHandle<T> {
    slot: Rc<JoinSlot<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(slot: Rc<JoinSlot<T>>) -> Self {
        Self { slot }
    }

    /// Returns `true` once the task has produced its result.
    pub fn is_finished(&self) -> bool {
        self.slot.result.borrow().is_some()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(result) = self.slot.result.take() {
            return Poll::Ready(result);
        }

        self.slot.waiter.replace(Some(cx.waker().clone()));
        Poll::Pending
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
