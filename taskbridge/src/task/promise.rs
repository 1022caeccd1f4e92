use crate::error::{Error, Fault, Result};

use std::fmt;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// Terminal state of a completion.
pub(crate) enum Outcome<T> {
    Completed(T),
    Cancelled,
    Faulted(Fault),
}

impl<T> Outcome<T> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Outcome::Completed(_) => "completed",
            Outcome::Cancelled => "cancelled",
            Outcome::Faulted(_) => "faulted",
        }
    }
}

impl<T: Clone> Outcome<T> {
    fn to_result(&self) -> Result<T> {
        match self {
            Outcome::Completed(value) => Ok(value.clone()),
            Outcome::Cancelled => Err(Error::Cancelled),
            Outcome::Faulted(fault) => Err(Error::Faulted(fault.clone())),
        }
    }
}

enum State<T> {
    /// Wakers of observers waiting for the outcome, in registration order.
    Pending(Vec<Waker>),
    Done(Outcome<T>),
}

/// Single-assignment result cell behind a completion source.
///
/// Only the owning loop's thread settles the cell (completion sources hand
/// their transitions off to it), so the mutex is never contended by the
/// loop itself; it only makes the cell shareable with producer threads.
pub(crate) struct Promise<T> {
    state: Mutex<State<T>>,
}

impl<T> Promise<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies the terminal transition and wakes every waiting observer in
    /// registration order.
    ///
    /// Returns `false`, leaving the stored outcome untouched, if the cell was
    /// already settled.
    pub(crate) fn settle(&self, outcome: Outcome<T>) -> bool {
        let waiters = {
            let mut state = self.lock();

            match &mut *state {
                State::Done(_) => return false,
                State::Pending(waiters) => {
                    let waiters = mem::take(waiters);
                    *state = State::Done(outcome);
                    waiters
                }
            }
        };

        for waker in waiters {
            waker.wake();
        }

        true
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(*self.lock(), State::Done(_))
    }
}

impl<T: Clone> Promise<T> {
    /// Returns the outcome if settled, otherwise registers the observer.
    pub(crate) fn poll_result(&self, cx: &mut Context<'_>) -> Poll<Result<T>> {
        let mut state = self.lock();

        match &mut *state {
            State::Done(outcome) => Poll::Ready(outcome.to_result()),
            State::Pending(waiters) => {
                if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
                    waiters.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            State::Pending(waiters) => format!("pending ({} waiting)", waiters.len()),
            State::Done(outcome) => outcome.kind().to_owned(),
        };

        f.debug_struct("Promise").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};
    use std::task::Wake;

    /// Records its id into a shared log when woken.
    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<usize>>>,
    }

    impl Wake for Recorder {
        fn wake(self: Arc<Self>) {
            self.log.lock().unwrap().push(self.id);
        }
    }

    fn recorder(id: usize, log: &Arc<Mutex<Vec<usize>>>) -> Waker {
        Waker::from(Arc::new(Recorder {
            id,
            log: log.clone(),
        }))
    }

    #[test]
    fn settles_only_once() {
        let promise = Promise::new();

        assert!(promise.settle(Outcome::Completed(1)));
        assert!(!promise.settle(Outcome::Completed(2)));
        assert!(!promise.settle(Outcome::Cancelled));

        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);
        assert!(matches!(promise.poll_result(&mut cx), Poll::Ready(Ok(1))));
    }

    #[test]
    fn wakes_observers_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let promise = Promise::<u8>::new();

        for id in [3, 1, 2] {
            let waker = recorder(id, &log);
            let mut cx = Context::from_waker(&waker);
            assert!(promise.poll_result(&mut cx).is_pending());
        }

        promise.settle(Outcome::Cancelled);

        assert_eq!(*log.lock().unwrap(), vec![3, 1, 2]);
        assert!(promise.is_done());
    }

    #[test]
    fn repeated_polls_register_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let promise = Promise::<u8>::new();
        let waker = recorder(7, &log);

        for _ in 0..3 {
            let mut cx = Context::from_waker(&waker);
            assert!(promise.poll_result(&mut cx).is_pending());
        }

        promise.settle(Outcome::Faulted(Fault::new("gone")));

        assert_eq!(*log.lock().unwrap(), vec![7]);
    }
}
