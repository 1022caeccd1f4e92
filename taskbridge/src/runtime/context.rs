use crate::error::{Error, Result};
use crate::runtime::core::Core;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// The event loop currently running on this thread.
    ///
    /// Set for the duration of `EventLoop::block_on` and allows runtime
    /// components (spawning, completion sources, bridges) to find the loop
    /// without explicit parameter passing.
    static CURRENT_LOOP: RefCell<Option<Rc<Core>>> = const { RefCell::new(None) };
}

/// Restores the previous context when dropped, including on unwind.
struct Restore(Option<Rc<Core>>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT_LOOP.with(|current| current.replace(previous));
    }
}

/// Enters the loop's execution context for the current thread.
///
/// The loop is installed as the thread's current loop for the duration of
/// `f`. After the closure completes (or unwinds), the previous context is
/// restored.
pub(crate) fn enter<R>(core: Rc<Core>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_LOOP.with(|current| current.replace(Some(core)));
    let _restore = Restore(previous);

    f()
}

/// Returns the loop running on this thread.
///
/// # Errors
///
/// [`Error::NoActiveLoop`] outside `block_on`.
pub(crate) fn current() -> Result<Rc<Core>> {
    CURRENT_LOOP.with(|current| current.borrow().clone().ok_or(Error::NoActiveLoop))
}

/// Returns `true` while a loop is running on this thread.
pub(crate) fn is_active() -> bool {
    CURRENT_LOOP.with(|current| current.borrow().is_some())
}
