use crate::runtime::injector::{Entry, Injector};

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{RawWaker, RawWakerVTable, Waker};

/// What a waker re-schedules when woken.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Target {
    /// A spawned task, by slab index.
    Task(usize),

    /// The future driven by `block_on`.
    Main,
}

/// Shared state behind every waker handed out by the loop.
///
/// Waking only pushes an entry into the injector, which is why the waker
/// may be cloned to, and woken from, any thread. The `notified` flag keeps
/// a task from being queued more than once between two polls.
pub(crate) struct WakeHandle {
    target: Target,
    injector: Arc<Injector>,
    notified: AtomicBool,
}

impl WakeHandle {
    pub(crate) fn new(target: Target, injector: Arc<Injector>) -> Arc<Self> {
        Arc::new(Self {
            target,
            injector,
            notified: AtomicBool::new(false),
        })
    }

    /// Queues the target unless it is already queued.
    pub(crate) fn wake(&self) {
        if self.notified.swap(true, Ordering::AcqRel) {
            return;
        }

        let entry = match self.target {
            Target::Task(id) => Entry::Wake(id),
            Target::Main => Entry::Main,
        };

        if self.injector.push(entry).is_err() {
            tracing::trace!(wake_target = ?self.target, "wake-up dropped, event loop is closed");
        }
    }

    /// Clears the queued flag right before the target is polled, so that a
    /// wake-up issued during the poll queues it again.
    pub(crate) fn reset(&self) {
        self.notified.store(false, Ordering::Release);
    }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates a [`Waker`] backed by an `Arc<WakeHandle>`.
///
/// # Safety
///
/// The pointer stored inside the `RawWaker` comes from `Arc::into_raw`
/// and every vtable entry keeps the reference count balanced.
pub(crate) fn make_waker(handle: Arc<WakeHandle>) -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(handle) as *const (), &VTABLE)) }
}

/// Clones the raw waker by bumping the reference count.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<WakeHandle>::from_raw(ptr as *const WakeHandle) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

/// Wakes and consumes the waker.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<WakeHandle>::from_raw(ptr as *const WakeHandle) };
    arc.wake();
}

/// Wakes without consuming the waker.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<WakeHandle>::from_raw(ptr as *const WakeHandle) };
    arc.wake();
    mem::forget(arc);
}

/// Drops one reference to the handle.
fn drop_raw(ptr: *const ()) {
    unsafe { drop(Arc::<WakeHandle>::from_raw(ptr as *const WakeHandle)) };
}
