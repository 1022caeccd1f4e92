use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that gives control back to the event loop exactly once.
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    /// On the first poll, the task wakes itself (landing at the back of the
    /// loop's queue) and returns `Poll::Pending`. On the second poll it
    /// completes.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Yields execution back to the event loop.
///
/// Every task queued before the caller runs once before the caller resumes.
///
/// # Examples
///
/// ```rust,ignore
/// async fn task() {
///     // Let the other tasks make progress.
///     yield_now().await;
/// }
/// ```
pub async fn yield_now() {
    YieldOnce { yielded: false }.await
}
