use super::EventLoop;
use crate::error::Error;
use crate::utils::catch_unwind::panic_message;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Default name attached to the loop's log records.
const DEFAULT_NAME: &str = "taskbridge";

/// Default upper bound on an idle park.
const DEFAULT_PARK_TIMEOUT: Duration = Duration::from_millis(10);

/// Callback receiving failures that no caller observes.
pub type UnhandledHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Builder for configuring and creating an [`EventLoop`].
///
/// # Examples
///
/// ```rust,ignore
/// let event_loop = EventLoopBuilder::new()
///     .name("ingest")
///     .on_unhandled(|err| eprintln!("background task failed: {err}"))
///     .build();
/// ```
pub struct EventLoopBuilder {
    /// Name attached to log records.
    name: String,

    /// Upper bound on an idle park.
    park_timeout: Duration,

    /// Unhandled-failure channel; `None` logs through `tracing`.
    unhandled: Option<UnhandledHandler>,
}

impl EventLoopBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            park_timeout: DEFAULT_PARK_TIMEOUT,
            unhandled: None,
        }
    }

    /// Sets the name attached to the loop's log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets how long an idle loop parks before checking its queue again.
    ///
    /// Pushing work always wakes a parked loop; the timeout only bounds
    /// the wait.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero.
    pub fn park_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "park_timeout must be > 0");

        self.park_timeout = timeout;
        self
    }

    /// Installs the handler that receives failures of fire-and-forget tasks
    /// and panics of hand-off callbacks.
    ///
    /// Without a handler, such failures are logged with `tracing::error!`.
    pub fn on_unhandled<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.unhandled = Some(Arc::new(handler));
        self
    }

    /// Builds the event loop with the configured options.
    pub fn build(self) -> EventLoop {
        let name: Arc<str> = Arc::from(self.name);

        tracing::debug!(event_loop = %name, park_timeout = ?self.park_timeout, "event loop built");

        let unhandled = Unhandled {
            name: name.clone(),
            handler: self.unhandled,
        };

        EventLoop::from_parts(name, self.park_timeout, unhandled)
    }
}

impl Default for EventLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoopBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoopBuilder")
            .field("name", &self.name)
            .field("park_timeout", &self.park_timeout)
            .field("on_unhandled", &self.unhandled.is_some())
            .finish()
    }
}

/// The loop's unhandled-failure channel.
#[derive(Clone)]
pub(crate) struct Unhandled {
    name: Arc<str>,
    handler: Option<UnhandledHandler>,
}

impl Unhandled {
    /// Reports a failure nobody awaits. Never propagates to the caller,
    /// even when the installed handler panics.
    pub(crate) fn report(&self, err: &Error) {
        let Some(handler) = &self.handler else {
            tracing::error!(
                event_loop = %self.name,
                error = %err,
                "unhandled failure in background task"
            );
            return;
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(err))) {
            tracing::error!(
                event_loop = %self.name,
                error = %err,
                handler_panic = %panic_message(&*payload),
                "unhandled-failure handler panicked"
            );
        }
    }
}
