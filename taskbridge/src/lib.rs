//! # taskbridge
//!
//! **taskbridge** exposes .NET-style `Task` / `TaskCompletionSource`
//! semantics on top of a small single-threaded cooperative event loop.
//!
//! It lets code written against a "promise with externally settable
//! completion" model interoperate with Rust futures:
//!
//! - A **completion source** that a producer settles exactly once, from any
//!   thread, with a value, a cancellation or an error
//! - **Bridges** between synchronous and asynchronous code: blocking waits,
//!   fire-and-forget scheduling, already completed tasks
//! - A **single-threaded event loop** with a thread-safe hand-off queue, on
//!   which everything above runs
//! - **Macros** `#[taskbridge::main]` and `#[taskbridge::test]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskbridge::task::{TaskCompletionSource, get_result};
//!
//! fn main() -> taskbridge::Result<()> {
//!     let value = get_result(async {
//!         let source = TaskCompletionSource::new()?;
//!         let task = source.get_task();
//!
//!         std::thread::spawn(move || source.set_result("ready"));
//!
//!         task.await
//!     })?;
//!
//!     assert_eq!(value, "ready");
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`task`]: completion sources and the sync/async bridges
//!
//! The event loop types ([`EventLoop`], [`EventLoopBuilder`],
//! [`LoopHandle`], [`spawn_local`], [`yield_now`]) are exported at the
//! crate root.
//!
//! ## Logging
//!
//! The crate logs through `tracing`. With the `enable_log` feature,
//! [`init_log`] installs a stderr subscriber filtered by `RUST_LOG`.

mod error;
mod runtime;
mod utils;

pub mod task;

pub use error::{Error, Fault, Result};
pub use runtime::{
    EventLoop, EventLoopBuilder, JoinHandle, LoopHandle, UnhandledHandler, spawn_local, yield_now,
};

pub use taskbridge_macros::{main, test};

/// Installs a `tracing` subscriber writing to stderr, filtered by the
/// `RUST_LOG` environment variable.
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "enable_log")]
pub fn init_log() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(EnvFilter::from_default_env())
        .try_init();
}
