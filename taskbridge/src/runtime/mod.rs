//! The single-threaded event loop.
//!
//! This module contains the scheduler that every other part of the crate
//! runs on. It is responsible for:
//! - executing spawned futures cooperatively on one thread,
//! - accepting wake-ups and callbacks from any thread through the
//!   injector queue,
//! - tracking which loop is current on each thread,
//! - reporting failures that nobody awaits.
//!
//! Most users only touch [`EventLoop`], [`LoopHandle`] and
//! [`spawn_local`]; the completion-source layer in [`crate::task`] is
//! built on top of them.

mod core;
mod handle;
mod injector;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod task;
pub(crate) mod yield_now;

pub use builder::{EventLoopBuilder, UnhandledHandler};
pub use self::core::EventLoop;
pub use handle::LoopHandle;
pub use task::{JoinHandle, spawn_local};
pub use yield_now::yield_now;
