//! Spawned-task primitives of the event loop.
//!
//! This module defines how the loop represents, wakes and joins the futures
//! it drives:
//! - [`core`]: the task table entry and the spawn functions,
//! - [`handle`]: join handles for awaiting a spawned task,
//! - [`waker`]: `Send + Sync` wakers that feed the loop's injector.
//!
//! Most users will interact with this module through [`spawn_local`] and
//! [`JoinHandle`].

pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod waker;

pub(crate) use self::core::{LocalFuture, Task, spawn_detached};

pub use self::core::spawn_local;
pub use handle::JoinHandle;
