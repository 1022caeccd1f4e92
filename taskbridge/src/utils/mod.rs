//! Internal utilities.
//!
//! - [`slab`]: compact index allocator backing the task table,
//! - [`catch_unwind`]: turns a panicking future into an `Error::Panicked`.

pub(crate) mod catch_unwind;
pub(crate) mod slab;
