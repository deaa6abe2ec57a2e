//! # tbx-memory
//!
//! Deterministic memory management for the MicroTBX-rs toolbox.
//!
//! A monotonic heap arena, size-class memory pools carved from it, and the
//! doubly linked lists the pools use for free/used block bookkeeping.
#![warn(missing_docs)]

pub mod heap;
pub mod list;
pub mod pool;
pub mod ptr;
pub mod stats;

// Re-exports
pub use heap::Heap;
pub use list::{ItemRef, ListHandle, ListStore};
pub use pool::MemPool;
pub use ptr::BlockPtr;
pub use stats::{PoolStats, SizeClassInfo};
