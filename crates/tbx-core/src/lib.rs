//! # tbx-core
//!
//! Foundation of the MicroTBX-rs toolbox: compile-time constants, the
//! run-time assertion channel, non-reentrant critical sections and the
//! shared error type.
#![warn(missing_docs)]

pub mod assert;
pub mod constants;
pub mod critsect;
pub mod error;

// Re-exports
pub use assert::{AssertionHandler, Assertions, CountingHandler, LogHandler, SourceLocation};
pub use constants::{
    exit_codes, ADDRESS_ALIGN, DEFAULT_HEAP_SIZE, ERROR, FALSE, HEAP_BASE_ADDR, OK, TRUE,
    VERSION_MAIN, VERSION_MINOR, VERSION_PATCH,
};
pub use critsect::{CriticalSection, CriticalSectionGuard, HostInterruptPort, InterruptPort};
pub use error::TbxError;
