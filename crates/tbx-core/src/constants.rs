//! Compile-time constants shared by every toolbox module.

/// Main version number of the toolbox.
pub const VERSION_MAIN: u8 = 1;

/// Minor version number of the toolbox.
pub const VERSION_MINOR: u8 = 0;

/// Patch number of the toolbox.
pub const VERSION_PATCH: u8 = 0;

/// Boolean true value for byte-sized flags exchanged with C-style callers.
pub const TRUE: u8 = 1;

/// Boolean false value.
pub const FALSE: u8 = 0;

/// Generic okay status value.
pub const OK: u8 = 1;

/// Generic error status value.
pub const ERROR: u8 = 0;

/// Default capacity (in bytes) of the heap arena.
pub const DEFAULT_HEAP_SIZE: usize = 2048;

/// Address at which the heap arena is mapped.
///
/// Matches the SRAM start of most Cortex-M parts. Keeping it non-zero means
/// address `0` is never a valid block.
pub const HEAP_BASE_ADDR: usize = 0x2000_0000;

/// Alignment applied to every heap and pool allocation: the native pointer width.
pub const ADDRESS_ALIGN: usize = core::mem::size_of::<usize>();

/// Marks a function argument as intentionally unused.
///
/// # Example
/// ```
/// fn handler(id: u32) {
///     tbx_core::unused_arg!(id);
/// }
/// handler(7);
/// ```
#[macro_export]
macro_rules! unused_arg {
    ($arg:expr) => {
        let _ = &$arg;
    };
}

/// Process exit codes of the `tbx` binary.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// A contract violation was reported while running the command.
    pub const ERROR_VIOLATION: i32 = 2;
    /// The heap or a memory pool ran out of blocks.
    pub const ERROR_OUT_OF_MEMORY: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}
