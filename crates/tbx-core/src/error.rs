//! Error type shared by all toolbox crates.

/// Failure result returned by toolbox operations.
///
/// Variants fall in two groups. Programmer errors (`InvalidArgument`,
/// `NotOwned`, `StaleList`) are always paired with a report on the assertion
/// channel. Resource exhaustion (`OutOfMemory`, `PoolExhausted`,
/// `NoSizeClass`) is an expected outcome and is never reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TbxError {
    /// An argument violated the operation's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The heap arena cannot satisfy the request.
    #[error("out of heap memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Requested size in bytes, after alignment.
        requested: usize,
        /// Free bytes left in the arena.
        available: usize,
    },

    /// The best-fitting size class has no free block left.
    #[error("memory pool for {block_size} byte blocks is exhausted")]
    PoolExhausted {
        /// Block size of the exhausted pool.
        block_size: usize,
    },

    /// No registered size class is large enough for the request.
    #[error("no memory pool can hold {size} bytes")]
    NoSizeClass {
        /// Requested size in bytes.
        size: usize,
    },

    /// The address is not an allocated block of any memory pool.
    #[error("address {0:#x} is not an allocated pool block")]
    NotOwned(usize),

    /// The list or item handle no longer refers to a live entry.
    #[error("stale list handle")]
    StaleList,
}

impl TbxError {
    /// Whether this error stems from a contract violation rather than exhaustion.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::NotOwned(_) | Self::StaleList
        )
    }
}
