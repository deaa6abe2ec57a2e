//! Block addresses handed out by the heap and the memory pools.

use std::fmt;

use tbx_core::ADDRESS_ALIGN;

/// Address of a block inside the heap arena.
///
/// A `BlockPtr` is a plain address value: it can be copied, compared and
/// offset freely, but the bytes behind it are only reachable through the
/// bounds-checked accessors of [`Heap`](crate::heap::Heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockPtr(usize);

impl BlockPtr {
    /// The null address. Never returned by a successful allocation.
    pub const NULL: Self = Self(0);

    /// Wrap a raw address.
    #[must_use]
    pub const fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    /// The raw address.
    #[must_use]
    pub const fn addr(self) -> usize {
        self.0
    }

    /// Whether this is the null address.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `bytes` further on, wrapping around the address space.
    #[must_use]
    pub const fn wrapping_add(self, bytes: usize) -> Self {
        Self(self.0.wrapping_add(bytes))
    }

    /// Address `bytes` before this one, wrapping around the address space.
    #[must_use]
    pub const fn wrapping_sub(self, bytes: usize) -> Self {
        Self(self.0.wrapping_sub(bytes))
    }
}

impl fmt::Display for BlockPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Round `size` up to the native pointer width. `None` on overflow.
#[must_use]
pub const fn align_up(size: usize) -> Option<usize> {
    match size.checked_add(ADDRESS_ALIGN - 1) {
        Some(padded) => Some(padded & !(ADDRESS_ALIGN - 1)),
        None => None,
    }
}
