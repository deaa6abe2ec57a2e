//! Heap arena allocator.
//!
//! One fixed-capacity byte region with a bump cursor. Allocations are aligned
//! to the native pointer width and are never reclaimed individually; the
//! memory pools build block recycling on top of this.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tbx_core::{Assertions, TbxError, HEAP_BASE_ADDR};

use crate::ptr::{align_up, BlockPtr};

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonic arena backing every dynamic allocation of the toolbox.
pub struct Heap {
    id: u64,
    storage: Box<[u8]>,
    cursor: usize,
    base: usize,
    asserts: Arc<Assertions>,
}

impl Heap {
    /// Create an arena of `capacity` bytes mapped at [`HEAP_BASE_ADDR`].
    #[must_use]
    pub fn new(capacity: usize, asserts: Arc<Assertions>) -> Self {
        Self {
            id: NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed),
            storage: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            base: HEAP_BASE_ADDR,
            asserts,
        }
    }

    /// Allocate `size` bytes, rounded up to the pointer width.
    ///
    /// A zero size is a contract violation. Running out of space is not: it
    /// only yields [`TbxError::OutOfMemory`]. A failed call leaves the cursor
    /// untouched.
    pub fn allocate(&mut self, size: usize) -> Result<BlockPtr, TbxError> {
        if !self.asserts.check(size != 0) {
            return Err(TbxError::InvalidArgument("heap allocation size must be non-zero"));
        }
        let available = self.get_free();
        let aligned = match align_up(size) {
            Some(aligned) if aligned <= available => aligned,
            _ => {
                tracing::debug!(size, available, "heap exhausted");
                return Err(TbxError::OutOfMemory {
                    requested: align_up(size).unwrap_or(size),
                    available,
                });
            }
        };

        let ptr = BlockPtr::from_addr(self.base + self.cursor);
        self.cursor += aligned;
        tracing::trace!(%ptr, size = aligned, free = self.get_free(), "heap allocate");
        Ok(ptr)
    }

    /// Identity of this arena, unique within the process.
    ///
    /// Every arena maps at the same base address, so addresses alone cannot
    /// tell two arenas apart.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of bytes still available.
    #[must_use]
    pub fn get_free(&self) -> usize {
        self.storage.len() - self.cursor
    }

    /// Total capacity of the arena in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of bytes handed out so far.
    #[must_use]
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Whether `[ptr, ptr + len)` lies inside the allocated part of the arena.
    #[must_use]
    pub fn contains(&self, ptr: BlockPtr, len: usize) -> bool {
        self.offset_of(ptr, len).is_some()
    }

    /// Read access to `len` allocated bytes starting at `ptr`.
    #[must_use]
    pub fn slice(&self, ptr: BlockPtr, len: usize) -> Option<&[u8]> {
        let start = self.offset_of(ptr, len)?;
        Some(&self.storage[start..start + len])
    }

    /// Write access to `len` allocated bytes starting at `ptr`.
    pub fn slice_mut(&mut self, ptr: BlockPtr, len: usize) -> Option<&mut [u8]> {
        let start = self.offset_of(ptr, len)?;
        Some(&mut self.storage[start..start + len])
    }

    fn offset_of(&self, ptr: BlockPtr, len: usize) -> Option<usize> {
        let start = ptr.addr().checked_sub(self.base)?;
        let end = start.checked_add(len)?;
        (end <= self.cursor).then_some(start)
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("id", &self.id)
            .field("base", &format_args!("{:#x}", self.base))
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbx_core::{CountingHandler, ADDRESS_ALIGN};

    fn heap(capacity: usize) -> (Heap, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::new());
        let asserts = Arc::new(Assertions::with_handler(handler.clone()));
        (Heap::new(capacity, asserts), handler)
    }

    #[test]
    fn fresh_heap_is_entirely_free() {
        let (heap, _) = heap(2048);
        assert_eq!(heap.get_free(), 2048);
        assert_eq!(heap.capacity(), 2048);
        assert_eq!(heap.used(), 0);
    }

    #[test]
    fn allocate_reduces_free_size() {
        let (mut heap, handler) = heap(2048);
        let ptr = heap.allocate(2).unwrap();
        assert!(!ptr.is_null());
        assert!(heap.get_free() < 2048);
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn zero_size_is_a_violation() {
        let (mut heap, handler) = heap(2048);
        let result = heap.allocate(0);
        assert_eq!(
            result,
            Err(TbxError::InvalidArgument("heap allocation size must be non-zero"))
        );
        assert_eq!(heap.get_free(), 2048);
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn too_large_fails_without_violation() {
        let (mut heap, handler) = heap(64);
        let result = heap.allocate(65);
        assert!(matches!(result, Err(TbxError::OutOfMemory { available: 64, .. })));
        assert_eq!(heap.get_free(), 64);
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn huge_request_does_not_overflow() {
        let (mut heap, handler) = heap(64);
        assert!(heap.allocate(usize::MAX).is_err());
        assert_eq!(heap.get_free(), 64);
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn sizes_align_to_pointer_width() {
        let (mut heap, _) = heap(256);
        let before = heap.get_free();
        heap.allocate(1).unwrap();
        assert_eq!(before - heap.get_free(), ADDRESS_ALIGN);
    }

    #[test]
    fn allocations_never_overlap() {
        let (mut heap, _) = heap(256);
        let a = heap.allocate(3).unwrap();
        let b = heap.allocate(3).unwrap();
        assert_eq!(b.addr() - a.addr(), ADDRESS_ALIGN);
        assert_eq!(a.addr(), HEAP_BASE_ADDR);
    }

    #[test]
    fn exact_fit_empties_the_heap() {
        let (mut heap, _) = heap(64);
        heap.allocate(64).unwrap();
        assert_eq!(heap.get_free(), 0);
        assert!(heap.allocate(1).is_err());
    }

    #[test]
    fn every_heap_has_its_own_id() {
        let (first, _) = heap(64);
        let (second, _) = heap(64);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn slices_are_bounds_checked() {
        let (mut heap, _) = heap(64);
        let ptr = heap.allocate(16).unwrap();
        heap.slice_mut(ptr, 16).unwrap().fill(0xAA);
        assert_eq!(heap.slice(ptr, 16).unwrap(), &[0xAA; 16]);
        assert!(heap.slice(ptr, 17).is_none());
        assert!(heap.slice(ptr.wrapping_sub(0x1000), 1).is_none());
        assert!(heap.contains(ptr, 16));
        assert!(!heap.contains(BlockPtr::NULL, 1));
    }
}
