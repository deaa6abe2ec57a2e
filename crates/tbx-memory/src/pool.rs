//! Size-class memory pools layered on the heap arena.
//!
//! Each pool hands out fixed-size blocks carved from heap segments. Creating a
//! pool for a block size that already exists grows that pool by one more
//! segment. Allocation picks the pool with the smallest block size that fits;
//! a full pool does not fall through to a larger one. Releasing a block costs
//! one binary search over the segments of each pool.

use std::sync::Arc;

use tbx_core::{Assertions, TbxError};

use crate::heap::Heap;
use crate::list::{ItemRef, ListHandle, ListStore};
use crate::ptr::{align_up, BlockPtr};
use crate::stats::{AtomicPoolStats, PoolStats, SizeClassInfo};

/// One contiguous heap range carved into blocks by a single `create` call.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: BlockPtr,
    blocks: usize,
    first_slot: usize,
}

#[derive(Debug)]
struct Pool {
    block_size: usize,
    segments: Vec<Segment>,
    // Per block: the node in the used list while allocated.
    slots: Vec<Option<ItemRef>>,
    free: ListHandle,
    used: ListHandle,
}

impl Pool {
    fn add_segment(
        &mut self,
        lists: &mut ListStore<BlockPtr>,
        start: BlockPtr,
        blocks: usize,
    ) -> Result<(), TbxError> {
        self.segments.push(Segment {
            start,
            blocks,
            first_slot: self.slots.len(),
        });
        for index in 0..blocks {
            lists.insert_back(self.free, start.wrapping_add(index * self.block_size))?;
            self.slots.push(None);
        }
        Ok(())
    }

    /// Slot index of the block starting exactly at `ptr`.
    ///
    /// Segments come from a monotonic heap, so they are ordered by start
    /// address and the candidate is found by binary search.
    fn slot_of(&self, ptr: BlockPtr) -> Option<usize> {
        let after = self.segments.partition_point(|segment| segment.start <= ptr);
        let segment = self.segments.get(after.checked_sub(1)?)?;
        let offset = ptr.addr() - segment.start.addr();
        let index = offset / self.block_size;
        (index < segment.blocks && offset % self.block_size == 0)
            .then_some(segment.first_slot + index)
    }
}

/// Registry of size-class pools.
pub struct MemPool {
    // Sorted by ascending block size, one pool per size.
    pools: Vec<Pool>,
    // Arena every segment was carved from, fixed by the first successful create.
    heap_id: Option<u64>,
    lists: ListStore<BlockPtr>,
    stats: AtomicPoolStats,
    asserts: Arc<Assertions>,
}

impl MemPool {
    /// Create an empty registry reporting violations to `asserts`.
    #[must_use]
    pub fn new(asserts: Arc<Assertions>) -> Self {
        Self {
            pools: Vec::new(),
            heap_id: None,
            lists: ListStore::new(Arc::clone(&asserts)),
            stats: AtomicPoolStats::new(),
            asserts,
        }
    }

    /// Create a pool of `num_blocks` blocks of `block_size` bytes, or grow the
    /// existing pool of that (aligned) size.
    ///
    /// Zero arguments are a contract violation, and so is passing a different
    /// heap than the one earlier pools were carved from. When the heap cannot
    /// supply the memory the registry is left as it was.
    pub fn create(
        &mut self,
        heap: &mut Heap,
        num_blocks: usize,
        block_size: usize,
    ) -> Result<(), TbxError> {
        if !self.asserts.check(num_blocks != 0 && block_size != 0) {
            return Err(TbxError::InvalidArgument(
                "pool needs a non-zero block count and block size",
            ));
        }
        let foreign_heap = self.heap_id.is_some_and(|id| id != heap.id());
        if !self.asserts.check(!foreign_heap) {
            return Err(TbxError::InvalidArgument(
                "memory pools are bound to the heap they were first created on",
            ));
        }
        let Some((block_size, bytes)) = align_up(block_size)
            .and_then(|aligned| aligned.checked_mul(num_blocks).map(|bytes| (aligned, bytes)))
        else {
            return Err(TbxError::OutOfMemory {
                requested: usize::MAX,
                available: heap.get_free(),
            });
        };
        let start = heap.allocate(bytes)?;
        self.heap_id = Some(heap.id());

        match self
            .pools
            .binary_search_by_key(&block_size, |pool| pool.block_size)
        {
            Ok(index) => {
                let pool = &mut self.pools[index];
                pool.add_segment(&mut self.lists, start, num_blocks)?;
                self.stats.record_grow();
                tracing::debug!(
                    block_size,
                    added = num_blocks,
                    total = pool.slots.len(),
                    "memory pool grown"
                );
            }
            Err(index) => {
                let mut pool = Pool {
                    block_size,
                    segments: Vec::new(),
                    slots: Vec::with_capacity(num_blocks),
                    free: self.lists.create(),
                    used: self.lists.create(),
                };
                pool.add_segment(&mut self.lists, start, num_blocks)?;
                self.pools.insert(index, pool);
                tracing::debug!(block_size, blocks = num_blocks, %start, "memory pool created");
            }
        }
        Ok(())
    }

    /// Allocate a block of at least `size` bytes.
    pub fn allocate(&mut self, size: usize) -> Result<BlockPtr, TbxError> {
        if !self.asserts.check(size != 0) {
            return Err(TbxError::InvalidArgument("pool allocation size must be non-zero"));
        }
        let Some(pool) = self.pools.iter_mut().find(|pool| pool.block_size >= size) else {
            self.stats.record_failure();
            tracing::trace!(size, "no size class fits");
            return Err(TbxError::NoSizeClass { size });
        };
        let Some(free_ref) = self.lists.first_ref(pool.free) else {
            self.stats.record_failure();
            tracing::trace!(size, block_size = pool.block_size, "memory pool exhausted");
            return Err(TbxError::PoolExhausted {
                block_size: pool.block_size,
            });
        };

        // Resolve everything fallible before either list changes.
        let ptr = self.lists.get(free_ref).ok_or(TbxError::StaleList)?;
        let slot = pool.slot_of(ptr).ok_or(TbxError::NotOwned(ptr.addr()))?;
        let used_ref = self.lists.insert_back(pool.used, ptr)?;
        self.lists.remove_item(pool.free, free_ref)?;
        pool.slots[slot] = Some(used_ref);
        self.stats.record_allocation();
        tracing::trace!(%ptr, size, block_size = pool.block_size, "pool allocate");
        Ok(ptr)
    }

    /// Return a block previously handed out by [`allocate`](Self::allocate).
    ///
    /// `ptr` must be the exact start of a block that is currently allocated.
    /// Anything else is a contract violation and changes nothing.
    pub fn release(&mut self, ptr: BlockPtr) -> Result<(), TbxError> {
        if !self.asserts.check(!ptr.is_null()) {
            return Err(TbxError::InvalidArgument("cannot release a null block"));
        }
        let owner = self.pools.iter().enumerate().find_map(|(index, pool)| {
            let slot = pool.slot_of(ptr)?;
            pool.slots[slot].map(|used_ref| (index, slot, used_ref))
        });
        let Some((index, slot, used_ref)) = owner else {
            self.asserts.check(false);
            return Err(TbxError::NotOwned(ptr.addr()));
        };

        let pool = &mut self.pools[index];
        self.lists.insert_front(pool.free, ptr)?;
        self.lists.remove_item(pool.used, used_ref)?;
        pool.slots[slot] = None;
        self.stats.record_release();
        tracing::trace!(%ptr, block_size = pool.block_size, "pool release");
        Ok(())
    }

    /// Block size of the pool owning the block that starts at `ptr`.
    #[must_use]
    pub fn block_size_of(&self, ptr: BlockPtr) -> Option<usize> {
        self.pools
            .iter()
            .find(|pool| pool.slot_of(ptr).is_some())
            .map(|pool| pool.block_size)
    }

    /// Whether `ptr` is the start of a currently allocated block.
    #[must_use]
    pub fn is_allocated(&self, ptr: BlockPtr) -> bool {
        self.pools
            .iter()
            .any(|pool| pool.slot_of(ptr).is_some_and(|slot| pool.slots[slot].is_some()))
    }

    /// Shape of every pool, ordered by ascending block size.
    #[must_use]
    pub fn size_classes(&self) -> Vec<SizeClassInfo> {
        self.pools
            .iter()
            .map(|pool| SizeClassInfo {
                block_size: pool.block_size,
                block_count: pool.slots.len(),
                free: self.lists.size(pool.free),
                used: self.lists.size(pool.used),
                segments: pool.segments.len(),
            })
            .collect()
    }

    /// Number of distinct size classes.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Get a snapshot of pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Reset pool statistics counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl std::fmt::Debug for MemPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemPool")
            .field("size_classes", &self.size_classes())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
