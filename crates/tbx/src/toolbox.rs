//! Process state of the toolbox.
//!
//! A [`Toolbox`] owns one instance of every stateful module and wires them to
//! a shared assertion channel. Mutating memory operations run inside the
//! critical section, entering it only when the caller has not already done so.

use std::sync::Arc;

use tbx_core::{
    AssertionHandler, Assertions, CriticalSection, HostInterruptPort, InterruptPort, TbxError,
    DEFAULT_HEAP_SIZE,
};
use tbx_memory::{BlockPtr, Heap, ListStore, MemPool, PoolStats, SizeClassInfo};
use tbx_utils::{checksum, crypto, Random};

/// Construction parameters of a [`Toolbox`].
#[derive(Clone)]
pub struct ToolboxConfig {
    /// Heap arena capacity in bytes.
    pub heap_size: usize,
    /// Port used by the critical section to mask interrupts.
    pub port: Arc<dyn InterruptPort>,
}

impl ToolboxConfig {
    /// Replace the heap size.
    #[must_use]
    pub fn with_heap_size(mut self, heap_size: usize) -> Self {
        self.heap_size = heap_size;
        self
    }

    /// Replace the interrupt port.
    #[must_use]
    pub fn with_port(mut self, port: Arc<dyn InterruptPort>) -> Self {
        self.port = port;
        self
    }
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            heap_size: DEFAULT_HEAP_SIZE,
            port: Arc::new(HostInterruptPort::new()),
        }
    }
}

impl std::fmt::Debug for ToolboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolboxConfig")
            .field("heap_size", &self.heap_size)
            .finish_non_exhaustive()
    }
}

/// All toolbox modules behind one value.
pub struct Toolbox {
    asserts: Arc<Assertions>,
    critsect: CriticalSection,
    heap: Heap,
    pools: MemPool,
    random: Random,
}

impl Toolbox {
    /// Build a toolbox that logs violations through `tracing`.
    #[must_use]
    pub fn new(config: ToolboxConfig) -> Self {
        Self::with_assertions(config, Arc::new(Assertions::new()))
    }

    /// Build a toolbox reporting violations to `handler`.
    #[must_use]
    pub fn with_handler(config: ToolboxConfig, handler: Arc<dyn AssertionHandler>) -> Self {
        Self::with_assertions(config, Arc::new(Assertions::with_handler(handler)))
    }

    fn with_assertions(config: ToolboxConfig, asserts: Arc<Assertions>) -> Self {
        tracing::debug!(heap_size = config.heap_size, "toolbox initialised");
        Self {
            critsect: CriticalSection::new(config.port, Arc::clone(&asserts)),
            heap: Heap::new(config.heap_size, Arc::clone(&asserts)),
            pools: MemPool::new(Arc::clone(&asserts)),
            random: Random::new(Arc::clone(&asserts)),
            asserts,
        }
    }

    /// The shared assertion channel.
    #[must_use]
    pub fn assertions(&self) -> &Arc<Assertions> {
        &self.asserts
    }

    /// Swap the assertion handler. `None` is reported and ignored.
    #[track_caller]
    pub fn set_assertion_handler(&self, handler: Option<Arc<dyn AssertionHandler>>) {
        self.asserts.set_handler(handler);
    }

    /// The critical section guarding the memory modules.
    #[must_use]
    pub fn critical_section(&self) -> &CriticalSection {
        &self.critsect
    }

    /// Allocate raw bytes from the heap arena.
    pub fn heap_allocate(&mut self, size: usize) -> Result<BlockPtr, TbxError> {
        let heap = &mut self.heap;
        self.critsect.with(|| heap.allocate(size))
    }

    /// Free bytes left in the heap arena.
    #[must_use]
    pub fn heap_get_free(&self) -> usize {
        self.heap.get_free()
    }

    /// Read-only view of the heap arena.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Create or grow the memory pool for `block_size` byte blocks.
    pub fn mem_pool_create(&mut self, num_blocks: usize, block_size: usize) -> Result<(), TbxError> {
        let (pools, heap) = (&mut self.pools, &mut self.heap);
        self.critsect
            .with(|| pools.create(heap, num_blocks, block_size))
    }

    /// Allocate a block of at least `size` bytes from the memory pools.
    pub fn mem_pool_allocate(&mut self, size: usize) -> Result<BlockPtr, TbxError> {
        let pools = &mut self.pools;
        self.critsect.with(|| pools.allocate(size))
    }

    /// Return a block to its memory pool.
    pub fn mem_pool_release(&mut self, ptr: BlockPtr) -> Result<(), TbxError> {
        let pools = &mut self.pools;
        self.critsect.with(|| pools.release(ptr))
    }

    /// Read-only view of the memory pools.
    #[must_use]
    pub fn pools(&self) -> &MemPool {
        &self.pools
    }

    /// Shape of every memory pool.
    #[must_use]
    pub fn size_classes(&self) -> Vec<SizeClassInfo> {
        self.pools.size_classes()
    }

    /// Memory pool counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pools.stats()
    }

    /// Contents of a pool block.
    #[must_use]
    pub fn block(&self, ptr: BlockPtr) -> Option<&[u8]> {
        let len = self.pools.block_size_of(ptr)?;
        self.heap.slice(ptr, len)
    }

    /// Mutable contents of a pool block.
    pub fn block_mut(&mut self, ptr: BlockPtr) -> Option<&mut [u8]> {
        let len = self.pools.block_size_of(ptr)?;
        self.heap.slice_mut(ptr, len)
    }

    /// A fresh list store reporting to this toolbox's assertion channel.
    #[must_use]
    pub fn list_store<T: Copy>(&self) -> ListStore<T> {
        ListStore::new(Arc::clone(&self.asserts))
    }

    /// The random number generator.
    #[must_use]
    pub fn random(&self) -> &Random {
        &self.random
    }

    /// CRC-16/CCITT-FALSE of `data`.
    #[track_caller]
    pub fn crc16(&self, data: &[u8]) -> u16 {
        checksum::crc16_calculate(&self.asserts, data)
    }

    /// CRC-32/MPEG-2 of `data`.
    #[track_caller]
    pub fn crc32(&self, data: &[u8]) -> u32 {
        checksum::crc32_calculate(&self.asserts, data)
    }

    /// AES-256 ECB encryption in place.
    #[track_caller]
    pub fn aes256_encrypt(&self, data: &mut [u8], key: &[u8]) -> Result<(), TbxError> {
        crypto::aes256_encrypt(&self.asserts, data, key)
    }

    /// AES-256 ECB decryption in place.
    #[track_caller]
    pub fn aes256_decrypt(&self, data: &mut [u8], key: &[u8]) -> Result<(), TbxError> {
        crypto::aes256_decrypt(&self.asserts, data, key)
    }
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::new(ToolboxConfig::default())
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("heap", &self.heap)
            .field("pools", &self.pools)
            .field("violations", &self.asserts.violations())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbx_core::CountingHandler;

    fn toolbox(heap_size: usize) -> (Toolbox, Arc<HostInterruptPort>, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::new());
        let port = Arc::new(HostInterruptPort::new());
        let config = ToolboxConfig::default()
            .with_heap_size(heap_size)
            .with_port(port.clone());
        (Toolbox::with_handler(config, handler.clone()), port, handler)
    }

    #[test]
    fn default_config_uses_default_heap_size() {
        let toolbox = Toolbox::default();
        assert_eq!(toolbox.heap_get_free(), DEFAULT_HEAP_SIZE);
    }

    #[test]
    fn memory_calls_leave_interrupts_enabled() {
        let (mut toolbox, port, handler) = toolbox(1024);
        toolbox.mem_pool_create(4, 32).unwrap();
        let ptr = toolbox.mem_pool_allocate(20).unwrap();
        toolbox.mem_pool_release(ptr).unwrap();
        toolbox.heap_allocate(8).unwrap();
        assert!(port.interrupts_enabled());
        assert!(!toolbox.critical_section().is_active());
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn memory_calls_inside_caller_section_keep_it_open() {
        let (mut toolbox, port, handler) = toolbox(1024);
        toolbox.mem_pool_create(2, 16).unwrap();

        toolbox.critical_section().enter();
        let ptr = toolbox.mem_pool_allocate(16).unwrap();
        assert!(toolbox.critical_section().is_active());
        assert!(!port.interrupts_enabled());
        toolbox.mem_pool_release(ptr).unwrap();
        toolbox.heap_allocate(8).unwrap();
        assert!(!port.interrupts_enabled());
        toolbox.critical_section().exit();

        assert!(port.interrupts_enabled());
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn blocks_are_writable_through_the_facade() {
        let (mut toolbox, _, _) = toolbox(1024);
        toolbox.mem_pool_create(2, 16).unwrap();
        let ptr = toolbox.mem_pool_allocate(16).unwrap();
        toolbox.block_mut(ptr).unwrap().copy_from_slice(&[7; 16]);
        assert_eq!(toolbox.block(ptr).unwrap(), &[7; 16]);
        assert!(toolbox.block(ptr.wrapping_add(1)).is_none());
    }

    #[test]
    fn violations_share_one_channel() {
        let (mut toolbox, _, handler) = toolbox(1024);
        let _ = toolbox.heap_allocate(0);
        let _ = toolbox.mem_pool_allocate(0);
        assert_eq!(toolbox.crc16(&[]), 0);
        let mut lists = toolbox.list_store::<u8>();
        let list = lists.create();
        lists.delete(list).unwrap();
        assert_eq!(lists.size(list), 0);
        assert_eq!(handler.count(), 4);
        assert_eq!(toolbox.assertions().violations(), 4);
    }

    #[test]
    fn null_assertion_handler_keeps_previous() {
        let (toolbox, _, handler) = toolbox(64);
        toolbox.set_assertion_handler(None);
        assert_eq!(handler.count(), 1);
        assert_eq!(toolbox.crc32(&[]), 0);
        assert_eq!(handler.count(), 2);
    }
}
