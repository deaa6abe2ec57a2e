#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use tbx_core::{Assertions, CountingHandler, HEAP_BASE_ADDR};
use tbx_memory::{BlockPtr, Heap, MemPool};

fuzz_target!(|data: &[u8]| {
    let asserts = Arc::new(Assertions::with_handler(Arc::new(CountingHandler::new())));
    let mut heap = Heap::new(4096, Arc::clone(&asserts));
    let mut pools = MemPool::new(asserts);
    let mut live: Vec<BlockPtr> = Vec::new();

    // Each operation is three bytes: opcode and two arguments.
    for chunk in data.chunks_exact(3) {
        let (a, b) = (usize::from(chunk[1]), usize::from(chunk[2]));
        match chunk[0] % 4 {
            0 => {
                let _ = pools.create(&mut heap, a % 8, b);
            }
            1 => {
                if let Ok(ptr) = pools.allocate(a) {
                    assert!(!live.contains(&ptr));
                    live.push(ptr);
                }
            }
            2 if !live.is_empty() => {
                let ptr = live.swap_remove(a % live.len());
                pools.release(ptr).unwrap();
            }
            _ => {
                // Forged addresses must be rejected unless they name a live block.
                let ptr = BlockPtr::from_addr(HEAP_BASE_ADDR + ((a << 8) | b));
                let was_live = live.contains(&ptr);
                assert_eq!(pools.release(ptr).is_ok(), was_live);
                live.retain(|p| *p != ptr);
            }
        }

        for class in pools.size_classes() {
            assert_eq!(class.free + class.used, class.block_count);
        }
    }
});
