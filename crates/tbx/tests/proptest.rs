//! Property-based tests for the toolbox facade and CLI parsing.

use std::sync::Arc;

use proptest::prelude::*;

use tbx_core::CountingHandler;
use tbx_lib::config::parse_layout;
use tbx_lib::{Toolbox, ToolboxConfig};

fn toolbox(heap_size: usize) -> (Toolbox, Arc<CountingHandler>) {
    let handler = Arc::new(CountingHandler::new());
    let config = ToolboxConfig::default().with_heap_size(heap_size);
    (Toolbox::with_handler(config, handler.clone()), handler)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any non-zero layout written as NxS parses back to its parts.
    #[test]
    fn layout_parses(blocks in 1usize..10_000, size in 1usize..10_000, upper in any::<bool>()) {
        let sep = if upper { 'X' } else { 'x' };
        let layout = parse_layout(&format!("{blocks}{sep}{size}")).unwrap();
        prop_assert_eq!(layout.num_blocks, blocks);
        prop_assert_eq!(layout.block_size, size);
    }

    /// Pools built on a toolbox never hand out more heap than they reserved.
    #[test]
    fn pool_blocks_fit_their_class(
        layouts in prop::collection::vec((1usize..8, 1usize..96), 1..6),
        requests in prop::collection::vec(1usize..96, 0..40),
    ) {
        let (mut toolbox, handler) = toolbox(16 * 1024);
        for (blocks, size) in &layouts {
            toolbox.mem_pool_create(*blocks, *size).unwrap();
        }
        let heap_free = toolbox.heap_get_free();

        let mut live = Vec::new();
        for size in requests {
            if let Ok(ptr) = toolbox.mem_pool_allocate(size) {
                let block = toolbox.block(ptr).unwrap();
                prop_assert!(block.len() >= size);
                live.push(ptr);
            }
        }
        for ptr in live {
            toolbox.mem_pool_release(ptr).unwrap();
        }

        prop_assert_eq!(toolbox.heap_get_free(), heap_free);
        for class in toolbox.size_classes() {
            prop_assert_eq!(class.used, 0);
            prop_assert_eq!(class.free, class.block_count);
        }
        prop_assert_eq!(handler.count(), 0);
    }

    /// Encrypting then decrypting with the same key restores the data.
    #[test]
    fn aes_restores_plaintext(
        blocks in prop::collection::vec(any::<[u8; 16]>(), 1..8),
        key in any::<[u8; 32]>(),
    ) {
        let (toolbox, handler) = toolbox(64);
        let plain: Vec<u8> = blocks.concat();
        let mut data = plain.clone();
        toolbox.aes256_encrypt(&mut data, &key).unwrap();
        prop_assert_ne!(&data, &plain);
        toolbox.aes256_decrypt(&mut data, &key).unwrap();
        prop_assert_eq!(data, plain);
        prop_assert_eq!(handler.count(), 0);
    }
}
