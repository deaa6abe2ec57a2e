#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use tbx_core::{Assertions, CountingHandler};
use tbx_memory::{ListHandle, ListStore};

fuzz_target!(|data: &[u8]| {
    let asserts = Arc::new(Assertions::with_handler(Arc::new(CountingHandler::new())));
    let mut store: ListStore<u8> = ListStore::new(asserts);
    let mut handles: Vec<ListHandle> = vec![store.create()];

    // Each operation is two bytes: opcode and argument. Deleted handles stay
    // in `handles` so stale use gets exercised too.
    for chunk in data.chunks_exact(2) {
        let list = handles[usize::from(chunk[1]) % handles.len()];
        match chunk[0] % 7 {
            0 => handles.push(store.create()),
            1 => {
                let _ = store.delete(list);
            }
            2 => {
                let _ = store.clear(list);
            }
            3 => {
                let _ = store.insert_front(list, chunk[1]);
            }
            4 => {
                let _ = store.insert_back(list, chunk[1]);
            }
            5 => {
                if let Some(item) = store.last_ref(list) {
                    store.remove_item(list, item).unwrap();
                }
            }
            _ => {
                let walked = store.iter(list).count();
                assert_eq!(walked, store.size(list));
            }
        }
    }
});
