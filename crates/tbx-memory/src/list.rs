//! Doubly linked lists of opaque payloads.
//!
//! A [`ListStore`] owns the nodes of every list created from it. Nodes freed
//! by `clear`, `delete` or `remove_item` go to a private recycling store and
//! are reused by later inserts, so node storage never depends on the heap or
//! the memory pools.
//!
//! Lists and items are addressed through generational handles. Using a handle
//! after its list was deleted (or its item removed) is a contract violation:
//! it is reported on the assertion channel and the operation fails without
//! touching any list.

use std::fmt;
use std::sync::Arc;

use tbx_core::{Assertions, TbxError};

/// Handle of a list inside a [`ListStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListHandle {
    slot: usize,
    generation: u64,
}

/// Handle of one item inside a list, returned by the insert operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRef {
    node: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node<T> {
    item: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
    owner: usize,
    generation: u64,
}

#[derive(Debug, Default)]
struct Header {
    head: Option<usize>,
    tail: Option<usize>,
    size: usize,
    generation: u64,
    live: bool,
}

/// Storage for any number of doubly linked lists holding `T` payloads.
pub struct ListStore<T> {
    headers: Vec<Header>,
    free_headers: Vec<usize>,
    nodes: Vec<Node<T>>,
    free_nodes: Vec<usize>,
    asserts: Arc<Assertions>,
}

impl<T: Copy> ListStore<T> {
    /// Create an empty store reporting violations to `asserts`.
    #[must_use]
    pub fn new(asserts: Arc<Assertions>) -> Self {
        Self {
            headers: Vec::new(),
            free_headers: Vec::new(),
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            asserts,
        }
    }

    /// Create a new, empty list.
    pub fn create(&mut self) -> ListHandle {
        if let Some(slot) = self.free_headers.pop() {
            let header = &mut self.headers[slot];
            header.live = true;
            return ListHandle {
                slot,
                generation: header.generation,
            };
        }
        self.headers.push(Header {
            live: true,
            ..Header::default()
        });
        ListHandle {
            slot: self.headers.len() - 1,
            generation: 0,
        }
    }

    /// Delete a list. Its nodes are recycled and the handle becomes stale.
    pub fn delete(&mut self, list: ListHandle) -> Result<(), TbxError> {
        let slot = self.validate(list)?;
        self.release_nodes(slot);
        let header = &mut self.headers[slot];
        header.live = false;
        header.generation = header.generation.wrapping_add(1);
        self.free_headers.push(slot);
        Ok(())
    }

    /// Remove every item from a list. The list itself stays usable.
    pub fn clear(&mut self, list: ListHandle) -> Result<(), TbxError> {
        let slot = self.validate(list)?;
        self.release_nodes(slot);
        Ok(())
    }

    /// Number of items in a list. Zero for a stale handle.
    pub fn size(&self, list: ListHandle) -> usize {
        self.validate(list)
            .map_or(0, |slot| self.headers[slot].size)
    }

    /// Insert `item` at the front of a list.
    pub fn insert_front(&mut self, list: ListHandle, item: T) -> Result<ItemRef, TbxError> {
        let slot = self.validate(list)?;
        let old_head = self.headers[slot].head;
        let node = self.alloc_node(slot, item, None, old_head);
        match old_head {
            Some(head) => self.nodes[head].prev = Some(node),
            None => self.headers[slot].tail = Some(node),
        }
        let header = &mut self.headers[slot];
        header.head = Some(node);
        header.size += 1;
        Ok(self.item_ref(node))
    }

    /// Insert `item` at the back of a list.
    pub fn insert_back(&mut self, list: ListHandle, item: T) -> Result<ItemRef, TbxError> {
        let slot = self.validate(list)?;
        let old_tail = self.headers[slot].tail;
        let node = self.alloc_node(slot, item, old_tail, None);
        match old_tail {
            Some(tail) => self.nodes[tail].next = Some(node),
            None => self.headers[slot].head = Some(node),
        }
        let header = &mut self.headers[slot];
        header.tail = Some(node);
        header.size += 1;
        Ok(self.item_ref(node))
    }

    /// Remove one item from a list and return its payload.
    pub fn remove_item(&mut self, list: ListHandle, item: ItemRef) -> Result<T, TbxError> {
        let slot = self.validate(list)?;
        let node = self.validate_item(slot, item)?;
        let (prev, next) = (self.nodes[node].prev, self.nodes[node].next);
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.headers[slot].head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.headers[slot].tail = prev,
        }
        self.headers[slot].size -= 1;
        self.free_node(node).ok_or(TbxError::StaleList)
    }

    /// Payload at the front of a list, without removing it.
    pub fn first_item(&self, list: ListHandle) -> Option<T> {
        self.first_ref(list).and_then(|item| self.nodes[item.node].item)
    }

    /// Payload at the back of a list, without removing it.
    pub fn last_item(&self, list: ListHandle) -> Option<T> {
        self.last_ref(list).and_then(|item| self.nodes[item.node].item)
    }

    /// Handle of the first item of a list.
    pub fn first_ref(&self, list: ListHandle) -> Option<ItemRef> {
        let slot = self.validate(list).ok()?;
        self.headers[slot].head.map(|node| self.item_ref(node))
    }

    /// Handle of the last item of a list.
    pub fn last_ref(&self, list: ListHandle) -> Option<ItemRef> {
        let slot = self.validate(list).ok()?;
        self.headers[slot].tail.map(|node| self.item_ref(node))
    }

    /// Handle of the item following `item`.
    pub fn next_ref(&self, list: ListHandle, item: ItemRef) -> Option<ItemRef> {
        let slot = self.validate(list).ok()?;
        let node = self.validate_item(slot, item).ok()?;
        self.nodes[node].next.map(|next| self.item_ref(next))
    }

    /// Handle of the item preceding `item`.
    pub fn prev_ref(&self, list: ListHandle, item: ItemRef) -> Option<ItemRef> {
        let slot = self.validate(list).ok()?;
        let node = self.validate_item(slot, item).ok()?;
        self.nodes[node].prev.map(|prev| self.item_ref(prev))
    }

    /// Payload behind an item handle.
    pub fn get(&self, item: ItemRef) -> Option<T> {
        let live = self
            .nodes
            .get(item.node)
            .filter(|node| node.generation == item.generation)
            .and_then(|node| node.item);
        if self.asserts.check(live.is_some()) {
            live
        } else {
            None
        }
    }

    /// Iterate over the payloads of a list, front to back.
    pub fn iter(&self, list: ListHandle) -> Iter<'_, T> {
        let cursor = self
            .validate(list)
            .ok()
            .and_then(|slot| self.headers[slot].head);
        Iter {
            store: self,
            cursor,
        }
    }

    /// Number of nodes waiting in the recycling store.
    #[must_use]
    pub fn recycled_nodes(&self) -> usize {
        self.free_nodes.len()
    }

    /// Number of live lists.
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.headers.len() - self.free_headers.len()
    }

    #[track_caller]
    fn validate(&self, list: ListHandle) -> Result<usize, TbxError> {
        let live = self
            .headers
            .get(list.slot)
            .is_some_and(|header| header.live && header.generation == list.generation);
        if self.asserts.check(live) {
            Ok(list.slot)
        } else {
            Err(TbxError::StaleList)
        }
    }

    #[track_caller]
    fn validate_item(&self, slot: usize, item: ItemRef) -> Result<usize, TbxError> {
        let live = self.nodes.get(item.node).is_some_and(|node| {
            node.item.is_some() && node.generation == item.generation && node.owner == slot
        });
        if self.asserts.check(live) {
            Ok(item.node)
        } else {
            Err(TbxError::StaleList)
        }
    }

    fn item_ref(&self, node: usize) -> ItemRef {
        ItemRef {
            node,
            generation: self.nodes[node].generation,
        }
    }

    fn alloc_node(
        &mut self,
        owner: usize,
        item: T,
        prev: Option<usize>,
        next: Option<usize>,
    ) -> usize {
        if let Some(index) = self.free_nodes.pop() {
            let node = &mut self.nodes[index];
            node.item = Some(item);
            node.prev = prev;
            node.next = next;
            node.owner = owner;
            return index;
        }
        self.nodes.push(Node {
            item: Some(item),
            prev,
            next,
            owner,
            generation: 0,
        });
        self.nodes.len() - 1
    }

    fn free_node(&mut self, index: usize) -> Option<T> {
        let node = &mut self.nodes[index];
        node.generation = node.generation.wrapping_add(1);
        node.prev = None;
        node.next = None;
        self.free_nodes.push(index);
        node.item.take()
    }

    fn release_nodes(&mut self, slot: usize) {
        let mut cursor = self.headers[slot].head;
        while let Some(index) = cursor {
            cursor = self.nodes[index].next;
            self.free_node(index);
        }
        let header = &mut self.headers[slot];
        header.head = None;
        header.tail = None;
        header.size = 0;
    }
}

impl<T> fmt::Debug for ListStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListStore")
            .field("lists", &(self.headers.len() - self.free_headers.len()))
            .field("nodes", &self.nodes.len())
            .field("recycled", &self.free_nodes.len())
            .finish_non_exhaustive()
    }
}

/// Front-to-back iterator over the payloads of one list.
pub struct Iter<'a, T> {
    store: &'a ListStore<T>,
    cursor: Option<usize>,
}

impl<T: Copy> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let node = &self.store.nodes[self.cursor?];
        self.cursor = node.next;
        node.item
    }
}
