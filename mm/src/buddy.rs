//! Power-of-two buddy allocator over a fixed byte arena.
//!
//! One free list per size class (order), where order `0` is `MIN_BLOCK`
//! bytes and order `max_order` is the whole arena. This trades the
//! straightforward "scan every block" allocator for `O(log(TOTAL_MEMORY /
//! MIN_BLOCK))` allocate/free, at the cost of only the block-discovery
//! order observed in `memory.log` within a size class — never the
//! externally observable allocate/free/coalesce behavior itself.

use std::collections::{BTreeSet, HashMap};

use vosim_abi::JobId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Block {
    offset: u64,
    size: u64,
}

/// A buddy allocator over `[0, total_memory)`.
pub struct BuddyAllocator {
    total_memory: u64,
    min_block: u64,
    max_order: u32,
    /// `free_lists[order]` holds the offsets of free blocks of that order,
    /// ordered so the lowest offset is always picked first (the spec's
    /// deterministic tie-break).
    free_lists: Vec<BTreeSet<u64>>,
    allocated: HashMap<JobId, Block>,
}

impl BuddyAllocator {
    /// Creates an allocator over an arena of `total_memory` bytes with
    /// minimum grain `min_block`. Both must be powers of two, and
    /// `min_block` must not exceed `total_memory`.
    pub fn new(total_memory: u64, min_block: u64) -> Self {
        assert!(total_memory.is_power_of_two(), "TOTAL_MEMORY must be a power of two");
        assert!(min_block.is_power_of_two(), "MIN_BLOCK must be a power of two");
        assert!(min_block <= total_memory, "MIN_BLOCK must not exceed TOTAL_MEMORY");

        let max_order = (total_memory / min_block).trailing_zeros();
        let mut free_lists = vec![BTreeSet::new(); max_order as usize + 1];
        free_lists[max_order as usize].insert(0);

        Self {
            total_memory,
            min_block,
            max_order,
            free_lists,
            allocated: HashMap::new(),
        }
    }

    pub fn total_memory(&self) -> u64 {
        self.total_memory
    }

    fn order_of(&self, size: u64) -> u32 {
        (size / self.min_block).trailing_zeros()
    }

    fn size_of_order(&self, order: u32) -> u64 {
        self.min_block << order
    }

    /// Rounds `bytes` up to the smallest power of two `>= max(bytes, MIN_BLOCK)`.
    fn round_up_size(&self, bytes: u64) -> u64 {
        let mut size = self.min_block;
        while size < bytes {
            size *= 2;
        }
        size
    }

    /// Attempts to reserve `bytes` for `owner`. Returns the block's base
    /// offset on success. Fails (without mutating any state) if no free
    /// block is large enough, including when `bytes` exceeds the arena.
    pub fn allocate(&mut self, owner: JobId, bytes: u64) -> Option<u64> {
        if bytes == 0 || bytes > self.total_memory {
            return None;
        }

        let size = self.round_up_size(bytes);
        let order = self.order_of(size);

        let found_order = (order..=self.max_order).find(|&o| !self.free_lists[o as usize].is_empty())?;

        let offset = {
            let list = &mut self.free_lists[found_order as usize];
            let offset = *list.iter().next().expect("checked non-empty above");
            list.remove(&offset);
            offset
        };

        // Split down from found_order to the target order, keeping the
        // lower half and freeing the upper half (the buddy) at each step.
        let mut current_order = found_order;
        while current_order > order {
            current_order -= 1;
            let half_size = self.size_of_order(current_order);
            let buddy_offset = offset + half_size;
            self.free_lists[current_order as usize].insert(buddy_offset);
        }

        self.allocated.insert(owner, Block { offset, size });
        Some(offset)
    }

    /// Releases `owner`'s block, coalescing with its buddy repeatedly
    /// while the buddy is free and within the arena. No-op if `owner`
    /// holds no block.
    pub fn free(&mut self, owner: JobId) {
        let Some(block) = self.allocated.remove(&owner) else {
            return;
        };

        let mut offset = block.offset;
        let mut order = self.order_of(block.size);

        while order < self.max_order {
            let size = self.size_of_order(order);
            let buddy_offset = offset ^ size;
            let list = &mut self.free_lists[order as usize];
            if list.remove(&buddy_offset) {
                offset = offset.min(buddy_offset);
                order += 1;
            } else {
                break;
            }
        }

        self.free_lists[order as usize].insert(offset);
    }

    /// The byte size of the block currently held by `owner`, if any. Used
    /// by the scheduler to sanity-check its own bookkeeping against the
    /// allocator's before trusting a `free`.
    pub fn block_size_of(&self, owner: JobId) -> Option<u64> {
        self.allocated.get(&owner).map(|b| b.size)
    }

    /// `true` once every owner has freed and the arena has fully
    /// coalesced back into a single free block spanning the whole arena.
    pub fn is_fully_coalesced(&self) -> bool {
        self.allocated.is_empty() && self.free_lists[self.max_order as usize].len() == 1
    }
}
