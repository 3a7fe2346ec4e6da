//! Property tests for the buddy allocator's partition and alignment
//! invariants (§8, properties 1 and 2), driven through randomized
//! alloc/free interleavings rather than just the scripted scenarios.

use proptest::prelude::*;
use vosim_mm::BuddyAllocator;

#[derive(Clone, Debug)]
enum Op {
    Alloc { owner: u32, bytes: u64 },
    Free { owner: u32 },
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (0u32..6, 1u64..300).prop_map(|(owner, bytes)| Op::Alloc { owner, bytes }),
            (0u32..6).prop_map(|owner| Op::Free { owner }),
        ],
        1..40,
    )
}

fn next_pow2(n: u64) -> u64 {
    let mut p = 32u64.max(1);
    while p < n {
        p *= 2;
    }
    p
}

proptest! {
    #[test]
    fn live_blocks_partition_the_arena_and_offsets_are_aligned(ops in ops_strategy()) {
        let mut arena = BuddyAllocator::new(1024, 32);
        let mut live: std::collections::HashMap<u32, (u64, u64)> = std::collections::HashMap::new();

        for op in ops {
            match op {
                Op::Alloc { owner, bytes } => {
                    if live.contains_key(&owner) {
                        continue;
                    }
                    if let Some(offset) = arena.allocate(owner, bytes) {
                        let size = arena.block_size_of(owner).unwrap();
                        let expected_size = next_pow2(bytes);
                        prop_assert_eq!(size, expected_size);
                        prop_assert_eq!(offset % size, 0);

                        for &(lo, hi) in live.values() {
                            let new_hi = offset + size;
                            prop_assert!(offset >= hi || new_hi <= lo);
                        }
                        live.insert(owner, (offset, offset + size));
                    }
                }
                Op::Free { owner } => {
                    arena.free(owner);
                    live.remove(&owner);
                }
            }
        }

        for owner in live.keys().copied().collect::<Vec<_>>() {
            arena.free(owner);
        }
        prop_assert!(arena.is_fully_coalesced());
    }
}
