//! Buddy allocator backing per-job memory reservations.
//!
//! One arena, one minimum grain, one free-list per power-of-two size
//! class (order). See [`buddy::BuddyAllocator`] for the algorithm.

pub mod buddy;

pub use buddy::BuddyAllocator;
