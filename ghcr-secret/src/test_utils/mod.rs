//! In-memory implementations for testing.
//!
//! Available behind the `test-utils` feature flag.

mod memory_store;

pub use memory_store::MemoryStore;
