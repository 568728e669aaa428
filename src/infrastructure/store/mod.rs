//! Counter store adapters.
//!
//! Provides three implementations of [`crate::domain::store::CounterStore`]:
//! - [`RedisCounterStore`] - Production store shared by all worker processes
//! - [`MemoryCounterStore`] - Single-process store for development and tests
//! - [`NullCounterStore`] - Always unavailable; the fail mode decides admission

mod memory_store;
mod null_store;
mod redis_store;

pub use memory_store::MemoryCounterStore;
pub use null_store::NullCounterStore;
pub use redis_store::RedisCounterStore;
