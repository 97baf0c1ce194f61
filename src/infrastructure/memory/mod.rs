//! Memory Layer - In-Memory State
//!
//! 定位结果缓存的内存实现

mod result_cache;

pub use result_cache::{CacheConfig, InMemoryResultCache};
