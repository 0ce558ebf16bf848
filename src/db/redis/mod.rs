//! Redis cache for guest lists and category data.

pub mod cache;

mod macros;

pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
