pub mod memory;
pub mod postgres;
pub mod redis;
pub mod seed;
pub mod store;

pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};
pub use seed::Seed;
pub use store::{Collection, DocumentPage, RecipeFilter, Store};
