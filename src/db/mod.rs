pub mod postgres;
pub mod ratings;
pub mod redis;

pub use postgres::create_pool;
pub use ratings::{InMemoryRatingStore, PgRatingStore, RatingStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
