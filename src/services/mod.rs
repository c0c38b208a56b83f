//! Service layer: Redis caching and notification delivery.

pub mod cache;
pub mod notifications;

pub use cache::RedisCache;
