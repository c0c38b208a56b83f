//! Redis cache for derived, read-heavy data.
//!
//! Values are stored as JSON with a TTL. Every failure is logged and treated
//! as a miss so a Redis outage never fails a request.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl RedisCache {
    pub async fn new(redis_url: &str, default_ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            conn,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();

        let raw = match conn.get::<_, Option<String>>(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Redis get failed");
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store `value` under `key`; errors are logged, not returned.
    #[instrument(skip(self, value))]
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = self.try_put(key, value, ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    async fn try_put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let data = serde_json::to_string(value).context("Failed to serialize cache value")?;

        conn.set_ex::<_, _, ()>(key, data, ttl.as_secs().max(1))
            .await
            .context("Failed to set cache value")?;

        debug!(key, ttl_secs = ttl.as_secs(), "Cached value");
        Ok(())
    }

    /// Delete every key matching `pattern`, e.g. `matches:rfq:<id>:*`.
    #[instrument(skip(self))]
    pub async fn invalidate(&self, pattern: &str) {
        match self.delete_pattern(pattern).await {
            Ok(deleted) => debug!(pattern, deleted, "Cache invalidated"),
            Err(e) => warn!(pattern, error = %e, "Cache invalidation failed"),
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await
                .context("Redis SCAN failed")?;

            if !keys.is_empty() {
                let n: usize = conn.del(&keys).await.context("Failed to delete cache keys")?;
                deleted += n;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(deleted)
    }

    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }
}

/// Cache key builders
pub mod keys {
    use uuid::Uuid;

    pub fn rfq_matches(rfq_id: Uuid, limit: usize) -> String {
        format!("matches:rfq:{}:limit:{}", rfq_id, limit)
    }

    /// Pattern covering every cached match list for an RFQ
    pub fn rfq_matches_pattern(rfq_id: Uuid) -> String {
        format!("matches:rfq:{}:*", rfq_id)
    }

    /// Every cached match list, for changes that affect all RFQs
    pub fn all_matches_pattern() -> String {
        "matches:rfq:*".to_string()
    }

    pub fn admin_stats() -> String {
        "admin:stats".to_string()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn match_keys_fall_under_their_patterns() {
            let id = Uuid::from_u128(42);
            let key = rfq_matches(id, 10);
            let prefix = rfq_matches_pattern(id);
            assert!(key.starts_with(prefix.trim_end_matches('*')));
            assert!(key.starts_with(all_matches_pattern().trim_end_matches('*')));
        }
    }
}
