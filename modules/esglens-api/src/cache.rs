use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};

use esglens_common::config::CacheConfig;

/// TTLs per cache scope, seconds.
fn ttl_for(scope: &str) -> u64 {
    match scope {
        "company" | "companies" => 3600,
        "indicators" => 86400,
        "scores" => 1800,
        "telemetry" => 60,
        _ => 300,
    }
}

/// Hierarchical cache key: `scope:part:part…`.
pub fn cache_key(parts: &[&str]) -> String {
    parts.join(":")
}

/// Best-effort Redis cache in front of the read endpoints. Every failure
/// degrades to an origin read; the cache is never load-bearing.
#[derive(Clone)]
pub struct CacheManager {
    conn: Option<ConnectionManager>,
}

impl CacheManager {
    pub async fn connect(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return Self { conn: None };
        }

        let client = match redis::Client::open(config.redis_url()) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Cache client setup failed; running without cache");
                return Self { conn: None };
            }
        };

        match ConnectionManager::new(client).await {
            Ok(conn) => {
                info!("Cache connected");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                warn!(error = %e, "Cache unreachable; running without cache");
                Self { conn: None }
            }
        }
    }

    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub fn enabled(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Write with the scope's TTL (scope = first key segment).
    pub async fn set(&self, key: &str, value: &serde_json::Value) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let scope = key.split(':').next().unwrap_or_default();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, ttl_for(scope)).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    /// Delete every key matching `pattern` (e.g. `company:1*`). Returns the
    /// number of keys removed; failures count as zero.
    pub async fn delete_pattern(&self, pattern: &str) -> u64 {
        let Some(mut conn) = self.conn.clone() else {
            return 0;
        };

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let scan: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;
            match scan {
                Ok((next, batch)) => {
                    keys.extend(batch);
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Err(e) => {
                    warn!(pattern, error = %e, "Cache scan failed");
                    return 0;
                }
            }
        }

        if keys.is_empty() {
            return 0;
        }

        match conn.del::<_, u64>(keys).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(pattern, error = %e, "Cache delete failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compose_hierarchically() {
        assert_eq!(cache_key(&["company", "1"]), "company:1");
        assert_eq!(cache_key(&["scores", "1", "2024"]), "scores:1:2024");
        assert_eq!(
            cache_key(&["indicators", "definitions", "all"]),
            "indicators:definitions:all"
        );
    }

    #[test]
    fn scopes_have_distinct_ttls() {
        assert_eq!(ttl_for("indicators"), 86400);
        assert_eq!(ttl_for("telemetry"), 60);
        assert_eq!(ttl_for("anything-else"), 300);
    }

    #[tokio::test]
    async fn disabled_cache_degrades_gracefully() {
        let cache = CacheManager::disabled();
        assert!(!cache.enabled());
        assert!(cache.get("company:1").await.is_none());
        cache.set("company:1", &serde_json::json!({"id": 1})).await;
        assert_eq!(cache.delete_pattern("company:*").await, 0);
    }
}
