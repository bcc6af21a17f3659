//! Shared setup for tests that need a live Redis server
//!
//! Set `REDIS_HOST` (and optionally `REDIS_PORT`) to run them; without it
//! every live test returns early.

#![allow(dead_code)]

use redishaus::prelude::*;

pub fn live_config(prefix: Option<&str>) -> Option<AppConfig> {
    let host = std::env::var("REDIS_HOST").ok()?;
    let port = std::env::var("REDIS_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(6379);

    let mut redis = RedisConfig::new(host, port);
    if let Some(prefix) = prefix {
        redis = redis.with_prefix(prefix);
    }

    Some(AppConfig {
        redis,
        ..AppConfig::default()
    })
}

/// A RedisHaus scoped to a fresh random namespace, or None without a server
pub fn live_redishaus() -> Option<RedisHaus> {
    let prefix = format!("redishaus-test-{}:", rand::random::<u32>());
    let Some(config) = live_config(Some(&prefix)) else {
        eprintln!("REDIS_HOST not set, skipping live Redis test");
        return None;
    };
    Some(RedisHaus::new(config).expect("Failed to build client"))
}

pub async fn cleanup(redishaus: &RedisHaus) {
    let _ = redishaus.client().scan_and_delete("*", None).await;
    let _ = redishaus.dispose().await;
}
