//! # RedisHaus
//!
//! A prefix-scoped async Redis client with cursor-based key scanning,
//! bulk delete, pipelined batches and explicit transactions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redishaus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig {
//!         redis: RedisConfig::new("localhost".to_string(), 6379).with_prefix("app:"),
//!         ..AppConfig::default()
//!     };
//!
//!     let redishaus = RedisHaus::new(config)?;
//!     redishaus.log_events();
//!     let client = redishaus.client();
//!
//!     client.set("test1", 1, KeyOptions::expire(30)).await?;
//!
//!     // Walk app:test* page by page; handlers see "test1", not "app:test1"
//!     let mut found = 0;
//!     client
//!         .scan("test*", None, |keys| {
//!             found += keys.len();
//!             async { Ok::<(), ClientError>(()) }
//!         })
//!         .await?;
//!
//!     client.scan_and_delete("test*", None).await?;
//!     redishaus.dispose().await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::RedisHaus;
pub use crate::errors::RedisHausError;

// Re-export centralized config
pub use config::{AppConfig, RedisConfig, ScanConfig, SignalConfig};

// Re-export internal crates used in the public API
pub use client_system;
pub use signal_system;

// Re-export external dependencies used in public API
pub use async_trait;
pub use redis;
