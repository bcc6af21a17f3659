//! Convenience re-exports for common RedisHaus usage
//!
//! This prelude module re-exports the most commonly used items from the RedisHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use redishaus::prelude::*;
//!
//! // Now you have access to all the common RedisHaus types and traits
//! ```

// Core RedisHaus components
pub use crate::core::RedisHaus;
pub use crate::errors::RedisHausError;

// Re-export centralized config
pub use config::{AppConfig, RedisConfig, ScanConfig, SignalConfig};

// Re-export client system
pub use client_system::prelude::*;

// Re-export signal system for event handling
pub use signal_system::{CallbackId, ClientEvent, EventType, SignalManager, SignalStats};

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;
