//! Convenience re-exports for common client-system usage

// Core client system components
pub use crate::batch::Batch;
pub use crate::client::RedisClient;
pub use crate::errors::ClientError;
pub use crate::memory::MemoryKeyspace;
pub use crate::options::{KeyOptions, KeyPrefix};
pub use crate::scan::{ScanSummary, ScanWalker};
pub use crate::scanner::KeyScanner;
pub use crate::transaction::Transaction;

// Re-export centralized config
pub use config::{RedisConfig, ScanConfig};

// Common external dependencies
pub use async_trait::async_trait;
pub use redis;
pub use tokio;
