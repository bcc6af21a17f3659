//! Client system for prefix-scoped Redis access
//!
//! This crate provides the Redis client wrapper, the cursor-based
//! key walker with bulk delete, and batch and transaction handles.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod batch;
pub mod client;
pub mod errors;
pub mod memory;
pub mod options;
pub mod prelude;
pub mod scan;
pub mod scanner;
pub mod transaction;

// Re-export centralized config
pub use config::{RedisConfig, ScanConfig};

pub use batch::Batch;
pub use client::RedisClient;
pub use errors::ClientError;
pub use memory::MemoryKeyspace;
pub use options::{KeyOptions, KeyPrefix};
pub use scan::{ScanSummary, ScanWalker};
pub use scanner::{INITIAL_CURSOR, KeyScanner};
pub use transaction::Transaction;
