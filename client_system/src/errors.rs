//! Error types for client operations
//!
//! This module defines all error types that can occur
//! during client operations and Redis interactions.

use thiserror::Error;

/// Client system errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Client disposed")]
    Disposed,

    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    #[error("Transaction aborted: a watched key changed before EXEC")]
    TransactionAborted,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Scan handler failed: {0}")]
    Handler(#[from] anyhow::Error),
}
