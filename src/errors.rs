//! Error types for the RedisHaus crate
//!
//! This module contains all error types that can be returned by RedisHaus operations.

use client_system::ClientError;
use config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedisHausError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Unexpected PING reply: {0}")]
    UnexpectedPing(String),
}
