//! Core RedisHaus functionality
//!
//! This module contains the main RedisHaus struct, which wires the
//! configuration, the client and the signal system together.

use std::sync::Arc;

use client_system::RedisClient;
use config::AppConfig;
use signal_system::{CallbackId, ClientEvent, SignalManager};

use crate::errors::RedisHausError;

/// Main RedisHaus coordinator that owns the client and its event sink
#[derive(Debug)]
pub struct RedisHaus {
    config: AppConfig,
    client: RedisClient,
    signals: Arc<SignalManager>,
}

impl RedisHaus {
    /// Create a new RedisHaus from an explicit configuration
    pub fn new(config: AppConfig) -> Result<Self, RedisHausError> {
        config.validate()?;

        let signals = Arc::new(SignalManager::with_config(&config.signal));
        let client = RedisClient::new(config.redis.clone())?
            .with_scan_config(&config.scan)
            .with_signals(signals.clone());

        Ok(Self {
            config,
            client,
            signals,
        })
    }

    /// Create a new RedisHaus from `REDISHAUS_CONFIG` or `./redishaus.toml`
    pub fn from_env() -> Result<Self, RedisHausError> {
        Self::new(AppConfig::load()?)
    }

    /// Get the client
    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    /// Get the event sink shared with the client
    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    /// Get current configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Subscribe to client events
    pub fn on_event<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.signals.add_callback(callback)
    }

    /// Forward every client event to `tracing` at info level
    pub fn log_events(&self) -> CallbackId {
        self.on_event(|event| {
            tracing::info!(
                message = %event.message,
                data = %event.data,
                timestamp = %event.timestamp.to_rfc3339(),
                "redis event"
            );
        })
    }

    /// Check Redis connectivity
    pub async fn health_check(&self) -> Result<(), RedisHausError> {
        let reply = self.client.ping().await?;
        if reply != "PONG" {
            return Err(RedisHausError::UnexpectedPing(reply));
        }
        Ok(())
    }

    /// Dispose the client; later calls through any clone of it fail fast
    pub async fn dispose(&self) -> Result<(), RedisHausError> {
        self.client.dispose().await?;
        Ok(())
    }
}
