//! Pipelined read batch

use redis::FromRedisValue;
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::ClientError;
use crate::options::KeyPrefix;

/// Reads queued client-side and sent in one round trip.
///
/// Not atomic: other clients' commands may interleave. Consumed by
/// [`Batch::exec`].
pub struct Batch {
    conn: MultiplexedConnection,
    pipeline: redis::Pipeline,
    prefix: KeyPrefix,
    disposed: Arc<AtomicBool>,
    queued: usize,
}

impl Batch {
    pub(crate) fn new(
        conn: MultiplexedConnection,
        prefix: KeyPrefix,
        disposed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            conn,
            pipeline: redis::pipe(),
            prefix,
            disposed,
            queued: 0,
        }
    }

    /// Queue EXISTS
    pub fn exists(&mut self, key: &str) -> &mut Self {
        self.pipeline.exists(self.prefix.apply(key));
        self.queued += 1;
        self
    }

    /// Queue GET
    pub fn get(&mut self, key: &str) -> &mut Self {
        self.pipeline.get(self.prefix.apply(key));
        self.queued += 1;
        self
    }

    /// Queue HGETALL
    pub fn hgetall(&mut self, key: &str) -> &mut Self {
        self.pipeline.hgetall(self.prefix.apply(key));
        self.queued += 1;
        self
    }

    /// Queue SMEMBERS
    pub fn smembers(&mut self, key: &str) -> &mut Self {
        self.pipeline.smembers(self.prefix.apply(key));
        self.queued += 1;
        self
    }

    pub fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Send every queued command and decode the replies in queue order,
    /// e.g. into `(Option<String>, Option<String>)` or `Vec<redis::Value>`.
    pub async fn exec<T: FromRedisValue>(mut self) -> Result<T, ClientError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(ClientError::Disposed);
        }
        tracing::debug!(commands = self.queued, "executing batch");
        let replies: T = self.pipeline.query_async(&mut self.conn).await?;
        Ok(replies)
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("prefix", &self.prefix)
            .field("queued", &self.queued)
            .finish()
    }
}
