//! MULTI/EXEC transaction handle
//!
//! Commands are queued client-side and sent as one MULTI ... EXEC block on
//! commit. Both [`Transaction::commit`] and [`Transaction::rollback`] consume
//! the handle, so a finished transaction cannot be used again. Dropping an
//! uncommitted handle discards the queued commands.

use redis::ToRedisArgs;
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::ClientError;
use crate::options::{KeyOptions, KeyPrefix};

pub struct Transaction {
    conn: MultiplexedConnection,
    pipeline: redis::Pipeline,
    prefix: KeyPrefix,
    disposed: Arc<AtomicBool>,
    watching: bool,
    queued: usize,
}

impl Transaction {
    pub(crate) fn new(
        conn: MultiplexedConnection,
        prefix: KeyPrefix,
        disposed: Arc<AtomicBool>,
        watching: bool,
    ) -> Self {
        let mut pipeline = redis::pipe();
        pipeline.atomic();
        Self {
            conn,
            pipeline,
            prefix,
            disposed,
            watching,
            queued: 0,
        }
    }

    /// Whether this transaction runs on a connection with WATCHed keys
    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Number of queued commands, expiries included
    pub fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Queue SET
    pub fn set<V: ToRedisArgs>(&mut self, key: &str, value: V, options: KeyOptions) -> &mut Self {
        let key = self.prefix.apply(key);
        self.pipeline.set(&key, value);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue INCRBY
    pub fn incrby(&mut self, key: &str, delta: i64, options: KeyOptions) -> &mut Self {
        let key = self.prefix.apply(key);
        self.pipeline.incr(&key, delta);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue INCRBYFLOAT
    pub fn incrbyfloat(&mut self, key: &str, delta: f64, options: KeyOptions) -> &mut Self {
        let key = self.prefix.apply(key);
        self.pipeline.cmd("INCRBYFLOAT").arg(&key).arg(delta);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue HINCRBY
    pub fn hincrby(
        &mut self,
        key: &str,
        field: &str,
        delta: i64,
        options: KeyOptions,
    ) -> &mut Self {
        let key = self.prefix.apply(key);
        self.pipeline.hincr(&key, field, delta);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue HINCRBYFLOAT
    pub fn hincrbyfloat(
        &mut self,
        key: &str,
        field: &str,
        delta: f64,
        options: KeyOptions,
    ) -> &mut Self {
        let key = self.prefix.apply(key);
        self.pipeline
            .cmd("HINCRBYFLOAT")
            .arg(&key)
            .arg(field)
            .arg(delta);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue HSET with several fields. An empty slice queues nothing.
    pub fn hmset<F, V>(&mut self, key: &str, fields: &[(F, V)], options: KeyOptions) -> &mut Self
    where
        F: ToRedisArgs,
        V: ToRedisArgs,
    {
        if fields.is_empty() {
            return self;
        }
        let key = self.prefix.apply(key);
        self.pipeline.hset_multiple(&key, fields);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue DEL
    pub fn del(&mut self, key: &str) -> &mut Self {
        self.pipeline.del(self.prefix.apply(key));
        self.queued += 1;
        self
    }

    /// Queue SADD with one member or a slice of members
    pub fn sadd<M: ToRedisArgs>(&mut self, key: &str, members: M, options: KeyOptions) -> &mut Self {
        let key = self.prefix.apply(key);
        self.pipeline.sadd(&key, members);
        self.queued += 1;
        self.queue_expiry(&key, options)
    }

    /// Queue SREM
    pub fn srem<M: ToRedisArgs>(&mut self, key: &str, members: M) -> &mut Self {
        self.pipeline.srem(self.prefix.apply(key), members);
        self.queued += 1;
        self
    }

    /// Run the queued commands atomically
    pub async fn commit(mut self) -> Result<(), ClientError> {
        self.ensure_open()?;
        tracing::debug!(commands = self.queued, watching = self.watching, "committing transaction");
        let replies: Option<Vec<redis::Value>> = self.pipeline.query_async(&mut self.conn).await?;
        match replies {
            Some(_) => Ok(()),
            None => {
                tracing::debug!("transaction aborted by WATCH");
                Err(ClientError::TransactionAborted)
            }
        }
    }

    /// Discard the queued commands and release any WATCH
    pub async fn rollback(mut self) -> Result<(), ClientError> {
        self.ensure_open()?;
        if self.watching {
            let _: () = redis::cmd("UNWATCH").query_async(&mut self.conn).await?;
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(ClientError::Disposed);
        }
        Ok(())
    }

    fn queue_expiry(&mut self, key: &str, options: KeyOptions) -> &mut Self {
        if let Some(seconds) = options.expire_seconds() {
            self.pipeline.expire(key, seconds);
            self.queued += 1;
        }
        self
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("prefix", &self.prefix)
            .field("watching", &self.watching)
            .field("queued", &self.queued)
            .finish()
    }
}
