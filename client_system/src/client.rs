//! Redis client implementation
//!
//! This module provides the main RedisClient struct
//! for Redis operations and connection management.

use crate::batch::Batch;
use crate::errors::ClientError;
use crate::options::{KeyOptions, KeyPrefix};
use crate::scan::{ScanSummary, ScanWalker};
use crate::transaction::Transaction;
use config::{DEFAULT_SCAN_COUNT, RedisConfig, ScanConfig};
use redis::aio::MultiplexedConnection;
use redis::{
    AsyncCommands, Client, ConnectionAddr, ConnectionInfo, FromRedisValue, RedisConnectionInfo,
    ToRedisArgs,
};
use signal_system::{ClientEvent, EventType, SignalManager};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

enum ConnectionSlot {
    Idle,
    Open(MultiplexedConnection),
    Disposed,
}

/// Prefix-scoped Redis client
#[derive(Clone)]
pub struct RedisClient {
    client: Arc<Client>,
    config: Arc<RedisConfig>,
    prefix: KeyPrefix,
    scan_count: usize,
    signals: Option<Arc<SignalManager>>,
    connection: Arc<RwLock<ConnectionSlot>>,
    disposed: Arc<AtomicBool>,
}

impl Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = {
            match self.connection.try_read() {
                Ok(slot) => match *slot {
                    ConnectionSlot::Idle => "idle",
                    ConnectionSlot::Open(_) => "connected",
                    ConnectionSlot::Disposed => "disposed",
                },
                Err(_) => "lock_error",
            }
        };

        f.debug_struct("RedisClient")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("prefix", &self.prefix)
            .field("scan_count", &self.scan_count)
            .field("connection", &connection_status)
            .finish()
    }
}

impl RedisClient {
    /// Create a new client. No connection is made until the first command.
    pub fn new(config: RedisConfig) -> Result<Self, ClientError> {
        let client = Client::open(Self::connection_info(&config))?;

        Ok(Self {
            client: Arc::new(client),
            prefix: KeyPrefix::from(config.prefix.clone()),
            config: Arc::new(config),
            scan_count: DEFAULT_SCAN_COUNT,
            signals: None,
            connection: Arc::new(RwLock::new(ConnectionSlot::Idle)),
            disposed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Connection parameters for `config`, passed to the driver as is
    pub fn connection_info(config: &RedisConfig) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.database,
                password: config.auth_password().map(str::to_string),
                ..RedisConnectionInfo::default()
            },
        }
    }

    pub fn with_scan_config(mut self, scan: &ScanConfig) -> Self {
        self.scan_count = scan.count;
        self
    }

    /// Attach an event sink for connection and scan events
    pub fn with_signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Get current configuration
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    pub fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.signals.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Get or create the shared connection
    async fn get_connection(&self) -> Result<MultiplexedConnection, ClientError> {
        self.ensure_open()?;
        {
            let slot = self.connection.read().await;
            match &*slot {
                ConnectionSlot::Open(connection) => return Ok(connection.clone()),
                ConnectionSlot::Disposed => return Err(ClientError::Disposed),
                ConnectionSlot::Idle => {}
            }
        }

        let mut slot = self.connection.write().await;
        match &*slot {
            ConnectionSlot::Open(connection) => Ok(connection.clone()),
            ConnectionSlot::Disposed => Err(ClientError::Disposed),
            ConnectionSlot::Idle => {
                let connection = self.open_connection().await?;
                *slot = ConnectionSlot::Open(connection.clone());
                tracing::info!(
                    host = %self.config.host,
                    port = self.config.port,
                    database = self.config.database,
                    "redis connection opened"
                );
                self.emit(|| ClientEvent::new(EventType::Connected));
                Ok(connection)
            }
        }
    }

    /// Open a connection that is not shared with other callers
    async fn open_connection(&self) -> Result<MultiplexedConnection, ClientError> {
        let timeout_ms = self.config.connection_timeout_ms;
        let connection = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| ClientError::Timeout(timeout_ms))??;
        Ok(connection)
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.is_disposed() {
            return Err(ClientError::Disposed);
        }
        Ok(())
    }

    /// Close the client. Every later call fails with [`ClientError::Disposed`],
    /// as do the next round trips of walks, batches and transactions already
    /// handed out.
    pub async fn dispose(&self) -> Result<(), ClientError> {
        let mut slot = self.connection.write().await;
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let previous = std::mem::replace(&mut *slot, ConnectionSlot::Disposed);
        if let ConnectionSlot::Open(mut connection) = previous {
            let quit: Result<(), redis::RedisError> =
                redis::cmd("QUIT").query_async(&mut connection).await;
            if let Err(err) = quit {
                tracing::debug!(error = %err, "QUIT failed while disposing");
            }
        }
        tracing::info!(host = %self.config.host, port = self.config.port, "redis client disposed");
        self.emit(|| ClientEvent::new(EventType::Disposed));
        Ok(())
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<String, ClientError> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }

    /// Start a pipelined batch on the shared connection
    pub async fn batch(&self) -> Result<Batch, ClientError> {
        let conn = self.get_connection().await?;
        Ok(Batch::new(conn, self.prefix.clone(), self.disposed.clone()))
    }

    /// Start a MULTI/EXEC transaction on the shared connection
    pub async fn transaction(&self) -> Result<Transaction, ClientError> {
        let conn = self.get_connection().await?;
        Ok(Transaction::new(
            conn,
            self.prefix.clone(),
            self.disposed.clone(),
            false,
        ))
    }

    /// WATCH `keys` on a dedicated connection and start a transaction on it.
    ///
    /// Committing fails with [`ClientError::TransactionAborted`] if any watched
    /// key changed in between.
    pub async fn watch(&self, keys: &[&str]) -> Result<Transaction, ClientError> {
        if keys.is_empty() {
            return Err(ClientError::InvalidArgument(
                "watch needs at least one key".to_string(),
            ));
        }
        self.ensure_open()?;

        let mut conn = self.open_connection().await?;
        let watched: Vec<String> = keys.iter().map(|key| self.prefix.apply(key)).collect();
        let _: () = redis::cmd("WATCH")
            .arg(&watched)
            .query_async(&mut conn)
            .await?;
        Ok(Transaction::new(
            conn,
            self.prefix.clone(),
            self.disposed.clone(),
            true,
        ))
    }

    /// Key exists
    pub async fn exists(&self, key: &str) -> Result<bool, ClientError> {
        let mut conn = self.get_connection().await?;
        let exists: bool = conn.exists(self.prefix.apply(key)).await?;
        Ok(exists)
    }

    /// Get a key value
    pub async fn get<T: FromRedisValue>(&self, key: &str) -> Result<T, ClientError> {
        let mut conn = self.get_connection().await?;
        let value: T = conn.get(self.prefix.apply(key)).await?;
        Ok(value)
    }

    /// Set a key value
    pub async fn set<V>(&self, key: &str, value: V, options: KeyOptions) -> Result<(), ClientError>
    where
        V: ToRedisArgs + Send + Sync,
    {
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(&key, value).await?;
        Self::apply_expiry(&mut conn, &key, options).await
    }

    /// Increment an integer value, returns the new value
    pub async fn incrby(
        &self,
        key: &str,
        delta: i64,
        options: KeyOptions,
    ) -> Result<i64, ClientError> {
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let value: i64 = conn.incr(&key, delta).await?;
        Self::apply_expiry(&mut conn, &key, options).await?;
        Ok(value)
    }

    /// Increment a float value, returns the new value
    pub async fn incrbyfloat(
        &self,
        key: &str,
        delta: f64,
        options: KeyOptions,
    ) -> Result<f64, ClientError> {
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let value: f64 = redis::cmd("INCRBYFLOAT")
            .arg(&key)
            .arg(delta)
            .query_async(&mut conn)
            .await?;
        Self::apply_expiry(&mut conn, &key, options).await?;
        Ok(value)
    }

    /// Increment an integer field of a hash
    pub async fn hincrby(
        &self,
        key: &str,
        field: &str,
        delta: i64,
        options: KeyOptions,
    ) -> Result<i64, ClientError> {
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let value: i64 = conn.hincr(&key, field, delta).await?;
        Self::apply_expiry(&mut conn, &key, options).await?;
        Ok(value)
    }

    /// Increment a float field of a hash
    pub async fn hincrbyfloat(
        &self,
        key: &str,
        field: &str,
        delta: f64,
        options: KeyOptions,
    ) -> Result<f64, ClientError> {
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let value: f64 = redis::cmd("HINCRBYFLOAT")
            .arg(&key)
            .arg(field)
            .arg(delta)
            .query_async(&mut conn)
            .await?;
        Self::apply_expiry(&mut conn, &key, options).await?;
        Ok(value)
    }

    /// Set several hash fields at once
    pub async fn hmset<F, V>(
        &self,
        key: &str,
        fields: &[(F, V)],
        options: KeyOptions,
    ) -> Result<(), ClientError>
    where
        F: ToRedisArgs + Send + Sync,
        V: ToRedisArgs + Send + Sync,
    {
        if fields.is_empty() {
            return Err(ClientError::InvalidArgument(
                "hmset needs at least one field".to_string(),
            ));
        }
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let _: () = conn.hset_multiple(&key, fields).await?;
        Self::apply_expiry(&mut conn, &key, options).await
    }

    /// Get every field of a hash, e.g. as `HashMap<String, String>`
    pub async fn hgetall<T: FromRedisValue>(&self, key: &str) -> Result<T, ClientError> {
        let mut conn = self.get_connection().await?;
        let hash: T = conn.hgetall(self.prefix.apply(key)).await?;
        Ok(hash)
    }

    /// Delete a key, returns whether it existed
    pub async fn del(&self, key: &str) -> Result<bool, ClientError> {
        let mut conn = self.get_connection().await?;
        let deleted: i64 = conn.del(self.prefix.apply(key)).await?;
        Ok(deleted > 0)
    }

    /// Add one member or a slice of members to a set, returns how many were new
    pub async fn sadd<M>(&self, key: &str, members: M, options: KeyOptions) -> Result<i64, ClientError>
    where
        M: ToRedisArgs + Send + Sync,
    {
        let key = self.prefix.apply(key);
        let mut conn = self.get_connection().await?;
        let added: i64 = conn.sadd(&key, members).await?;
        Self::apply_expiry(&mut conn, &key, options).await?;
        Ok(added)
    }

    /// Get the members of a set, e.g. as `Vec<String>`
    pub async fn smembers<T: FromRedisValue>(&self, key: &str) -> Result<T, ClientError> {
        let mut conn = self.get_connection().await?;
        let members: T = conn.smembers(self.prefix.apply(key)).await?;
        Ok(members)
    }

    /// Remove members from a set, returns how many were removed
    pub async fn srem<M>(&self, key: &str, members: M) -> Result<i64, ClientError>
    where
        M: ToRedisArgs + Send + Sync,
    {
        let mut conn = self.get_connection().await?;
        let removed: i64 = conn.srem(self.prefix.apply(key), members).await?;
        Ok(removed)
    }

    /// Remaining time to live in seconds (-1 without expiry, -2 if missing)
    pub async fn ttl(&self, key: &str) -> Result<i64, ClientError> {
        let mut conn = self.get_connection().await?;
        let ttl: i64 = conn.ttl(self.prefix.apply(key)).await?;
        Ok(ttl)
    }

    /// Walk every key matching `pattern` in the client's namespace.
    ///
    /// `handler` sees keys without the prefix. `count` overrides the
    /// configured COUNT hint.
    pub async fn scan<H, Fut, E>(
        &self,
        pattern: &str,
        count: Option<usize>,
        handler: H,
    ) -> Result<ScanSummary, E>
    where
        H: FnMut(Vec<String>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<ClientError>,
    {
        let count = self.scan_count(count)?;
        let mut conn = self.get_connection().await?;
        self.walker(&mut conn, count).scan(pattern, handler).await
    }

    /// Delete every key matching `pattern` in the client's namespace
    pub async fn scan_and_delete(
        &self,
        pattern: &str,
        count: Option<usize>,
    ) -> Result<ScanSummary, ClientError> {
        let count = self.scan_count(count)?;
        let mut conn = self.get_connection().await?;
        self.walker(&mut conn, count).scan_and_delete(pattern).await
    }

    /// Like [`RedisClient::scan_and_delete`], showing each page to `handler` first
    pub async fn scan_and_delete_with<H, Fut, E>(
        &self,
        pattern: &str,
        count: Option<usize>,
        handler: H,
    ) -> Result<ScanSummary, E>
    where
        H: FnMut(Vec<String>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<ClientError>,
    {
        let count = self.scan_count(count)?;
        let mut conn = self.get_connection().await?;
        self.walker(&mut conn, count)
            .scan_and_delete_with(pattern, handler)
            .await
    }

    fn walker<'c>(
        &self,
        conn: &'c mut MultiplexedConnection,
        count: usize,
    ) -> ScanWalker<'c, MultiplexedConnection> {
        let walker = ScanWalker::new(conn)
            .with_prefix(self.prefix.clone())
            .with_count(count)
            .with_disposed(self.disposed.clone());
        match &self.signals {
            Some(signals) => walker.with_signals(signals.clone()),
            None => walker,
        }
    }

    fn scan_count(&self, count: Option<usize>) -> Result<usize, ClientError> {
        match count.unwrap_or(self.scan_count) {
            0 => Err(ClientError::InvalidArgument(
                "scan count must be greater than 0".to_string(),
            )),
            count => Ok(count),
        }
    }

    async fn apply_expiry(
        conn: &mut MultiplexedConnection,
        key: &str,
        options: KeyOptions,
    ) -> Result<(), ClientError> {
        if let Some(seconds) = options.expire_seconds() {
            let _: () = conn.expire(key, seconds).await?;
        }
        Ok(())
    }

    fn emit(&self, event: impl FnOnce() -> ClientEvent) {
        if let Some(signals) = &self.signals {
            signals.emit(event());
        }
    }
}
