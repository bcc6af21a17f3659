//! The two keyspace primitives the scan walker depends on

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use crate::errors::ClientError;

/// Cursor value that both starts and ends a SCAN iteration
pub const INITIAL_CURSOR: &str = "0";

/// Cursor-based key enumeration plus bulk delete
#[async_trait]
pub trait KeyScanner: Send {
    /// One `SCAN cursor MATCH pattern COUNT count` round trip.
    ///
    /// Returns the next cursor and the keys of this page, exactly as stored
    /// on the server. A page may be empty while the cursor is not yet `"0"`.
    async fn scan_page(
        &mut self,
        cursor: &str,
        pattern: &str,
        count: usize,
    ) -> Result<(String, Vec<String>), ClientError>;

    /// Delete server-side keys, returning how many existed
    async fn delete_keys(&mut self, keys: &[String]) -> Result<u64, ClientError>;
}

#[async_trait]
impl KeyScanner for MultiplexedConnection {
    async fn scan_page(
        &mut self,
        cursor: &str,
        pattern: &str,
        count: usize,
    ) -> Result<(String, Vec<String>), ClientError> {
        let (next_cursor, keys): (String, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(self)
            .await?;
        Ok((next_cursor, keys))
    }

    async fn delete_keys(&mut self, keys: &[String]) -> Result<u64, ClientError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let deleted: u64 = self.del(keys).await?;
        Ok(deleted)
    }
}
