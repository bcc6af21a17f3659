//! Prefix-aware cursor walker over a keyspace
//!
//! A walk issues one SCAN at a time, hands every non-empty page to the
//! caller's handler and waits for it before asking for the next page. The
//! server guarantees full coverage for keys that exist for the whole walk, but
//! a key may be delivered more than once; callers that care must dedupe.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_system::{ClientEvent, SignalManager};

use crate::errors::ClientError;
use crate::options::KeyPrefix;
use crate::scanner::{INITIAL_CURSOR, KeyScanner};
use crate::{debug_log, trace_log};

/// Totals of a finished walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// SCAN round trips issued
    pub cycles: u64,
    /// Keys delivered to the handler, duplicates included
    pub keys_seen: u64,
    /// Keys the server reported as deleted
    pub keys_deleted: u64,
}

/// Cursor walker, configured with an optional prefix and event sink
pub struct ScanWalker<'a, S: KeyScanner + ?Sized> {
    scanner: &'a mut S,
    prefix: KeyPrefix,
    count: usize,
    signals: Option<Arc<SignalManager>>,
    disposed: Option<Arc<AtomicBool>>,
}

impl<S: KeyScanner + ?Sized> std::fmt::Debug for ScanWalker<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanWalker")
            .field("prefix", &self.prefix)
            .field("count", &self.count)
            .field("signals", &self.signals.is_some())
            .finish()
    }
}

impl<'a, S: KeyScanner + ?Sized> ScanWalker<'a, S> {
    pub fn new(scanner: &'a mut S) -> Self {
        Self {
            scanner,
            prefix: KeyPrefix::none(),
            count: config::DEFAULT_SCAN_COUNT,
            signals: None,
            disposed: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<KeyPrefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// COUNT hint sent with every SCAN
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Stop with [`ClientError::Disposed`] once `disposed` is set, checked
    /// before every SCAN and DEL
    pub fn with_disposed(mut self, disposed: Arc<AtomicBool>) -> Self {
        self.disposed = Some(disposed);
        self
    }

    /// Walk every key matching `pattern`, calling `handler` once per non-empty page.
    ///
    /// The first error from SCAN or from the handler ends the walk and is
    /// returned as is.
    pub async fn scan<H, Fut, E>(self, pattern: &str, handler: H) -> Result<ScanSummary, E>
    where
        H: FnMut(Vec<String>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<ClientError>,
    {
        self.walk(pattern, handler, false).await
    }

    /// Walk and delete every key matching `pattern`
    pub async fn scan_and_delete(self, pattern: &str) -> Result<ScanSummary, ClientError> {
        self.walk(pattern, |_| async { Ok::<(), ClientError>(()) }, true)
            .await
    }

    /// Walk, show each page to `handler`, then delete it
    pub async fn scan_and_delete_with<H, Fut, E>(
        self,
        pattern: &str,
        handler: H,
    ) -> Result<ScanSummary, E>
    where
        H: FnMut(Vec<String>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<ClientError>,
    {
        self.walk(pattern, handler, true).await
    }

    async fn walk<H, Fut, E>(
        mut self,
        pattern: &str,
        mut handler: H,
        delete: bool,
    ) -> Result<ScanSummary, E>
    where
        H: FnMut(Vec<String>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<ClientError>,
    {
        if self.count == 0 {
            return Err(ClientError::InvalidArgument(
                "scan count must be greater than 0".to_string(),
            )
            .into());
        }

        let resolved = self.prefix.resolve_pattern(pattern);
        let count_hint = self.count as u64;
        let mut cursor = INITIAL_CURSOR.to_string();
        let mut summary = ScanSummary::default();

        tracing::debug!(pattern = %resolved, count = self.count, delete, "scan started");

        loop {
            self.ensure_open()?;
            let (next_cursor, raw_keys) = self
                .scanner
                .scan_page(&cursor, &resolved, self.count)
                .await?;
            cursor = next_cursor;
            summary.cycles += 1;

            if !raw_keys.is_empty() {
                summary.keys_seen += raw_keys.len() as u64;
                let keys: Vec<String> = raw_keys
                    .iter()
                    .map(|key| self.prefix.strip(key).to_string())
                    .collect();

                if delete {
                    handler(keys.clone()).await?;
                    self.ensure_open()?;
                    self.emit(|| ClientEvent::scan_delete(&keys));
                    summary.keys_deleted += self.scanner.delete_keys(&raw_keys).await?;
                } else {
                    handler(keys).await?;
                }
            }

            let cycle = summary.cycles;
            let keys_seen = summary.keys_seen;
            self.emit(|| ClientEvent::scan_progress(cycle, cycle * count_hint, keys_seen));
            trace_log!(cycle, keys_seen, cursor = %cursor, "scan cycle finished");

            if cursor == INITIAL_CURSOR {
                break;
            }
        }

        debug_log!(
            pattern = %resolved,
            cycles = summary.cycles,
            keys_seen = summary.keys_seen,
            keys_deleted = summary.keys_deleted,
            "scan finished"
        );
        Ok(summary)
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        match &self.disposed {
            Some(disposed) if disposed.load(Ordering::Acquire) => Err(ClientError::Disposed),
            _ => Ok(()),
        }
    }

    fn emit(&self, event: impl FnOnce() -> ClientEvent) {
        if let Some(signals) = &self.signals {
            signals.emit(event());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKeyspace;
    use signal_system::EventType;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn scenario_keyspace(prefix: &str) -> MemoryKeyspace {
        let mut keyspace = MemoryKeyspace::new();
        for i in 0..=2000 {
            keyspace.insert(format!("{prefix}test{i}"), i.to_string());
        }
        for other in ["other1", "other2", "atest", "tes"] {
            keyspace.insert(format!("{prefix}{other}"), "x");
        }
        keyspace.insert("unrelated:test1", "x");
        keyspace
    }

    async fn count_matching(keyspace: &mut MemoryKeyspace, prefix: &str, pattern: &str) -> u64 {
        let mut counter = 0u64;
        ScanWalker::new(keyspace)
            .with_prefix(prefix)
            .with_count(1000)
            .scan(pattern, |keys| {
                counter += keys.len() as u64;
                async { Ok::<(), ClientError>(()) }
            })
            .await
            .unwrap();
        counter
    }

    #[tokio::test]
    async fn test_scan_covers_every_matching_key() {
        let mut keyspace = scenario_keyspace("");

        let total = count_matching(&mut keyspace, "", "test*").await;

        assert_eq!(total, 2001);
        assert!(keyspace.scan_calls() > 1);
    }

    #[tokio::test]
    async fn test_scan_and_delete_then_scan_finds_nothing() {
        let mut keyspace = scenario_keyspace("");

        let summary = ScanWalker::new(&mut keyspace)
            .with_count(1000)
            .scan_and_delete("test*")
            .await
            .unwrap();

        assert_eq!(summary.keys_seen, 2001);
        assert_eq!(summary.keys_deleted, 2001);
        assert_eq!(count_matching(&mut keyspace, "", "test*").await, 0);
        assert!(keyspace.contains("other1"));
        assert!(keyspace.contains("unrelated:test1"));
    }

    #[tokio::test]
    async fn test_prefix_is_added_to_pattern_and_stripped_from_keys() {
        let mut keyspace = MemoryKeyspace::new();
        keyspace.insert("app:test1", "1");
        keyspace.insert("test2", "2");
        let seen = Mutex::new(Vec::new());

        ScanWalker::new(&mut keyspace)
            .with_prefix("app:")
            .scan("test*", |keys| {
                seen.lock().unwrap().extend(keys);
                async { Ok::<(), ClientError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["test1".to_string()]);
    }

    #[tokio::test]
    async fn test_prefixed_delete_removes_namespaced_keys_only() {
        let mut keyspace = scenario_keyspace("app:");
        keyspace.insert("test5", "outside the namespace");
        let deleted_views = Mutex::new(Vec::new());

        let summary = ScanWalker::new(&mut keyspace)
            .with_prefix("app:")
            .scan_and_delete_with("test*", |keys| {
                deleted_views.lock().unwrap().extend(keys);
                async { Ok::<(), ClientError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(summary.keys_deleted, 2001);
        assert!(deleted_views.lock().unwrap().iter().all(|k| k.starts_with("test")));
        assert!(!keyspace.contains("app:test1"));
        assert!(keyspace.contains("test5"));
        assert!(keyspace.contains("app:other1"));
    }

    #[tokio::test]
    async fn test_empty_result_terminates_after_one_cycle() {
        let mut keyspace: MemoryKeyspace = ["alpha", "beta"].into_iter().collect();
        let mut calls = 0;

        let summary = ScanWalker::new(&mut keyspace)
            .scan("test*", |_| {
                calls += 1;
                async { Ok::<(), ClientError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.keys_seen, 0);
    }

    #[tokio::test]
    async fn test_empty_intermediate_pages_keep_walking() {
        let mut keyspace: MemoryKeyspace = ["a1", "a2", "a3", "a4", "z1"].into_iter().collect();
        let mut seen = Vec::new();

        let summary = ScanWalker::new(&mut keyspace)
            .with_count(2)
            .scan("z*", |keys| {
                seen.extend(keys);
                async { Ok::<(), ClientError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(seen, vec!["z1".to_string()]);
        assert_eq!(summary.cycles, 3);
    }

    #[tokio::test]
    async fn test_handler_calls_never_overlap() {
        let mut keyspace: MemoryKeyspace = (0..50).map(|i| format!("k{i:02}")).collect();
        let busy = AtomicBool::new(false);
        let order = Mutex::new(Vec::new());

        ScanWalker::new(&mut keyspace)
            .with_count(7)
            .scan("k*", |keys| {
                let busy = &busy;
                let order = &order;
                async move {
                    assert!(!busy.swap(true, Ordering::SeqCst), "handler calls overlapped");
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    order.lock().unwrap().push(keys[0].clone());
                    busy.store(false, Ordering::SeqCst);
                    Ok::<(), ClientError>(())
                }
            })
            .await
            .unwrap();

        let order = order.lock().unwrap();
        assert_eq!(order.len(), 8);
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[derive(Debug)]
    enum JobError {
        Client(ClientError),
        Stop(usize),
    }

    impl From<ClientError> for JobError {
        fn from(err: ClientError) -> Self {
            JobError::Client(err)
        }
    }

    #[tokio::test]
    async fn test_handler_error_aborts_walk_verbatim() {
        let mut keyspace: MemoryKeyspace = (0..30).map(|i| format!("k{i:02}")).collect();
        let mut pages = 0;

        let result = ScanWalker::new(&mut keyspace)
            .with_count(10)
            .scan("k*", |_| {
                pages += 1;
                let page = pages;
                async move {
                    if page == 2 {
                        Err(JobError::Stop(page))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(matches!(result, Err(JobError::Stop(2))));
        assert_eq!(keyspace.scan_calls(), 2);
    }

    #[tokio::test]
    async fn test_handler_error_stops_delete_before_it_runs() {
        let mut keyspace: MemoryKeyspace = (0..5).map(|i| format!("k{i}")).collect();

        let result = ScanWalker::new(&mut keyspace)
            .scan_and_delete_with("k*", |_| async {
                Err::<(), ClientError>(anyhow::anyhow!("refused").into())
            })
            .await;

        assert!(matches!(result, Err(ClientError::Handler(_))));
        assert_eq!(keyspace.delete_calls(), 0);
        assert_eq!(keyspace.len(), 5);
    }

    #[tokio::test]
    async fn test_scan_error_propagates() {
        let mut keyspace = scenario_keyspace("").fail_scan_on_call(2);

        let result = ScanWalker::new(&mut keyspace)
            .with_count(1000)
            .scan("test*", |_| async { Ok::<(), JobError>(()) })
            .await;

        assert!(matches!(result, Err(JobError::Client(ClientError::Redis(_)))));
    }

    #[tokio::test]
    async fn test_disposal_mid_walk_stops_before_next_round_trip() {
        let mut keyspace = scenario_keyspace("");
        let disposed = Arc::new(AtomicBool::new(false));
        let flag = disposed.clone();

        let result = ScanWalker::new(&mut keyspace)
            .with_count(100)
            .with_disposed(disposed.clone())
            .scan_and_delete_with("test*", move |_| {
                flag.store(true, Ordering::Release);
                async { Ok::<(), ClientError>(()) }
            })
            .await;

        assert!(matches!(result, Err(ClientError::Disposed)));
        assert_eq!(keyspace.scan_calls(), 1);
        assert_eq!(keyspace.delete_calls(), 0);
        assert_eq!(keyspace.len(), 2006);
    }

    #[tokio::test]
    async fn test_disposed_walker_sends_nothing() {
        let mut keyspace: MemoryKeyspace = ["k1"].into_iter().collect();

        let result = ScanWalker::new(&mut keyspace)
            .with_disposed(Arc::new(AtomicBool::new(true)))
            .scan("*", |_| async { Ok::<(), ClientError>(()) })
            .await;

        assert!(matches!(result, Err(ClientError::Disposed)));
        assert_eq!(keyspace.scan_calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_count_is_rejected_before_any_request() {
        let mut keyspace: MemoryKeyspace = ["k1"].into_iter().collect();

        let result = ScanWalker::new(&mut keyspace)
            .with_count(0)
            .scan_and_delete("*")
            .await;

        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
        assert_eq!(keyspace.scan_calls(), 0);
    }

    #[tokio::test]
    async fn test_progress_events_per_cycle() {
        let mut keyspace: MemoryKeyspace = (0..25).map(|i| format!("k{i:02}")).collect();
        let signals = Arc::new(SignalManager::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        signals.add_callback(move |event| sink.lock().unwrap().push(event.clone()));

        ScanWalker::new(&mut keyspace)
            .with_count(10)
            .with_signals(signals)
            .scan_and_delete("k*")
            .await
            .unwrap();

        let events = events.lock().unwrap();
        let progress: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == EventType::ScanProgress)
            .collect();
        let deletes = events
            .iter()
            .filter(|e| e.event_type == EventType::ScanDelete)
            .count();

        assert_eq!(progress.len(), 3);
        assert_eq!(deletes, 3);
        let last = progress[2];
        assert_eq!(last.data_u64("cycle"), Some(3));
        assert_eq!(last.data_u64("scanned_estimate"), Some(30));
        assert_eq!(last.data_u64("keys_seen"), Some(25));
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_fail_walk() {
        let mut keyspace: MemoryKeyspace = ["k1", "k2"].into_iter().collect();
        let signals = Arc::new(SignalManager::new());
        signals.add_callback(|_| panic!("observer bug"));

        let summary = ScanWalker::new(&mut keyspace)
            .with_signals(signals.clone())
            .scan_and_delete("k*")
            .await
            .unwrap();

        assert_eq!(summary.keys_deleted, 2);
        assert!(signals.stats().callback_panics > 0);
    }
}
