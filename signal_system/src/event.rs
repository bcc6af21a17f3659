//! Client event types and definitions
//!
//! This module defines the structure of client events
//! that flow through the signal system.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Client event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// One SCAN cycle finished
    ScanProgress,
    /// A scanned batch is about to be deleted
    ScanDelete,
    /// Connection opened
    Connected,
    /// Client disposed
    Disposed,
}

impl EventType {
    /// Stable message name carried by events of this type
    pub fn message(&self) -> &'static str {
        match self {
            EventType::ScanProgress => "redis#scan",
            EventType::ScanDelete => "redis#scanDel",
            EventType::Connected => "redis#connect",
            EventType::Disposed => "redis#dispose",
        }
    }
}

/// Client event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEvent {
    /// Event type
    pub event_type: EventType,
    /// Message name, e.g. `redis#scan`
    pub message: String,
    /// Structured event data
    pub data: Value,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ClientEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            message: event_type.message().to_string(),
            data: Value::Null,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Progress of a scan walk after `cycle` SCAN round trips
    ///
    /// `scanned_estimate` is `cycle * count_hint`, which over- or under-counts
    /// whenever the server ignores the hint. `keys_seen` is the exact number of
    /// keys delivered so far.
    pub fn scan_progress(cycle: u64, scanned_estimate: u64, keys_seen: u64) -> Self {
        Self::new(EventType::ScanProgress).with_data(json!({
            "cycle": cycle,
            "scanned_estimate": scanned_estimate,
            "keys_seen": keys_seen,
        }))
    }

    /// Keys about to be deleted by a scan-and-delete walk
    pub fn scan_delete(keys: &[String]) -> Self {
        Self::new(EventType::ScanDelete).with_data(json!({ "keys": keys }))
    }

    /// Read an unsigned integer field from the event data
    pub fn data_u64(&self, field: &str) -> Option<u64> {
        self.data.get(field).and_then(Value::as_u64)
    }
}
