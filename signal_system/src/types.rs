//! Type definitions for signal system

use crate::event::ClientEvent;

use std::sync::Arc;

/// Event observer. Runs synchronously inside `emit` and must not block.
/// It may add or remove callbacks; those changes apply from the next event.
pub type EventCallback = Arc<dyn Fn(&ClientEvent) + Send + Sync>;
