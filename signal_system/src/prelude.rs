//! Convenience re-exports for common signal-system usage

// Core signal system components
pub use crate::event::{ClientEvent, EventType};
pub use crate::manager::{CallbackId, SignalManager, SignalStats};
pub use crate::types::EventCallback;

// Re-export centralized config
pub use config::SignalConfig;

// Common external dependencies
pub use serde::{Deserialize, Serialize};
pub use serde_json;
