use crate::event::ClientEvent;
use crate::types::EventCallback;
use config::SignalConfig;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Handle returned by [`SignalManager::add_callback`], used to remove the callback again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(Uuid);

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalStats {
    pub emitted: u64,
    pub callback_panics: u64,
}

/// Signal manager for client event notifications
pub struct SignalManager {
    enabled: bool,
    callbacks: std::sync::RwLock<Vec<(CallbackId, EventCallback)>>,
    emitted: AtomicU64,
    callback_panics: AtomicU64,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("enabled", &self.enabled)
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self {
            enabled: true,
            callbacks: std::sync::RwLock::new(Vec::new()),
            emitted: AtomicU64::new(0),
            callback_panics: AtomicU64::new(0),
        }
    }

    pub fn with_config(config: &SignalConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Add event callback
    pub fn add_callback<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = CallbackId(Uuid::new_v4());
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push((id, Arc::new(callback)));
        }
        id
    }

    /// Remove a previously added callback, returns false if it was not registered
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        match self.callbacks.write() {
            Ok(mut callbacks) => {
                let before = callbacks.len();
                callbacks.retain(|(cb_id, _)| *cb_id != id);
                callbacks.len() != before
            }
            Err(_) => false,
        }
    }

    /// Emit event to all subscribers
    ///
    /// Never fails: a panicking callback is logged and skipped.
    pub fn emit(&self, event: ClientEvent) {
        if !self.enabled {
            return;
        }
        self.emitted.fetch_add(1, Ordering::Relaxed);

        // Callbacks run without the lock held
        let callbacks: Vec<(CallbackId, EventCallback)> = match self.callbacks.read() {
            Ok(callbacks) => callbacks.clone(),
            Err(_) => return,
        };

        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                self.callback_panics.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    callback = ?id,
                    message = %event.message,
                    "event callback panicked"
                );
            }
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn stats(&self) -> SignalStats {
        SignalStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
        }
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}
