//! Signal system for client event handling
//!
//! This crate provides fire-and-forget event delivery for
//! Redis client operations in the RedisHaus ecosystem.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use event::{ClientEvent, EventType};
pub use manager::{CallbackId, SignalManager, SignalStats};
pub use types::EventCallback;
