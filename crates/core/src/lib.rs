//! # Ordbok Core
//!
//! Domain types, traits, and error definitions for the Ordbok dialog engine.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The transport boundary is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping transports (CLI, Telegram) via configuration
//! - Easy testing with injected messages
//! - Clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod record;
pub mod reply;

// Re-export key types at crate root for ergonomics
pub use channel::Channel;
pub use error::{ChannelError, Error, Result, StoreError};
pub use record::{Contact, Suggestion, VerbEntry};
pub use reply::{CallerId, Inbound, Keyboard, Reply};
