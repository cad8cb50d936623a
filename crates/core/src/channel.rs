//! Channel trait — the abstraction over chat transports.
//!
//! A Channel connects Ordbok to a messaging surface (CLI, Telegram). It
//! receives free-text messages from callers and renders replies back.

use crate::error::ChannelError;
use crate::reply::{Inbound, Reply};
use async_trait::async_trait;

/// The core Channel trait.
///
/// Implementations handle transport-specific connection logic, keyboard
/// rendering, and markup formatting. The dialog core never sees any of that:
/// it consumes `Inbound` and produces `Reply`.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "telegram", "cli").
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    ///
    /// Returns a receiver that yields incoming messages. The channel
    /// implementation handles polling or terminal input internally.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<Inbound, ChannelError>>,
        ChannelError,
    >;

    /// Render a reply back to the caller.
    async fn send(&self, reply: &Reply) -> std::result::Result<(), ChannelError>;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }
}
