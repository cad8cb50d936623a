//! Telegram channel adapter (stub).
//!
//! Implements the Channel trait for the Telegram Bot API surface the dialog
//! core was written against: reply keyboards and HTML-mode bold spans. In
//! production this would use `teloxide` for long-polling; currently a stub
//! that can receive and send messages via an in-process channel, which is
//! also how the tests drive it.

use async_trait::async_trait;
use ordbok_core::channel::Channel;
use ordbok_core::error::ChannelError;
use ordbok_core::reply::{Inbound, Reply};
use tokio::sync::mpsc;
use tracing::info;

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

/// Telegram channel adapter.
pub struct TelegramChannel {
    config: TelegramConfig,
    /// Sender for injecting test messages.
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<Inbound, ChannelError>>>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            inject_tx: tokio::sync::Mutex::new(None),
        }
    }

    /// Whether the adapter has enough configuration to connect.
    pub fn is_configured(&self) -> bool {
        !self.config.bot_token.is_empty()
    }

    /// Inject a message as if it came from Telegram (for testing).
    pub async fn inject_message(&self, msg: Inbound) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("message channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost("channel not started".into()))
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<Inbound, ChannelError>>, ChannelError> {
        if !self.is_configured() {
            return Err(ChannelError::NotConfigured(
                "telegram bot token is not set".into(),
            ));
        }
        info!("Telegram channel starting (stub mode)");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        // In production: spawn the teloxide long-polling loop here
        Ok(rx)
    }

    async fn send(&self, reply: &Reply) -> Result<(), ChannelError> {
        info!(
            keyboard = ?reply.keyboard,
            formatted = reply.formatted,
            content_len = reply.text.len(),
            "Telegram send (stub)"
        );
        // In production: sendMessage with parse_mode=HTML when formatted,
        // plus a ReplyKeyboardMarkup built from reply.keyboard
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Telegram channel stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }
}
