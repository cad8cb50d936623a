//! CLI channel — interactive terminal-based chat.
//!
//! This is the simplest transport: reads from stdin, writes to stdout.
//! Bold markup is stripped (a terminal has no inline emphasis here) and the
//! keyboard layout is rendered as a hint line listing the available buttons.

use async_trait::async_trait;
use ordbok_core::channel::Channel;
use ordbok_core::error::ChannelError;
use ordbok_core::reply::{CallerId, Inbound, Keyboard, Reply};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    caller_id: CallerId,
    caller_name: Option<String>,
}

impl CliChannel {
    /// Create a channel whose inbound messages carry the given identity.
    pub fn new(caller_id: CallerId, caller_name: Option<String>) -> Self {
        Self {
            caller_id,
            caller_name,
        }
    }

    /// Render a reply to plain terminal text.
    fn render(reply: &Reply) -> String {
        let text = if reply.formatted {
            reply.text.replace("<b>", "").replace("</b>", "")
        } else {
            reply.text.clone()
        };
        format!("{text}\n[{}]", keyboard_hint(reply.keyboard))
    }
}

fn keyboard_hint(keyboard: Keyboard) -> &'static str {
    match keyboard {
        Keyboard::Main => "start | suggest-word",
        Keyboard::AdminMain => "start | add | suggestions | contacts",
        Keyboard::SuggestionsMenu => {
            "add-by-index | add-all | delete-by-index | delete-all | edit-by-index | back"
        }
        Keyboard::CancelOnly => "cancel",
        Keyboard::BackOnly => "back",
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<Inbound, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let caller_id = self.caller_id.clone();
        let caller_name = self.caller_name.clone();

        tokio::spawn(async move {
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
                            break;
                        }

                        let msg =
                            Inbound::new(caller_id.clone(), caller_name.clone(), line);
                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx
                            .send(Err(ChannelError::ConnectionLost(e.to_string())))
                            .await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, reply: &Reply) -> Result<(), ChannelError> {
        println!("{}", Self::render(reply));
        Ok(())
    }
}
