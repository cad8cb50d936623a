//! `ordbok chat` — interactive dialog session in the terminal.
//!
//! Wires the CLI channel to the dispatcher: every stdin line becomes an
//! inbound message, every reply is rendered back to stdout. `--admin` acts
//! as the privileged caller from the config; otherwise all messages carry
//! the given (or default) sender identity.

use ordbok_channels::CliChannel;
use ordbok_config::AppConfig;
use ordbok_core::channel::Channel;
use ordbok_core::error::{Error, Result};
use ordbok_core::reply::CallerId;
use ordbok_dialog::Dispatcher;
use ordbok_store::{RecordStore, TablePaths};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(config_path: &Path, sender: Option<String>, admin: bool) -> Result<()> {
    let config = AppConfig::load(config_path).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    let store = Arc::new(RecordStore::open(TablePaths::in_dir(&config.data_dir))?);
    let admin_id = CallerId::new(config.admin_id.clone());
    let dispatcher = Dispatcher::new(store, admin_id.clone());

    let caller_id = if admin {
        admin_id
    } else {
        CallerId::new(sender.unwrap_or_else(|| "local-user".into()))
    };
    info!(caller = %caller_id, "chat session starting");
    println!("Type 'start' to begin, 'exit' to quit.");

    let channel = CliChannel::new(caller_id, None);
    let mut rx = channel.start().await?;

    while let Some(incoming) = rx.recv().await {
        match incoming {
            Ok(msg) => {
                let reply = dispatcher.handle(&msg).await;
                channel.send(&reply).await?;
            }
            Err(e) => {
                warn!(error = %e, "channel error, stopping");
                break;
            }
        }
    }

    info!("chat session ended");
    Ok(())
}
