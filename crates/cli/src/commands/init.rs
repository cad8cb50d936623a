//! `ordbok init` — write a default config file and create the empty tables.

use ordbok_config::AppConfig;
use ordbok_core::error::{Error, Result};
use ordbok_store::{RecordStore, TablePaths};
use std::path::Path;
use tracing::info;

pub fn run(config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    if config_path.exists() {
        info!(path = %config_path.display(), "config file already exists, keeping it");
    } else {
        let toml = config.to_toml().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        std::fs::write(config_path, toml)
            .map_err(|e| Error::Internal(format!("failed to write config file: {e}")))?;
        info!(path = %config_path.display(), "config file created");
    }

    // Opening the store creates any absent table with its canonical header.
    let store = RecordStore::open(TablePaths::in_dir(&config.data_dir))?;
    drop(store);
    info!(data_dir = %config.data_dir.display(), "tables ready");

    println!("Initialized. Edit {} and run `ordbok chat`.", config_path.display());
    Ok(())
}
