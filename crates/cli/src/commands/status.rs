//! `ordbok status` — table row counts.

use ordbok_config::AppConfig;
use ordbok_core::error::{Error, Result};
use ordbok_store::{RecordStore, TablePaths};
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    let store = RecordStore::open(TablePaths::in_dir(&config.data_dir))?;
    let (verbs, suggestions, contacts) = store.counts().await;

    println!("Data directory: {}", config.data_dir.display());
    println!("  Dictionary:  {verbs} rows");
    println!("  Suggestions: {suggestions} rows");
    println!("  Contacts:    {contacts} rows");
    Ok(())
}
