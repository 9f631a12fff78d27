//! Init command - write a default config and create the database

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::ProductStore;
use std::path::Path;
use tracing::info;

/// Create `config_path` with defaults and initialize the database next to it
pub async fn cmd_init(config_path: &Path, force: bool) -> Result<Config> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    let config = Config {
        paths: Config::paths_for(config_path),
        ..Config::default()
    };
    config.save()?;

    let store = ProductStore::open(&config.paths.db_file).await?;
    store.close().await;

    info!("Initialized pricewatch in {:?}", config.paths.base_dir);
    Ok(config)
}
