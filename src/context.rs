//! Process-wide application context
//!
//! Built once per invocation and handed to every command, so the store,
//! fetcher, and notifier share one configuration.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::notify::Notifier;
use crate::store::ProductStore;
use std::sync::Arc;
use std::time::Duration;

pub struct AppContext {
    pub config: Config,
    pub store: ProductStore,
    pub fetcher: Arc<dyn PageFetcher>,
    pub notifier: Notifier,
}

impl AppContext {
    /// Open the database and build the HTTP fetcher described by `config`
    pub async fn open(config: Config) -> Result<Self> {
        let store = ProductStore::open(&config.paths.db_file).await?;
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::new(config, store, fetcher))
    }

    /// Assemble a context from already-built parts
    pub fn new(config: Config, store: ProductStore, fetcher: Arc<dyn PageFetcher>) -> Self {
        let notifier = Notifier::new(config.email.clone());
        Self {
            config,
            store,
            fetcher,
            notifier,
        }
    }

    /// Pause between products within a cycle
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.config.tracking.request_delay_secs.max(0.0))
    }
}
