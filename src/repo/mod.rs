pub mod usage;

use std::sync::Arc;

use crate::config::Config;

pub use usage::{HistoricalStore, LoadReport, RegionSummary, StoreError, UsageIndex};

pub struct Repositories {
    pub usage: Arc<HistoricalStore>,
}

impl Repositories {
    pub fn new(cfg: &Config) -> Self {
        Self {
            usage: Arc::new(HistoricalStore::new(cfg.data.csv_path.clone())),
        }
    }

    pub fn with_store(usage: Arc<HistoricalStore>) -> Self {
        Self { usage }
    }
}
