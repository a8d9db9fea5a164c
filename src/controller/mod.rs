pub mod orchestrator;
pub mod validation;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::forecast::{
    noise_from_config, ExternalPredictor, ForecastEngine, ModelCatalog, StatisticalForecaster,
    TemplateSummarizer, UsagePredictor,
};
use crate::repo::{HistoricalStore, Repositories};

pub use orchestrator::{ForecastError, ForecastOrchestrator};
pub use validation::{Coordinate, FieldErrors, ForecastForm};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub orchestrator: Arc<ForecastOrchestrator>,
    pub repos: Arc<Repositories>,
    pub catalog: Arc<ModelCatalog>,
}

impl AppState {
    /// Build the state from configuration and load the historical file
    /// before serving.
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Arc::new(Repositories::new(&cfg));

        let store = repos.usage.clone();
        let records = tokio::task::spawn_blocking(move || store.record_count()).await?;
        if records == 0 {
            warn!(path = %cfg.data.csv_path.display(), "no historical usage available, forecasts will use a zero baseline");
        }

        Ok(Self::with_parts(cfg, repos, Arc::new(SystemClock)))
    }

    /// Assemble the state around an existing store and clock.
    pub fn with_parts(cfg: Config, repos: Arc<Repositories>, clock: Arc<dyn Clock>) -> Self {
        let store: Arc<HistoricalStore> = repos.usage.clone();

        let external: Arc<dyn UsagePredictor> = Arc::new(ExternalPredictor::new(&cfg.predictor));
        let statistical: Arc<dyn UsagePredictor> = Arc::new(StatisticalForecaster::new(
            store.clone(),
            cfg.data.history_window_days,
            (
                cfg.forecast.reference_latitude,
                cfg.forecast.reference_longitude,
            ),
            noise_from_config(&cfg.forecast),
            clock.clone(),
        ));
        let engine = Arc::new(ForecastEngine::new(vec![external, statistical]));

        info!(
            stages = ?engine.stage_labels(),
            predictor_enabled = cfg.predictor.enabled,
            scripts = cfg.predictor.scripts.len(),
            jitter = ?cfg.forecast.jitter,
            "forecast engine ready"
        );

        let orchestrator = Arc::new(ForecastOrchestrator::new(
            engine,
            store,
            Arc::new(TemplateSummarizer),
            clock,
            cfg.data.history_window_days,
            cfg.forecast.max_horizon_days,
        ));
        let catalog = Arc::new(ModelCatalog::new(cfg.predictor.models_dir.clone()));

        Self {
            cfg,
            orchestrator,
            repos,
            catalog,
        }
    }
}
