use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::validation::{validate_form, FieldErrors, ForecastForm};
use crate::clock::Clock;
use crate::domain::{build_chart_series, ForecastRequest, ForecastResult, PredictionInput};
use crate::forecast::{resolve_model, ForecastEngine, Summarizer, SummaryContext};
use crate::repo::HistoricalStore;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("invalid request: {0:?}")]
    Validation(FieldErrors),

    #[error("forecast failed: {0}")]
    Internal(String),
}

/// Per-request pipeline: validate, resolve the model, predict with fallback,
/// enrich with real history, summarize.
#[derive(Clone)]
pub struct ForecastOrchestrator {
    engine: Arc<ForecastEngine>,
    store: Arc<HistoricalStore>,
    summarizer: Arc<dyn Summarizer>,
    clock: Arc<dyn Clock>,
    window: usize,
    max_horizon_days: u32,
}

impl ForecastOrchestrator {
    pub fn new(
        engine: Arc<ForecastEngine>,
        store: Arc<HistoricalStore>,
        summarizer: Arc<dyn Summarizer>,
        clock: Arc<dyn Clock>,
        window: usize,
        max_horizon_days: u32,
    ) -> Self {
        Self {
            engine,
            store,
            summarizer,
            clock,
            window,
            max_horizon_days,
        }
    }

    pub async fn predict(&self, form: ForecastForm) -> Result<ForecastResult, ForecastError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("forecast", %request_id, region = tracing::field::Empty);

        let request = span
            .in_scope(|| validate_form(&form, self.clock.today(), self.max_horizon_days))
            .map_err(ForecastError::Validation)?;
        span.record("region", request.region.as_str());

        // Stages after validation run on their own task so a panic is
        // contained and reported as an internal error.
        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(request).await }.instrument(span.clone()));

        match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                error!(parent: &span, error = %join_error, "forecast task aborted");
                Err(ForecastError::Internal(join_error.to_string()))
            }
        }
    }

    async fn run(&self, request: ForecastRequest) -> Result<ForecastResult, ForecastError> {
        let resolved = resolve_model(request.model_choice, &request.region);
        let input = PredictionInput::new(&request, resolved.kind);

        let (prediction, source) = self.engine.predict(&input).await.map_err(|e| {
            error!(error = %e, "every predictor failed");
            ForecastError::Internal(e.to_string())
        })?;

        let real_history = self.store.recent_daily_usage(&request.region, self.window);
        let historical = if real_history.is_empty() {
            prediction.historical_data
        } else {
            real_history
        };

        let summary = self.summarizer.summarize(&SummaryContext {
            region: &request.region,
            predicted_usage: prediction.predicted_usage,
            target_date: request.target_date,
            model: resolved.kind,
            historical: &historical,
            forecast: &prediction.forecast_data,
        });

        info!(
            model = %resolved.kind,
            %source,
            predicted_usage = prediction.predicted_usage,
            historical_points = historical.len(),
            forecast_points = prediction.forecast_data.len(),
            "forecast completed"
        );

        Ok(ForecastResult {
            series: build_chart_series(&historical, &prediction.forecast_data),
            region: request.region,
            latitude: request.latitude,
            longitude: request.longitude,
            target_date: request.target_date,
            predicted_usage: prediction.predicted_usage,
            model_used: resolved.kind.to_string(),
            model_reason: resolved.reason,
            summary,
            prediction_source: source,
            features_used: prediction.features_used,
        })
    }
}
