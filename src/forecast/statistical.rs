//! Local statistical forecaster
//!
//! Baseline predictor used when no external predictor answers. It projects
//! the mean of the recent window forward along a half-split trend, adds
//! calendar seasonality and a location term, then applies the per-model
//! shift and a bounded jitter.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::debug;

use super::engine::{PredictorError, UsagePredictor};
use super::features::{feature_vector, location_adjustment, seasonal_component, trend_per_day};
use super::noise::NoiseSource;
use crate::clock::Clock;
use crate::domain::{
    mean, normalize_usage, DailyUsage, ModelPrediction, PredictionInput, PredictionSource,
};
use crate::repo::HistoricalStore;

/// Jitter bound on the point estimate, as a fraction of average usage
pub const POINT_JITTER: f64 = 0.025;
/// Jitter bound on each series point
pub const SERIES_JITTER: f64 = 0.015;

/// Summary statistics of a historical window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub average: f64,
    pub trend_per_day: f64,
    pub window_len: usize,
}

impl HistoryStats {
    pub fn from_history(history: &[DailyUsage]) -> Self {
        let values: Vec<f64> = history.iter().map(|p| p.usage).collect();
        Self {
            average: mean(&values),
            trend_per_day: trend_per_day(&values),
            window_len: values.len(),
        }
    }
}

pub struct StatisticalForecaster {
    store: Arc<HistoricalStore>,
    window: usize,
    reference: (f64, f64),
    noise: Arc<dyn NoiseSource>,
    clock: Arc<dyn Clock>,
}

impl StatisticalForecaster {
    pub fn new(
        store: Arc<HistoricalStore>,
        window: usize,
        reference: (f64, f64),
        noise: Arc<dyn NoiseSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            window,
            reference,
            noise,
            clock,
        }
    }

    /// Forecast from an explicit history window, anchored at `today`.
    pub fn forecast(
        &self,
        input: &PredictionInput,
        history: &[DailyUsage],
        today: NaiveDate,
    ) -> ModelPrediction {
        let stats = HistoryStats::from_history(history);
        let avg = stats.average;
        let days_ahead = (input.target_date - today).num_days();

        let location = location_adjustment(input.latitude, input.longitude, self.reference, avg);
        let model_shift = input.model.adjustment_fraction() * avg;

        let point = avg
            + stats.trend_per_day * days_ahead as f64
            + seasonal_component(input.target_date, avg)
            + location
            + model_shift
            + self.jitter(avg, POINT_JITTER);

        let forecast_data = (1..=days_ahead.max(0))
            .map(|i| {
                let date = today + Duration::days(i);
                let value = avg
                    + stats.trend_per_day * i as f64
                    + seasonal_component(date, avg)
                    + location
                    + model_shift
                    + self.jitter(avg, SERIES_JITTER);
                DailyUsage::new(date, normalize_usage(value))
            })
            .collect();

        debug!(
            region = %input.region,
            model = %input.model,
            average = avg,
            trend_per_day = stats.trend_per_day,
            window_len = stats.window_len,
            days_ahead,
            "statistical forecast computed"
        );

        ModelPrediction {
            predicted_usage: normalize_usage(point),
            model_type: input.model.to_string(),
            historical_data: history.to_vec(),
            forecast_data,
            features_used: Some(feature_vector(
                input.target_date,
                input.latitude,
                input.longitude,
            )),
        }
    }

    fn jitter(&self, average: f64, bound: f64) -> f64 {
        average * bound * self.noise.sample()
    }
}

#[async_trait]
impl UsagePredictor for StatisticalForecaster {
    fn label(&self) -> String {
        "statistical".to_string()
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Statistical
    }

    async fn predict(&self, input: &PredictionInput) -> Result<ModelPrediction, PredictorError> {
        let history = self.store.recent_daily_usage(&input.region, self.window);
        Ok(self.forecast(input, &history, self.clock.today()))
    }
}
