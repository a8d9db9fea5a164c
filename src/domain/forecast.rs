use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::domain::types::{normalize_usage, DailyUsage, ModelChoice, ModelKind};

/// A validated prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub target_date: NaiveDate,
    pub model_choice: ModelChoice,
}

/// Model chosen for a request and the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub kind: ModelKind,
    pub reason: String,
}

/// Inputs shared by every predictor once the model has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInput {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub target_date: NaiveDate,
    pub model: ModelKind,
}

impl PredictionInput {
    pub fn new(request: &ForecastRequest, model: ModelKind) -> Self {
        Self {
            region: request.region.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            target_date: request.target_date,
            model,
        }
    }
}

/// Output of any predictor, in the wire shape external predictors print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub predicted_usage: f64,
    pub model_type: String,
    pub historical_data: Vec<DailyUsage>,
    pub forecast_data: Vec<DailyUsage>,
    #[serde(
        default,
        deserialize_with = "flat_features",
        skip_serializing_if = "Option::is_none"
    )]
    pub features_used: Option<Vec<f64>>,
}

/// Feature vectors arrive flat or as a one-row matrix (`[[...]]`).
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureShape {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

fn flat_features<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FeatureShape>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FeatureShape::Flat(values)) => Ok(Some(values)),
        Some(FeatureShape::Rows(rows)) => match <[Vec<f64>; 1]>::try_from(rows) {
            Ok([row]) => Ok(Some(row)),
            Err(rows) => Err(de::Error::custom(format!(
                "features_used has {} rows, expected one",
                rows.len()
            ))),
        },
    }
}

/// Which stage of the fallback chain produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    External,
    Statistical,
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Statistical => write!(f, "statistical"),
        }
    }
}

/// A chart point carries either a historical or a forecast value, never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_usage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_usage: Option<f64>,
}

impl ChartPoint {
    pub fn historical(point: &DailyUsage) -> Self {
        Self {
            date: point.date,
            historical_usage: Some(point.usage),
            forecast_usage: None,
        }
    }

    pub fn forecast(point: &DailyUsage) -> Self {
        Self {
            date: point.date,
            historical_usage: None,
            forecast_usage: Some(point.usage),
        }
    }
}

/// Historical points followed by forecast points, ascending by date.
///
/// The sort is stable, so a historical and a forecast point sharing a date
/// keep the historical one first.
pub fn build_chart_series(historical: &[DailyUsage], forecast: &[DailyUsage]) -> Vec<ChartPoint> {
    let mut series: Vec<ChartPoint> = historical
        .iter()
        .map(ChartPoint::historical)
        .chain(forecast.iter().map(ChartPoint::forecast))
        .collect();
    series.sort_by_key(|p| p.date);
    series
}

/// Response returned to the client for a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub target_date: NaiveDate,
    pub predicted_usage: f64,
    pub model_used: String,
    pub model_reason: String,
    pub summary: String,
    pub series: Vec<ChartPoint>,
    pub prediction_source: PredictionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features_used: Option<Vec<f64>>,
}

impl ForecastResult {
    /// Number of points carrying a historical value
    pub fn historical_len(&self) -> usize {
        self.series
            .iter()
            .filter(|p| p.historical_usage.is_some())
            .count()
    }

    /// Number of points carrying a forecast value
    pub fn forecast_len(&self) -> usize {
        self.series
            .iter()
            .filter(|p| p.forecast_usage.is_some())
            .count()
    }
}

impl ModelPrediction {
    /// Clamp every value to >= 0 with two decimals.
    pub fn normalized(mut self) -> Self {
        self.predicted_usage = normalize_usage(self.predicted_usage);
        for point in self
            .historical_data
            .iter_mut()
            .chain(self.forecast_data.iter_mut())
        {
            point.usage = normalize_usage(point.usage);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_features_used_accepts_flat_and_single_row() {
        let base = r#""predicted_usage": 1.0, "model_type": "LSTM", "historical_data": [], "forecast_data": []"#;
        let parse = |features: &str| -> serde_json::Result<ModelPrediction> {
            serde_json::from_str(&format!("{{{base}{features}}}"))
        };

        assert_eq!(parse("").unwrap().features_used, None);
        assert_eq!(parse(r#", "features_used": null"#).unwrap().features_used, None);
        assert_eq!(
            parse(r#", "features_used": [1.0, 2.0]"#).unwrap().features_used,
            Some(vec![1.0, 2.0])
        );
        assert_eq!(
            parse(r#", "features_used": [[1.0, 2.0]]"#).unwrap().features_used,
            Some(vec![1.0, 2.0])
        );
        assert!(parse(r#", "features_used": [[1.0], [2.0]]"#).is_err());
    }

    #[test]
    fn test_chart_series_is_sorted_and_exclusive() {
        let historical = vec![DailyUsage::new(day(2), 10.0), DailyUsage::new(day(1), 9.0)];
        let forecast = vec![DailyUsage::new(day(4), 12.0), DailyUsage::new(day(3), 11.0)];

        let series = build_chart_series(&historical, &forecast);

        let dates: Vec<_> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(4)]);
        assert!(series[..2]
            .iter()
            .all(|p| p.historical_usage.is_some() && p.forecast_usage.is_none()));
        assert!(series[2..]
            .iter()
            .all(|p| p.forecast_usage.is_some() && p.historical_usage.is_none()));
    }

    #[test]
    fn test_chart_point_serializes_camel_case_without_nulls() {
        let json = serde_json::to_value(ChartPoint::forecast(&DailyUsage::new(day(5), 1.5))).unwrap();
        assert_eq!(json["date"], "2024-03-05");
        assert_eq!(json["forecastUsage"], 1.5);
        assert!(json.get("historicalUsage").is_none());
    }

    #[test]
    fn test_prediction_parses_external_wire_shape() {
        let raw = r#"{
            "predicted_usage": 312.456,
            "model_type": "LSTM",
            "historical_data": [{"date": "2024-03-01", "usage": -4.0}],
            "forecast_data": [{"date": "2024-03-02", "usage": 300.111}]
        }"#;
        let prediction: ModelPrediction = serde_json::from_str(raw).unwrap();
        assert!(prediction.features_used.is_none());

        let normalized = prediction.normalized();
        assert_eq!(normalized.predicted_usage, 312.46);
        assert_eq!(normalized.historical_data[0].usage, 0.0);
        assert_eq!(normalized.forecast_data[0].usage, 300.11);
    }

    #[test]
    fn test_prediction_source_display() {
        assert_eq!(PredictionSource::External.to_string(), "external");
        assert_eq!(PredictionSource::Statistical.to_string(), "statistical");
    }
}
