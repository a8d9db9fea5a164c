use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

// ============================================================================
// Models
// ============================================================================

/// One of the named forecasting models a client can ask for.
///
/// The names are labels: every model is served by the same predictor chain,
/// each label only shifting the statistical estimate by a fixed fraction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ModelKind {
    #[serde(rename = "ARIMA")]
    #[strum(serialize = "ARIMA")]
    Arima,
    #[serde(rename = "XGBoost")]
    #[strum(serialize = "XGBoost")]
    XgBoost,
    #[serde(rename = "LSTM")]
    #[strum(serialize = "LSTM")]
    Lstm,
    #[serde(rename = "Prophet")]
    #[strum(serialize = "Prophet")]
    Prophet,
}

impl ModelKind {
    /// Models in the order used for hash-based auto selection
    pub fn all() -> Vec<ModelKind> {
        ModelKind::iter().collect()
    }

    /// Shift applied to the statistical estimate, as a fraction of average usage
    pub fn adjustment_fraction(&self) -> f64 {
        match self {
            Self::Arima => 0.0,
            Self::XgBoost => 0.05,
            Self::Lstm => -0.02,
            Self::Prophet => 0.03,
        }
    }
}

/// Model requested by the client: a named model or automatic selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelChoice {
    Auto,
    Named(ModelKind),
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Named(kind) => write!(f, "{}", kind),
        }
    }
}

impl FromStr for ModelChoice {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        ModelKind::from_str(s).map(Self::Named)
    }
}

// ============================================================================
// Usage records
// ============================================================================

/// One row of the historical source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub region: String,
    pub subregion: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
    pub usage: f64,
}

/// Usage summed over a region for a single calendar date.
///
/// Also the `{date, usage}` point shape exchanged with external predictors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub usage: f64,
}

impl DailyUsage {
    pub fn new(date: NaiveDate, usage: f64) -> Self {
        Self { date, usage }
    }
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp to zero and round to two decimals; non-finite values become zero.
pub fn normalize_usage(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    round2(value.max(0.0))
}

/// Arithmetic mean, zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
