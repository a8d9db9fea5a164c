//! Request validation
//!
//! Turns the loosely typed client form into a [`ForecastRequest`], collecting
//! one message per offending field. Structural problems (missing values,
//! unparsable numbers or dates) are checked by hand; numeric ranges and the
//! region length go through `validator`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use validator::Validate;

use crate::domain::{ForecastRequest, ModelChoice};

/// Error messages keyed by request field name.
pub type FieldErrors = BTreeMap<String, String>;

pub const FUTURE_DATE_MESSAGE: &str = "date must be in the future";

/// A coordinate as sent by clients: JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn parse(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Raw prediction request, JSON or form encoded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastForm {
    pub state: Option<String>,
    pub lat: Option<Coordinate>,
    pub lon: Option<Coordinate>,
    pub prediction_date: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Validate)]
struct BoundedFields {
    #[validate(length(min = 1, max = 100, message = "state must be between 1 and 100 characters"))]
    state: String,
    #[validate(range(min = -90.0, max = 90.0, message = "lat must be between -90 and 90"))]
    lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "lon must be between -180 and 180"))]
    lon: f64,
}

/// `YYYY-MM-DD`, or an ISO timestamp whose date part is used.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn required<'a>(value: Option<&'a str>, field: &str, errors: &mut FieldErrors) -> Option<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.insert(field.to_string(), format!("{field} is required"));
            None
        }
    }
}

fn coordinate(value: Option<&Coordinate>, field: &str, errors: &mut FieldErrors) -> Option<f64> {
    let parsed = match value {
        None => None,
        Some(Coordinate::Text(s)) if s.trim().is_empty() => None,
        Some(c) => match c.parse() {
            Some(v) => Some(v),
            None => {
                errors.insert(field.to_string(), format!("{field} must be a number"));
                return None;
            }
        },
    };
    if parsed.is_none() {
        errors.insert(field.to_string(), format!("{field} is required"));
    }
    parsed
}

/// Validate `form` against `today`. The target date must fall within
/// `max_horizon_days` after today. Every invalid field is reported at once.
pub fn validate_form(
    form: &ForecastForm,
    today: NaiveDate,
    max_horizon_days: u32,
) -> Result<ForecastRequest, FieldErrors> {
    let mut errors = FieldErrors::new();

    let state = required(form.state.as_deref(), "state", &mut errors);
    let lat = coordinate(form.lat.as_ref(), "lat", &mut errors);
    let lon = coordinate(form.lon.as_ref(), "lon", &mut errors);

    let target_date = required(form.prediction_date.as_deref(), "predictionDate", &mut errors)
        .and_then(|raw| match parse_date(raw) {
            Some(date) if date <= today => {
                errors.insert("predictionDate".to_string(), FUTURE_DATE_MESSAGE.to_string());
                None
            }
            Some(date) if (date - today).num_days() > i64::from(max_horizon_days) => {
                errors.insert(
                    "predictionDate".to_string(),
                    format!("date must be within {max_horizon_days} days from today"),
                );
                None
            }
            Some(date) => Some(date),
            None => {
                errors.insert(
                    "predictionDate".to_string(),
                    "predictionDate must be a date in YYYY-MM-DD format".to_string(),
                );
                None
            }
        });

    let model_choice = required(form.model.as_deref(), "model", &mut errors).and_then(|raw| {
        match raw.parse::<ModelChoice>() {
            Ok(choice) => Some(choice),
            Err(_) => {
                errors.insert(
                    "model".to_string(),
                    "model must be one of Auto, ARIMA, XGBoost, LSTM, Prophet".to_string(),
                );
                None
            }
        }
    });

    if let (Some(state), Some(lat), Some(lon)) = (state, lat, lon) {
        let bounded = BoundedFields {
            state: state.to_string(),
            lat,
            lon,
        };
        if let Err(e) = bounded.validate() {
            for (field, field_errors) in e.field_errors() {
                let message = field_errors
                    .first()
                    .and_then(|err| err.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                errors.insert(field.to_string(), message);
            }
        }
    }

    match (state, lat, lon, target_date, model_choice) {
        (Some(state), Some(latitude), Some(longitude), Some(target_date), Some(model_choice))
            if errors.is_empty() =>
        {
            Ok(ForecastRequest {
                region: state.to_string(),
                latitude,
                longitude,
                target_date,
                model_choice,
            })
        }
        _ => Err(errors),
    }
}
