//! Feature engineering for usage forecasting
//!
//! Calendar features and the sinusoidal seasonal terms shared by the
//! statistical forecaster and the feature vector reported to clients.

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Relative amplitude of the annual cycle (fraction of average usage)
pub const ANNUAL_AMPLITUDE: f64 = 0.10;
/// Relative amplitude of the month-of-year cycle
pub const MONTHLY_AMPLITUDE: f64 = 0.05;
/// Relative amplitude of the day-of-week cycle
pub const WEEKLY_AMPLITUDE: f64 = 0.02;
/// Usage shift per degree away from the reference point, as a fraction of average
pub const LOCATION_SCALE: f64 = 0.01;

const DAYS_PER_YEAR: f64 = 365.25;

/// Calendar features of a single date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarFeatures {
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day_of_month: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: u32,
    /// Day of year (1-366)
    pub day_of_year: u32,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day_of_month: date.day(),
            day_of_week: date.weekday().num_days_from_monday(),
            day_of_year: date.ordinal(),
        }
    }

    /// sin(2π·dayOfYear/365.25)
    pub fn annual_phase(&self) -> f64 {
        (2.0 * PI * self.day_of_year as f64 / DAYS_PER_YEAR).sin()
    }

    /// sin(2π·month/12)
    pub fn monthly_phase(&self) -> f64 {
        (2.0 * PI * self.month as f64 / 12.0).sin()
    }

    /// sin(2π·weekday/7)
    pub fn weekly_phase(&self) -> f64 {
        (2.0 * PI * self.day_of_week as f64 / 7.0).sin()
    }
}

/// Annual, monthly and weekly terms for `date`, scaled by `average`.
pub fn seasonal_component(date: NaiveDate, average: f64) -> f64 {
    let f = CalendarFeatures::from_date(date);
    average
        * (ANNUAL_AMPLITUDE * f.annual_phase()
            + MONTHLY_AMPLITUDE * f.monthly_phase()
            + WEEKLY_AMPLITUDE * f.weekly_phase())
}

/// Linear shift for distance from the reference coordinates.
pub fn location_adjustment(
    latitude: f64,
    longitude: f64,
    reference: (f64, f64),
    average: f64,
) -> f64 {
    let (ref_lat, ref_lon) = reference;
    LOCATION_SCALE * average * (latitude - ref_lat) + LOCATION_SCALE * average * (longitude - ref_lon)
}

/// Mean of the second half minus mean of the first half, per day of the first half.
///
/// A window of fewer than two points has no trend.
pub fn trend_per_day(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if mid == 0 {
        return 0.0;
    }
    let (first, second) = values.split_at(mid);
    (crate::domain::mean(second) - crate::domain::mean(first)) / first.len() as f64
}

/// Feature vector reported alongside a prediction:
/// year, month, day, weekday, day of year, latitude, longitude,
/// then sin/cos of the annual and monthly phases.
pub fn feature_vector(date: NaiveDate, latitude: f64, longitude: f64) -> Vec<f64> {
    let f = CalendarFeatures::from_date(date);
    let annual = 2.0 * PI * f.day_of_year as f64 / DAYS_PER_YEAR;
    let monthly = 2.0 * PI * f.month as f64 / 12.0;
    vec![
        f.year as f64,
        f.month as f64,
        f.day_of_month as f64,
        f.day_of_week as f64,
        f.day_of_year as f64,
        latitude,
        longitude,
        annual.sin(),
        annual.cos(),
        monthly.sin(),
        monthly.cos(),
    ]
}
