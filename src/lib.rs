//! Regional usage forecast service.
//!
//! Historical usage is aggregated per region, a forecast is obtained from an
//! external predictor process when one is available, and a local statistical
//! forecaster takes over whenever that chain fails.

pub mod api;
pub mod clock;
pub mod config;
pub mod controller;
pub mod domain;
pub mod forecast;
pub mod repo;
pub mod telemetry;
