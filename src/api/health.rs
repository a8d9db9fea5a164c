use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::controller::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    historical_data: ComponentHealth,
    predictor: PredictorHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(records: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            records: Some(records),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            records: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictorHealth {
    enabled: bool,
    interpreter: String,
    scripts: usize,
    timeout_secs: u64,
}

fn check_historical_data(state: &AppState) -> ComponentHealth {
    let store = &state.repos.usage;
    if !store.is_loaded() {
        return ComponentHealth::unhealthy("historical data not loaded yet".to_string());
    }
    match store.record_count() {
        0 => ComponentHealth::unhealthy("historical data is empty".to_string()),
        n => ComponentHealth::healthy(n),
    }
}

/// GET /health - Liveness plus component details
///
/// Always 200 while the process serves requests; an empty dataset only
/// degrades forecasts to a zero baseline.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let historical_data = check_historical_data(&state);
    let predictor = &state.cfg.predictor;

    let response = HealthResponse {
        status: if historical_data.status == "healthy" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            historical_data,
            predictor: PredictorHealth {
                enabled: predictor.enabled,
                interpreter: predictor.interpreter.clone(),
                scripts: predictor.scripts.len(),
                timeout_secs: predictor.timeout().as_secs(),
            },
        },
    };

    (StatusCode::OK, Json(response))
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    ready: bool,
    records: usize,
}

/// GET /health/ready - Readiness probe
///
/// Returns 200 once the historical store has been loaded
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = &state.repos.usage;
    let ready = store.is_loaded();
    let records = if ready { store.record_count() } else { 0 };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessResponse { ready, records }))
}
