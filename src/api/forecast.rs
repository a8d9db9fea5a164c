use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    Form, Json,
};

use crate::{
    api::error::ApiError,
    controller::{AppState, ForecastForm},
    domain::ForecastResult,
};

/// POST /api/v1/predict - Forecast from a JSON body
pub async fn predict_json(
    State(state): State<AppState>,
    body: Result<Json<ForecastForm>, JsonRejection>,
) -> Result<Json<ForecastResult>, ApiError> {
    let Json(form) = body.map_err(|rejection| ApiError::bad_request("body", rejection.body_text()))?;
    run(&state, form).await
}

/// POST /api/v1/predict/form - Forecast from an urlencoded form
pub async fn predict_form(
    State(state): State<AppState>,
    body: Result<Form<ForecastForm>, FormRejection>,
) -> Result<Json<ForecastResult>, ApiError> {
    let Form(form) = body.map_err(|rejection| ApiError::bad_request("body", rejection.body_text()))?;
    run(&state, form).await
}

async fn run(state: &AppState, form: ForecastForm) -> Result<Json<ForecastResult>, ApiError> {
    let result = state.orchestrator.predict(form).await?;
    Ok(Json(result))
}
