use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::error::ApiError,
    controller::AppState,
    forecast::RegionModels,
    repo::RegionSummary,
};

/// GET /api/v1/regions - Regions present in the historical data
pub async fn list_regions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegionSummary>>, ApiError> {
    let store = state.repos.usage.clone();
    let regions = tokio::task::spawn_blocking(move || store.regions()).await?;
    Ok(Json(regions))
}

/// GET /api/v1/regions/:region/models - Trained model artefacts for a region
pub async fn region_models(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<RegionModels>, ApiError> {
    if region.trim().is_empty() {
        return Err(ApiError::NotFound("region".to_string()));
    }
    let catalog = state.catalog.clone();
    let models = tokio::task::spawn_blocking(move || catalog.region_models(&region)).await?;
    Ok(Json(models))
}
