use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    api::{forecast, regions},
    controller::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(forecast::predict_json))
        .route("/predict/form", post(forecast::predict_form))
        .route("/regions", get(regions::list_regions))
        .route("/regions/:region/models", get(regions::region_models))
        .with_state(state)
}
