pub mod error;
pub mod forecast;
pub mod health;
pub mod regions;
pub mod v1;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, controller::AppState};

const BODY_LIMIT_BYTES: usize = 64 * 1024;

pub fn router(state: AppState, cfg: &Config) -> Router {
    let health = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .with_state(state.clone());

    let mut router = Router::new()
        .nest("/api/v1", v1::router(state))
        .merge(health);

    if cfg.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(BODY_LIMIT_BYTES))
                .layer(TimeoutLayer::new(cfg.request_timeout())),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(feature = "metrics")]
pub fn with_metrics(app: Router) -> Router {
    use axum_prometheus::PrometheusMetricLayer;
    let (layer, handle) = PrometheusMetricLayer::pair();

    let metrics_router =
        Router::new().route("/metrics", get(move || async move { handle.render() }));

    app.layer(layer).merge(metrics_router)
}
