use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{analysis, app_state::AppState, health};

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, analysis::handlers::analyze),
    components(schemas(
        health::HealthResponse,
        analysis::AnalyzeRequest,
        analysis::AnalyzeResponse,
        analysis::ErrorResponse
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "analysis", description = "Listing analysis")
    )
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/v1/analyze", post(analysis::analyze))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
