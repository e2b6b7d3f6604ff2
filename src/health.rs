use axum::Json;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::browser::setup;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    browser_environment: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Health check successful", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    // The environment is prepared lazily by the first analysis.
    let browser_environment = if setup::is_prepared() {
        "prepared"
    } else {
        "pending"
    };
    debug!(browser_environment, "health check");
    Json(HealthResponse {
        status: "OK".to_string(),
        browser_environment: browser_environment.to_string(),
    })
}
