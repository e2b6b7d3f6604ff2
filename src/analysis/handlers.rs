use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::{
    analysis::dtos::{AnalyzeRequest, AnalyzeResponse, ErrorResponse},
    app_state::AppState,
    pipeline::PipelineError,
};

#[utoipa::path(
    post,
    path = "/v1/analyze",
    tag = "analysis",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Listing analyzed", body = AnalyzeResponse),
        (status = 400, description = "Invalid request or listing URL", body = ErrorResponse),
        (status = 502, description = "Browser session could not load the listing", body = ErrorResponse),
        (status = 500, description = "Unexpected browser failure", body = ErrorResponse)
    )
)]
pub async fn analyze(State(state): State<AppState>, Json(payload): Json<AnalyzeRequest>) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let generator = state.generators.for_credential(payload.api_key.trim());
    match state.pipeline.analyze(&payload.url, generator.as_ref()).await {
        Ok(outcome) => (StatusCode::OK, Json(AnalyzeResponse::from(outcome))).into_response(),
        Err(e) => {
            let status = match &e {
                PipelineError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                PipelineError::Browser(inner) if inner.is_session_fatal() => StatusCode::BAD_GATEWAY,
                PipelineError::Browser(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                error!(error = %e, "analysis failed");
            } else {
                warn!(error = %e, "analysis rejected");
            }
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
