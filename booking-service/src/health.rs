use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use common_http_errors::ApiResult;
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub message: &'static str,
}

/// Readiness probe: 400 until every bundled migration has been applied.
pub async fn ping(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<PingResponse>)> {
    if state.bookings.schema_is_current().await? {
        Ok((StatusCode::OK, Json(PingResponse { message: "ok" })))
    } else {
        warn!("database schema is behind bundled migrations");
        Ok((
            StatusCode::BAD_REQUEST,
            Json(PingResponse {
                message: "Database is not up-to-date yet",
            }),
        ))
    }
}
