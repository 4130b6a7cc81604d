//! Liveness endpoint.

use axum::Json;

use crate::models::PingResponse;

/// `GET /ping`: answers `pong` without touching the store.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}
