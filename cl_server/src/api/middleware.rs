//! Host token middleware for the host-only endpoints.
//!
//! Requests must carry `Authorization: Bearer <HOST_TOKEN>`.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::logging;

/// Reject requests that do not carry the host token.
///
/// - **Missing header**: `401 Unauthorized`
/// - **Wrong token**: `401 Unauthorized`
pub async fn host_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let rejection = match token {
        Some(token) if token == state.host_token.as_ref() => None,
        Some(_) => Some("wrong host token"),
        None => Some("missing bearer token"),
    };

    match rejection {
        None => Ok(next.run(request).await),
        Some(reason) => {
            logging::log_rejected_host_request(
                request.method().as_str(),
                request.uri().path(),
                reason,
            );
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
