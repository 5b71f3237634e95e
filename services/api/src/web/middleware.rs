//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Middleware that validates the bearer token.
///
/// If valid, inserts the `Viewer` and the decoded claims into request extensions
/// for handlers to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    let claims = state.tokens.decode(token).inspect_err(|e| {
        debug!("Rejected bearer token: {}", e);
    })?;
    let viewer = claims.viewer()?;

    req.extensions_mut().insert(viewer);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
