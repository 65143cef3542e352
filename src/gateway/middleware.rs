use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::state::AppState;

/// User identity extracted from a validated bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Rejects requests lacking a valid bearer token; on success the user id is
/// injected as a request extension.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
    let user_id = state
        .secretary
        .verify_token(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}
