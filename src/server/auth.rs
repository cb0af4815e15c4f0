//! Bearer-secret check for the cron routes.

use super::{AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Rejects requests whose `Authorization` header is not `Bearer <CRON_SECRET>`.
pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verdict = bearer_token(request.headers()).map(|token| secrets_match(token, &state.cron_secret));

    match verdict {
        Some(true) => Ok(next.run(request).await),
        Some(false) => {
            warn!("Rejected cron call to {} with a wrong secret", request.uri().path());
            Err(ApiError::unauthorized("invalid cron secret"))
        }
        None => {
            warn!("Rejected cron call to {} without a secret", request.uri().path());
            Err(ApiError::unauthorized("missing cron secret"))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Compares every byte so timing does not leak the matching prefix length.
fn secrets_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
