//! Operator authentication
//!
//! Threshold changes are operator-only. The operator presents the configured
//! API token as a bearer token.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use crate::AppState;

/// Reject requests that do not carry the operator token
pub async fn operator_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token.trim(),
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    if !token_matches(token, &state.config.operator.api_token) {
        tracing::warn!("Rejected operator request with wrong token");
        return AppError::Unauthorized("Invalid operator token".to_string()).into_response();
    }

    next.run(request).await
}

type HmacSha256 = Hmac<Sha256>;

const TOKEN_LABEL: &[u8] = b"wx-station operator token";

/// Each token keys an HMAC over the same label; the tags are compared in
/// constant time.
fn token_matches(presented: &str, expected: &str) -> bool {
    let Ok(expected_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    let expected_tag = expected_mac.chain_update(TOKEN_LABEL).finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(presented.as_bytes()) else {
        return false;
    };
    mac.update(TOKEN_LABEL);
    mac.verify_slice(&expected_tag).is_ok()
}
