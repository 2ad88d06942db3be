pub mod admin;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod slots;

use axum::http::HeaderMap;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Bearer-token admin auth. Returns the acting admin identity used for
/// `blocked_by` attribution and unblock authorization.
pub(crate) fn check_auth(headers: &HeaderMap, config: &AppConfig) -> Result<String, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != config.admin_token {
        return Err(AppError::Unauthorized);
    }
    Ok(config.admin_id.clone())
}
