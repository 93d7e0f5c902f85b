//! Login and logout handlers

use crate::auth::{removal_cookie, session_artifact, session_cookie, LoginRequest};
use crate::responses::MessageResponse;
use crate::{ApiError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// POST /api/auth/login - Exchange credentials for a session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(format!("invalid login body: {}", e.body_text())))?;

    let grant = match state.auth.login(&request, Utc::now()).await {
        Ok(grant) => grant,
        Err(e) => {
            warn!(strategy = %state.auth.strategy(), reason = %e, "login failed");
            return Err(e.into());
        }
    };

    info!(principal = %grant.principal, expires_at = %grant.expires_at, "login succeeded");

    let cookie = session_cookie(
        grant.artifact,
        state.auth.session_duration(),
        state.config.secure_cookies,
    );
    Ok((jar.add(cookie), Json(MessageResponse::success("login successful"))))
}

/// POST /api/auth/logout - Revoke the presented session and clear the cookie
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(artifact) = session_artifact(&headers) {
        state.auth.revoke(&artifact);
    }

    (
        jar.add(removal_cookie(state.config.secure_cookies)),
        Json(MessageResponse::success("logged out")),
    )
}
