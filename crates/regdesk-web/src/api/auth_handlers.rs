use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::Json;
use regdesk_core::CredentialStrategy;

use crate::auth::client_addr::ClientAddr;
use crate::auth::cookies::{clear_cookie, cookie_name, credential_cookie, extract_credential};
use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ClientAddr(address): ClientAddr,
    body: Bytes,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    let request: LoginRequest = if body.is_empty() {
        LoginRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| AppError::BadRequest("Invalid request body.".to_string()))?
    };

    let auth = state.auth.clone();
    let issued = tokio::task::spawn_blocking(move || {
        auth.authenticate(
            &address,
            request.username.as_deref(),
            request.password.as_deref(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let max_age = issued.max_age.as_secs();
    let name = cookie_name(state.auth.strategy());
    let cookie = credential_cookie(
        name,
        &issued.value,
        max_age,
        state.config.admin.secure_cookies,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    let (session_id, token) = match state.auth.strategy() {
        CredentialStrategy::Session(_) => (Some(issued.value), None),
        CredentialStrategy::Token(_) => (None, Some(issued.value)),
    };

    Ok((
        headers,
        Json(LoginResponse {
            message: "Login successful.".to_string(),
            session_id,
            token,
            expires_in: max_age,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    if let Some(credential) = extract_credential(&headers, state.auth.strategy()) {
        state.auth.invalidate(&credential);
    }

    let cookie = clear_cookie(
        cookie_name(state.auth.strategy()),
        state.config.admin.secure_cookies,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);

    Ok((
        response_headers,
        Json(MessageResponse {
            message: "Logged out successfully.".to_string(),
        }),
    ))
}

/// Reports whether the caller holds a valid credential. Never fails.
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthStatusResponse> {
    let credential = extract_credential(&headers, state.auth.strategy());
    match state.auth.authorize(credential.as_deref()) {
        Ok(principal) => Json(AuthStatusResponse {
            authenticated: true,
            username: Some(principal.subject),
        }),
        Err(_) => Json(AuthStatusResponse {
            authenticated: false,
            username: None,
        }),
    }
}
