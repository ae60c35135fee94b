use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

use super::cookies::extract_credential;

/// Guard for admin-only handlers.
pub struct AdminUser {
    pub subject: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = extract_credential(&parts.headers, state.auth.strategy());
        let principal = state.auth.authorize(credential.as_deref()).map_err(|e| {
            tracing::debug!("Rejected admin request: {e}");
            AppError::from(e)
        })?;

        Ok(AdminUser {
            subject: principal.subject,
        })
    }
}
