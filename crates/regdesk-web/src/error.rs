use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use regdesk_core::{AuthError, CoreError};
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    Auth(String),
    InvalidCredentials { remaining_attempts: u32 },
    LockedOut { retry_after_minutes: u64 },
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_minutes: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut remaining_attempts = None;
        let mut retry_after_minutes = None;

        let (status, message) = match self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::InvalidCredentials { remaining_attempts: left } => {
                remaining_attempts = Some(left);
                (StatusCode::UNAUTHORIZED, "Invalid credentials.".to_string())
            }
            AppError::LockedOut { retry_after_minutes: minutes } => {
                retry_after_minutes = Some(minutes);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    format!(
                        "Too many failed login attempts. Please try again in {minutes} minutes."
                    ),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
            remaining_attempts,
            retry_after_minutes,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(minutes) = retry_after_minutes {
            if let Ok(value) = HeaderValue::from_str(&(minutes * 60).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::LockedOut { .. } => AppError::LockedOut {
                retry_after_minutes: e.retry_after_minutes().unwrap_or_default(),
            },
            AuthError::InvalidCredentials { remaining_attempts } => {
                AppError::InvalidCredentials { remaining_attempts }
            }
            AuthError::MissingLoginFields => {
                AppError::BadRequest("Username and password are required.".to_string())
            }
            AuthError::MissingCredential => AppError::Auth("Authentication required.".to_string()),
            AuthError::ExpiredCredential => {
                AppError::Auth("Session expired. Please login again.".to_string())
            }
            AuthError::MalformedCredential => {
                AppError::Auth("Invalid or expired token.".to_string())
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingField(field) => {
                tracing::debug!("Registration rejected, missing {field}");
                AppError::BadRequest("Missing required fields.".to_string())
            }
            CoreError::InvalidDocumentKind(_) => AppError::BadRequest(
                "Invalid image type. Use \"cnic\" or \"payment\".".to_string(),
            ),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}
