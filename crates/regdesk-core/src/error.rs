//! Error types for `regdesk-core`.
//!
//! Registration and export operations return [`CoreResult<T>`]. Admin
//! authentication has its own taxonomy in [`AuthError`] because every
//! variant maps to a distinct negative answer for the caller.

use std::time::Duration;

/// Unified error type for registration, document and export operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A required registration field or document was not supplied.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An unrecognised document kind was requested.
    #[error("invalid document type: {0}")]
    InvalidDocumentKind(String),

    /// Writing the spreadsheet export failed.
    #[error("export error: {0}")]
    Export(String),

    /// Password hashing failed or a stored hash could not be parsed.
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

/// Convenience alias used throughout `regdesk-core`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Negative outcomes of admin authentication and authorization.
///
/// All variants are terminal for the current request; none are retried
/// internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The source address is locked out after too many failures.
    #[error("too many failed login attempts")]
    LockedOut { retry_after: Duration },

    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials { remaining_attempts: u32 },

    /// Username or password absent from the login request.
    #[error("username and password are required")]
    MissingLoginFields,

    /// No credential was presented, or it refers to nothing.
    #[error("authentication required")]
    MissingCredential,

    /// The credential was recognised but has expired.
    #[error("session expired, please login again")]
    ExpiredCredential,

    /// Signature, format or kind check failed on a token.
    #[error("invalid or expired token")]
    MalformedCredential,

    #[error("authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whole minutes until a lockout lapses, rounded up. `None` for other variants.
    pub fn retry_after_minutes(&self) -> Option<u64> {
        match self {
            AuthError::LockedOut { retry_after } => Some(retry_after_minutes(*retry_after)),
            _ => None,
        }
    }
}

fn retry_after_minutes(retry_after: Duration) -> u64 {
    retry_after.as_secs().div_ceil(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_displays_name() {
        let err = CoreError::MissingField("email");
        assert_eq!(err.to_string(), "missing required field: email");
    }

    #[test]
    fn invalid_document_kind_displays_value() {
        let err = CoreError::InvalidDocumentKind("selfie".to_string());
        assert_eq!(err.to_string(), "invalid document type: selfie");
    }

    #[test]
    fn export_error_displays_message() {
        let err = CoreError::Export("buffer closed".to_string());
        assert_eq!(err.to_string(), "export error: buffer closed");
    }

    #[test]
    fn locked_out_rounds_minutes_up() {
        let err = AuthError::LockedOut {
            retry_after: Duration::from_secs(29 * 60 + 1),
        };
        assert_eq!(err.retry_after_minutes(), Some(30));
    }

    #[test]
    fn retry_after_only_for_lockout() {
        let err = AuthError::InvalidCredentials {
            remaining_attempts: 3,
        };
        assert_eq!(err.retry_after_minutes(), None);
    }

    #[test]
    fn credential_errors_display() {
        assert_eq!(
            AuthError::MissingCredential.to_string(),
            "authentication required"
        );
        assert_eq!(
            AuthError::ExpiredCredential.to_string(),
            "session expired, please login again"
        );
    }
}
