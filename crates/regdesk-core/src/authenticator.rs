//! The single-admin authentication component.
//!
//! [`Authenticator`] owns the login throttle and one credential strategy,
//! chosen once at startup. Every login runs the same sequence: lockout
//! check, credential check, then issue.

use std::time::{Duration, Instant};

use crate::error::AuthError;
use crate::password::verify_password;
use crate::session::SessionStore;
use crate::throttle::{LoginThrottle, ThrottlePolicy};
use crate::token::{unix_now, TokenIssuer};

/// How an authenticated admin is remembered between requests.
pub enum CredentialStrategy {
    /// Random id backed by a server-side registry. Revocable, sliding expiry.
    Session(SessionStore),
    /// Signed token verified on each request. Fixed expiry.
    Token(TokenIssuer),
}

impl CredentialStrategy {
    pub fn ttl(&self) -> Duration {
        match self {
            CredentialStrategy::Session(store) => store.ttl(),
            CredentialStrategy::Token(issuer) => issuer.ttl(),
        }
    }
}

/// A freshly minted credential, handed to the transport as an opaque string.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub value: String,
    pub subject: String,
    pub max_age: Duration,
}

/// The identity resolved from a valid credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

pub struct Authenticator {
    admin_username: String,
    password_hash: String,
    throttle: LoginThrottle,
    credentials: CredentialStrategy,
}

impl Authenticator {
    pub fn new(
        admin_username: impl Into<String>,
        password_hash: impl Into<String>,
        policy: ThrottlePolicy,
        credentials: CredentialStrategy,
    ) -> Self {
        Self {
            admin_username: admin_username.into(),
            password_hash: password_hash.into(),
            throttle: LoginThrottle::new(policy),
            credentials,
        }
    }

    pub fn strategy(&self) -> &CredentialStrategy {
        &self.credentials
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    /// Verifies an admin login from `address`.
    ///
    /// Runs an argon2 comparison, so callers on an async runtime should move
    /// this onto a blocking thread.
    pub fn authenticate(
        &self,
        address: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<IssuedCredential, AuthError> {
        self.authenticate_at(address, username, password, Instant::now())
    }

    pub fn authenticate_at(
        &self,
        address: &str,
        username: Option<&str>,
        password: Option<&str>,
        now: Instant,
    ) -> Result<IssuedCredential, AuthError> {
        if let Some(retry_after) = self.throttle.lockout_remaining_at(address, now) {
            tracing::warn!("Login refused for locked-out address {address}");
            return Err(AuthError::LockedOut { retry_after });
        }

        let (username, password) = match (non_empty(username), non_empty(password)) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                self.throttle.record_failed_attempt_at(address, now);
                return Err(AuthError::MissingLoginFields);
            }
        };

        let username_matches =
            constant_time_eq(username.as_bytes(), self.admin_username.as_bytes());
        let password_matches = verify_password(&self.password_hash, password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !username_matches || !password_matches {
            tracing::warn!("Failed login attempt from {address}");
            if self.throttle.record_failed_attempt_at(address, now) {
                return Err(AuthError::LockedOut {
                    retry_after: self.throttle.policy().lockout(),
                });
            }
            return Err(AuthError::InvalidCredentials {
                remaining_attempts: self.throttle.remaining_attempts(address),
            });
        }

        self.throttle.reset_login_attempts(address);
        tracing::info!("Admin login succeeded from {address}");
        self.issue(now)
    }

    fn issue(&self, now: Instant) -> Result<IssuedCredential, AuthError> {
        let value = match &self.credentials {
            CredentialStrategy::Session(store) => store.create(&self.admin_username, now),
            CredentialStrategy::Token(issuer) => issuer.issue(&self.admin_username)?.0,
        };
        Ok(IssuedCredential {
            value,
            subject: self.admin_username.clone(),
            max_age: self.credentials.ttl(),
        })
    }

    pub fn authorize(&self, credential: Option<&str>) -> Result<Principal, AuthError> {
        self.authorize_at(credential, Instant::now())
    }

    /// Resolves a presented credential. For sessions this also slides the expiry.
    pub fn authorize_at(
        &self,
        credential: Option<&str>,
        now: Instant,
    ) -> Result<Principal, AuthError> {
        let credential = non_empty(credential).ok_or(AuthError::MissingCredential)?;
        let subject = match &self.credentials {
            CredentialStrategy::Session(store) => store.validate(credential, now)?.subject,
            CredentialStrategy::Token(issuer) => issuer.verify(credential)?.sub,
        };
        Ok(Principal { subject })
    }

    /// Best-effort logout. Tokens are only affected when revocation is enabled.
    pub fn invalidate(&self, credential: &str) {
        match &self.credentials {
            CredentialStrategy::Session(store) => store.remove(credential),
            CredentialStrategy::Token(issuer) => issuer.revoke(credential),
        }
    }

    /// Drops lapsed lockouts, stale throttle windows, expired sessions and
    /// revocations of expired tokens.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        self.throttle.sweep_expired(now);
        match &self.credentials {
            CredentialStrategy::Session(store) => store.cleanup_expired(now),
            CredentialStrategy::Token(issuer) => match unix_now() {
                Ok(now) => issuer.cleanup_revoked(now),
                Err(e) => tracing::warn!("Skipping revocation sweep: {e}"),
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Constant-time byte comparison to prevent timing side-channels on the username.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
