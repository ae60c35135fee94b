//! Self-verifying admin tokens (HS256 JWT).
//!
//! Tokens carry their own expiry and are checked without any storage
//! lookup. Logout cannot invalidate a token unless the optional revocation
//! list is enabled, in which case logged-out token ids are rejected until
//! their natural expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Value of the `kind` claim on every admin token.
pub const ADMIN_KIND: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub kind: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    /// Revoked `jti` -> `exp`. `None` when revocation is disabled.
    revoked: Option<DashMap<String, u64>>,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration, revoke_on_logout: bool) -> Self {
        // Expiry is exact: a token is rejected from its first second past `exp`.
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            revoked: revoke_on_logout.then(DashMap::new),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn revocation_enabled(&self) -> bool {
        self.revoked.is_some()
    }

    /// Signs a token for `subject`. Returns the token and its expiry as unix seconds.
    pub fn issue(&self, subject: &str) -> Result<(String, u64), AuthError> {
        self.issue_at(subject, unix_now()?)
    }

    pub fn issue_at(&self, subject: &str, now: u64) -> Result<(String, u64), AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            kind: ADMIN_KIND.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))?;

        Ok((token, claims.exp))
    }

    /// Checks signature, expiry, `kind` and the revocation list.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::MalformedCredential,
            })?
            .claims;

        if claims.kind != ADMIN_KIND {
            return Err(AuthError::MalformedCredential);
        }

        if let Some(revoked) = &self.revoked {
            if revoked.contains_key(&claims.jti) {
                return Err(AuthError::MissingCredential);
            }
        }

        Ok(claims)
    }

    /// Adds a valid token to the revocation list. No-op when revocation is
    /// disabled or the token does not verify.
    pub fn revoke(&self, token: &str) {
        let Some(revoked) = &self.revoked else {
            return;
        };
        if let Ok(claims) = self.verify(token) {
            tracing::info!("Token revoked for {} (jti: {})", claims.sub, claims.jti);
            revoked.insert(claims.jti, claims.exp);
        }
    }

    /// Forgets revoked ids whose tokens have expired anyway.
    pub fn cleanup_revoked(&self, now: u64) {
        if let Some(revoked) = &self.revoked {
            revoked.retain(|_, exp| *exp > now);
        }
    }
}

pub(crate) fn unix_now() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn now() -> u64 {
        unix_now().unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::new(SECRET, DAY, false);
        let (token, exp) = issuer.issue("admin").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.kind, ADMIN_KIND);
        assert_eq!(claims.exp, exp);
        assert_eq!(claims.exp - claims.iat, DAY.as_secs());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = TokenIssuer::new(SECRET, DAY, false);
        let (token, _) = issuer.issue_at("admin", now() - 2 * DAY.as_secs()).unwrap();
        assert_eq!(
            issuer.verify(&token).unwrap_err(),
            AuthError::ExpiredCredential
        );
    }

    #[test]
    fn token_expired_seconds_ago_is_rejected() {
        let ttl = Duration::from_secs(3600);
        let issuer = TokenIssuer::new(SECRET, ttl, false);
        let (token, exp) = issuer.issue_at("admin", now() - ttl.as_secs() - 30).unwrap();
        assert!(exp < now());
        assert_eq!(
            issuer.verify(&token).unwrap_err(),
            AuthError::ExpiredCredential
        );
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let issuer = TokenIssuer::new(SECRET, DAY, false);
        let other = TokenIssuer::new("another-secret-entirely-different", DAY, false);
        let (token, _) = other.issue("admin").unwrap();
        assert_eq!(
            issuer.verify(&token).unwrap_err(),
            AuthError::MalformedCredential
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = TokenIssuer::new(SECRET, DAY, false);
        assert_eq!(
            issuer.verify("not.a.token").unwrap_err(),
            AuthError::MalformedCredential
        );
    }

    #[test]
    fn non_admin_kind_is_rejected() {
        let issuer = TokenIssuer::new(SECRET, DAY, false);
        let claims = Claims {
            sub: "admin".to_string(),
            kind: "visitor".to_string(),
            iat: now(),
            exp: now() + 3600,
            jti: "x".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            issuer.verify(&token).unwrap_err(),
            AuthError::MalformedCredential
        );
    }

    #[test]
    fn logout_without_revocation_leaves_token_valid() {
        let issuer = TokenIssuer::new(SECRET, DAY, false);
        let (token, _) = issuer.issue("admin").unwrap();
        issuer.revoke(&token);
        assert!(issuer.verify(&token).is_ok());
    }

    #[test]
    fn revocation_list_rejects_logged_out_token() {
        let issuer = TokenIssuer::new(SECRET, DAY, true);
        let (token, _) = issuer.issue("admin").unwrap();
        let (other, _) = issuer.issue("admin").unwrap();
        issuer.revoke(&token);
        assert_eq!(
            issuer.verify(&token).unwrap_err(),
            AuthError::MissingCredential
        );
        assert!(issuer.verify(&other).is_ok());
    }

    #[test]
    fn cleanup_forgets_expired_revocations() {
        let issuer = TokenIssuer::new(SECRET, DAY, true);
        let (token, exp) = issuer.issue("admin").unwrap();
        issuer.revoke(&token);
        issuer.cleanup_revoked(exp - 1);
        assert!(issuer.verify(&token).is_err());
        issuer.cleanup_revoked(exp);
        assert!(issuer.verify(&token).is_ok());
    }
}
