//! Server-held admin sessions with sliding expiry.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::AuthError;

/// Bytes of randomness in a session id (256 bits).
const SESSION_ID_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct Session {
    pub subject: String,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// Registry of live sessions keyed by their opaque id.
///
/// Expired entries are removed lazily when presented, or in bulk by
/// [`SessionStore::cleanup_expired`].
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a session for `subject` and returns its id.
    pub fn create(&self, subject: &str, now: Instant) -> String {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let session_id = hex::encode(bytes);

        self.sessions.insert(
            session_id.clone(),
            Session {
                subject: subject.to_string(),
                created_at: now,
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!("Session created, store size: {}", self.sessions.len());
        session_id
    }

    /// Looks up `session_id` and slides its expiry to `now + ttl`.
    ///
    /// An expired session is deleted and reported as
    /// [`AuthError::ExpiredCredential`]; an unknown id as
    /// [`AuthError::MissingCredential`]. Ids that were never issued, were
    /// revoked by logout, or were already swept are indistinguishable and all
    /// read as a missing credential, never as an expired one.
    pub fn validate(&self, session_id: &str, now: Instant) -> Result<Session, AuthError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(AuthError::MissingCredential)?;

        if entry.expires_at < now {
            drop(entry);
            self.sessions.remove(session_id);
            tracing::debug!("Session expired and removed");
            return Err(AuthError::ExpiredCredential);
        }

        entry.expires_at = now + self.ttl;
        Ok(entry.clone())
    }

    /// Deletes `session_id`. No-op if it is already gone.
    pub fn remove(&self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            tracing::debug!("Session removed, store size: {}", self.sessions.len());
        }
    }

    pub fn cleanup_expired(&self, now: Instant) {
        self.sessions.retain(|_, session| session.expires_at >= now);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn hours(h: u64) -> Duration {
        Duration::from_secs(h * 3600)
    }

    #[test]
    fn session_id_is_256_bit_hex() {
        let store = SessionStore::new(DAY);
        let id = store.create("admin", Instant::now());
        assert_eq!(id.len(), SESSION_ID_BYTES * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_unique() {
        let store = SessionStore::new(DAY);
        let now = Instant::now();
        let a = store.create("admin", now);
        let b = store.create("admin", now);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn fresh_session_validates() {
        let store = SessionStore::new(DAY);
        let now = Instant::now();
        let id = store.create("admin", now);
        let session = store.validate(&id, now).unwrap();
        assert_eq!(session.subject, "admin");
        assert_eq!(session.created_at, now);
    }

    #[test]
    fn unknown_id_is_missing() {
        let store = SessionStore::new(DAY);
        assert_eq!(
            store.validate("deadbeef", Instant::now()).unwrap_err(),
            AuthError::MissingCredential
        );
    }

    #[test]
    fn validation_slides_expiry() {
        let store = SessionStore::new(DAY);
        let start = Instant::now();
        let id = store.create("admin", start);

        let used_at = start + hours(23);
        let session = store.validate(&id, used_at).unwrap();
        assert_eq!(session.expires_at, used_at + DAY);
        assert_eq!(session.created_at, start);
    }

    #[test]
    fn repeated_use_never_expires() {
        let store = SessionStore::new(DAY);
        let start = Instant::now();
        let id = store.create("admin", start);
        for day in 1..=5 {
            assert!(store.validate(&id, start + hours(23 * day)).is_ok());
        }
    }

    #[test]
    fn idle_past_ttl_expires_and_is_deleted() {
        let store = SessionStore::new(DAY);
        let start = Instant::now();
        let id = store.create("admin", start);
        store.validate(&id, start + hours(1)).unwrap();

        let err = store.validate(&id, start + hours(1) + hours(25)).unwrap_err();
        assert_eq!(err, AuthError::ExpiredCredential);
        assert!(store.is_empty());

        assert_eq!(
            store.validate(&id, start + hours(27)).unwrap_err(),
            AuthError::MissingCredential
        );
    }

    #[test]
    fn removed_session_is_missing() {
        let store = SessionStore::new(DAY);
        let now = Instant::now();
        let id = store.create("admin", now);
        store.remove(&id);
        store.remove(&id);
        assert_eq!(
            store.validate(&id, now).unwrap_err(),
            AuthError::MissingCredential
        );
    }

    #[test]
    fn cleanup_removes_only_expired() {
        let store = SessionStore::new(DAY);
        let start = Instant::now();
        store.create("admin", start);
        let live = store.create("admin", start + hours(10));

        store.cleanup_expired(start + hours(30));
        assert_eq!(store.len(), 1);
        assert!(store.validate(&live, start + hours(30)).is_ok());
    }
}
