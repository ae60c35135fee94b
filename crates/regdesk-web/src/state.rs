use std::sync::Arc;
use std::time::Duration;

use regdesk_core::{Authenticator, CredentialStrategy, SessionStore, TokenIssuer};

use crate::config::{CredentialMode, ServerConfig};
use crate::db::RegistrationStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub auth: Arc<Authenticator>,
    pub store: RegistrationStore,
}

impl AppState {
    pub fn new(config: ServerConfig, store: RegistrationStore) -> Self {
        let auth = Arc::new(build_authenticator(&config));
        Self {
            config: Arc::new(config),
            auth,
            store,
        }
    }
}

/// Builds the single admin authenticator with the configured credential strategy.
pub fn build_authenticator(config: &ServerConfig) -> Authenticator {
    let ttl = Duration::from_secs(config.admin.credential_ttl_hours.saturating_mul(3600));
    let strategy = match config.admin.credential_mode {
        CredentialMode::Session => CredentialStrategy::Session(SessionStore::new(ttl)),
        CredentialMode::Token => CredentialStrategy::Token(TokenIssuer::new(
            &config.admin.jwt_secret,
            ttl,
            config.admin.revoke_tokens_on_logout,
        )),
    };
    Authenticator::new(
        config.admin.username.clone(),
        config.admin.password_hash.clone(),
        config.throttle,
        strategy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_credential_ttl_saturates() {
        let mut config = ServerConfig::default();
        config.admin.password_hash = "unused".to_string();
        config.admin.credential_ttl_hours = u64::MAX;
        let auth = build_authenticator(&config);
        assert_eq!(auth.strategy().ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn token_mode_builds_token_strategy() {
        let mut config = ServerConfig::default();
        config.admin.credential_mode = CredentialMode::Token;
        config.admin.jwt_secret = "an-adequately-long-test-secret-0123456789".to_string();
        let auth = build_authenticator(&config);
        assert!(matches!(auth.strategy(), CredentialStrategy::Token(_)));
        assert_eq!(auth.strategy().ttl(), Duration::from_secs(24 * 3600));
    }
}
