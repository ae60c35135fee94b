use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use regdesk_core::ThrottlePolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub throttle: ThrottlePolicy,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    /// Directory of static frontend files served as the router fallback.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a reverse proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// How the admin credential is carried between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    Session,
    Token,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default = "default_credential_mode")]
    pub credential_mode: CredentialMode,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_credential_ttl_hours")]
    pub credential_ttl_hours: u64,
    /// Keep logged-out token ids on a denylist until they expire.
    #[serde(default)]
    pub revoke_tokens_on_logout: bool,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: usize,
    #[serde(default = "default_max_total_size_mb")]
    pub max_total_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Registration submissions allowed per address in each period.
    #[serde(default = "default_register_burst")]
    pub register_burst: u32,
    #[serde(default = "default_register_period_minutes")]
    pub register_period_minutes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_database_url() -> String { "sqlite://regdesk.db".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_admin_username() -> String { "admin".to_string() }
fn default_credential_mode() -> CredentialMode { CredentialMode::Session }
fn default_credential_ttl_hours() -> u64 { 24 }
fn default_max_file_size_mb() -> usize { 10 }
fn default_max_total_size_mb() -> usize { 20 }
fn default_register_burst() -> u32 { 10 }
fn default_register_period_minutes() -> u64 { 15 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password_hash: String::new(),
            credential_mode: default_credential_mode(),
            jwt_secret: String::new(),
            credential_ttl_hours: default_credential_ttl_hours(),
            revoke_tokens_on_logout: false,
            secure_cookies: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_total_size_mb: default_max_total_size_mb(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            register_burst: default_register_burst(),
            register_period_minutes: default_register_period_minutes(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database: DatabaseConfig::default(),
            admin: AdminConfig::default(),
            throttle: ThrottlePolicy::default(),
            upload: UploadConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
            static_dir: None,
            trust_proxy_headers: false,
        }
    }
}

/// One year.
const MAX_CREDENTIAL_TTL_HOURS: u64 = 24 * 365;
const MAX_THROTTLE_MINUTES: u64 = 60 * 24 * 365;

const WEAK_SECRETS: &[&str] = &[
    "change-me-to-a-random-secret",
    "secret",
    "password",
    "jwt-secret",
];

impl ServerConfig {
    /// Reads `REGDESK_CONFIG` (if set), applies environment overrides and validates.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("REGDESK_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => ServerConfig::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(addr) = std::env::var("REGDESK_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Ok(url) = std::env::var("REGDESK_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(username) = std::env::var("REGDESK_ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Ok(hash) = std::env::var("REGDESK_ADMIN_PASSWORD_HASH") {
            self.admin.password_hash = hash;
        }
        if let Ok(mode) = std::env::var("REGDESK_CREDENTIAL_MODE") {
            self.admin.credential_mode = match mode.to_ascii_lowercase().as_str() {
                "session" => CredentialMode::Session,
                "token" => CredentialMode::Token,
                other => anyhow::bail!("Unknown REGDESK_CREDENTIAL_MODE: {other}"),
            };
        }
        if let Ok(secret) = std::env::var("REGDESK_JWT_SECRET") {
            self.admin.jwt_secret = secret;
        }
        if let Ok(val) = std::env::var("REGDESK_SECURE_COOKIES") {
            self.admin.secure_cookies = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(dir) = std::env::var("REGDESK_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(dir));
        }
        if let Ok(val) = std::env::var("REGDESK_TRUST_PROXY_HEADERS") {
            self.trust_proxy_headers = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(cert) = std::env::var("REGDESK_TLS_CERT") {
            self.tls.cert_path = Some(cert);
        }
        if let Ok(key) = std::env::var("REGDESK_TLS_KEY") {
            self.tls.key_path = Some(key);
        }
        Ok(())
    }

    fn validate(&mut self) -> anyhow::Result<()> {
        if self.admin.password_hash.is_empty() {
            anyhow::bail!(
                "No admin password hash configured. \
                 Generate one with the hash_password binary and set REGDESK_ADMIN_PASSWORD_HASH."
            );
        }
        regdesk_core::password::validate_hash(&self.admin.password_hash)?;

        if self.admin.credential_mode == CredentialMode::Token {
            if self.admin.jwt_secret.is_empty() {
                self.admin.jwt_secret = format!(
                    "{}{}",
                    uuid::Uuid::new_v4().simple(),
                    uuid::Uuid::new_v4().simple()
                );
                tracing::warn!(
                    "No JWT secret configured. Generated random secret (tokens will not survive a restart)."
                );
            }
            if WEAK_SECRETS.iter().any(|&w| self.admin.jwt_secret == w) {
                anyhow::bail!(
                    "JWT secret matches a known weak/placeholder value. \
                     Set a strong random secret via REGDESK_JWT_SECRET."
                );
            }
            if self.admin.jwt_secret.len() < 32 {
                tracing::warn!(
                    "JWT secret is shorter than 32 characters. \
                     Consider using a stronger secret via REGDESK_JWT_SECRET."
                );
            }
        }

        if !(1..=MAX_CREDENTIAL_TTL_HOURS).contains(&self.admin.credential_ttl_hours) {
            anyhow::bail!(
                "admin.credential_ttl_hours must be between 1 and {MAX_CREDENTIAL_TTL_HOURS}"
            );
        }
        if self.throttle.max_attempts == 0
            || self.throttle.window_minutes > MAX_THROTTLE_MINUTES
            || self.throttle.lockout_minutes > MAX_THROTTLE_MINUTES
        {
            anyhow::bail!(
                "throttle needs max_attempts >= 1 and window/lockout of at most {MAX_THROTTLE_MINUTES} minutes"
            );
        }

        if self.tls.cert_path.is_some() != self.tls.key_path.is_some() {
            anyhow::bail!("TLS needs both a certificate and a key path");
        }
        if self.tls_enabled() {
            self.admin.secure_cookies = true;
        }

        Ok(())
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.upload.max_file_size_mb * 1024 * 1024
    }

    pub fn max_total_size_bytes(&self) -> usize {
        self.upload.max_total_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn hash() -> String {
        static HASH: std::sync::OnceLock<String> = std::sync::OnceLock::new();
        HASH.get_or_init(|| regdesk_core::password::hash_password("pw").unwrap())
            .clone()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.admin.credential_mode, CredentialMode::Session);
        assert_eq!(config.admin.credential_ttl_hours, 24);
        assert_eq!(config.throttle, ThrottlePolicy::default());
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.max_total_size_bytes(), 20 * 1024 * 1024);
        assert_eq!(config.rate_limit.register_burst, 10);
        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn load_partial_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("regdesk.toml");
        fs::write(
            &path,
            r#"
bind_addr = "127.0.0.1:8080"

[admin]
username = "iamadmin"
credential_mode = "token"
jwt_secret = "0123456789abcdef0123456789abcdef"

[throttle]
max_attempts = 3
"#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.admin.username, "iamadmin");
        assert_eq!(config.admin.credential_mode, CredentialMode::Token);
        assert_eq!(config.throttle.max_attempts, 3);
        assert_eq!(config.throttle.lockout_minutes, 30);
        assert_eq!(config.database.url, "sqlite://regdesk.db");
    }

    #[test]
    fn missing_password_hash_is_rejected() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn token_mode_generates_secret() {
        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.admin.credential_mode = CredentialMode::Token;
        config.validate().unwrap();
        assert_eq!(config.admin.jwt_secret.len(), 64);
    }

    #[test]
    fn weak_secret_is_rejected() {
        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.admin.credential_mode = CredentialMode::Token;
        config.admin.jwt_secret = "secret".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn tls_forces_secure_cookies() {
        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.tls.cert_path = Some("cert.pem".to_string());
        config.tls.key_path = Some("key.pem".to_string());
        config.validate().unwrap();
        assert!(config.admin.secure_cookies);
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.admin.credential_ttl_hours = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.throttle.lockout_minutes = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.throttle.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn half_configured_tls_is_rejected() {
        let mut config = ServerConfig::default();
        config.admin.password_hash = hash();
        config.tls.cert_path = Some("cert.pem".to_string());
        assert!(config.validate().is_err());
    }
}
