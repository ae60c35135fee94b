use axum::http::header::{InvalidHeaderValue, AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use regdesk_core::CredentialStrategy;

pub const SESSION_COOKIE_NAME: &str = "admin_session";
pub const TOKEN_COOKIE_NAME: &str = "admin_token";

pub fn cookie_name(strategy: &CredentialStrategy) -> &'static str {
    match strategy {
        CredentialStrategy::Session(_) => SESSION_COOKIE_NAME,
        CredentialStrategy::Token(_) => TOKEN_COOKIE_NAME,
    }
}

/// Finds the presented credential: the strategy's cookie first, then a
/// bearer header when tokens are in use.
pub fn extract_credential(headers: &HeaderMap, strategy: &CredentialStrategy) -> Option<String> {
    if let Some(value) = extract_cookie(headers, cookie_name(strategy)) {
        return Some(value);
    }
    match strategy {
        CredentialStrategy::Token(_) => extract_bearer_token(headers),
        CredentialStrategy::Session(_) => None,
    }
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub fn credential_cookie(
    name: &str,
    value: &str,
    max_age_secs: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    credential_cookie(name, "", 0, secure)
}
