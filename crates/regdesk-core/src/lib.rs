//! regdesk core library: transport-agnostic registration and admin auth logic.
//!
//! `regdesk-core` holds everything the HTTP frontend (`regdesk-web`) needs
//! that is not tied to axum or the database driver.
//!
//! # Modules
//!
//! - [`throttle`]: Per-address login throttling with timed lockout.
//! - [`session`]: Server-held admin sessions with sliding expiry.
//! - [`token`]: Self-verifying signed admin tokens.
//! - [`authenticator`]: The single admin login component tying the above together.
//! - [`password`]: argon2 password hashing and verification.
//! - [`registration`]: Event catalog and registration form validation.
//! - [`document`]: Content-type sniffing for uploaded documents.
//! - [`export`]: CSV spreadsheet export of registrations.
//! - [`error`]: Error types ([`CoreError`], [`AuthError`]) and result alias.

pub mod authenticator;
pub mod document;
pub mod error;
pub mod export;
pub mod password;
pub mod registration;
pub mod session;
pub mod throttle;
pub mod token;

pub use authenticator::{Authenticator, CredentialStrategy, IssuedCredential, Principal};
pub use error::{AuthError, CoreError, CoreResult};
pub use registration::{
    DocumentKind, Event, NewRegistration, RegistrationForm, RegistrationRecord,
    RegistrationSummary,
};
pub use session::{Session, SessionStore};
pub use throttle::{LoginThrottle, ThrottlePolicy};
pub use token::{Claims, TokenIssuer};
