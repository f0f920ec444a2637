//! Identity service integration
//!
//! The identity service runs the OAuth authorization-code flow for the web client
//! and answers user-info queries, either by OAuth access token or by the session
//! token this backend issued.
//!
//! # Modules
//!
//! - [`client`] - HTTP client for the identity service endpoints
//! - [`types`] - Request and response bodies

pub mod client;
pub mod types;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

pub use client::IdentityClient;
pub use types::{ExchangeTokenResponse, RemoteUserProfile};

/// Failures talking to the identity service
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service URL is not configured")]
    NotConfigured,
    #[error("invalid OAuth state: {0}")]
    InvalidState(String),
    #[error("identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid identity service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Platform identifiers reported by the identity service, in priority order
const PLATFORM_LOGIN_METHODS: &[(&[&str], &str)] = &[
    (&["REGISTERED_PLATFORM_EMAIL"], "email"),
    (&["REGISTERED_PLATFORM_GOOGLE"], "google"),
    (&["REGISTERED_PLATFORM_APPLE"], "apple"),
    (
        &["REGISTERED_PLATFORM_MICROSOFT", "REGISTERED_PLATFORM_AZURE"],
        "microsoft",
    ),
    (&["REGISTERED_PLATFORM_GITHUB"], "github"),
];

/// Pick the login method to record for a user
///
/// A non-empty `fallback` (the platform the service reported directly) wins.
/// Otherwise the best-known registered platform is used, and failing that the
/// first listed platform, lowercased.
#[must_use]
pub fn derive_login_method(platforms: &[String], fallback: Option<&str>) -> Option<String> {
    if let Some(fallback) = fallback.filter(|f| !f.is_empty()) {
        return Some(fallback.to_string());
    }

    for (names, method) in PLATFORM_LOGIN_METHODS {
        if platforms.iter().any(|p| names.contains(&p.as_str())) {
            return Some((*method).to_string());
        }
    }

    platforms.first().map(|p| p.to_lowercase())
}

/// Recover the redirect URI carried in the OAuth `state` parameter
///
/// # Errors
///
/// Returns [`IdentityError::InvalidState`] if the state is not base64 encoded UTF-8
pub fn decode_state(state: &str) -> Result<String, IdentityError> {
    let bytes = general_purpose::STANDARD
        .decode(state.trim())
        .map_err(|e| IdentityError::InvalidState(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| IdentityError::InvalidState(e.to_string()))
}
