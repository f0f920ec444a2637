//! Session Management Module
//!
//! Stateless signed sessions for the review backend.
//!
//! # Modules
//!
//! - [`secret`] - Signing secret handling
//! - [`claims`] - Session claims and their wire form
//! - [`codec`] - HS256 token encoding and verification
//! - [`cookie`] - Cookie attribute selection per request
//! - [`clock`] - Injectable time source
//! - [`manager`] - Session issuance, verification and user resolution

pub mod claims;
pub mod clock;
pub mod codec;
pub mod cookie;
pub mod errors;
pub mod manager;
pub mod secret;

pub use claims::SessionClaims;
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use codec::{DecodeError, TokenCodec};
pub use cookie::{CookiePolicy, COOKIE_NAME};
pub use errors::SessionError;
pub use manager::SessionManager;
pub(crate) use manager::upsert_from_profile;
pub use secret::SessionSecret;
