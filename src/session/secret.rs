//! Session signing secret
//!
//! The secret is read once from settings at process start and shared
//! read-only between every request afterwards.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 16;

/// Symmetric key used to sign and verify session tokens
#[derive(Clone)]
pub struct SessionSecret(Arc<[u8]>);

impl SessionSecret {
    /// Build a secret from raw key material
    ///
    /// # Errors
    ///
    /// Returns an error if the key is shorter than [`MIN_SECRET_LEN`] bytes
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "Session secret too short: expected at least {MIN_SECRET_LEN} bytes, got {}",
                key.len()
            ));
        }
        Ok(Self(Arc::from(key)))
    }

    /// Build a secret from the configured string value
    ///
    /// # Errors
    ///
    /// Returns an error if the value is too short
    pub fn from_config(value: &str) -> Result<Self> {
        Self::new(value.as_bytes())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Never print key material
impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionSecret(<{} bytes>)", self.0.len())
    }
}
