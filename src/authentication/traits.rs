//! Collaborator traits consumed by the session manager
//!
//! The session manager owns no user data. It resolves subjects through a
//! [`UserRepository`] and, for subjects it has never seen, asks a
//! [`RemoteUserInfo`] source once before giving up.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::identity::{IdentityError, RemoteUserProfile};
use crate::models::{User, UserUpsert};

/// Persistent store of user records keyed by subject id (`open_id`)
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by subject id
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>>;

    /// Look up a user by normalized (trimmed, lowercase) email
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a new user or merge the provided fields into an existing one
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read or written
    async fn upsert(&self, fields: UserUpsert) -> Result<User>;

    /// Record that the user was seen at `at`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be written
    async fn touch_last_signed_in(&self, open_id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Remote source of user profiles, keyed by the raw session token
#[async_trait]
pub trait RemoteUserInfo: Send + Sync {
    /// Fetch the profile of the principal behind `raw_token`
    ///
    /// # Errors
    ///
    /// Returns an error if the remote service is unreachable, slow, or rejects the token
    async fn fetch_user_info(&self, raw_token: &str) -> Result<RemoteUserProfile, IdentityError>;
}
