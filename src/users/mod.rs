//! User repositories
//!
//! # Modules
//!
//! - [`memory`] - Process-local repository
//! - [`file`] - Repository persisted as a JSON document
//! - [`password`] - Argon2 password hashing
//!
//! Both repositories share [`UserTable`] for the upsert rules: absent fields
//! leave stored values alone, and the configured owner always ends up `Admin`.

pub mod file;
pub mod memory;
pub mod password;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authentication::traits::UserRepository;
use crate::models::{Role, User, UserUpsert};

pub use file::JsonFileUserRepository;
pub use memory::InMemoryUserRepository;

/// Login method recorded for email/password accounts
pub const EMAIL_LOGIN_METHOD: &str = "email";

/// Trimmed, lowercased form used for every email comparison
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Subject id assigned to a local email/password account
#[must_use]
pub fn local_open_id(email: &str) -> String {
    format!("local_{}", normalize_email(email).replace('@', "_at_"))
}

/// Ordered set of user records with sequential ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTable {
    next_id: u64,
    users: Vec<User>,
}

impl UserTable {
    #[must_use]
    pub fn find_by_open_id(&self, open_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.open_id == open_id)
    }

    #[must_use]
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users
            .iter()
            .find(|u| u.email.as_deref().map(normalize_email).as_deref() == Some(email.as_str()))
    }

    /// Insert or merge `fields`, returning the stored record
    ///
    /// # Errors
    ///
    /// Returns an error if `fields.open_id` is empty
    pub fn upsert(
        &mut self,
        fields: UserUpsert,
        owner_open_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        anyhow::ensure!(!fields.open_id.is_empty(), "User open id is required for upsert");

        let is_owner = owner_open_id.is_some_and(|owner| owner == fields.open_id);
        let email = fields.email.as_deref().map(normalize_email);

        if let Some(user) = self.users.iter_mut().find(|u| u.open_id == fields.open_id) {
            if fields.name.is_some() {
                user.name = fields.name;
            }
            if email.is_some() {
                user.email = email;
            }
            if fields.login_method.is_some() {
                user.login_method = fields.login_method;
            }
            if fields.password_hash.is_some() {
                user.password_hash = fields.password_hash;
            }
            if let Some(at) = fields.last_signed_in {
                user.last_signed_in = at;
            }
            if let Some(role) = fields.role {
                user.role = role;
            }
            if is_owner {
                user.role = Role::Admin;
            }
            user.updated_at = now;
            return Ok(user.clone());
        }

        self.next_id += 1;
        let user = User {
            id: self.next_id,
            open_id: fields.open_id,
            name: fields.name,
            email,
            login_method: fields.login_method,
            role: if is_owner {
                Role::Admin
            } else {
                fields.role.unwrap_or_default()
            },
            password_hash: fields.password_hash,
            created_at: now,
            updated_at: now,
            last_signed_in: fields.last_signed_in.unwrap_or(now),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    /// Set the last-seen time of an existing user
    ///
    /// # Errors
    ///
    /// Returns an error if no user has `open_id`
    pub fn touch(&mut self, open_id: &str, at: DateTime<Utc>) -> Result<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.open_id == open_id)
            .with_context(|| format!("No user with open id {open_id}"))?;
        user.last_signed_in = at;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Create or update a local email/password account
///
/// An existing account with the same email keeps its subject id; otherwise
/// the id is derived from the email.
///
/// # Errors
///
/// Returns an error if hashing or the repository fails
pub async fn upsert_local_user(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<User> {
    let email = normalize_email(email);
    anyhow::ensure!(!email.is_empty(), "Local user email is required");

    let open_id = match users.find_by_email(&email).await? {
        Some(existing) => existing.open_id,
        None => local_open_id(&email),
    };
    let name = name
        .map(str::to_string)
        .or_else(|| email.split('@').next().map(str::to_string));

    users
        .upsert(
            UserUpsert::new(open_id)
                .with_name(name)
                .with_email(Some(email))
                .with_login_method(Some(EMAIL_LOGIN_METHOD.to_string()))
                .with_password_hash(Some(password::hash_password(password)?)),
        )
        .await
}
