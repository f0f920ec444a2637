use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege level of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn is_admin(self) -> bool {
        match self {
            Role::Admin => true,
            Role::User => false,
        }
    }
}

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

impl User {
    /// Client-facing view without credential material
    #[must_use]
    pub fn public_view(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            open_id: self.open_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            login_method: self.login_method.clone(),
            role: self.role,
            last_signed_in: self.last_signed_in,
        }
    }
}

/// User as returned to the web client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: u64,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub last_signed_in: DateTime<Utc>,
}

/// Fields to insert or update for a user keyed by `open_id`
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpsert {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub last_signed_in: Option<DateTime<Utc>>,
}

impl UserUpsert {
    #[must_use]
    pub fn new(open_id: impl Into<String>) -> Self {
        Self {
            open_id: open_id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    #[must_use]
    pub fn with_login_method(mut self, login_method: Option<String>) -> Self {
        self.login_method = login_method;
        self
    }

    #[must_use]
    pub fn with_password_hash(mut self, password_hash: Option<String>) -> Self {
        self.password_hash = password_hash;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn signed_in_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_signed_in = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"user\"").unwrap(),
            Role::User
        );
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }

    #[test]
    fn test_public_view_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 1,
            open_id: "local_alice".to_string(),
            name: Some("Alice".to_string()),
            email: Some("alice@example.com".to_string()),
            login_method: Some("email".to_string()),
            role: Role::User,
            password_hash: Some("$argon2id$...".to_string()),
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        };

        let json = serde_json::to_value(user.public_view()).unwrap();
        assert_eq!(json["openId"], "local_alice");
        assert_eq!(json["role"], "user");
        assert!(json.get("passwordHash").is_none());
    }
}
