//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use chrono::{DateTime, Duration};

use crate::authentication::traits::UserRepository;
use crate::identity::RemoteUserProfile;
use crate::models::{Role, User, UserUpsert};
use crate::session::{ManualClock, SessionManager, SessionSecret};
use crate::settings::MedscanSettings;
use crate::users::InMemoryUserRepository;

use super::constants::{TEST_EMAIL, TEST_EPOCH, TEST_SECRET, TEST_USER_NAME};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Signing secret shared by every fixture
    ///
    /// # Panics
    ///
    /// Never; the constant secret is long enough.
    #[must_use]
    pub fn secret() -> SessionSecret {
        SessionSecret::new(TEST_SECRET).unwrap()
    }

    /// Manual clock starting at [`TEST_EPOCH`]
    ///
    /// # Panics
    ///
    /// Never; the epoch is a valid timestamp.
    #[must_use]
    pub fn clock() -> ManualClock {
        ManualClock::new(DateTime::from_timestamp(TEST_EPOCH, 0).unwrap())
    }

    /// Session manager over an empty in-memory repository, with hour-long sessions
    #[must_use]
    pub fn session_manager() -> (SessionManager, Arc<InMemoryUserRepository>) {
        let users = Arc::new(InMemoryUserRepository::new(None));
        let manager = SessionManager::new(Self::secret(), Duration::hours(1), users.clone());
        (manager, users)
    }

    /// Settings with a fixed secret and the in-memory store
    #[must_use]
    pub fn settings() -> MedscanSettings {
        let mut settings = MedscanSettings::default();
        settings.session.session_secret = String::from_utf8_lossy(TEST_SECRET).into_owned();
        settings
    }

    /// Upsert for a user with the default name and a derived email
    #[must_use]
    pub fn user_upsert(open_id: &str) -> UserUpsert {
        UserUpsert::new(open_id)
            .with_name(Some(TEST_USER_NAME.to_string()))
            .with_email(Some(format!("{open_id}@example.com")))
    }

    /// Store a user with the given role
    ///
    /// # Panics
    ///
    /// Panics if the in-memory repository rejects the user.
    pub async fn insert_user(users: &InMemoryUserRepository, open_id: &str, role: Role) -> User {
        users
            .upsert(Self::user_upsert(open_id).with_role(role))
            .await
            .unwrap()
    }

    /// Identity service profile for `open_id`, registered through Google
    #[must_use]
    pub fn remote_profile(open_id: &str) -> RemoteUserProfile {
        RemoteUserProfile {
            open_id: open_id.to_string(),
            project_id: "test-app".to_string(),
            name: "Remote User".to_string(),
            email: Some(TEST_EMAIL.to_string()),
            platform: None,
            login_method: None,
            platforms: Some(vec!["REGISTERED_PLATFORM_GOOGLE".to_string()]),
        }
    }
}
