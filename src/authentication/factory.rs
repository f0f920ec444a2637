//! Service factory for wiring settings into runtime services
//!
//! Builds the user repository, the identity client, the owner notifier and the
//! `SessionManager` that ties them together.

use std::sync::Arc;

use anyhow::{ensure, Context, Result};

use crate::authentication::traits::UserRepository;
use crate::identity::IdentityClient;
use crate::notification::OwnerNotifier;
use crate::session::{SessionManager, SessionSecret};
use crate::settings::{MedscanSettings, SeedUser, UserStoreBackend, MAX_SESSION_TTL_SECONDS};
use crate::users::{self, InMemoryUserRepository, JsonFileUserRepository};

/// Runtime services shared by every worker
#[derive(Clone)]
pub struct AuthenticationServices {
    pub session_manager: SessionManager,
    pub identity: Option<IdentityClient>,
    pub notifier: OwnerNotifier,
}

/// Factory for creating authentication services with dependency injection
pub struct AuthenticationServiceFactory;

impl AuthenticationServiceFactory {
    /// Build every service described by `settings` and create the seed accounts
    ///
    /// # Errors
    ///
    /// Returns an error if the secret or lifetime is invalid, an HTTP client cannot be
    /// built, or seeding fails
    pub async fn create_services(settings: &MedscanSettings) -> Result<AuthenticationServices> {
        log::info!("🏭 Starting authentication service factory...");

        let users = Self::create_user_repository(settings);
        Self::seed_users(users.as_ref(), &settings.users.seed).await?;

        let identity = Self::create_identity_client(settings)?;
        let session_manager = Self::create_session_manager(settings, users, identity.clone())?;
        let notifier = OwnerNotifier::new(
            &settings.notification.forge_api_url,
            &settings.notification.forge_api_key,
            settings.request_timeout(),
        )
        .context("Failed to build notification client")?;

        log::info!("🏭 Authentication service factory completed successfully");
        Ok(AuthenticationServices {
            session_manager,
            identity,
            notifier,
        })
    }

    /// Select the configured user store
    #[must_use]
    pub fn create_user_repository(settings: &MedscanSettings) -> Arc<dyn UserRepository> {
        let owner = settings.owner_open_id();
        match settings.users.backend {
            UserStoreBackend::Memory => {
                log::info!("✅ Using in-memory user store");
                Arc::new(InMemoryUserRepository::new(owner))
            }
            UserStoreBackend::File => {
                log::info!("✅ Using JSON user store at {}", settings.users.data_path);
                Arc::new(JsonFileUserRepository::new(&settings.users.data_path, owner))
            }
        }
    }

    /// Identity client, or `None` when no identity service is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is invalid
    pub fn create_identity_client(settings: &MedscanSettings) -> Result<Option<IdentityClient>> {
        if settings.identity.oauth_server_url.trim().is_empty() {
            log::info!("⚠️  OAuth login and remote user sync are disabled - no identity service URL");
            return Ok(None);
        }

        let client = IdentityClient::new(
            &settings.identity.oauth_server_url,
            settings.session.app_id.trim(),
            settings.request_timeout(),
        )
        .context("Failed to configure identity client")?;
        Ok(Some(client))
    }

    /// Session manager using the configured secret, lifetime and tenant
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is too short or the lifetime is zero or out of range
    pub fn create_session_manager(
        settings: &MedscanSettings,
        users: Arc<dyn UserRepository>,
        identity: Option<IdentityClient>,
    ) -> Result<SessionManager> {
        let secret = SessionSecret::from_config(&settings.session.session_secret)?;
        ensure!(
            settings.session.session_ttl_seconds > 0,
            "session_ttl_seconds must be positive"
        );
        ensure!(
            settings.session.session_ttl_seconds <= MAX_SESSION_TTL_SECONDS,
            "session_ttl_seconds must not exceed {MAX_SESSION_TTL_SECONDS}"
        );

        let mut manager = SessionManager::new(secret, settings.session_ttl(), users)
            .with_tenant(settings.app_id())
            .with_remote_sync_timeout(settings.request_timeout());

        if let Some(identity) = identity {
            manager = manager.with_remote_user_info(Arc::new(identity));
            log::info!("✅ Remote user sync enabled");
        }

        Ok(manager)
    }

    /// Create or refresh the configured local accounts
    ///
    /// # Errors
    ///
    /// Returns an error if any account cannot be stored
    pub async fn seed_users(repository: &dyn UserRepository, seed: &[SeedUser]) -> Result<()> {
        for account in seed {
            let user =
                users::upsert_local_user(repository, &account.email, &account.password, account.name.as_deref())
                    .await
                    .with_context(|| format!("Failed to seed user {}", account.email))?;
            log::info!("   └─ Seeded local account {} ({})", account.email, user.open_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::users::password::verify_password;

    fn settings() -> MedscanSettings {
        let mut settings = MedscanSettings::default();
        settings.session.session_secret = "factory-test-secret-0123456789".to_string();
        settings
    }

    #[actix_web::test]
    async fn test_create_services_seeds_accounts() {
        let mut settings = settings();
        settings.users.owner_open_id = "local_example_at_mail.ru".to_string();
        settings.users.seed = vec![SeedUser {
            email: "Example@Mail.ru".to_string(),
            password: "123".to_string(),
            name: None,
        }];

        let services = AuthenticationServiceFactory::create_services(&settings)
            .await
            .unwrap();
        assert!(services.identity.is_none());

        let user = services
            .session_manager
            .users()
            .find_by_email("example@mail.ru")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.open_id, "local_example_at_mail.ru");
        assert_eq!(user.role, Role::Admin);
        assert!(verify_password("123", user.password_hash.as_deref().unwrap()));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut settings = settings();
        settings.session.session_secret = "short".to_string();
        let users = AuthenticationServiceFactory::create_user_repository(&settings);
        assert!(AuthenticationServiceFactory::create_session_manager(&settings, users, None).is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut settings = settings();
        settings.session.session_ttl_seconds = 0;
        let users = AuthenticationServiceFactory::create_user_repository(&settings);
        assert!(AuthenticationServiceFactory::create_session_manager(&settings, users, None).is_err());
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        let mut settings = settings();
        settings.session.session_ttl_seconds = 9_000_000_000_000;
        let users = AuthenticationServiceFactory::create_user_repository(&settings);
        assert!(AuthenticationServiceFactory::create_session_manager(&settings, users.clone(), None).is_err());

        settings.session.session_ttl_seconds = MAX_SESSION_TTL_SECONDS;
        let manager = AuthenticationServiceFactory::create_session_manager(&settings, users, None).unwrap();
        assert!(manager.issue_token("user-1", None).is_ok());
    }

    #[test]
    fn test_identity_client_only_when_configured() {
        let mut settings = settings();
        assert!(AuthenticationServiceFactory::create_identity_client(&settings)
            .unwrap()
            .is_none());

        settings.identity.oauth_server_url = "https://id.example.com".to_string();
        assert!(AuthenticationServiceFactory::create_identity_client(&settings)
            .unwrap()
            .is_some());
    }
}
