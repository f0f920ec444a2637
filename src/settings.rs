use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// One year, the lifetime of sessions issued on login
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24 * 365;

/// Longest accepted session lifetime (100 years)
pub const MAX_SESSION_TTL_SECONDS: u64 = 100 * DEFAULT_SESSION_TTL_SECONDS;

/// Upper bound on any call to the identity or notification services
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MedscanSettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub identity: IdentitySettings,
    pub users: UserStoreSettings,
    pub notification: NotificationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_secret: String,
    pub session_ttl_seconds: u64,
    /// Application id stamped into issued tokens; empty for local-only deployments
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Base URL of the OAuth identity service; empty disables OAuth and remote sync
    pub oauth_server_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStoreSettings {
    pub backend: UserStoreBackend,
    pub data_path: String,
    /// Subject id granted the admin role
    pub owner_open_id: String,
    pub seed: Vec<SeedUser>,
}

/// Local email/password account created at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationSettings {
    pub forge_api_url: String,
    pub forge_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: "http://localhost:3000,http://localhost:5173".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Will be generated if empty
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            app_id: String::new(),
        }
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            oauth_server_url: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Default for UserStoreSettings {
    fn default() -> Self {
        Self {
            backend: UserStoreBackend::Memory,
            data_path: "data/users.json".to_string(),
            owner_open_id: String::new(),
            seed: Vec::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl MedscanSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Initializes logging as a side effect.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - Logger initialization fails
    pub fn load() -> Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        Self::ensure_session_secret(&mut settings.session);

        Ok(settings)
    }

    /// Initialize `env_logger`; `RUST_LOG` wins over the configured level
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    fn initialize_logging(logging: &LoggingSettings) -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&logging.level))
            .try_init()
            .context("Failed to initialize logger")
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `MEDSCAN_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("MEDSCAN_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ MEDSCAN_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        basic_toml::from_str(&toml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_identity_env_overrides(&mut settings.identity);
        Self::apply_user_store_env_overrides(&mut settings.users);
        Self::apply_notification_env_overrides(&mut settings.notification);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        Self::apply_string_env_override("HOST", &mut app_settings.host);
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        Self::apply_string_env_override("CORS_ORIGINS", &mut app_settings.cors_origins);
    }

    fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                session_settings.session_secret = secret;
            }
        }
        Self::apply_numeric_env_override(
            "SESSION_TTL_SECONDS",
            &mut session_settings.session_ttl_seconds,
        );
        Self::apply_string_env_override("APP_ID", &mut session_settings.app_id);
    }

    fn apply_identity_env_overrides(identity_settings: &mut IdentitySettings) {
        Self::apply_string_env_override("OAUTH_SERVER_URL", &mut identity_settings.oauth_server_url);
        Self::apply_numeric_env_override(
            "IDENTITY_TIMEOUT_MS",
            &mut identity_settings.request_timeout_ms,
        );
    }

    fn apply_user_store_env_overrides(user_settings: &mut UserStoreSettings) {
        if let Ok(backend) = std::env::var("USER_STORE") {
            match backend.to_lowercase().as_str() {
                "memory" => user_settings.backend = UserStoreBackend::Memory,
                "file" => user_settings.backend = UserStoreBackend::File,
                other => eprintln!("⚠️  Ignoring unknown USER_STORE value: {other}"),
            }
        }
        Self::apply_string_env_override("USER_DATA_PATH", &mut user_settings.data_path);
        Self::apply_string_env_override("OWNER_OPEN_ID", &mut user_settings.owner_open_id);
    }

    fn apply_notification_env_overrides(notification_settings: &mut NotificationSettings) {
        Self::apply_string_env_override(
            "BUILT_IN_FORGE_API_URL",
            &mut notification_settings.forge_api_url,
        );
        Self::apply_string_env_override(
            "BUILT_IN_FORGE_API_KEY",
            &mut notification_settings.forge_api_key,
        );
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        Self::apply_string_env_override("RUST_LOG", &mut logging_settings.level);
    }

    fn apply_string_env_override(env_var: &str, target: &mut String) {
        if let Ok(value) = std::env::var(env_var) {
            *target = value;
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Replace an empty session secret with a random one
    pub fn ensure_session_secret(session_settings: &mut SessionSettings) {
        if session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            log::warn!("Using an auto-generated session secret; sessions will not survive a restart");
            log::warn!("Set JWT_SECRET or session_secret in Settings.toml for production use");
        }
    }

    /// 32 bytes of entropy, base64 encoded
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        let seconds = i64::try_from(self.session.session_ttl_seconds)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        chrono::Duration::seconds(seconds)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.identity.request_timeout_ms)
    }

    /// Application id, if one is configured
    #[must_use]
    pub fn app_id(&self) -> Option<String> {
        Some(self.session.app_id.trim().to_string()).filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn owner_open_id(&self) -> Option<String> {
        Some(self.users.owner_open_id.trim().to_string()).filter(|id| !id.is_empty())
    }
}
