//! Session Manager - Stateless Signed Session Handling
//!
//! The `SessionManager` issues session tokens on login, verifies them on every
//! authenticated request, and resolves verified tokens to user records.
//!
//! ## Architecture
//!
//! - **Token operations**: delegated to [`TokenCodec`]
//! - **Cookie attributes**: delegated to [`CookiePolicy`]
//! - **User records**: delegated to an injected [`UserRepository`]
//! - **Unknown subjects**: synced once through an injected [`RemoteUserInfo`]
//!
//! There is no server-side session store. A token stays valid until it expires;
//! logout only deletes the client's cookie.

use std::fmt;
use std::sync::Arc;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::HttpRequest;
use anyhow::{anyhow, Context, Result};
use chrono::Duration;

use crate::authentication::traits::{RemoteUserInfo, UserRepository};
use crate::identity::RemoteUserProfile;
use crate::models::{User, UserUpsert};
use crate::session::claims::SessionClaims;
use crate::session::clock::{Clock, SystemClock};
use crate::session::codec::TokenCodec;
use crate::session::cookie::{CookiePolicy, COOKIE_NAME};
use crate::session::errors::SessionError;
use crate::session::secret::SessionSecret;

/// Upper bound on the one-time remote user sync
pub const DEFAULT_REMOTE_SYNC_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

// =============================================================================
// Session Manager Structure
// =============================================================================

/// Session Manager for stateless signed session handling
#[derive(Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    session_ttl: Duration,
    tenant_id: Option<String>,
    users: Arc<dyn UserRepository>,
    remote_user_info: Option<Arc<dyn RemoteUserInfo>>,
    remote_sync_timeout: std::time::Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_ttl", &self.session_ttl)
            .field("tenant_id", &self.tenant_id)
            .field("remote_user_info", &self.remote_user_info.is_some())
            .field("remote_sync_timeout", &self.remote_sync_timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// 1. Construction
// =============================================================================

impl SessionManager {
    /// Create a session manager issuing tokens valid for `session_ttl`
    #[must_use]
    pub fn new(
        secret: SessionSecret,
        session_ttl: Duration,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(secret),
            session_ttl,
            tenant_id: None,
            users,
            remote_user_info: None,
            remote_sync_timeout: DEFAULT_REMOTE_SYNC_TIMEOUT,
            clock: Arc::new(SystemClock),
        }
    }

    /// Scope issued tokens to an application id
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id.filter(|t| !t.is_empty());
        self
    }

    /// Configure the remote user info source used for unknown subjects
    #[must_use]
    pub fn with_remote_user_info(mut self, remote: Arc<dyn RemoteUserInfo>) -> Self {
        self.remote_user_info = Some(remote);
        self
    }

    /// Bound the remote user sync
    #[must_use]
    pub fn with_remote_sync_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.remote_sync_timeout = timeout;
        self
    }

    /// Replace the time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

// =============================================================================
// 2. Token Issuance & Verification
// =============================================================================

impl SessionManager {
    /// Issue a token for `subject_id`, valid for `ttl` from now
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is empty, `ttl` is not positive or overflows the
    /// expiry timestamp, or encoding fails
    pub fn create_session(
        &self,
        subject_id: &str,
        tenant_id: Option<&str>,
        display_name: Option<&str>,
        ttl: Duration,
    ) -> Result<String> {
        if subject_id.is_empty() {
            return Err(anyhow!("Cannot issue a session without a subject id"));
        }
        if ttl <= Duration::zero() {
            return Err(anyhow!("Session lifetime must be positive, got {ttl}"));
        }

        let claims = SessionClaims::issue(subject_id, tenant_id, display_name, self.clock.now(), ttl)
            .ok_or_else(|| anyhow!("Session lifetime {ttl} is out of range"))?;
        let token = self.codec.encode(&claims)?;

        log::debug!(
            "Issued session for subject {} expiring at {}",
            claims.subject_id,
            claims.expires_at
        );
        Ok(token)
    }

    /// Issue a token with the configured tenant and lifetime
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is empty or encoding fails
    pub fn issue_token(&self, subject_id: &str, display_name: Option<&str>) -> Result<String> {
        self.create_session(
            subject_id,
            self.tenant_id.as_deref(),
            display_name,
            self.session_ttl,
        )
    }

    /// Verify a session token
    ///
    /// Every decode failure collapses to `None`; the reason is only logged.
    #[must_use]
    pub fn verify_session(&self, token: Option<&str>) -> Option<SessionClaims> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            log::debug!("Missing session cookie");
            return None;
        };

        match self.codec.decode_at(token, self.clock.now()) {
            Ok(claims) => {
                log::debug!(
                    "Session verified: subject={}, tenant={}",
                    claims.subject_id,
                    claims.tenant_id.as_deref().unwrap_or("(none)")
                );
                Some(claims)
            }
            Err(e) => {
                log::info!("Session verification failed: {e}");
                None
            }
        }
    }
}

// =============================================================================
// 3. Authentication
// =============================================================================

impl SessionManager {
    /// Resolve the session cookie value to a user record
    ///
    /// Unknown subjects are synced once from the remote user info source, keyed by the
    /// raw token. On success the user's last-seen time is updated.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Unauthenticated`] if the token is missing or invalid, or no user
    ///   can be resolved (including remote sync failures and timeouts)
    /// - [`SessionError::Internal`] if the user repository fails
    pub async fn authenticate(&self, cookie_value: Option<&str>) -> Result<User, SessionError> {
        let token = cookie_value.filter(|t| !t.is_empty());
        let claims = self
            .verify_session(token)
            .ok_or(SessionError::Unauthenticated)?;
        let token = token.ok_or(SessionError::Unauthenticated)?;
        let now = self.clock.now();

        let user = match self.users.find_by_open_id(&claims.subject_id).await? {
            Some(user) => user,
            None => self.sync_remote_user(&claims, token).await?,
        };

        let mut user = user;
        match self.users.touch_last_signed_in(&user.open_id, now).await {
            Ok(()) => user.last_signed_in = now,
            Err(e) => log::warn!("Failed to record last sign-in for {}: {e:#}", user.open_id),
        }

        Ok(user)
    }

    /// Resolve the request's session, or `None` for anonymous callers
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Internal`] only for repository failures
    pub async fn current_user(&self, req: &HttpRequest) -> Result<Option<User>, SessionError> {
        let cookie = req.cookie(COOKIE_NAME);
        match self.authenticate(cookie.as_ref().map(Cookie::value)).await {
            Ok(user) => Ok(Some(user)),
            Err(SessionError::Unauthenticated) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sync_remote_user(
        &self,
        claims: &SessionClaims,
        token: &str,
    ) -> Result<User, SessionError> {
        let Some(remote) = &self.remote_user_info else {
            log::info!(
                "No local user for subject {} and no remote user info configured",
                claims.subject_id
            );
            return Err(SessionError::Unauthenticated);
        };

        let profile =
            match tokio::time::timeout(self.remote_sync_timeout, remote.fetch_user_info(token))
                .await
            {
                Ok(Ok(profile)) => profile,
                Ok(Err(e)) => {
                    log::warn!("Failed to sync user {} from identity service: {e}", claims.subject_id);
                    return Err(SessionError::Unauthenticated);
                }
                Err(_) => {
                    log::warn!(
                        "Identity service did not answer within {:?} for user {}",
                        self.remote_sync_timeout,
                        claims.subject_id
                    );
                    return Err(SessionError::Unauthenticated);
                }
            };

        if profile.open_id != claims.subject_id {
            log::warn!(
                "Identity service returned subject {} for a session of {}",
                profile.open_id,
                claims.subject_id
            );
            return Err(SessionError::Unauthenticated);
        }

        self.users
            .upsert(upsert_from_profile(&profile, self.clock.now()))
            .await
            .context("Failed to store synced user")?;

        self.users
            .find_by_open_id(&claims.subject_id)
            .await?
            .ok_or(SessionError::Unauthenticated)
    }
}

/// User fields reported by the identity service, stamped as signed in at `now`
pub(crate) fn upsert_from_profile(profile: &RemoteUserProfile, now: chrono::DateTime<chrono::Utc>) -> UserUpsert {
    UserUpsert::new(profile.open_id.clone())
        .with_name(Some(profile.name.clone()).filter(|n| !n.is_empty()))
        .with_email(profile.email.clone())
        .with_login_method(profile.effective_login_method())
        .signed_in_at(now)
}

// =============================================================================
// 4. Cookies
// =============================================================================

impl SessionManager {
    /// Session cookie carrying `token` for this request's host
    #[must_use]
    pub fn session_cookie(&self, req: &HttpRequest, token: String) -> Cookie<'static> {
        CookiePolicy::for_request(req).build_cookie(COOKIE_NAME, token, self.cookie_max_age())
    }

    /// Deletion cookie matching the attributes `session_cookie` would set
    #[must_use]
    pub fn expired_session_cookie(&self, req: &HttpRequest) -> Cookie<'static> {
        CookiePolicy::for_request(req).expired_cookie(COOKIE_NAME)
    }

    fn cookie_max_age(&self) -> CookieDuration {
        CookieDuration::seconds(self.session_ttl.num_seconds())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

// =============================================================================
// 5. Tests
// =============================================================================
