//! Fake collaborators for isolated tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::authentication::traits::RemoteUserInfo;
use crate::identity::{IdentityError, RemoteUserProfile};

/// Remote user info source returning a fixed profile and recording calls
#[derive(Debug)]
pub struct MockUserInfo {
    profile: RemoteUserProfile,
    calls: AtomicUsize,
    last_token: Mutex<Option<String>>,
}

impl MockUserInfo {
    #[must_use]
    pub fn returning(profile: RemoteUserProfile) -> Self {
        Self {
            profile,
            calls: AtomicUsize::new(0),
            last_token: Mutex::new(None),
        }
    }

    /// Number of `fetch_user_info` calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Token passed to the most recent call
    #[must_use]
    pub fn last_token(&self) -> Option<String> {
        self.last_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RemoteUserInfo for MockUserInfo {
    async fn fetch_user_info(&self, raw_token: &str) -> Result<RemoteUserProfile, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(raw_token.to_string());
        Ok(self.profile.clone())
    }
}

/// Remote user info source that always rejects the token
#[derive(Debug, Default)]
pub struct FailingUserInfo;

#[async_trait]
impl RemoteUserInfo for FailingUserInfo {
    async fn fetch_user_info(&self, _raw_token: &str) -> Result<RemoteUserProfile, IdentityError> {
        Err(IdentityError::Status {
            status: 401,
            body: "invalid token".to_string(),
        })
    }
}

/// Remote user info source that answers only after a delay
#[derive(Debug)]
pub struct SlowUserInfo {
    delay: Duration,
    profile: RemoteUserProfile,
}

impl SlowUserInfo {
    #[must_use]
    pub fn new(delay: Duration, profile: RemoteUserProfile) -> Self {
        Self { delay, profile }
    }
}

#[async_trait]
impl RemoteUserInfo for SlowUserInfo {
    async fn fetch_user_info(&self, _raw_token: &str) -> Result<RemoteUserProfile, IdentityError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.profile.clone())
    }
}
