//! Session claims carried inside a signed token

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Claims identifying the principal behind a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub subject_id: String,
    pub tenant_id: Option<String>,
    pub display_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Build claims issued at `now` and valid for `ttl`
    ///
    /// Timestamps are truncated to whole seconds, the precision of the wire format.
    /// An empty tenant collapses to `None`; an empty display name falls back to the subject.
    /// Returns `None` if the expiry is past the representable range.
    #[must_use]
    pub fn issue(
        subject_id: &str,
        tenant_id: Option<&str>,
        display_name: Option<&str>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        let issued_at = truncate_to_seconds(now);
        let expires_at = issued_at.checked_add_signed(ttl)?;
        Some(Self {
            subject_id: subject_id.to_string(),
            tenant_id: tenant_id.filter(|t| !t.is_empty()).map(ToString::to_string),
            display_name: display_name
                .filter(|n| !n.is_empty())
                .unwrap_or(subject_id)
                .to_string(),
            issued_at,
            expires_at,
        })
    }

    /// Whether the claims are usable at `now`
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.subject_id.is_empty() && self.issued_at <= now && now < self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// JSON payload of a session token, in the field names the web client uses
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    #[serde(rename = "openId", default)]
    pub open_id: Option<String>,
    #[serde(rename = "appId", default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl From<&SessionClaims> for WireClaims {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            open_id: Some(claims.subject_id.clone()),
            app_id: Some(claims.tenant_id.clone().unwrap_or_default()),
            name: Some(claims.display_name.clone()),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        }
    }
}

impl WireClaims {
    /// Convert to domain claims; `None` when the subject is missing or timestamps are invalid
    pub(crate) fn into_claims(self) -> Option<SessionClaims> {
        let subject_id = self.open_id.filter(|s| !s.is_empty())?;
        let issued_at = DateTime::from_timestamp(self.iat, 0)?;
        let expires_at = DateTime::from_timestamp(self.exp, 0)?;
        if expires_at <= issued_at {
            return None;
        }

        let display_name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| subject_id.clone());

        Some(SessionClaims {
            tenant_id: self.app_id.filter(|a| !a.is_empty()),
            display_name,
            subject_id,
            issued_at,
            expires_at,
        })
    }
}

fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).unwrap_or(ts)
}
