//! Wire types of the identity service
//!
//! Field names follow the service's camelCase JSON.

use serde::{Deserialize, Serialize};

use super::derive_login_method;

pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTokenRequest {
    pub grant_type: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserInfoRequest {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserInfoWithJwtRequest {
    pub jwt_token: String,
    pub project_id: String,
}

/// User profile as reported by the identity service
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUserProfile {
    pub open_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub login_method: Option<String>,
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
}

impl RemoteUserProfile {
    /// Login method to store for this profile
    ///
    /// An explicit login method wins, then the reported platform, then the
    /// registered platforms list.
    #[must_use]
    pub fn effective_login_method(&self) -> Option<String> {
        self.login_method
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| {
                derive_login_method(
                    self.platforms.as_deref().unwrap_or_default(),
                    self.platform.as_deref(),
                )
            })
    }

    /// Fill `platform` and `login_method` from the derived login method
    pub(crate) fn resolve_login_method(mut self) -> Self {
        let method = derive_login_method(
            self.platforms.as_deref().unwrap_or_default(),
            self.platform.as_deref(),
        );
        self.platform.clone_from(&method);
        self.login_method = method;
        self
    }
}
