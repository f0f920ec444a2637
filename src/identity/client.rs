use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use super::types::{
    ExchangeTokenRequest, ExchangeTokenResponse, GetUserInfoRequest, GetUserInfoWithJwtRequest,
    RemoteUserProfile, GRANT_TYPE_AUTHORIZATION_CODE,
};
use super::{decode_state, IdentityError};
use crate::authentication::traits::RemoteUserInfo;

const EXCHANGE_TOKEN_PATH: &str = "webdev.v1.WebDevAuthPublicService/ExchangeToken";
const GET_USER_INFO_PATH: &str = "webdev.v1.WebDevAuthPublicService/GetUserInfo";
const GET_USER_INFO_WITH_JWT_PATH: &str = "webdev.v1.WebDevAuthPublicService/GetUserInfoWithJwt";

/// HTTP client for the identity service
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: Url,
    app_id: String,
}

impl IdentityClient {
    /// Create a client for the service at `base_url`
    ///
    /// Every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or invalid, or the HTTP client cannot be built
    pub fn new(base_url: &str, app_id: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(IdentityError::NotConfigured);
        }

        // Url::join replaces the last path segment unless the base ends with '/'
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        log::info!("Identity service client initialized with base URL {base_url}");
        Ok(Self {
            http,
            base_url,
            app_id: app_id.to_string(),
        })
    }

    /// Exchange an authorization code for an access token
    ///
    /// The redirect URI sent back to the service is recovered from `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state is invalid or the service call fails
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        state: &str,
    ) -> Result<ExchangeTokenResponse, IdentityError> {
        let request = ExchangeTokenRequest {
            grant_type: GRANT_TYPE_AUTHORIZATION_CODE.to_string(),
            code: code.to_string(),
            refresh_token: None,
            client_id: self.app_id.clone(),
            client_secret: None,
            redirect_uri: decode_state(state)?,
        };

        log::debug!("Exchanging authorization code for token");
        self.post(EXCHANGE_TOKEN_PATH, &request).await
    }

    /// Fetch the profile behind an OAuth access token
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails
    pub async fn get_user_info(&self, access_token: &str) -> Result<RemoteUserProfile, IdentityError> {
        let request = GetUserInfoRequest {
            access_token: access_token.to_string(),
        };
        let profile: RemoteUserProfile = self.post(GET_USER_INFO_PATH, &request).await?;
        Ok(profile.resolve_login_method())
    }

    /// Fetch the profile behind a session token issued by this backend
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails
    pub async fn get_user_info_with_jwt(
        &self,
        jwt_token: &str,
    ) -> Result<RemoteUserProfile, IdentityError> {
        let request = GetUserInfoWithJwtRequest {
            jwt_token: jwt_token.to_string(),
            project_id: self.app_id.clone(),
        };
        let profile: RemoteUserProfile = self.post(GET_USER_INFO_WITH_JWT_PATH, &request).await?;
        Ok(profile.resolve_login_method())
    }

    /// Absolute URL of an endpoint path
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined onto the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        Ok(self.base_url.join(path)?)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, IdentityError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.http.post(url.clone()).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Identity service call to {url} failed with status {status}");
            return Err(IdentityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemoteUserInfo for IdentityClient {
    async fn fetch_user_info(&self, raw_token: &str) -> Result<RemoteUserProfile, IdentityError> {
        self.get_user_info_with_jwt(raw_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::{json, Value};

    /// Serve canned identity responses on an ephemeral port
    fn start_identity_stub() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/webdev.v1.WebDevAuthPublicService/ExchangeToken",
                    web::post().to(|body: web::Json<Value>| async move {
                        if body["grantType"] != "authorization_code"
                            || body["redirectUri"] != "https://app.example.com/cb"
                        {
                            return HttpResponse::BadRequest().finish();
                        }
                        HttpResponse::Ok().json(json!({
                            "accessToken": format!("access-{}", body["code"].as_str().unwrap_or("")),
                            "tokenType": "Bearer",
                            "expiresIn": 3600,
                            "scope": "profile",
                            "idToken": "id"
                        }))
                    }),
                )
                .route(
                    "/webdev.v1.WebDevAuthPublicService/GetUserInfo",
                    web::post().to(|body: web::Json<Value>| async move {
                        if body["accessToken"] != "access-good" {
                            return HttpResponse::Unauthorized().body("bad token");
                        }
                        HttpResponse::Ok().json(json!({
                            "openId": "remote-1",
                            "projectId": "app-1",
                            "name": "Remote User",
                            "email": "remote@example.com",
                            "platforms": ["REGISTERED_PLATFORM_GOOGLE"]
                        }))
                    }),
                )
                .route(
                    "/webdev.v1.WebDevAuthPublicService/GetUserInfoWithJwt",
                    web::post().to(|body: web::Json<Value>| async move {
                        HttpResponse::Ok().json(json!({
                            "openId": "remote-2",
                            "projectId": body["projectId"],
                            "name": "Jwt User",
                            "platform": "github"
                        }))
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}")
    }

    #[test]
    fn test_new_requires_base_url() {
        assert!(matches!(
            IdentityClient::new("  ", "app-1", Duration::from_secs(1)),
            Err(IdentityError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client =
            IdentityClient::new("https://id.example.com/api", "app-1", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint(EXCHANGE_TOKEN_PATH).unwrap().as_str(),
            "https://id.example.com/api/webdev.v1.WebDevAuthPublicService/ExchangeToken"
        );
    }

    #[actix_web::test]
    async fn test_code_exchange_and_user_info() {
        let base = start_identity_stub();
        let client = IdentityClient::new(&base, "app-1", Duration::from_secs(5)).unwrap();
        let state = general_purpose::STANDARD.encode("https://app.example.com/cb");

        let token = client.exchange_code_for_token("good", &state).await.unwrap();
        assert_eq!(token.access_token, "access-good");

        let profile = client.get_user_info(&token.access_token).await.unwrap();
        assert_eq!(profile.open_id, "remote-1");
        assert_eq!(profile.login_method.as_deref(), Some("google"));
        assert_eq!(profile.platform.as_deref(), Some("google"));
    }

    #[actix_web::test]
    async fn test_error_status_is_reported() {
        let base = start_identity_stub();
        let client = IdentityClient::new(&base, "app-1", Duration::from_secs(5)).unwrap();

        let result = client.get_user_info("access-bad").await;
        assert!(matches!(
            result,
            Err(IdentityError::Status { status: 401, .. })
        ));
    }

    #[actix_web::test]
    async fn test_fetch_user_info_uses_session_token() {
        let base = start_identity_stub();
        let client = IdentityClient::new(&base, "app-1", Duration::from_secs(5)).unwrap();

        let profile = client.fetch_user_info("session-jwt").await.unwrap();
        assert_eq!(profile.open_id, "remote-2");
        assert_eq!(profile.project_id, "app-1");
        assert_eq!(profile.login_method.as_deref(), Some("github"));
    }
}
