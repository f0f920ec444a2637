// OAuth callback handler
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{error, info};
use serde::Deserialize;

use crate::identity::{IdentityClient, IdentityError, RemoteUserProfile};
use crate::session::{upsert_from_profile, SessionManager};
use crate::utils::responses::ResponseBuilder;

/// Where the browser lands after a successful login
const POST_LOGIN_REDIRECT: &str = "/";

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Complete the authorization-code flow
///
/// Exchanges the code, stores the user, sets the session cookie and redirects home.
///
/// # Errors
/// Never returns `Err`; failures are mapped to error responses
pub async fn oauth_callback(
    req: HttpRequest,
    query: web::Query<OAuthCallbackQuery>,
    session_manager: web::Data<SessionManager>,
    identity: Option<web::Data<IdentityClient>>,
) -> Result<HttpResponse> {
    let (Some(code), Some(state)) = (
        query.code.as_deref().filter(|c| !c.is_empty()),
        query.state.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Ok(ResponseBuilder::bad_request()
            .with_error_code("missing_parameters")
            .with_message("code and state are required")
            .build());
    };

    let Some(identity) = identity else {
        error!("OAuth callback received but no identity service is configured");
        return Ok(ResponseBuilder::internal_server_error()
            .with_message("OAuth is not configured")
            .build());
    };

    let profile = match fetch_profile(&identity, code, state).await {
        Ok(profile) => profile,
        Err(IdentityError::InvalidState(reason)) => {
            info!("Rejected OAuth callback with invalid state: {reason}");
            return Ok(ResponseBuilder::invalid_field("state", "not a valid redirect URI"));
        }
        Err(e) => {
            error!("OAuth callback failed: {e}");
            return Ok(ResponseBuilder::internal_server_error()
                .with_message("OAuth callback failed")
                .build());
        }
    };

    if profile.open_id.is_empty() {
        return Ok(ResponseBuilder::bad_request()
            .with_message("openId missing from user info")
            .build());
    }

    let now = session_manager.clock().now();
    if let Err(e) = session_manager
        .users()
        .upsert(upsert_from_profile(&profile, now))
        .await
    {
        error!("Failed to store OAuth user {}: {e:#}", profile.open_id);
        return Ok(ResponseBuilder::internal_server_error()
            .with_message("OAuth callback failed")
            .build());
    }

    let token = match session_manager.issue_token(&profile.open_id, Some(profile.name.as_str())) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to issue session for {}: {e:#}", profile.open_id);
            return Ok(ResponseBuilder::internal_server_error().build());
        }
    };

    info!("OAuth login completed for {}", profile.open_id);
    Ok(ResponseBuilder::redirect(POST_LOGIN_REDIRECT)
        .with_cookie(session_manager.session_cookie(&req, token))
        .build())
}

async fn fetch_profile(
    identity: &IdentityClient,
    code: &str,
    state: &str,
) -> Result<RemoteUserProfile, IdentityError> {
    let token = identity.exchange_code_for_token(code, state).await?;
    identity.get_user_info(&token.access_token).await
}
