// Authentication handlers: login, logout and current user
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::PublicUser;
use crate::session::{SessionError, SessionManager};
use crate::users::{normalize_email, password::verify_password};
use crate::utils::responses::ResponseBuilder;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Email/password login
///
/// Sets the session cookie on success.
///
/// # Errors
/// Returns an error if the user store fails or the token cannot be issued
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let email = normalize_email(&body.email);
    let password = body.password.trim();

    if email.is_empty() {
        return Ok(ResponseBuilder::missing_field("email"));
    }
    if password.is_empty() {
        return Ok(ResponseBuilder::missing_field("password"));
    }

    debug!("Login attempt for {email}");
    let user = session_manager
        .users()
        .find_by_email(&email)
        .await
        .map_err(SessionError::from)?;

    let Some(user) = user.filter(|u| {
        u.password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash))
    }) else {
        info!("Login failed for {email}");
        return Ok(ResponseBuilder::authentication_failed(INVALID_CREDENTIALS));
    };

    let display_name = user.name.clone().unwrap_or_else(|| email.clone());
    let token = session_manager
        .issue_token(&user.open_id, Some(display_name.as_str()))
        .map_err(SessionError::from)?;

    let now = session_manager.clock().now();
    let mut user = user;
    match session_manager
        .users()
        .touch_last_signed_in(&user.open_id, now)
        .await
    {
        Ok(()) => user.last_signed_in = now,
        Err(e) => warn!("Failed to record sign-in for {}: {e:#}", user.open_id),
    }

    info!("User {} logged in", user.open_id);
    Ok(ResponseBuilder::ok()
        .with_cookie(session_manager.session_cookie(&req, token))
        .json(&LoginResponse {
            success: true,
            user: user.public_view(),
        }))
}

/// Logout
///
/// Sessions are stateless, so this only deletes the cookie, using the attributes
/// it was set with.
///
/// # Errors
/// Never fails; the signature matches the other handlers
pub async fn logout(
    req: HttpRequest,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    Ok(ResponseBuilder::ok()
        .with_cookie(session_manager.expired_session_cookie(&req))
        .value(json!({ "success": true })))
}

/// Current user, or `null` for anonymous callers
///
/// # Errors
/// Returns an error if the user store fails
pub async fn me(req: HttpRequest, session_manager: web::Data<SessionManager>) -> Result<HttpResponse> {
    let user = session_manager.current_user(&req).await?;
    Ok(ResponseBuilder::ok().json(&user.map(|u| u.public_view())))
}
