//! Authorization gate for protected handlers

use actix_web::cookie::Cookie;
use actix_web::HttpRequest;

use crate::models::User;
use crate::session::{SessionError, SessionManager, COOKIE_NAME};

/// Resolve the caller or fail with [`SessionError::Unauthenticated`]
///
/// # Errors
///
/// Returns `Unauthenticated` without a valid session, `Internal` on repository failure
pub async fn require_user(req: &HttpRequest, manager: &SessionManager) -> Result<User, SessionError> {
    let cookie = req.cookie(COOKIE_NAME);
    manager.authenticate(cookie.as_ref().map(Cookie::value)).await
}

/// Resolve the caller and require the admin role
///
/// # Errors
///
/// Returns `Forbidden` for authenticated non-admins, otherwise as [`require_user`]
pub async fn require_admin(req: &HttpRequest, manager: &SessionManager) -> Result<User, SessionError> {
    let user = require_user(req, manager).await?;
    if user.role.is_admin() {
        Ok(user)
    } else {
        log::info!("User {} denied admin access to {}", user.open_id, req.path());
        Err(SessionError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::testing::{RequestBuilder, TestFixtures};
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_require_user_without_cookie() {
        let (manager, _users) = TestFixtures::session_manager();
        let req = RequestBuilder::local().build();

        let err = require_user(&req, &manager).await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthenticated));
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_require_user_with_session() {
        let (manager, users) = TestFixtures::session_manager();
        let user = TestFixtures::insert_user(&users, "user-1", Role::User).await;
        let token = manager.issue_token(&user.open_id, None).unwrap();
        let req = RequestBuilder::local().with_session(&token).build();

        assert_eq!(require_user(&req, &manager).await.unwrap().id, user.id);
    }

    #[actix_web::test]
    async fn test_require_admin() {
        let (manager, users) = TestFixtures::session_manager();
        let plain = TestFixtures::insert_user(&users, "user-1", Role::User).await;
        let admin = TestFixtures::insert_user(&users, "admin-1", Role::Admin).await;

        let req = RequestBuilder::local()
            .with_session(&manager.issue_token(&plain.open_id, None).unwrap())
            .build();
        let err = require_admin(&req, &manager).await.unwrap_err();
        assert!(matches!(err, SessionError::Forbidden));
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);

        let req = RequestBuilder::local()
            .with_session(&manager.issue_token(&admin.open_id, None).unwrap())
            .build();
        assert_eq!(require_admin(&req, &manager).await.unwrap().role, Role::Admin);

        let req = RequestBuilder::local().with_session("forged").build();
        assert!(matches!(
            require_admin(&req, &manager).await,
            Err(SessionError::Unauthenticated)
        ));
    }
}
