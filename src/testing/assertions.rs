//! Assertion helpers for handler responses

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::ServiceResponse;
use actix_web::http::header::SET_COOKIE;

use crate::session::COOKIE_NAME;

/// Assert that a response has the expected status code
///
/// # Panics
///
/// Panics if the response status does not match the expected status code.
pub fn assert_status<B>(response: &ServiceResponse<B>, expected_status: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected_status,
        "Expected status {expected_status}, got {}",
        response.status()
    );
}

/// Extract the session cookie set by a response
///
/// # Panics
///
/// Panics if no session cookie is set or the header cannot be parsed.
#[must_use]
pub fn session_cookie_from<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .find(|cookie| cookie.name() == COOKIE_NAME)
        .unwrap_or_else(|| panic!("Expected a {COOKIE_NAME} cookie to be set"))
}

/// Assert the SameSite and Secure attributes of a cookie
///
/// # Panics
///
/// Panics if either attribute differs.
pub fn assert_cookie_policy(cookie: &Cookie<'_>, same_site: SameSite, secure: bool) {
    assert_eq!(cookie.same_site(), Some(same_site), "SameSite of {cookie}");
    assert_eq!(cookie.secure().unwrap_or(false), secure, "Secure of {cookie}");
    assert_eq!(cookie.http_only(), Some(true), "HttpOnly of {cookie}");
    assert_eq!(cookie.path(), Some("/"), "Path of {cookie}");
}
