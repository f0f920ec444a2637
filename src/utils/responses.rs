//! HTTP response handling system
//!
//! This module provides a unified interface for creating HTTP responses across the application,
//! offering consistent patterns for errors, redirects, and JSON responses. The bodies of the
//! common error responses are serialized once and reused.

use std::sync::LazyLock;

use actix_web::{cookie::Cookie, http::header::ContentType, http::StatusCode, HttpResponse};
use serde_json::{json, Value};

/// Message shown to clients without a usable session
pub const UNAUTHENTICATED_MESSAGE: &str = "Please login (10001)";

/// Message shown to authenticated clients lacking the admin role
pub const FORBIDDEN_MESSAGE: &str = "You do not have required permission (10002)";

/// Error categories answered by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
    BadRequest = 0,
    Unauthorized = 1,
    Forbidden = 2,
    Internal = 3,
}

impl ErrorKind {
    const ALL: [ErrorKind; 4] = [
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::Internal,
    ];

    fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "invalid_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Internal => "server_error",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "The request is malformed or invalid",
            ErrorKind::Unauthorized => UNAUTHENTICATED_MESSAGE,
            ErrorKind::Forbidden => FORBIDDEN_MESSAGE,
            ErrorKind::Internal => "An internal server error occurred",
        }
    }
}

/// Default error bodies, serialized once and indexed by [`ErrorKind`]
static DEFAULT_BODIES: LazyLock<[String; 4]> =
    LazyLock::new(|| ErrorKind::ALL.map(|kind| error_body(kind.code(), kind.description())));

fn error_body(code: &str, description: &str) -> String {
    json!({
        "error": code,
        "error_description": description,
    })
    .to_string()
}

/// Unified response builder that handles all types of HTTP responses
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// 400 with the `invalid_request` body unless customized
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorKind::BadRequest)
    }

    /// 401 with the login prompt body unless customized
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorKind::Unauthorized)
    }

    /// 403 with the missing permission body unless customized
    #[must_use]
    pub fn forbidden() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorKind::Forbidden)
    }

    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorKind::Internal)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// 302 Found to `location`
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    /// 200 OK with a JSON body
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder {
            cookies: Vec::new(),
        }
    }

    // ===============================
    // CONVENIENCE METHODS
    // ===============================

    #[must_use]
    pub fn missing_field(field_name: &str) -> HttpResponse {
        Self::bad_request()
            .with_error_code("missing_field")
            .with_message(&format!("Missing required field: {field_name}"))
            .build()
    }

    #[must_use]
    pub fn invalid_field(field_name: &str, reason: &str) -> HttpResponse {
        Self::bad_request()
            .with_error_code("invalid_field")
            .with_message(&format!("Invalid {field_name}: {reason}"))
            .build()
    }

    /// 401 for rejected credentials
    #[must_use]
    pub fn authentication_failed(reason: &str) -> HttpResponse {
        Self::unauthorized()
            .with_error_code("authentication_failed")
            .with_message(reason)
            .build()
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Error response with an optional custom code and message
pub struct ErrorResponseBuilder {
    kind: ErrorKind,
    error_code: Option<String>,
    message: Option<String>,
}

/// Redirect carrying cookies
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

/// JSON success response carrying cookies
pub struct JsonResponseBuilder {
    cookies: Vec<Cookie<'static>>,
}

impl ErrorResponseBuilder {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            error_code: None,
            message: None,
        }
    }

    /// Replace the `error` field (e.g. "`missing_field`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Replace the `error_description` field
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let body = match (self.error_code, self.message) {
            (None, None) => DEFAULT_BODIES[self.kind as usize].clone(),
            (code, message) => error_body(
                code.as_deref().unwrap_or(self.kind.code()),
                message.as_deref().unwrap_or(self.kind.description()),
            ),
        };

        HttpResponse::build(self.kind.status())
            .content_type(ContentType::json())
            .body(body)
    }
}

// ===============================
// REDIRECT BUILDER IMPL
// ===============================

impl RedirectBuilder {
    /// Add a cookie to the redirect response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build the final redirect response
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.append_header(("Location", self.location)).finish()
    }
}

// ===============================
// JSON RESPONSE BUILDER IMPL
// ===============================

impl JsonResponseBuilder {
    /// Attach a cookie to the response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.json(data)
    }

    /// Build the response with a raw JSON value
    #[must_use]
    pub fn value(self, data: Value) -> HttpResponse {
        self.json(&data)
    }
}
