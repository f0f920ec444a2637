//! HTTP request builders for testing handlers and the cookie policy

use actix_web::cookie::Cookie;
use actix_web::http::Method;
use actix_web::{test, HttpRequest};
use serde_json::Value;

use super::constants::{LOCAL_HOST, PUBLIC_HOST};
use crate::session::COOKIE_NAME;

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
    body: Option<Value>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Create a new request builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    /// Request addressed to the local development host
    #[must_use]
    pub fn local() -> Self {
        Self::new().host(LOCAL_HOST)
    }

    /// Request addressed to the public host behind a TLS-terminating proxy
    #[must_use]
    pub fn public_https() -> Self {
        Self::new().host(PUBLIC_HOST).forwarded_proto("https")
    }

    /// Set the HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn host(self, host: &str) -> Self {
        self.header("Host", host)
    }

    #[must_use]
    pub fn forwarded_proto(self, proto: &str) -> Self {
        self.header("X-Forwarded-Proto", proto)
    }

    /// Add a cookie to the request
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Attach a session cookie carrying `token`
    #[must_use]
    pub fn with_session(self, token: &str) -> Self {
        self.with_cookie(Cookie::new(COOKIE_NAME, token.to_string()))
    }

    /// Set JSON body
    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build an actix `TestRequest` for driving a service
    #[must_use]
    pub fn to_test_request(self) -> test::TestRequest {
        let mut req = test::TestRequest::default()
            .method(self.method)
            .uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        if let Some(body) = self.body {
            req = req.set_json(body);
        }

        req
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.to_test_request().to_http_request()
    }
}
