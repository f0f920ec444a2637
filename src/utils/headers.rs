//! HTTP header helpers
//!
//! Small accessors over the request headers the session layer cares about:
//! the `Host` header, the connection scheme and `X-Forwarded-Proto`.

use actix_web::http::header;
use actix_web::HttpRequest;

/// Header set by reverse proxies that terminate TLS
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Raw `Host` header value, including any port
///
/// Falls back to the host actix resolved for the connection when the header
/// is absent (HTTP/2 requests carry the authority instead).
#[must_use]
pub fn host_header(req: &HttpRequest) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map_or_else(
            || req.connection_info().host().to_string(),
            ToString::to_string,
        )
}

/// Scheme of the connection as seen by this server (not by the client)
#[must_use]
pub fn request_scheme(req: &HttpRequest) -> String {
    req.uri()
        .scheme_str()
        .map_or_else(
            || {
                if req.app_config().secure() {
                    "https".to_string()
                } else {
                    "http".to_string()
                }
            },
            ToString::to_string,
        )
}

/// Value of `X-Forwarded-Proto`, if present and valid UTF-8
#[must_use]
pub fn forwarded_proto(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|h| h.to_str().ok())
        .map(ToString::to_string)
}

/// Strip a port suffix from a `Host` header value
///
/// Bracketed IPv6 literals (`[::1]:8080`) keep their address without brackets.
/// A bare IPv6 literal (more than one colon) is returned unchanged.
#[must_use]
pub fn strip_port(host: &str) -> &str {
    let host = host.trim();

    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }

    match host.matches(':').count() {
        1 => host.split(':').next().unwrap_or(host),
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("localhost:3000"), "localhost");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port(" 203.0.113.5:4000 "), "203.0.113.5");
        assert_eq!(strip_port(""), "");
    }

    #[test]
    fn test_header_accessors() {
        let req = TestRequest::default()
            .insert_header(("Host", "app.example.com:443"))
            .insert_header(("X-Forwarded-Proto", "https"))
            .to_http_request();

        assert_eq!(host_header(&req), "app.example.com:443");
        assert_eq!(forwarded_proto(&req).as_deref(), Some("https"));
        assert_eq!(request_scheme(&req), "http");
    }

    #[test]
    fn test_missing_forwarded_proto() {
        let req = TestRequest::default().to_http_request();
        assert!(forwarded_proto(&req).is_none());
    }
}
