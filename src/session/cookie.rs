//! Session cookie attributes
//!
//! Attributes are chosen per request from the host the browser addressed.
//! Local and IP hosts (plain HTTP development) get `SameSite=Lax` without `Secure`,
//! because browsers drop `SameSite=None` cookies that are not also `Secure`.
//! Named hosts get `SameSite=None` so the app can be embedded cross-site, with
//! `Secure` set whenever the client connection is HTTPS.
//!
//! The host classification is best-effort and must not feed authorization decisions.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

use crate::utils::headers::{forwarded_proto, host_header, request_scheme, strip_port};

/// Name of the cookie carrying the session token, shared with the web client
pub const COOKIE_NAME: &str = "app_session_id";

/// Hosts always treated as local development
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Attributes applied to the session cookie for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub http_only: bool,
    pub path: String,
    pub same_site: SameSite,
    pub secure: bool,
    pub domain: Option<String>,
}

impl CookiePolicy {
    /// Choose cookie attributes from the request's host and transport
    #[must_use]
    pub fn select(host_header: &str, request_scheme: &str, forwarded_proto: Option<&str>) -> Self {
        let host = strip_port(host_header);

        if is_local_host(host) {
            return Self {
                http_only: true,
                path: "/".to_string(),
                same_site: SameSite::Lax,
                secure: false,
                domain: None,
            };
        }

        Self {
            http_only: true,
            path: "/".to_string(),
            same_site: SameSite::None,
            secure: is_secure_transport(request_scheme, forwarded_proto),
            domain: None,
        }
    }

    /// Select attributes for an actix request
    #[must_use]
    pub fn for_request(req: &HttpRequest) -> Self {
        Self::select(
            &host_header(req),
            &request_scheme(req),
            forwarded_proto(req).as_deref(),
        )
    }

    /// Build a cookie carrying `value` with these attributes
    #[must_use]
    pub fn build_cookie(&self, name: &str, value: String, max_age: Duration) -> Cookie<'static> {
        let mut builder = Cookie::build(name.to_owned(), value)
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path.clone())
            .max_age(max_age);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.finish()
    }

    /// Build a deletion cookie with the same attributes
    ///
    /// Some browsers only clear a cookie when the deletion matches the attributes it was set with.
    #[must_use]
    pub fn expired_cookie(&self, name: &str) -> Cookie<'static> {
        let mut cookie = self.build_cookie(name, String::new(), Duration::ZERO);
        cookie.make_removal();
        cookie
    }
}

/// Local development host: a loopback name or any IP literal
#[must_use]
pub fn is_local_host(host: &str) -> bool {
    LOCAL_HOSTS.iter().any(|local| local.eq_ignore_ascii_case(host)) || is_ip_address(host)
}

/// IPv4 dotted quad with four numeric parts, or anything containing `:` (IPv6 heuristic)
#[must_use]
pub fn is_ip_address(host: &str) -> bool {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() == 4
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
    {
        return true;
    }
    host.contains(':')
}

/// Whether the client reached us over HTTPS, directly or through a proxy
#[must_use]
pub fn is_secure_transport(request_scheme: &str, forwarded_proto: Option<&str>) -> bool {
    if request_scheme.eq_ignore_ascii_case("https") {
        return true;
    }

    forwarded_proto.is_some_and(|value| {
        value
            .split(',')
            .any(|proto| proto.trim().eq_ignore_ascii_case("https"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_localhost_is_lax_and_insecure() {
        let policy = CookiePolicy::select("localhost", "http", None);
        assert_eq!(policy.same_site, SameSite::Lax);
        assert!(!policy.secure);
        assert!(policy.http_only);
        assert_eq!(policy.path, "/");
        assert_eq!(policy.domain, None);
    }

    #[test]
    fn test_localhost_with_port() {
        let policy = CookiePolicy::select("localhost:4000", "https", Some("https"));
        assert_eq!(policy.same_site, SameSite::Lax);
        assert!(!policy.secure);
    }

    #[test]
    fn test_localhost_any_case() {
        let policy = CookiePolicy::select("LocalHost:3000", "http", None);
        assert_eq!(policy.same_site, SameSite::Lax);
        assert!(!policy.secure);
        assert!(is_local_host("LOCALHOST"));
    }

    #[test]
    fn test_ipv4_literal_takes_local_path() {
        let policy = CookiePolicy::select("203.0.113.5", "http", None);
        assert_eq!(policy.same_site, SameSite::Lax);
        assert!(!policy.secure);
    }

    #[test]
    fn test_ipv6_literals_take_local_path() {
        assert_eq!(
            CookiePolicy::select("[::1]:4000", "http", None).same_site,
            SameSite::Lax
        );
        assert_eq!(
            CookiePolicy::select("[2001:db8::1]", "https", None).same_site,
            SameSite::Lax
        );
    }

    #[test]
    fn test_named_host_behind_tls_proxy() {
        let policy = CookiePolicy::select("example.com", "http", Some("https, http"));
        assert_eq!(policy.same_site, SameSite::None);
        assert!(policy.secure);
    }

    #[test]
    fn test_named_host_forwarded_proto_case_insensitive() {
        let policy = CookiePolicy::select("example.com", "http", Some(" HTTPS "));
        assert!(policy.secure);
    }

    #[test]
    fn test_named_host_plain_http() {
        let policy = CookiePolicy::select("example.com", "http", Some("http"));
        assert_eq!(policy.same_site, SameSite::None);
        assert!(!policy.secure);

        let policy = CookiePolicy::select("example.com", "http", None);
        assert!(!policy.secure);
    }

    #[test]
    fn test_named_host_direct_https() {
        let policy = CookiePolicy::select("ai.example.org:443", "https", None);
        assert_eq!(policy.same_site, SameSite::None);
        assert!(policy.secure);
    }

    #[test]
    fn test_ip_heuristic() {
        assert!(is_ip_address("10.0.0.1"));
        assert!(is_ip_address("fe80::1"));
        assert!(!is_ip_address("1.2.3"));
        assert!(!is_ip_address("a.b.c.d"));
        assert!(!is_ip_address("1..2.3"));
        assert!(!is_ip_address("example.com"));
    }

    #[test]
    fn test_for_request_reads_headers() {
        let req = TestRequest::default()
            .insert_header(("Host", "app.example.com"))
            .insert_header(("X-Forwarded-Proto", "https"))
            .to_http_request();

        let policy = CookiePolicy::for_request(&req);
        assert_eq!(policy.same_site, SameSite::None);
        assert!(policy.secure);
    }

    #[test]
    fn test_build_and_expire_cookie_share_attributes() {
        let policy = CookiePolicy::select("example.com", "https", None);
        let cookie = policy.build_cookie(COOKIE_NAME, "token".to_string(), Duration::hours(1));
        let removal = policy.expired_cookie(COOKIE_NAME);

        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.max_age(), Some(Duration::hours(1)));
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(Duration::ZERO));

        for c in [&cookie, &removal] {
            assert_eq!(c.same_site(), Some(SameSite::None));
            assert_eq!(c.secure(), Some(true));
            assert_eq!(c.http_only(), Some(true));
            assert_eq!(c.path(), Some("/"));
        }
    }
}
