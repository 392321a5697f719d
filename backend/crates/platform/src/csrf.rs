//! CSRF Double-Submit Primitives
//!
//! A random token lives in a script-readable cookie; state-changing requests
//! must echo it in a header. No server-side storage is involved — the token
//! only needs to be unguessable and unreadable from a third-party origin
//! under same-site cookie rules.

use axum::http::Method;

use crate::cookie::CookieSpec;
use crate::crypto::{constant_time_eq, random_bytes, to_base64_url};

/// Header that must carry the cookie value on unsafe methods
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Token entropy in bytes
const CSRF_TOKEN_BYTES: usize = 32;

/// CSRF guard configuration
///
/// The cookie is deliberately **not** HttpOnly — same-origin script must read
/// it to echo it back — but stays `SameSite=Strict` and `Secure` in
/// production.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    pub cookie: CookieSpec,
    /// Exact-match paths exempt from the unsafe-method check
    /// (health checks, the token-issuing endpoint itself)
    exempt_paths: Vec<String>,
}

impl CsrfGuard {
    pub fn new(cookie_name: impl Into<String>, secure: bool) -> Self {
        Self {
            cookie: CookieSpec {
                name: cookie_name.into(),
                path: "/".to_string(),
                http_only: false,
                secure,
                same_site: crate::cookie::SameSite::Strict,
                max_age_secs: None,
            },
            exempt_paths: Vec::new(),
        }
    }

    /// Add a path to the unsafe-method exemption list
    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    /// Generate a fresh token (32 random bytes, base64url)
    pub fn issue(&self) -> String {
        to_base64_url(&random_bytes(CSRF_TOKEN_BYTES))
    }

    /// Read-only methods never need the header
    pub fn is_safe_method(method: &Method) -> bool {
        matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Is this path exempt from the unsafe-method check?
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }

    /// Compare cookie and header values in constant time
    ///
    /// Absence of either side is a mismatch.
    pub fn matches(cookie: Option<&str>, header: Option<&str>) -> bool {
        match (cookie, header) {
            (Some(c), Some(h)) => constant_time_eq(c.as_bytes(), h.as_bytes()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_unique_and_urlsafe() {
        let guard = CsrfGuard::new("og_csrf", false);
        let a = guard.issue();
        let b = guard.issue();
        assert_ne!(a, b);
        assert!(!a.contains('=') && !a.contains('+') && !a.contains('/'));
    }

    #[test]
    fn test_cookie_is_script_readable() {
        let guard = CsrfGuard::new("og_csrf", true);
        let header = guard.cookie.build_set("tok");
        assert!(!header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Strict"));
    }

    #[test]
    fn test_safe_methods() {
        assert!(CsrfGuard::is_safe_method(&Method::GET));
        assert!(CsrfGuard::is_safe_method(&Method::HEAD));
        assert!(CsrfGuard::is_safe_method(&Method::OPTIONS));
        assert!(!CsrfGuard::is_safe_method(&Method::POST));
        assert!(!CsrfGuard::is_safe_method(&Method::PUT));
        assert!(!CsrfGuard::is_safe_method(&Method::DELETE));
    }

    #[test]
    fn test_exempt_paths() {
        let guard = CsrfGuard::new("og_csrf", false)
            .exempt("/api/health")
            .exempt("/api/auth/csrf");
        assert!(guard.is_exempt("/api/health"));
        assert!(guard.is_exempt("/api/auth/csrf"));
        assert!(!guard.is_exempt("/api/auth/login"));
    }

    #[test]
    fn test_matches() {
        assert!(CsrfGuard::matches(Some("token"), Some("token")));
        assert!(!CsrfGuard::matches(Some("token"), Some("other")));
        assert!(!CsrfGuard::matches(Some("token"), None));
        assert!(!CsrfGuard::matches(None, Some("token")));
        assert!(!CsrfGuard::matches(None, None));
    }
}
