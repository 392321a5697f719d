//! Cookie Management Infrastructure
//!
//! Cookie building and parsing. A [`CookieSpec`] fixes name, path, and flags
//! once, so set and clear always agree — a cleared cookie with different
//! path or flags is not removed by browsers.

use axum::http::{HeaderMap, HeaderValue, header};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie name, scope, and flags
#[derive(Debug, Clone)]
pub struct CookieSpec {
    pub name: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    /// None = session cookie
    pub max_age_secs: Option<i64>,
}

impl Default for CookieSpec {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            path: "/".to_string(),
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            max_age_secs: None,
        }
    }
}

impl CookieSpec {
    /// Build a Set-Cookie header value carrying `value`
    pub fn build_set(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }

    /// Build a Set-Cookie header value that removes the cookie
    ///
    /// Uses the same path and flags as `build_set`.
    pub fn build_clear(&self) -> String {
        let mut cookie = format!("{}=", self.name);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));
        cookie.push_str("; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT");

        cookie
    }

    /// `build_set` as a `HeaderValue`
    pub fn set_header(&self, value: &str) -> HeaderValue {
        HeaderValue::from_str(&self.build_set(value))
            .unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    /// `build_clear` as a `HeaderValue`
    pub fn clear_header(&self) -> HeaderValue {
        HeaderValue::from_str(&self.build_clear()).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// Extract a cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CookieSpec {
        CookieSpec {
            name: "og_access".to_string(),
            path: "/api".to_string(),
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            max_age_secs: Some(900),
        }
    }

    #[test]
    fn test_build_set() {
        let cookie = spec().build_set("token123");
        assert!(cookie.starts_with("og_access=token123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/api"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn test_build_clear_keeps_path_and_flags() {
        let cookie = spec().build_clear();
        assert!(cookie.starts_with("og_access="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/api"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_cookie_has_no_max_age() {
        let spec = CookieSpec {
            max_age_secs: None,
            http_only: false,
            ..spec()
        };
        let cookie = spec.build_set("v");
        assert!(!cookie.contains("Max-Age"));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; og_access=abc123; other=xyz"),
        );

        assert_eq!(
            extract_cookie(&headers, "og_access"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }
}
