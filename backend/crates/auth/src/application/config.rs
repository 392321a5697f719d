//! Application Configuration
//!
//! Configuration for the Auth application layer. The api binary fills this
//! from the environment; `development()` exists for local runs and tests.

use std::time::Duration;

use platform::cookie::{CookieSpec, SameSite};
use platform::throttle::ThrottleConfig;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for access tokens (independent from refresh)
    pub access_secret: Vec<u8>,
    /// Secret for refresh tokens
    pub refresh_secret: Vec<u8>,
    /// Token issuer claim
    pub issuer: String,
    /// Token audience claim
    pub audience: String,
    /// Access token TTL (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token TTL (7 days)
    pub refresh_ttl: Duration,
    /// Image-access token TTL (5 minutes)
    pub image_token_ttl: Duration,
    /// Access-token cookie name
    pub access_cookie_name: String,
    /// Refresh-token cookie name
    pub refresh_cookie_name: String,
    /// CSRF cookie name
    pub csrf_cookie_name: String,
    /// Path scope of the access cookie (general API path)
    pub api_path: String,
    /// Path scope of the refresh cookie (refresh endpoint only)
    pub refresh_path: String,
    /// Whether to require Secure cookies (production)
    pub cookie_secure: bool,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Login throttle settings
    pub throttle: ThrottleConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: vec![0u8; 32],
            refresh_secret: vec![0u8; 32],
            issuer: "ordergate".to_string(),
            audience: "ordergate-api".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
            image_token_ttl: Duration::from_secs(5 * 60),
            access_cookie_name: "og_access".to_string(),
            refresh_cookie_name: "og_refresh".to_string(),
            csrf_cookie_name: "og_csrf".to_string(),
            api_path: "/api".to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            cookie_secure: true,
            password_pepper: None,
            throttle: ThrottleConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Config with random token secrets (for development)
    pub fn with_random_secrets() -> Self {
        Self {
            access_secret: platform::crypto::random_bytes(32),
            refresh_secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Development config (insecure cookies, random secrets)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secrets()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Cookie spec for the access token
    ///
    /// Readable across the general API path; HttpOnly, Strict.
    pub fn access_cookie(&self) -> CookieSpec {
        CookieSpec {
            name: self.access_cookie_name.clone(),
            path: self.api_path.clone(),
            http_only: true,
            secure: self.cookie_secure,
            same_site: SameSite::Strict,
            max_age_secs: Some(self.access_ttl.as_secs() as i64),
        }
    }

    /// Cookie spec for the refresh token
    ///
    /// Scoped to the refresh endpoint only, minimizing blast radius if any
    /// other endpoint is compromised.
    pub fn refresh_cookie(&self) -> CookieSpec {
        CookieSpec {
            name: self.refresh_cookie_name.clone(),
            path: self.refresh_path.clone(),
            http_only: true,
            secure: self.cookie_secure,
            same_site: SameSite::Strict,
            max_age_secs: Some(self.refresh_ttl.as_secs() as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttls() {
        let config = AuthConfig::default();
        assert_eq!(config.access_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_ttl, Duration::from_secs(604_800));
    }

    #[test]
    fn test_random_secrets_are_independent() {
        let config = AuthConfig::with_random_secrets();
        assert_ne!(config.access_secret, config.refresh_secret);
    }

    #[test]
    fn test_cookie_path_scoping() {
        let config = AuthConfig::default();
        let access = config.access_cookie().build_set("a");
        let refresh = config.refresh_cookie().build_set("r");

        assert!(access.contains("Path=/api"));
        assert!(refresh.contains("Path=/api/auth/refresh"));
        assert!(access.contains("HttpOnly"));
        assert!(refresh.contains("HttpOnly"));
        assert!(access.contains("SameSite=Strict"));
    }

    #[test]
    fn test_development_is_insecure_cookie() {
        let config = AuthConfig::development();
        assert!(!config.cookie_secure);
        assert!(!config.access_cookie().build_set("a").contains("Secure"));
    }
}
