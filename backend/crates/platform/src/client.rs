//! Client origin identification
//!
//! Resolves the network origin of a request for throttle keying.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract the client IP address
///
/// Checks the `X-Forwarded-For` header first (reverse-proxy setups take the
/// first hop), then falls back to the direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Client origin as a stable string for throttle keys
///
/// `"unknown"` groups requests whose origin could not be determined; they
/// still share a single throttle bucket rather than escaping the limiter.
pub fn client_origin(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> String {
    extract_client_ip(headers, direct_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }

    #[test]
    fn test_client_origin_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(client_origin(&headers, None), "unknown");
    }

    #[test]
    fn test_client_origin_ignores_garbage_xff() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let direct: IpAddr = "10.1.2.3".parse().unwrap();
        assert_eq!(client_origin(&headers, Some(direct)), "10.1.2.3");
    }
}
