//! Auth Middleware
//!
//! - `require_auth`: verifies the access-token cookie and exposes the
//!   caller's identity to handlers via request extensions
//! - `csrf_guard`: double-submit check for unsafe methods, lazy token issue
//! - `attach_client_origin`: resolves the caller's network origin once per
//!   request for throttle keying

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use kernel::error::app_error::AppError;
use platform::cookie::extract_cookie;
use platform::csrf::{CSRF_HEADER, CsrfGuard};

use crate::application::config::AuthConfig;
use crate::application::tokens::TokenService;
use crate::domain::value_object::account_id::AccountId;
use crate::domain::value_object::account_role::AccountRole;
use crate::error::AuthError;

// ============================================================================
// Access-token verification
// ============================================================================

/// Authenticated caller identity, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: AccountId,
    pub public_id: String,
    pub role: AccountRole,
}

/// Middleware state for `require_auth`
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
}

/// Middleware that requires a valid access token
///
/// Verification is stateless (signature, expiry, issuer, audience); there
/// is no store round-trip here.
pub async fn require_auth(
    State(state): State<AuthMiddlewareState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_cookie(req.headers(), &state.config.access_cookie_name);

    let claims = match token.as_deref().map(|t| state.tokens.verify_access(t)) {
        Some(Ok(claims)) => claims,
        _ => return Err(AuthError::SessionInvalid.into_response()),
    };

    let account_id = claims.account_id().map_err(|e| e.into_response())?;
    let role = claims.account_role().map_err(|e| e.into_response())?;

    req.extensions_mut().insert(AuthContext {
        account_id,
        public_id: claims.pid,
        role,
    });

    Ok(next.run(req).await)
}

// ============================================================================
// CSRF double-submit guard
// ============================================================================

/// Middleware state for `csrf_guard`
#[derive(Clone)]
pub struct CsrfMiddlewareState {
    pub guard: Arc<CsrfGuard>,
}

/// Double-submit CSRF middleware
///
/// Safe methods always pass. Unsafe methods must echo the cookie value in
/// the `X-CSRF-Token` header unless the path is allow-listed; failures are
/// rejected before any handler runs. A request without the cookie gets one
/// issued on its response, whatever the outcome.
pub async fn csrf_guard(
    State(state): State<CsrfMiddlewareState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let cookie = extract_cookie(req.headers(), &state.guard.cookie.name);

    if !CsrfGuard::is_safe_method(req.method()) && !state.guard.is_exempt(req.uri().path()) {
        let header = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !CsrfGuard::matches(cookie.as_deref(), header.as_deref()) {
            tracing::warn!(path = %req.uri().path(), "CSRF check failed");
            let mut response =
                AppError::forbidden("CSRF token missing or mismatched").into_response();
            if cookie.is_none() {
                append_csrf_cookie(&state.guard, &mut response);
            }
            return response;
        }
    }

    let had_cookie = cookie.is_some();
    let mut response = next.run(req).await;

    // Lazy issue, unless a handler (the csrf endpoint) already set one
    if !had_cookie && !sets_csrf_cookie(&response, &state.guard.cookie.name) {
        append_csrf_cookie(&state.guard, &mut response);
    }

    response
}

fn append_csrf_cookie(guard: &CsrfGuard, response: &mut Response) {
    let token = guard.issue();
    response
        .headers_mut()
        .append(header::SET_COOKIE, guard.cookie.set_header(&token));
}

fn sets_csrf_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().map(|s| s.starts_with(&prefix)).unwrap_or(false))
}

// ============================================================================
// Client origin
// ============================================================================

/// Caller network origin, stored in request extensions
#[derive(Debug, Clone)]
pub struct ClientOrigin(pub String);

/// Middleware that resolves the client origin for every request
///
/// Always inserts a `ClientOrigin`; undeterminable origins share the
/// `"unknown"` bucket.
pub async fn attach_client_origin(mut req: Request<Body>, next: Next) -> Response {
    let direct_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());

    let origin = platform::client::client_origin(req.headers(), direct_ip);
    req.extensions_mut().insert(ClientOrigin(origin));

    next.run(req).await
}
