//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use std::sync::Arc;

use platform::cipher::BlobCipher;
use platform::cookie::extract_cookie;
use platform::csrf::CsrfGuard;
use platform::throttle::ThrottleStore;

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, TokenService};
use crate::application::{
    CurrentAccountUseCase, LoginInput, LoginUseCase, LogoutUseCase, MfaSetupUseCase,
    ProfileImageUseCase, RefreshUseCase, RegisterInput, RegisterUseCase, ServedImage,
};
use crate::domain::repository::{AccountRepository, ProfileImageRepository};
use crate::domain::value_object::public_id::PublicId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AccountResponse, CsrfTokenResponse, ImageStoredResponse, ImageTokenQuery, ImageUrlResponse,
    LoginRequest, MfaSetupResponse, MfaVerifyRequest, MfaVerifyResponse, RegisterRequest,
};
use crate::presentation::middleware::{AuthContext, ClientOrigin};

/// Shared state for auth handlers
pub struct AuthAppState<R, T>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub throttle: Arc<T>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
    pub cipher: Arc<BlobCipher>,
}

// Manual impl: the fields are all Arc, no bounds on R/T needed
impl<R, T> Clone for AuthAppState<R, T>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            throttle: self.throttle.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
            cipher: self.cipher.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case =
        RegisterUseCase::new(state.repo.clone(), state.config.clone(), state.tokens.clone());

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            phone: req.phone,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        session_cookies(&state.config, &output.pair),
        Json(AccountResponse::from(&output.account)),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(origin): Extension<ClientOrigin>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.throttle.clone(),
        state.config.clone(),
        state.tokens.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            identifier: req.identifier,
            password: req.password,
            mfa_code: req.mfa_code,
            origin: origin.0,
        })
        .await?;

    Ok((
        StatusCode::OK,
        session_cookies(&state.config, &output.pair),
        Json(AccountResponse::from(&output.account)),
    ))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
///
/// Any refresh-specific failure clears both session cookies so the client
/// does not retry forever with a dead token.
pub async fn refresh<R, T>(
    State(state): State<AuthAppState<R, T>>,
    headers: HeaderMap,
) -> Response
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let token = extract_cookie(&headers, &state.config.refresh_cookie_name);

    let Some(token) = token else {
        return with_cleared_cookies(&state.config, AuthError::SessionInvalid.into_response());
    };

    let use_case = RefreshUseCase::new(state.repo.clone(), state.tokens.clone());

    match use_case.execute(&token).await {
        Ok(output) => (
            StatusCode::OK,
            session_cookies(&state.config, &output.pair),
            Json(AccountResponse::from(&output.account)),
        )
            .into_response(),
        // 失効済みトークンでの再試行を断ち切るため Cookie も削除する
        Err(err @ AuthError::SessionInvalid) => {
            with_cleared_cookies(&state.config, err.into_response())
        }
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R, T>(
    State(state): State<AuthAppState<R, T>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let token = extract_cookie(&headers, &state.config.access_cookie_name);

    let use_case = LogoutUseCase::new(state.repo.clone(), state.tokens.clone());

    // Cookies are cleared even when revocation fails
    if let Err(e) = use_case.execute(token.as_deref()).await {
        tracing::warn!(error = %e, "Logout revocation failed");
    }

    (StatusCode::NO_CONTENT, clear_session_cookies(&state.config))
}

// ============================================================================
// Current account
// ============================================================================

/// GET /api/auth/me
pub async fn current_account<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case = CurrentAccountUseCase::new(state.repo.clone());
    let account = use_case.execute(&ctx.account_id).await?;

    Ok(Json(AccountResponse::from(&account)))
}

// ============================================================================
// CSRF token issue
// ============================================================================

/// GET /api/auth/csrf
///
/// Hands the current token out (issuing one first when absent) so
/// same-origin script can set the `X-CSRF-Token` header.
pub async fn csrf_token<R, T>(
    State(state): State<AuthAppState<R, T>>,
    headers: HeaderMap,
) -> Response
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    match extract_cookie(&headers, &state.config.csrf_cookie_name) {
        Some(token) => Json(CsrfTokenResponse { csrf_token: token }).into_response(),
        None => {
            let guard = CsrfGuard::new(
                state.config.csrf_cookie_name.clone(),
                state.config.cookie_secure,
            );
            let token = guard.issue();
            (
                [(header::SET_COOKIE, guard.cookie.set_header(&token))],
                Json(CsrfTokenResponse { csrf_token: token }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// MFA (requires authentication)
// ============================================================================

/// POST /api/auth/mfa/setup
pub async fn mfa_setup<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<MfaSetupResponse>>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case = MfaSetupUseCase::new(state.repo.clone());
    let output = use_case.setup(&ctx.account_id).await?;

    Ok(Json(MfaSetupResponse {
        secret: output.secret,
        otpauth_url: output.otpauth_url,
        qr_code: output.qr_code_base64,
    }))
}

/// POST /api/auth/mfa/verify
pub async fn mfa_verify<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<MfaVerifyRequest>,
) -> AuthResult<Json<MfaVerifyResponse>>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case = MfaSetupUseCase::new(state.repo.clone());
    let output = use_case.verify(&ctx.account_id, &req.code).await?;

    Ok(Json(MfaVerifyResponse {
        backup_codes: output.backup_codes,
    }))
}

// ============================================================================
// Profile image
// ============================================================================

/// POST /api/auth/profile-image (raw body, Content-Type carries the MIME)
pub async fn profile_image_store<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(ctx): Extension<AuthContext>,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<Json<ImageStoredResponse>>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let use_case = image_use_case(&state);
    let image_id = use_case.store(&ctx.account_id, &body, &mime_type).await?;

    Ok(Json(ImageStoredResponse {
        image_id: image_id.to_string(),
    }))
}

/// GET /api/auth/profile-image (own image, session cookie)
pub async fn profile_image_own<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Response>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case = image_use_case(&state);
    let served = use_case.serve_own(&ctx.account_id).await?;

    Ok(image_response(served))
}

/// GET /api/auth/profile-image-url (mint a short-lived cookie-less URL)
pub async fn profile_image_url<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<ImageUrlResponse>>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let public_id =
        PublicId::parse_str(&ctx.public_id).map_err(|_| AuthError::SessionInvalid)?;

    let use_case = image_use_case(&state);
    let output = use_case.mint_url(&ctx.account_id, &public_id).await?;

    Ok(Json(ImageUrlResponse {
        url: output.url,
        expires_in_secs: output.expires_in_secs,
    }))
}

/// GET /api/auth/profile-image/{public_id}?token=... (image-access token)
pub async fn profile_image_public<R, T>(
    State(state): State<AuthAppState<R, T>>,
    Path(public_id): Path<String>,
    Query(query): Query<ImageTokenQuery>,
) -> AuthResult<Response>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let use_case = image_use_case(&state);
    let served = use_case.serve_with_token(&public_id, &query.token).await?;

    Ok(image_response(served))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn image_use_case<R, T>(state: &AuthAppState<R, T>) -> ProfileImageUseCase<R>
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    ProfileImageUseCase::new(
        state.repo.clone(),
        state.cipher.clone(),
        state.tokens.clone(),
        state.config.clone(),
    )
}

/// Both session cookies for a fresh pair (append, not insert)
fn session_cookies(
    config: &AuthConfig,
    pair: &TokenPair,
) -> AppendHeaders<[(header::HeaderName, HeaderValue); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            config.access_cookie().set_header(&pair.access),
        ),
        (
            header::SET_COOKIE,
            config.refresh_cookie().set_header(&pair.refresh),
        ),
    ])
}

/// Clear both session cookies with the same paths/flags they were set with
fn clear_session_cookies(
    config: &AuthConfig,
) -> AppendHeaders<[(header::HeaderName, HeaderValue); 2]> {
    AppendHeaders([
        (header::SET_COOKIE, config.access_cookie().clear_header()),
        (header::SET_COOKIE, config.refresh_cookie().clear_header()),
    ])
}

fn with_cleared_cookies(config: &AuthConfig, mut response: Response) -> Response {
    response
        .headers_mut()
        .append(header::SET_COOKIE, config.access_cookie().clear_header());
    response
        .headers_mut()
        .append(header::SET_COOKIE, config.refresh_cookie().clear_header());
    response
}

fn image_response(served: ServedImage) -> Response {
    let content_type = HeaderValue::from_str(&served.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("private, no-store"),
            ),
        ],
        served.bytes,
    )
        .into_response()
}
