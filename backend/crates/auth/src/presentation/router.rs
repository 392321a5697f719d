//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use platform::cipher::BlobCipher;
use platform::throttle::{MemoryThrottleStore, ThrottleStore};

use crate::application::config::AuthConfig;
use crate::application::tokens::TokenService;
use crate::domain::repository::{AccountRepository, ProfileImageRepository};
use crate::infra::postgres::PgAccountRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{
    AuthMiddlewareState, attach_client_origin, require_auth,
};

/// Create the Auth router with the PostgreSQL repository and the in-memory
/// throttle store
pub fn auth_router(repo: PgAccountRepository, config: AuthConfig, cipher: BlobCipher) -> Router {
    let throttle = Arc::new(MemoryThrottleStore::new(config.throttle.clone()));
    auth_router_generic(Arc::new(repo), throttle, config, cipher)
}

/// Create a generic Auth router for any repository/throttle implementation
///
/// Takes `Arc`s so the caller can keep handles (e.g. for the throttle
/// eviction task).
pub fn auth_router_generic<R, T>(
    repo: Arc<R>,
    throttle: Arc<T>,
    config: AuthConfig,
    cipher: BlobCipher,
) -> Router
where
    R: AccountRepository + ProfileImageRepository + Send + Sync + 'static,
    T: ThrottleStore + Send + Sync + 'static,
{
    let config = Arc::new(config);
    let tokens = Arc::new(TokenService::new(&config));

    let state = AuthAppState {
        repo,
        throttle,
        config: config.clone(),
        tokens: tokens.clone(),
        cipher: Arc::new(cipher),
    };

    let mw_state = AuthMiddlewareState { config, tokens };

    let public = Router::new()
        .route("/register", post(handlers::register::<R, T>))
        .route("/login", post(handlers::login::<R, T>))
        .route("/refresh", post(handlers::refresh::<R, T>))
        .route("/logout", post(handlers::logout::<R, T>))
        .route("/csrf", get(handlers::csrf_token::<R, T>))
        .route(
            "/profile-image/{public_id}",
            get(handlers::profile_image_public::<R, T>),
        );

    let protected = Router::new()
        .route("/me", get(handlers::current_account::<R, T>))
        .route("/mfa/setup", post(handlers::mfa_setup::<R, T>))
        .route("/mfa/verify", post(handlers::mfa_verify::<R, T>))
        .route(
            "/profile-image",
            post(handlers::profile_image_store::<R, T>)
                .get(handlers::profile_image_own::<R, T>),
        )
        .route("/profile-image-url", get(handlers::profile_image_url::<R, T>))
        .route_layer(middleware::from_fn_with_state(mw_state, require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(middleware::from_fn(attach_client_origin))
        .with_state(state)
}
