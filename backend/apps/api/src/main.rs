//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors go through
//! `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::{AuthConfig, PgAccountRepository};
use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware,
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose;
use platform::cipher::BlobCipher;
use platform::csrf::CsrfGuard;
use platform::throttle::{MemoryThrottleStore, ThrottleStore};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// How often expired throttle entries are swept
const THROTTLE_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let production = env::var("PRODUCTION")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth configuration
    let auth_config = load_auth_config(production)?;

    // At-rest image encryption key (>= 32 chars enforced by the cipher)
    let image_key = env::var("IMAGE_ENCRYPTION_KEY")
        .expect("IMAGE_ENCRYPTION_KEY must be set in environment");
    let cipher = BlobCipher::from_secret(&image_key)
        .map_err(|e| anyhow::anyhow!("IMAGE_ENCRYPTION_KEY rejected: {}", e))?;

    // Login throttle store + periodic eviction to bound memory
    let throttle = Arc::new(MemoryThrottleStore::new(auth_config.throttle.clone()));
    spawn_throttle_eviction(throttle.clone());

    // CSRF guard: site-wide double-submit check, with the health check and
    // the token-issuing endpoint exempt from the unsafe-method rule
    let csrf_state = auth::middleware::CsrfMiddlewareState {
        guard: Arc::new(
            CsrfGuard::new(auth_config.csrf_cookie_name.clone(), auth_config.cookie_secure)
                .exempt("/api/health")
                .exempt("/api/auth/csrf"),
        ),
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40080,http://127.0.0.1:40080".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-csrf-token"),
        ]))
        .allow_credentials(true);

    // Build router
    let repo = Arc::new(PgAccountRepository::new(pool));
    let app = Router::new()
        .route("/api/health", get(health))
        .nest(
            "/api/auth",
            auth::router::auth_router_generic(repo, throttle, auth_config, cipher),
        )
        .layer(middleware::from_fn_with_state(
            csrf_state,
            auth::middleware::csrf_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:31180".to_string());
    let addr: SocketAddr = bind_addr.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the auth configuration from the environment
///
/// Production requires both token secrets (base64); development generates
/// random ones so sessions simply die on restart.
fn load_auth_config(production: bool) -> anyhow::Result<AuthConfig> {
    let mut config = if production {
        AuthConfig {
            access_secret: decode_secret("ACCESS_TOKEN_SECRET")?,
            refresh_secret: decode_secret("REFRESH_TOKEN_SECRET")?,
            ..AuthConfig::default()
        }
    } else {
        AuthConfig::development()
    };

    if let Ok(issuer) = env::var("TOKEN_ISSUER") {
        config.issuer = issuer;
    }
    if let Ok(audience) = env::var("TOKEN_AUDIENCE") {
        config.audience = audience;
    }
    if let Ok(pepper_b64) = env::var("PASSWORD_PEPPER") {
        let pepper = Engine::decode(&general_purpose::STANDARD, &pepper_b64)?;
        config.password_pepper = Some(pepper);
    }

    Ok(config)
}

fn decode_secret(var: &str) -> anyhow::Result<Vec<u8>> {
    let b64 = env::var(var)
        .map_err(|_| anyhow::anyhow!("{} must be set in production", var))?;
    let secret = Engine::decode(&general_purpose::STANDARD, &b64)?;
    anyhow::ensure!(secret.len() >= 32, "{} must decode to at least 32 bytes", var);
    Ok(secret)
}

/// Periodically sweep expired throttle entries
///
/// Lazy expiry already keeps the throttle correct; this bounds memory when
/// attackers cycle through many identifiers.
fn spawn_throttle_eviction(store: Arc<MemoryThrottleStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(THROTTLE_EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                tracing::debug!(evicted, "Expired throttle entries evicted");
            }
        }
    });
}
