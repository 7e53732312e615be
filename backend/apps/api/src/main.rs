//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use auth::application::token_codec::AccessTokenCodec;
use auth::infra::mailer::TracingMailer;
use auth::infra::oauth::{HttpOAuthClient, ProviderConfig};
use auth::middleware::{AccessFilterState, access_filter};
use auth::policy::AccessPolicy;
use auth::presentation::handlers::AuthAppState;
use auth::presentation::router::{social_router, users_router};
use auth::{AuthConfig, PgAuthRepository};
use axum::{
    Router, http,
    http::{Method, header},
    middleware,
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose;
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../database/migrations").run(&pool).await?;

    tracing::info!("Migrations completed");

    let repo = PgAuthRepository::new(pool.clone());

    // Startup cleanup: drop refresh tokens past their expiry.
    // Errors here should not prevent server startup.
    {
        use auth::domain::repository::RefreshTokenRepository;
        match repo.cleanup_expired().await {
            Ok(deleted) => {
                tracing::info!(tokens_deleted = deleted, "Refresh token cleanup completed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh token cleanup failed, continuing anyway");
            }
        }
    }

    // Auth configuration
    let auth_config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        // In production, load secret from environment
        let secret_b64 =
            env::var("TOKEN_SECRET").expect("TOKEN_SECRET must be set in production");
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        anyhow::ensure!(secret_bytes.len() == 32, "TOKEN_SECRET must be 32 bytes");
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&secret_bytes);
        AuthConfig {
            token_secret: secret,
            ..AuthConfig::default()
        }
    };

    // Identity providers are optional; unset credentials disable them
    let oauth = HttpOAuthClient::new(provider_from_env("GOOGLE"), provider_from_env("FACEBOOK"))
        .map_err(|e| anyhow::anyhow!("OAuth client init failed: {}", e))?;

    let config = Arc::new(auth_config);
    let codec = Arc::new(AccessTokenCodec::new(&config));

    let state = AuthAppState {
        repo: Arc::new(repo.clone()),
        oauth: Arc::new(oauth),
        mailer: Arc::new(TracingMailer),
        codec: codec.clone(),
        config,
    };

    let filter_state = AccessFilterState {
        repo: Arc::new(repo),
        codec,
        policy: Arc::new(AccessPolicy::default()),
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:4200,http://127.0.0.1:4200".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router. The access filter covers every /api/v1 route.
    let app = Router::new()
        .nest("/api/v1/users", users_router(state.clone()))
        .nest("/api/v1/auth", social_router(state))
        .route("/api/v1/health", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(
            filter_state,
            access_filter::<PgAuthRepository>,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Read one provider's credentials from `<PREFIX>_CLIENT_ID`,
/// `<PREFIX>_CLIENT_SECRET` and `<PREFIX>_REDIRECT_URI`.
fn provider_from_env(prefix: &str) -> Option<ProviderConfig> {
    let client_id = env::var(format!("{prefix}_CLIENT_ID")).ok()?;
    let client_secret = env::var(format!("{prefix}_CLIENT_SECRET")).ok()?;
    let redirect_uri = env::var(format!("{prefix}_REDIRECT_URI")).ok()?;

    let config = match prefix {
        "GOOGLE" => ProviderConfig::google(client_id, client_secret, redirect_uri),
        _ => ProviderConfig::facebook(client_id, client_secret, redirect_uri),
    };
    Some(config)
}
