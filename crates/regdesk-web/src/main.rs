mod api;
mod auth;
mod config;
mod db;
mod dto;
mod error;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::middleware::from_fn;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::db::RegistrationStore;
use crate::state::AppState;

/// Headroom above the upload limit for text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regdesk_web=debug,regdesk_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let tls_config = config.tls.clone();
    let tls_enabled = config.tls_enabled();
    let body_limit = config.max_total_size_bytes() + FORM_OVERHEAD_BYTES;
    let static_dir = config.static_dir.clone();
    let register_burst = config.rate_limit.register_burst.max(1);
    let register_period_secs = config.rate_limit.register_period_minutes.saturating_mul(60);
    let trust_proxy_headers = config.trust_proxy_headers;

    let store = RegistrationStore::connect(&config.database.url, config.database.max_connections).await?;
    tracing::info!("Registration database ready at {}", config.database.url);

    let state = AppState::new(config, store);
    tracing::info!(
        "Admin credentials: {}",
        match state.config.admin.credential_mode {
            config::CredentialMode::Session => "server-side sessions",
            config::CredentialMode::Token => "signed tokens",
        }
    );

    // Throttle, session and revocation cleanup
    let sweeper = state.auth.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweeper.sweep_expired();
        }
    });

    // CORS: same-origin only by default (no cross-origin requests allowed)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Per-IP limit on public registration submissions. Proxy headers only key
    // the limiter when they are trusted; otherwise the socket peer does.
    let period_per_request = (register_period_secs / u64::from(register_burst)).max(1);
    let register_routes = if trust_proxy_headers {
        let governor_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(period_per_request)
                .burst_size(register_burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("Invalid registration rate limit"))?,
        );
        api::public_router().layer(GovernorLayer::<_, _, axum::body::Body>::new(governor_config))
    } else {
        let governor_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(period_per_request)
                .burst_size(register_burst)
                .key_extractor(PeerIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("Invalid registration rate limit"))?,
        );
        api::public_router().layer(GovernorLayer::<_, _, axum::body::Body>::new(governor_config))
    };
    tracing::info!(
        "Client addresses taken from {}",
        if trust_proxy_headers { "proxy headers" } else { "socket peer" }
    );

    let mut base_router = axum::Router::new().nest(
        "/api",
        api::auth_router()
            .merge(register_routes)
            .merge(api::protected_router()),
    );
    if let Some(dir) = static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        base_router = base_router.fallback_service(ServeDir::new(dir));
    }

    let app = if tls_enabled {
        base_router
            .layer(from_fn(middleware::security_headers::security_headers_with_hsts))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    } else {
        base_router
            .layer(from_fn(middleware::security_headers::security_headers))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    };

    if let (Some(cert), Some(key)) = (&tls_config.cert_path, &tls_config.key_path) {
        use axum_server::tls_rustls::RustlsConfig;
        let rustls_config = RustlsConfig::from_pem_file(cert, key).await?;
        tracing::info!("regdesk-web listening on https://{}", bind_addr);
        axum_server::bind_rustls(bind_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!("regdesk-web listening on http://{}", bind_addr);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
