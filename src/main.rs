use std::net::SocketAddr;
use std::sync::Arc;

use allure_backend::config::Config;
use allure_backend::logging::{init_tracing, LogConfig};
use allure_backend::middleware::rate_limit::rate_limit_cleanup_loop;
use allure_backend::routes::build_router;
use allure_backend::scoring::config::ScoringConfig;
use allure_backend::scoring::engine::ScoringEngine;
use allure_backend::state::AppState;
use axum::http::{header, HeaderName, HeaderValue, Method};
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const CSP_HEADER: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'";
const HSTS_HEADER: &str = "max-age=31536000; includeSubDomains";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!("Starting allure-backend");

    let scoring_config = match ScoringConfig::from_env(&config.scoring) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "Invalid scoring configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        policy = %scoring_config.body.policy,
        method = %scoring_config.body.proportion_method,
        matching = %scoring_config.symmetry.matching,
        jitter = scoring_config.jitter.enabled,
        "Scoring engine configured"
    );

    let engine = Arc::new(ScoringEngine::new(scoring_config));
    let state = AppState::new(engine, &config);

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let cleanup_handle = tokio::spawn(rate_limit_cleanup_loop(
        state.rate_limit().clone(),
        shutdown_tx.subscribe(),
    ));

    let cors_layer = match build_cors_layer(&config) {
        Ok(layer) => layer,
        Err(e) => {
            tracing::error!(origin = %config.cors_origin, error = %e, "Invalid CORS_ORIGIN");
            std::process::exit(1);
        }
    };

    // First layer listed is the outermost.
    let middleware = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static(HSTS_HEADER),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static(CSP_HEADER),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);
    let app = build_router(state).layer(middleware);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Listening");

    let server_future = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    let _ = shutdown_tx.send(());
    if let Err(e) = cleanup_handle.await {
        tracing::warn!(error = %e, "Rate limit cleanup task did not exit cleanly");
    }
    tracing::info!("Shutdown complete");
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer, header::InvalidHeaderValue> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::ACCEPT];

    if config.cors_origin.trim() == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_credentials(false)
            .allow_headers(headers)
            .allow_methods(methods));
    }

    let origin = config.cors_origin.trim().parse::<HeaderValue>()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_headers(headers)
        .allow_methods(methods))
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
