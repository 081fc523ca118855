use std::sync::Arc;

use axum::Router;

use allure_backend::config::{Config, RateLimitConfig, ScoringEnvConfig};
use allure_backend::routes::build_router;
use allure_backend::scoring::config::ScoringConfig;
use allure_backend::scoring::engine::ScoringEngine;
use allure_backend::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
}

/// Options that differ between integration suites.
#[derive(Debug, Clone, Copy)]
pub struct TestOptions {
    pub max_requests: u64,
    pub allow_config_updates: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_requests: 100,
            allow_config_updates: false,
        }
    }
}

pub fn spawn_with(options: TestOptions) -> TestApp {
    // Config is built directly so parallel tests never race on set_var.
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 5000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "*".to_string(),
        trust_proxy: false,
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: options.max_requests,
        },
        scoring: ScoringEnvConfig {
            jitter_enabled: Some(false),
            allow_config_updates: options.allow_config_updates,
            ..ScoringEnvConfig::default()
        },
    };

    let scoring = ScoringConfig::from_env(&config.scoring).expect("default scoring config");
    let engine = Arc::new(ScoringEngine::new(scoring));
    let state = AppState::new(engine, &config);
    let app = build_router(state.clone());

    TestApp { app, state, config }
}

pub fn spawn_test_app() -> TestApp {
    spawn_with(TestOptions::default())
}
