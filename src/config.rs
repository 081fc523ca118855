use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::scoring::config::{BodyScorePolicy, FaceBlend, MirrorMatching, ProportionMethod};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub trust_proxy: bool,
    pub rate_limit: RateLimitConfig,
    pub scoring: ScoringEnvConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u64,
}

/// Scoring overrides read from the environment; `None` keeps the value from
/// the config file (or the built-in default).
#[derive(Debug, Clone, Default)]
pub struct ScoringEnvConfig {
    pub config_path: Option<String>,
    pub body_policy: Option<BodyScorePolicy>,
    pub proportion_method: Option<ProportionMethod>,
    pub mirror_matching: Option<MirrorMatching>,
    pub face_blend: Option<FaceBlend>,
    pub jitter_enabled: Option<bool>,
    pub jitter_seed: Option<u64>,
    pub allow_config_updates: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 5000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            trust_proxy: env_or_bool("TRUST_PROXY", false),
            rate_limit: RateLimitConfig {
                window_secs: env_or_parse("RATE_LIMIT_WINDOW_SECS", 60_u64),
                max_requests: env_or_parse("RATE_LIMIT_MAX", 120_u64),
            },
            scoring: ScoringEnvConfig {
                config_path: env_opt("SCORING_CONFIG_PATH"),
                body_policy: env_opt_parse("SCORING_BODY_POLICY"),
                proportion_method: env_opt_parse("SCORING_PROPORTION_METHOD"),
                mirror_matching: env_opt_parse("SCORING_MIRROR_MATCHING"),
                face_blend: env_opt("SCORING_FACE_BLEND").and_then(|name| {
                    let preset = FaceBlend::preset(&name);
                    if preset.is_none() {
                        tracing::warn!(value = %name, "Unknown SCORING_FACE_BLEND preset, ignoring");
                    }
                    preset
                }),
                jitter_enabled: env_opt_bool("SCORING_JITTER_ENABLED"),
                jitter_seed: env_opt_parse("SCORING_JITTER_SEED"),
                allow_config_updates: env_or_bool("SCORING_ALLOW_CONFIG_UPDATES", false),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

pub fn env_opt_bool(key: &str) -> Option<bool> {
    let raw = env_opt(key)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "Failed to parse env var, ignoring");
            None
        }
    }
}

/// Unset and blank values are both `None`.
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn env_opt_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_opt(key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Failed to parse env var, ignoring");
            None
        }
    }
}
