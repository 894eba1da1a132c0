// src/config.rs
use crate::catalog::{HF_UPSCALER_SPACE, provider_config};
use crate::errors::ApiError;
use crate::models::ProviderType;
use std::env;
use std::time::Duration;

pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<String>,
    pub request_timeout: Duration,
    pub upscale_max_attempts: u32,
    pub upscale_retry_delay: Duration,
    pub gitee_base_url: String,
    pub modelscope_base_url: String,
    pub hf_upscaler_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            environment: "development".to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            static_dir: None,
            request_timeout: Duration::from_secs(120),
            upscale_max_attempts: 2,
            upscale_retry_delay: Duration::from_millis(500),
            gitee_base_url: default_base_url(ProviderType::Gitee),
            modelscope_base_url: default_base_url(ProviderType::ModelScope),
            hf_upscaler_url: HF_UPSCALER_SPACE.to_string(),
        }
    }
}

fn default_base_url(provider: ProviderType) -> String {
    provider_config(provider.as_str())
        .map(|c| c.base_url.to_string())
        .unwrap_or_default()
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::Config(format!("{} has invalid value {:?}", key, value)))
}

/// Comma-separated origin list; blanks are dropped.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| o.trim_end_matches('/').to_string())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse("PORT", &port)?;
        }
        if let Some(environment) = get("APP_ENV") {
            config.environment = environment;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = parse_cors_origins(&origins);
        }
        config.static_dir = get("STATIC_DIR");
        if let Some(secs) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse("REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(attempts) = get("UPSCALE_MAX_ATTEMPTS") {
            let attempts: u32 = parse("UPSCALE_MAX_ATTEMPTS", &attempts)?;
            config.upscale_max_attempts = attempts.max(1);
        }
        if let Some(ms) = get("UPSCALE_RETRY_DELAY_MS") {
            config.upscale_retry_delay =
                Duration::from_millis(parse("UPSCALE_RETRY_DELAY_MS", &ms)?);
        }
        if let Some(url) = get("GITEE_BASE_URL") {
            config.gitee_base_url = url;
        }
        if let Some(url) = get("MODELSCOPE_BASE_URL") {
            config.modelscope_base_url = url;
        }
        if let Some(url) = get("HF_UPSCALER_URL") {
            config.hf_upscaler_url = url;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
