// src/validation.rs
use crate::errors::ApiError;
use reqwest::Url;
use std::net::IpAddr;

pub const MAX_PROMPT_LENGTH: usize = 10_000;
pub const MIN_DIMENSION: f64 = 256.0;
pub const MAX_DIMENSION: f64 = 2048.0;
pub const DIMENSION_ALIGNMENT: f64 = 8.0;
pub const MIN_STEPS: f64 = 1.0;
pub const MAX_STEPS: f64 = 50.0;
pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 4.0;

/// Hosts (and their subdomains) that upscale sources may come from.
pub const ALLOWED_IMAGE_HOSTS: &[&str] = &[
    "hf.space",
    "huggingface.co",
    "gitee.com",
    "giteeusercontent.com",
    "modelscope.cn",
    "aliyuncs.com",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        match self.error {
            Some(message) if !self.valid => Err(ApiError::Validation(message)),
            _ => Ok(()),
        }
    }
}

pub fn validate_prompt(prompt: Option<&str>) -> ValidationResult {
    let Some(prompt) = prompt else {
        return ValidationResult::fail("Prompt is required");
    };
    if prompt.trim().is_empty() {
        return ValidationResult::fail("Prompt is required");
    }
    if prompt.chars().count() > MAX_PROMPT_LENGTH {
        return ValidationResult::fail(format!(
            "Prompt exceeds maximum length of {} characters",
            MAX_PROMPT_LENGTH
        ));
    }
    ValidationResult::ok()
}

fn check_dimension(name: &str, value: f64) -> Option<String> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Some(format!("{} must be an integer", name));
    }
    if value <= 0.0 {
        return Some(format!("{} must be positive", name));
    }
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Some(format!(
            "{} must be between {} and {}",
            name, MIN_DIMENSION, MAX_DIMENSION
        ));
    }
    if value % DIMENSION_ALIGNMENT != 0.0 {
        return Some(format!(
            "{} must be a multiple of {}",
            name, DIMENSION_ALIGNMENT
        ));
    }
    None
}

pub fn validate_dimensions(width: f64, height: f64) -> ValidationResult {
    match check_dimension("Width", width).or_else(|| check_dimension("Height", height)) {
        Some(message) => ValidationResult::fail(message),
        None => ValidationResult::ok(),
    }
}

pub fn validate_steps(steps: f64) -> ValidationResult {
    if !steps.is_finite() || steps.fract() != 0.0 || !(MIN_STEPS..=MAX_STEPS).contains(&steps) {
        return ValidationResult::fail(format!(
            "Steps must be an integer between {} and {}",
            MIN_STEPS, MAX_STEPS
        ));
    }
    ValidationResult::ok()
}

pub fn validate_scale(scale: f64) -> ValidationResult {
    if !scale.is_finite() || !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
        return ValidationResult::fail(format!(
            "Scale must be between {} and {}",
            MIN_SCALE, MAX_SCALE
        ));
    }
    ValidationResult::ok()
}

/// Upscale sources must be plain https URLs on a provider-owned host, so the
/// gateway cannot be used to fetch arbitrary or internal addresses.
pub fn is_allowed_image_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if url.scheme() != "https" || !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    if url.port().is_some_and(|p| p != 443) {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return false;
    }
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    ALLOWED_IMAGE_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
}
