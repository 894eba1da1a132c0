// src/handlers.rs
use crate::catalog::{FALLBACK_AUTH_HEADER, MODELS, PROVIDER_CONFIGS, provider_config};
use crate::errors::ApiError;
use crate::models::*;
use crate::providers::ImageProvider;
use crate::validation::{
    is_allowed_image_url, validate_dimensions, validate_prompt, validate_scale, validate_steps,
};
use crate::{AppState, catalog};
use actix_web::{HttpRequest, HttpResponse, web};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Requests without a `provider` field predate multi-provider support.
pub const DEFAULT_PROVIDER: &str = "gitee";
pub const DEFAULT_DIMENSION: f64 = 1024.0;
pub const DEFAULT_STEPS: f64 = 9.0;
pub const DEFAULT_SCALE: f64 = 4.0;
pub const LEGACY_HF_MODEL: &str = "z-image";
pub const UPSCALE_MODEL: &str = "RealESRGAN_x4plus";

/// Syntax errors are `InvalidJson`; well-formed JSON of the wrong shape is a
/// validation error naming the mismatch.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Data => ApiError::Validation(e.to_string()),
        _ => ApiError::InvalidJson,
    })
}

pub(crate) fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reads the provider's credential header, failing when the provider needs one.
fn resolve_auth(
    req: &HttpRequest,
    provider: &dyn ImageProvider,
) -> Result<Option<String>, ApiError> {
    let (header, requires_auth, name) = match provider_config(provider.id()) {
        Some(config) => (config.auth_header, config.requires_auth, config.name),
        None => (FALLBACK_AUTH_HEADER, false, provider.name()),
    };
    let token = header_value(req, header);
    if requires_auth && token.is_none() {
        return Err(ApiError::MissingAuth {
            header: header.to_string(),
            provider: name.to_string(),
        });
    }
    Ok(token)
}

pub(crate) fn to_dimension(value: f64) -> u32 {
    value as u32
}

/// Invokes an adapter; any failure it reports is a downstream failure, and a
/// result without image data is never passed on as success.
pub(crate) async fn run_provider(
    provider: Arc<dyn ImageProvider>,
    request: ProviderGenerateRequest,
) -> Result<GenerateSuccessResponse, ApiError> {
    let start = Instant::now();
    match provider.generate(request).await {
        Ok(result) if result.has_image() => {
            info!(
                "{} generated image in {}ms",
                provider.id(),
                start.elapsed().as_millis()
            );
            Ok(result)
        }
        Ok(_) => {
            error!("{} Error: response contained no image", provider.id());
            Err(ApiError::Provider(format!(
                "No image returned from {}",
                provider.name()
            )))
        }
        Err(err) => {
            error!("{} Error: {}", provider.id(), err);
            Err(match err {
                ApiError::Provider(_) | ApiError::Transport(_) => err,
                other => ApiError::Provider(other.to_string()),
            })
        }
    }
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Z-Image API is running" }))
}

pub async fn generate(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body: GenerateRequest = parse_body(&body)?;

    let provider_id = body
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROVIDER);
    if !data.registry.has(provider_id) {
        return Err(ApiError::InvalidProvider(provider_id.to_string()));
    }
    let provider = data.registry.get(provider_id)?;
    let auth_token = resolve_auth(&req, provider.as_ref())?;

    validate_prompt(body.prompt.as_deref()).into_result()?;

    let width = body.width.unwrap_or(DEFAULT_DIMENSION);
    let height = body.height.unwrap_or(DEFAULT_DIMENSION);
    validate_dimensions(width, height).into_result()?;

    let steps = body.steps();
    validate_steps(steps).into_result()?;

    let request = ProviderGenerateRequest {
        model: body.model.clone(),
        prompt: body.prompt.clone().unwrap_or_default(),
        negative_prompt: body.negative_prompt(),
        width: to_dimension(width),
        height: to_dimension(height),
        steps: Some(steps as u32),
        seed: body.seed,
        guidance_scale: body.guidance_scale,
        auth_token,
    };

    let result = run_provider(provider, request).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Older clients call this path directly; it always targets HuggingFace.
pub async fn generate_hf(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body: LegacyGenerateRequest = parse_body(&body)?;

    validate_prompt(body.prompt.as_deref()).into_result()?;

    let hf_token = header_value(&req, "X-HF-Token");
    let width = body.width.unwrap_or(DEFAULT_DIMENSION);
    let height = body.height.unwrap_or(DEFAULT_DIMENSION);
    validate_dimensions(width, height).into_result()?;

    let provider = data.registry.get(ProviderType::HuggingFace.as_str())?;
    let request = ProviderGenerateRequest {
        model: Some(
            body.model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| LEGACY_HF_MODEL.to_string()),
        ),
        prompt: body.prompt.unwrap_or_default(),
        width: to_dimension(width),
        height: to_dimension(height),
        seed: body.seed,
        auth_token: hf_token,
        ..Default::default()
    };

    let result = run_provider(provider, request).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn upscale(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let body: UpscaleRequest = parse_body(&body)?;

    let url = body
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("url is required".to_string()))?;

    if !is_allowed_image_url(&url) {
        warn!("Rejected upscale source {}", url);
        return Err(ApiError::UrlNotAllowed);
    }

    let hf_token = header_value(&req, "X-HF-Token");
    let scale = body.scale.unwrap_or(DEFAULT_SCALE);
    validate_scale(scale).into_result()?;

    let payload = json!([
        { "path": url, "meta": { "_type": "gradio.FileData" } },
        UPSCALE_MODEL,
        0.5,
        false,
        scale,
    ]);

    let output = data
        .gradio
        .call(
            &data.upscaler_url,
            catalog::HF_UPSCALER_ENDPOINT,
            payload,
            hf_token.as_deref(),
        )
        .await
        .inspect_err(|err| error!("upscale Error: {}", err))?;

    let image_url = output
        .get(0)
        .and_then(|first| first.get("url"))
        .and_then(|u| u.as_str())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            error!("upscale Error: no image in {}", output);
            ApiError::Provider("No image returned".to_string())
        })?;

    Ok(HttpResponse::Ok().json(UpscaleResponse {
        url: image_url.to_string(),
    }))
}

pub async fn list_models() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "models": MODELS }))
}

pub async fn list_providers(data: web::Data<AppState>) -> HttpResponse {
    let providers: Vec<&ProviderConfig> = PROVIDER_CONFIGS
        .iter()
        .filter(|c| data.registry.has(c.id.as_str()))
        .collect();
    HttpResponse::Ok().json(json!({ "providers": providers }))
}
