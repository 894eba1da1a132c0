// src/openai.rs
// OpenAI-compatible image endpoints so stock OpenAI SDKs can talk to the gateway.
use crate::AppState;
use crate::catalog::provider_config;
use crate::errors::ApiError;
use crate::handlers::{DEFAULT_STEPS, header_value, parse_body, run_provider, to_dimension};
use crate::models::{GenerateSuccessResponse, ProviderGenerateRequest};
use crate::resolver::{model_ids, resolve_model};
use crate::validation::{validate_dimensions, validate_prompt, validate_steps};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const DEFAULT_SIZE: &str = "1024x1024";
/// Fixed creation stamp reported for the static model list.
const MODELS_CREATED: i64 = 1_735_689_600;

/// Same failures as the `/api` routes, rendered in OpenAI's error shape.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct OpenAiError(#[from] ApiError);

impl ResponseError for OpenAiError {
    fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let kind = match status {
            StatusCode::BAD_REQUEST => "invalid_request_error",
            StatusCode::UNAUTHORIZED => "authentication_error",
            _ => "api_error",
        };
        HttpResponse::build(status).json(json!({
            "error": { "message": self.0.to_string(), "type": kind }
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiImageRequest {
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub n: Option<u32>,
    pub size: Option<String>,
    /// Without it, whatever the provider returned is passed through.
    pub response_format: Option<ResponseFormat>,
    pub negative_prompt: Option<String>,
    pub steps: Option<f64>,
    pub seed: Option<u64>,
    pub guidance_scale: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Url,
    B64Json,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Url => "url",
            ResponseFormat::B64Json => "b64_json",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiImageDatum {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiImageResponse {
    pub created: i64,
    pub data: Vec<OpenAiImageDatum>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiModelInfo {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiModelsListResponse {
    pub object: String,
    pub data: Vec<OpenAiModelInfo>,
}

/// Parses `"WIDTHxHEIGHT"`.
pub fn parse_size(size: &str) -> Result<(f64, f64), ApiError> {
    let invalid = || ApiError::Validation(format!("Invalid size: {}", size));
    let (w, h) = size.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: f64 = w.trim().parse().map_err(|_| invalid())?;
    let h: f64 = h.trim().parse().map_err(|_| invalid())?;
    Ok((w, h))
}

/// Keeps only the requested image form. Providers return one form, so asking
/// for the other is a client error.
pub fn select_format(
    result: GenerateSuccessResponse,
    format: Option<ResponseFormat>,
    provider_name: &str,
) -> Result<OpenAiImageDatum, ApiError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let datum = match format {
        None => OpenAiImageDatum {
            url: result.url,
            b64_json: result.b64_json,
        },
        Some(ResponseFormat::Url) => OpenAiImageDatum {
            url: non_empty(result.url),
            b64_json: None,
        },
        Some(ResponseFormat::B64Json) => OpenAiImageDatum {
            url: None,
            b64_json: non_empty(result.b64_json),
        },
    };
    match format {
        Some(f) if datum.url.is_none() && datum.b64_json.is_none() => Err(ApiError::Validation(
            format!("response_format {} is not available from {}", f.as_str(), provider_name),
        )),
        _ => Ok(datum),
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    header_value(req, "Authorization").and_then(|value| {
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(&value)
            .trim();
        (!token.is_empty()).then(|| token.to_string())
    })
}

pub async fn images_generations(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, OpenAiError> {
    let body: OpenAiImageRequest = parse_body(&body)?;

    if body.n.is_some_and(|n| n != 1) {
        return Err(ApiError::Validation("Only n=1 is supported".to_string()).into());
    }

    let resolved = resolve_model(body.model.as_deref());
    let provider_id = resolved.provider.as_str();
    if !data.registry.has(provider_id) {
        return Err(ApiError::InvalidProvider(provider_id.to_string()).into());
    }
    let provider = data.registry.get(provider_id)?;

    let token = bearer_token(&req);
    let missing_auth = provider_config(provider_id).filter(|c| c.requires_auth && token.is_none());
    if let Some(config) = missing_auth {
        return Err(ApiError::MissingAuth {
            header: "Authorization".to_string(),
            provider: config.name.to_string(),
        }
        .into());
    }

    validate_prompt(body.prompt.as_deref()).into_result()?;
    let (width, height) = parse_size(body.size.as_deref().unwrap_or(DEFAULT_SIZE))?;
    validate_dimensions(width, height).into_result()?;
    let steps = body.steps.unwrap_or(DEFAULT_STEPS);
    validate_steps(steps).into_result()?;

    let request = ProviderGenerateRequest {
        model: Some(resolved.model),
        prompt: body.prompt.unwrap_or_default(),
        negative_prompt: body.negative_prompt.filter(|p| !p.is_empty()),
        width: to_dimension(width),
        height: to_dimension(height),
        steps: Some(steps as u32),
        seed: body.seed,
        guidance_scale: body.guidance_scale,
        auth_token: token,
    };

    let provider_name = provider.name().to_string();
    let result = run_provider(provider, request).await?;
    let datum = select_format(result, body.response_format, &provider_name)?;
    Ok(HttpResponse::Ok().json(OpenAiImageResponse {
        created: chrono::Utc::now().timestamp(),
        data: vec![datum],
    }))
}

pub async fn list_models() -> HttpResponse {
    let data = model_ids()
        .into_iter()
        .map(|(id, provider)| OpenAiModelInfo {
            id,
            object: "model".to_string(),
            created: MODELS_CREATED,
            owned_by: provider.to_string(),
        })
        .collect();
    HttpResponse::Ok().json(OpenAiModelsListResponse {
        object: "list".to_string(),
        data,
    })
}
