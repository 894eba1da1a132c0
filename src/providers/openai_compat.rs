// src/providers/openai_compat.rs
// `images/generations` call shared by the OpenAI-compatible providers.
use crate::errors::ApiError;
use crate::models::{GenerateSuccessResponse, ProviderGenerateRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STEPS: u32 = 9;

#[derive(Debug, Serialize)]
pub struct ImagesGenerateBody<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub size: String,
    pub n: u32,
    pub negative_prompt: &'a str,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl<'a> ImagesGenerateBody<'a> {
    pub fn from_request(request: &'a ProviderGenerateRequest, default_model: &'a str) -> Self {
        Self {
            prompt: &request.prompt,
            model: request
                .model
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(default_model),
            size: request.size(),
            n: 1,
            negative_prompt: request.negative_prompt.as_deref().unwrap_or(""),
            num_inference_steps: request.steps.unwrap_or(DEFAULT_STEPS),
            guidance_scale: request.guidance_scale,
            seed: request.seed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
    /// ModelScope answers with `images: [{url}]` on some models.
    #[serde(default)]
    images: Vec<ImageDatum>,
    seed: Option<u64>,
}

/// POSTs to `{base_url}/images/generations` and normalizes the first image.
pub async fn generate_image(
    client: &Client,
    provider_name: &str,
    base_url: &str,
    token: &str,
    body: &ImagesGenerateBody<'_>,
) -> Result<GenerateSuccessResponse, ApiError> {
    let url = format!("{}/images/generations", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .map_err(|e| ApiError::Transport(format!("{} request failed: {}", provider_name, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(ApiError::Provider(format!(
            "{} error ({}): {}",
            provider_name,
            status.as_u16(),
            error_text
        )));
    }

    let result: ImagesResponse = response.json().await.map_err(|e| {
        ApiError::Provider(format!("Failed to parse {} response: {}", provider_name, e))
    })?;

    let seed = result.seed.or(body.seed);
    let image = result
        .data
        .into_iter()
        .chain(result.images)
        .find(|d| d.url.is_some() || d.b64_json.is_some())
        .ok_or_else(|| ApiError::Provider(format!("No image returned from {}", provider_name)))?;

    Ok(GenerateSuccessResponse {
        url: image.url,
        b64_json: image.b64_json,
        seed,
    })
}
