// src/providers/huggingface.rs
use super::ImageProvider;
use crate::catalog::{DEFAULT_HF_MODEL, default_hf_spaces};
use crate::errors::ApiError;
use crate::models::{GenerateSuccessResponse, HfSpace, ProviderGenerateRequest};
use crate::services::GradioClient;
use async_trait::async_trait;
use log::debug;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_STEPS: u32 = 9;

/// Legacy clients send `z-image`; it names the turbo space.
const MODEL_ALIASES: &[(&str, &str)] = &[("z-image", "z-image-turbo")];

pub struct HuggingFaceProvider {
    gradio: Arc<GradioClient>,
    spaces: HashMap<String, HfSpace>,
}

impl HuggingFaceProvider {
    pub fn new(gradio: Arc<GradioClient>, spaces: HashMap<String, HfSpace>) -> Self {
        Self { gradio, spaces }
    }

    pub fn with_default_spaces(gradio: Arc<GradioClient>) -> Self {
        Self::new(gradio, default_hf_spaces())
    }

    /// Unknown models use the default space rather than failing.
    fn space_for(&self, model: Option<&str>) -> Result<&HfSpace, ApiError> {
        let model = model.map(str::trim).unwrap_or(DEFAULT_HF_MODEL);
        let model = MODEL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == model)
            .map(|(_, target)| *target)
            .unwrap_or(model);
        self.spaces
            .get(model)
            .or_else(|| self.spaces.get(DEFAULT_HF_MODEL))
            .ok_or_else(|| ApiError::Provider("No HuggingFace space configured".to_string()))
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Object(map) => map
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Gradio outputs are `[image, seed]`; the image is a FileData object or a URL.
pub fn parse_space_output(output: &Value) -> Result<GenerateSuccessResponse, ApiError> {
    let items = output.as_array().map(Vec::as_slice).unwrap_or_default();
    let url = items
        .first()
        .and_then(image_url)
        .ok_or_else(|| ApiError::Provider("No image returned from HuggingFace".to_string()))?;
    let seed = items.get(1).and_then(|s| {
        s.as_u64()
            .or_else(|| s.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .or_else(|| s.as_str().and_then(|s| s.trim().parse().ok()))
    });
    Ok(GenerateSuccessResponse {
        url: Some(url),
        b64_json: None,
        seed,
    })
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    fn id(&self) -> &str {
        "huggingface"
    }

    fn name(&self) -> &str {
        "HuggingFace"
    }

    async fn generate(
        &self,
        request: ProviderGenerateRequest,
    ) -> Result<GenerateSuccessResponse, ApiError> {
        let space = self.space_for(request.model.as_deref())?;
        debug!("HuggingFace generation via {}", space.base_url);

        let data = json!([
            request.prompt,
            request.height,
            request.width,
            request.steps.unwrap_or(DEFAULT_STEPS),
            request.seed.unwrap_or(0),
            request.seed.is_none(),
        ]);
        let output = self
            .gradio
            .call(&space.base_url, &space.endpoint, data, request.token())
            .await?;
        parse_space_output(&output)
    }
}
