// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gitee,
    HuggingFace,
    ModelScope,
}

impl ProviderType {
    pub const ALL: [ProviderType; 3] = [
        ProviderType::Gitee,
        ProviderType::HuggingFace,
        ProviderType::ModelScope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gitee => "gitee",
            ProviderType::HuggingFace => "huggingface",
            ProviderType::ModelScope => "modelscope",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: ProviderType,
    pub name: &'static str,
    pub requires_auth: bool,
    pub auth_header: &'static str,
    pub base_url: &'static str,
}

/// Body of `POST /api/generate`. Sizes stay `f64` so that `1024.5` reaches
/// validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub negative_prompt: Option<String>,
    #[serde(rename = "negative_prompt")]
    pub negative_prompt_snake: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub steps: Option<f64>,
    #[serde(rename = "num_inference_steps")]
    pub num_inference_steps: Option<f64>,
    pub seed: Option<u64>,
    #[serde(alias = "guidance_scale")]
    pub guidance_scale: Option<f64>,
}

impl GenerateRequest {
    pub fn negative_prompt(&self) -> Option<String> {
        [&self.negative_prompt, &self.negative_prompt_snake]
            .into_iter()
            .flatten()
            .find(|p| !p.is_empty())
            .cloned()
    }

    pub fn steps(&self) -> f64 {
        self.steps.or(self.num_inference_steps).unwrap_or(9.0)
    }
}

/// Body of the legacy `POST /api/generate-hf`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyGenerateRequest {
    pub prompt: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub model: Option<String>,
    pub seed: Option<u64>,
}

/// Validated request handed to an adapter.
#[derive(Debug, Clone, Default)]
pub struct ProviderGenerateRequest {
    pub model: Option<String>,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub steps: Option<u32>,
    pub seed: Option<u64>,
    pub guidance_scale: Option<f64>,
    pub auth_token: Option<String>,
}

impl ProviderGenerateRequest {
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Token with surrounding whitespace removed; blank tokens count as absent.
    pub fn token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateSuccessResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(alias = "b64Json", skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerateSuccessResponse {
    pub fn has_image(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
            || self.b64_json.as_deref().is_some_and(|b| !b.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpscaleRequest {
    pub url: Option<String>,
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleResponse {
    pub url: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFeatures {
    pub negative_prompt: bool,
    pub steps: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<Range>,
    pub seed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: ProviderType,
    pub features: ModelFeatures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatioPreset {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AspectRatioConfig {
    pub label: &'static str,
    pub presets: [AspectRatioPreset; 2],
}

/// A Gradio space hosting one HuggingFace model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HfSpace {
    pub base_url: String,
    pub endpoint: String,
}

impl HfSpace {
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
        }
    }
}
