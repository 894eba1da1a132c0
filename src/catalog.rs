// src/catalog.rs
// Compiled-in provider, model and aspect-ratio tables.
use crate::models::*;
use std::collections::HashMap;

pub static PROVIDER_CONFIGS: [ProviderConfig; 3] = [
    ProviderConfig {
        id: ProviderType::Gitee,
        name: "Gitee AI",
        requires_auth: true,
        auth_header: "X-API-Key",
        base_url: "https://ai.gitee.com/v1",
    },
    ProviderConfig {
        id: ProviderType::HuggingFace,
        name: "HuggingFace",
        requires_auth: false,
        auth_header: "X-HF-Token",
        base_url: "https://huggingface.co",
    },
    ProviderConfig {
        id: ProviderType::ModelScope,
        name: "ModelScope",
        requires_auth: true,
        auth_header: "X-MS-Token",
        base_url: "https://api-inference.modelscope.cn/v1",
    },
];

/// Header used for providers registered without a table entry.
pub const FALLBACK_AUTH_HEADER: &str = "X-API-Key";

pub fn provider_config(id: &str) -> Option<&'static ProviderConfig> {
    PROVIDER_CONFIGS.iter().find(|c| c.id.as_str() == id)
}

const TURBO_STEPS: Range = Range { min: 1.0, max: 20.0, default: 9.0 };
const FLUX_STEPS: Range = Range { min: 1.0, max: 50.0, default: 28.0 };
const FLUX_GUIDANCE: Range = Range { min: 1.0, max: 10.0, default: 3.5 };

pub static MODELS: &[ModelConfig] = &[
    ModelConfig {
        id: "z-image-turbo",
        name: "Z-Image Turbo",
        provider: ProviderType::Gitee,
        features: ModelFeatures {
            negative_prompt: true,
            steps: TURBO_STEPS,
            guidance_scale: None,
            seed: true,
        },
    },
    ModelConfig {
        id: "Qwen-Image",
        name: "Qwen Image",
        provider: ProviderType::Gitee,
        features: ModelFeatures {
            negative_prompt: true,
            steps: Range { min: 4.0, max: 50.0, default: 20.0 },
            guidance_scale: Some(Range { min: 1.0, max: 10.0, default: 4.0 }),
            seed: true,
        },
    },
    ModelConfig {
        id: "FLUX.1-dev",
        name: "FLUX.1 dev",
        provider: ProviderType::Gitee,
        features: ModelFeatures {
            negative_prompt: false,
            steps: FLUX_STEPS,
            guidance_scale: Some(FLUX_GUIDANCE),
            seed: true,
        },
    },
    ModelConfig {
        id: "z-image-turbo",
        name: "Z-Image Turbo",
        provider: ProviderType::HuggingFace,
        features: ModelFeatures {
            negative_prompt: false,
            steps: TURBO_STEPS,
            guidance_scale: None,
            seed: true,
        },
    },
    ModelConfig {
        id: "qwen-image-fast",
        name: "Qwen Image Fast",
        provider: ProviderType::HuggingFace,
        features: ModelFeatures {
            negative_prompt: false,
            steps: Range { min: 4.0, max: 16.0, default: 8.0 },
            guidance_scale: None,
            seed: true,
        },
    },
    ModelConfig {
        id: "ovis-image",
        name: "Ovis Image",
        provider: ProviderType::HuggingFace,
        features: ModelFeatures {
            negative_prompt: false,
            steps: Range { min: 1.0, max: 50.0, default: 24.0 },
            guidance_scale: Some(Range { min: 1.0, max: 10.0, default: 5.0 }),
            seed: true,
        },
    },
    ModelConfig {
        id: "flux-1-schnell",
        name: "FLUX.1 schnell",
        provider: ProviderType::HuggingFace,
        features: ModelFeatures {
            negative_prompt: false,
            steps: Range { min: 1.0, max: 8.0, default: 4.0 },
            guidance_scale: None,
            seed: true,
        },
    },
    ModelConfig {
        id: "Tongyi-MAI/Z-Image-Turbo",
        name: "Z-Image Turbo",
        provider: ProviderType::ModelScope,
        features: ModelFeatures {
            negative_prompt: true,
            steps: TURBO_STEPS,
            guidance_scale: None,
            seed: true,
        },
    },
    ModelConfig {
        id: "black-forest-labs/FLUX.2-dev",
        name: "FLUX.2 dev",
        provider: ProviderType::ModelScope,
        features: ModelFeatures {
            negative_prompt: false,
            steps: FLUX_STEPS,
            guidance_scale: Some(FLUX_GUIDANCE),
            seed: true,
        },
    },
];

pub fn models_for(provider: ProviderType) -> impl Iterator<Item = &'static ModelConfig> {
    MODELS.iter().filter(move |m| m.provider == provider)
}

pub static ASPECT_RATIOS: [AspectRatioConfig; 5] = [
    AspectRatioConfig {
        label: "1:1",
        presets: [
            AspectRatioPreset { w: 1024, h: 1024 },
            AspectRatioPreset { w: 2048, h: 2048 },
        ],
    },
    AspectRatioConfig {
        label: "4:3",
        presets: [
            AspectRatioPreset { w: 1152, h: 896 },
            AspectRatioPreset { w: 2048, h: 1536 },
        ],
    },
    AspectRatioConfig {
        label: "3:4",
        presets: [
            AspectRatioPreset { w: 768, h: 1024 },
            AspectRatioPreset { w: 1536, h: 2048 },
        ],
    },
    AspectRatioConfig {
        label: "16:9",
        presets: [
            AspectRatioPreset { w: 1024, h: 576 },
            AspectRatioPreset { w: 2048, h: 1152 },
        ],
    },
    AspectRatioConfig {
        label: "9:16",
        presets: [
            AspectRatioPreset { w: 576, h: 1024 },
            AspectRatioPreset { w: 1152, h: 2048 },
        ],
    },
];

pub fn aspect_ratio_by_label(label: &str) -> Option<&'static AspectRatioConfig> {
    ASPECT_RATIOS.iter().find(|r| r.label == label)
}

pub fn default_aspect_ratio() -> &'static AspectRatioConfig {
    &ASPECT_RATIOS[0]
}

pub const HF_UPSCALER_SPACE: &str = "https://tuan2308-upscaler.hf.space";
pub const HF_UPSCALER_ENDPOINT: &str = "realesrgan";
pub const DEFAULT_HF_MODEL: &str = "z-image-turbo";

/// Gradio spaces backing each HuggingFace model id.
pub fn default_hf_spaces() -> HashMap<String, HfSpace> {
    [
        ("z-image-turbo", "https://luca115-z-image-turbo.hf.space"),
        ("qwen-image-fast", "https://mcp-tools-qwen-image-fast.hf.space"),
        ("ovis-image", "https://aidc-ai-ovis-image-7b.hf.space"),
        ("flux-1-schnell", "https://black-forest-labs-flux-1-schnell.hf.space"),
    ]
    .into_iter()
    .map(|(id, url)| (id.to_string(), HfSpace::new(url, "generate_image")))
    .collect()
}
