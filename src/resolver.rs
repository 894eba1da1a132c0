// src/resolver.rs
// Maps client-facing model names onto a provider and that provider's model id.
use crate::catalog::DEFAULT_HF_MODEL;
use crate::models::ProviderType;

const GITEE_PREFIX: &str = "gitee/";
const MODELSCOPE_PREFIX: &str = "ms/";

const HF_MODELS: &[&str] = &["z-image-turbo", "qwen-image-fast", "ovis-image", "flux-1-schnell"];

const GITEE_MODEL_ALIASES: &[(&str, &str)] = &[
    ("z-image-turbo", "z-image-turbo"),
    ("qwen-image", "Qwen-Image"),
    ("flux-1-krea-dev", "FLUX_1-Krea-dev"),
    ("flux-1-dev", "FLUX.1-dev"),
];

const MODELSCOPE_MODEL_ALIASES: &[(&str, &str)] = &[
    ("z-image-turbo", "Tongyi-MAI/Z-Image-Turbo"),
    ("flux-2", "black-forest-labs/FLUX.2-dev"),
    ("flux-1-krea-dev", "black-forest-labs/FLUX.1-Krea-dev"),
    ("flux-1", "MusePublic/489_ckpt_FLUX_1"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub provider: ProviderType,
    pub model: String,
}

fn alias(table: &[(&str, &str)], raw: &str) -> String {
    match table.iter().find(|(name, _)| *name == raw) {
        Some((_, target)) => target.to_string(),
        None => raw.to_string(),
    }
}

/// Unrecognized unprefixed names fall back to the default HuggingFace model
/// instead of failing; clients rely on this.
pub fn resolve_model(model: Option<&str>) -> ResolvedModel {
    let model = model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_HF_MODEL);

    if let Some(raw) = model.strip_prefix(GITEE_PREFIX) {
        return ResolvedModel {
            provider: ProviderType::Gitee,
            model: alias(GITEE_MODEL_ALIASES, raw),
        };
    }

    if let Some(raw) = model.strip_prefix(MODELSCOPE_PREFIX) {
        return ResolvedModel {
            provider: ProviderType::ModelScope,
            model: alias(MODELSCOPE_MODEL_ALIASES, raw),
        };
    }

    let model = if HF_MODELS.contains(&model) {
        model
    } else {
        DEFAULT_HF_MODEL
    };
    ResolvedModel {
        provider: ProviderType::HuggingFace,
        model: model.to_string(),
    }
}

/// Every public model name `resolve_model` understands without falling back.
pub fn model_ids() -> Vec<(String, ProviderType)> {
    let hf = HF_MODELS
        .iter()
        .map(|m| (m.to_string(), ProviderType::HuggingFace));
    let gitee = GITEE_MODEL_ALIASES
        .iter()
        .map(|(name, _)| (format!("{}{}", GITEE_PREFIX, name), ProviderType::Gitee));
    let modelscope = MODELSCOPE_MODEL_ALIASES
        .iter()
        .map(|(name, _)| (format!("{}{}", MODELSCOPE_PREFIX, name), ProviderType::ModelScope));
    hf.chain(gitee).chain(modelscope).collect()
}
