// src/providers/registry.rs
use super::{GiteeProvider, HuggingFaceProvider, ImageProvider, ModelScopeProvider};
use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::services::GradioClient;
use log::info;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

/// Collects adapters during startup wiring; `build` freezes the set.
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: HashMap<String, Arc<dyn ImageProvider>>,
}

impl ProviderRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering an id twice replaces the earlier adapter.
    pub fn register(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        info!("Registering provider {} ({})", provider.id(), provider.name());
        self.providers.insert(provider.id().to_string(), provider);
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}

/// Immutable provider map shared read-only by every request.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ImageProvider>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::new()
    }

    pub fn with_defaults(client: Client, gradio: Arc<GradioClient>, config: &AppConfig) -> Self {
        Self::defaults_builder(client, gradio, config).build()
    }

    /// The built-in adapters, left open for further registrations.
    pub fn defaults_builder(
        client: Client,
        gradio: Arc<GradioClient>,
        config: &AppConfig,
    ) -> ProviderRegistryBuilder {
        Self::builder()
            .register(Arc::new(GiteeProvider::new(
                client.clone(),
                config.gitee_base_url.clone(),
            )))
            .register(Arc::new(HuggingFaceProvider::with_default_spaces(gradio)))
            .register(Arc::new(ModelScopeProvider::new(
                client,
                config.modelscope_base_url.clone(),
            )))
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn ImageProvider>, ApiError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::UnknownProvider(id.to_string()))
    }

    pub fn has(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
