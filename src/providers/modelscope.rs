// src/providers/modelscope.rs
use super::ImageProvider;
use super::openai_compat::{ImagesGenerateBody, generate_image};
use crate::errors::ApiError;
use crate::models::{GenerateSuccessResponse, ProviderGenerateRequest};
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_MODEL: &str = "Tongyi-MAI/Z-Image-Turbo";

pub struct ModelScopeProvider {
    client: Client,
    base_url: String,
}

impl ModelScopeProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ImageProvider for ModelScopeProvider {
    fn id(&self) -> &str {
        "modelscope"
    }

    fn name(&self) -> &str {
        "ModelScope"
    }

    async fn generate(
        &self,
        request: ProviderGenerateRequest,
    ) -> Result<GenerateSuccessResponse, ApiError> {
        let token = request
            .token()
            .ok_or_else(|| ApiError::Provider("Token is required for ModelScope".to_string()))?;

        let body = ImagesGenerateBody::from_request(&request, DEFAULT_MODEL);
        generate_image(&self.client, self.name(), &self.base_url, token, &body).await
    }
}
