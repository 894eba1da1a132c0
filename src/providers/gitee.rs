// src/providers/gitee.rs
use super::ImageProvider;
use super::openai_compat::{ImagesGenerateBody, generate_image};
use crate::errors::ApiError;
use crate::models::{GenerateSuccessResponse, ProviderGenerateRequest};
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_MODEL: &str = "z-image-turbo";

pub struct GiteeProvider {
    client: Client,
    base_url: String,
}

impl GiteeProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ImageProvider for GiteeProvider {
    fn id(&self) -> &str {
        "gitee"
    }

    fn name(&self) -> &str {
        "Gitee AI"
    }

    async fn generate(
        &self,
        request: ProviderGenerateRequest,
    ) -> Result<GenerateSuccessResponse, ApiError> {
        let token = request
            .token()
            .ok_or_else(|| ApiError::Provider("API Key is required for Gitee AI".to_string()))?;

        let body = ImagesGenerateBody::from_request(&request, DEFAULT_MODEL);
        generate_image(&self.client, self.name(), &self.base_url, token, &body).await
    }
}
