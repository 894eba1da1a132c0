// src/providers/mod.rs
use crate::errors::ApiError;
use crate::models::{GenerateSuccessResponse, ProviderGenerateRequest};
use async_trait::async_trait;

pub mod gitee;
pub mod huggingface;
pub mod modelscope;
pub mod openai_compat;
pub mod registry;

pub use gitee::GiteeProvider;
pub use huggingface::HuggingFaceProvider;
pub use modelscope::ModelScopeProvider;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    async fn generate(
        &self,
        request: ProviderGenerateRequest,
    ) -> Result<GenerateSuccessResponse, ApiError>;
}
