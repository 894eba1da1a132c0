// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zimage_api::AppState;
use zimage_api::errors::ApiError;
use zimage_api::models::{GenerateSuccessResponse, ProviderGenerateRequest};
use zimage_api::providers::{ImageProvider, ProviderRegistry};
use zimage_api::services::{GradioClient, RetryPolicy};

pub enum Outcome {
    Image(&'static str),
    Empty,
    Fail(&'static str),
}

/// Adapter double that records what the route layer hands it.
pub struct FakeProvider {
    id: &'static str,
    name: &'static str,
    outcome: Outcome,
    calls: AtomicUsize,
    last: Mutex<Option<ProviderGenerateRequest>>,
}

impl FakeProvider {
    pub fn new(id: &'static str, name: &'static str, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            id,
            name,
            outcome,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> ProviderGenerateRequest {
        self.last
            .lock()
            .unwrap()
            .clone()
            .expect("provider was not called")
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        request: ProviderGenerateRequest,
    ) -> Result<GenerateSuccessResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);
        match self.outcome {
            Outcome::Image(url) => Ok(GenerateSuccessResponse {
                url: Some(url.to_string()),
                b64_json: None,
                seed: Some(42),
            }),
            Outcome::Empty => Ok(GenerateSuccessResponse::default()),
            Outcome::Fail(message) => Err(ApiError::Provider(message.to_string())),
        }
    }
}

pub fn gradio_client() -> Arc<GradioClient> {
    gradio_client_with(reqwest::Client::new())
}

/// Client whose every request gives up after `timeout`.
pub fn gradio_client_with_timeout(timeout: Duration) -> Arc<GradioClient> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap();
    gradio_client_with(client)
}

fn gradio_client_with(client: reqwest::Client) -> Arc<GradioClient> {
    Arc::new(GradioClient::new(
        client,
        RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(10),
        },
    ))
}

pub struct Fakes {
    pub gitee: Arc<FakeProvider>,
    pub huggingface: Arc<FakeProvider>,
    pub modelscope: Arc<FakeProvider>,
}

impl Fakes {
    pub fn with_outcomes(gitee: Outcome, huggingface: Outcome, modelscope: Outcome) -> Self {
        Self {
            gitee: FakeProvider::new("gitee", "Gitee AI", gitee),
            huggingface: FakeProvider::new("huggingface", "HuggingFace", huggingface),
            modelscope: FakeProvider::new("modelscope", "ModelScope", modelscope),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_outcomes(
            Outcome::Image("https://gitee.com/out.png"),
            Outcome::Image("https://space.hf.space/out.png"),
            Outcome::Image("https://modelscope.cn/out.png"),
        )
    }

    pub fn state(&self, upscaler_url: &str) -> AppState {
        self.state_with(upscaler_url, gradio_client())
    }

    pub fn state_with(&self, upscaler_url: &str, gradio: Arc<GradioClient>) -> AppState {
        let registry = ProviderRegistry::builder()
            .register(self.gitee.clone())
            .register(self.huggingface.clone())
            .register(self.modelscope.clone())
            .build();
        AppState::new(registry, gradio, upscaler_url)
    }
}
