// src/lib.rs
use actix_cors::Cors;
use actix_web::web;
use reqwest::Client;
use std::sync::Arc;

pub mod catalog;
pub mod config;
pub mod errors;
pub mod flow_storage;
pub mod handlers;
pub mod models;
pub mod openai;
pub mod providers;
pub mod resolver;
pub mod services;
pub mod validation;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::providers::ProviderRegistry;
use crate::services::{GradioClient, RetryPolicy};

pub const CORS_ALLOWED_HEADERS: &[&str] = &[
    "Content-Type",
    "X-API-Key",
    "X-HF-Token",
    "X-MS-Token",
    "Authorization",
];

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub gradio: Arc<GradioClient>,
    pub upscaler_url: String,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let gradio = Arc::new(GradioClient::new(
            client.clone(),
            RetryPolicy {
                max_attempts: config.upscale_max_attempts,
                delay: config.upscale_retry_delay,
            },
        ));
        let registry = ProviderRegistry::with_defaults(client, gradio.clone(), config);
        Ok(Self::new(registry, gradio, config.hf_upscaler_url.clone()))
    }

    pub fn new(
        registry: ProviderRegistry,
        gradio: Arc<GradioClient>,
        upscaler_url: impl Into<String>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            gradio,
            upscaler_url: upscaler_url.into(),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("", web::get().to(handlers::health_check))
            .route("/", web::get().to(handlers::health_check))
            .route("/generate", web::post().to(handlers::generate))
            .route("/generate-hf", web::post().to(handlers::generate_hf))
            .route("/upscale", web::post().to(handlers::upscale))
            .route("/models", web::get().to(handlers::list_models))
            .route("/providers", web::get().to(handlers::list_providers)),
    )
    .service(
        web::scope("/v1")
            .route(
                "/images/generations",
                web::post().to(openai::images_generations),
            )
            .route("/models", web::get().to(openai::list_models)),
    );
}

pub fn build_cors(config: &AppConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods(["GET", "POST", "OPTIONS"])
        .allowed_headers(CORS_ALLOWED_HEADERS.iter().copied())
        .max_age(3600);

    if config.allows_any_origin() {
        return cors.allow_any_origin();
    }
    config
        .cors_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
