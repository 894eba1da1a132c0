// src/services/mod.rs
pub mod gradio;
pub mod sse;

pub use gradio::{GradioClient, RetryPolicy};
pub use sse::{SseScanner, extract_complete_event_data};
