// src/services/sse.rs
// Line scanner for Gradio's `event: ... / data: ...` result streams.
use crate::errors::ApiError;
use serde_json::Value;

pub const QUOTA_EXHAUSTED: &str = "Quota exhausted, please set HF Token";
const SNIPPET_CHARS: usize = 200;

/// Incremental scanner; feed chunks as they arrive, then call `finish`.
#[derive(Debug, Default)]
pub struct SseScanner {
    pending: Vec<u8>,
    /// Leading characters of the stream, kept for the error snippet.
    raw: String,
    raw_chars: usize,
    in_complete: bool,
}

impl SseScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some` as soon as a terminal event has been seen.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Result<Value, ApiError>> {
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).into_owned();
            self.remember(&line);
            if let Some(result) = self.scan_line(line.trim_end_matches(['\r', '\n'])) {
                return Some(result);
            }
        }
        None
    }

    /// Flushes a trailing unterminated line and reports the final outcome.
    pub fn finish(mut self) -> Result<Value, ApiError> {
        if !self.pending.is_empty() {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.remember(&line);
            if let Some(result) = self.scan_line(line.trim_end_matches('\r')) {
                return result;
            }
        }
        Err(ApiError::Provider(format!(
            "No complete event in response: {}",
            self.raw
        )))
    }

    fn remember(&mut self, line: &str) {
        for c in line.chars().take(SNIPPET_CHARS - self.raw_chars) {
            self.raw.push(c);
            self.raw_chars += 1;
        }
    }

    fn scan_line(&mut self, line: &str) -> Option<Result<Value, ApiError>> {
        if let Some(event) = line.strip_prefix("event:") {
            match event.trim() {
                "complete" => self.in_complete = true,
                "error" => return Some(Err(ApiError::Provider(QUOTA_EXHAUSTED.to_string()))),
                _ => self.in_complete = false,
            }
        } else if let Some(data) = line.strip_prefix("data:") {
            if self.in_complete {
                return Some(serde_json::from_str(data.trim()).map_err(|e| {
                    ApiError::Provider(format!("Failed to parse complete event data: {}", e))
                }));
            }
        }
        None
    }
}

/// Scans a fully buffered stream.
pub fn extract_complete_event_data(stream: &str) -> Result<Value, ApiError> {
    let mut scanner = SseScanner::new();
    match scanner.feed(stream.as_bytes()) {
        Some(result) => result,
        None => scanner.finish(),
    }
}
