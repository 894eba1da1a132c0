// src/flow_storage.rs
// Generation history kept by the web client. Values are JSON strings in a
// key-value store (browser local storage in the client), wrapped in a
// versioned envelope so the layout can change later.
use crate::catalog::{ASPECT_RATIOS, default_aspect_ratio};
use crate::models::{AspectRatioPreset, GenerateSuccessResponse};
use chrono::{Local, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

pub const FLOW_STORAGE_KEY: &str = "zenith-flow-sessions";
pub const FLOW_INPUT_SETTINGS_KEY: &str = "zenith-flow-input-settings";
/// Holds a session list that could not be decoded before it is replaced.
pub const FLOW_STORAGE_UNREADABLE_KEY: &str = "zenith-flow-sessions-unreadable";
pub const SCHEMA_VERSION: u32 = 1;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
    pub prompt: String,
    pub aspect_ratio: String,
    pub timestamp: i64,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<f64>,
    /// Milliseconds; older clients stored fractional values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_blurred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_upscaled: Option<bool>,
}

impl GeneratedImage {
    /// History entry for a successful generation; `None` when the response
    /// carries no image.
    pub fn from_response(
        response: &GenerateSuccessResponse,
        prompt: &str,
        aspect_ratio: &str,
        model: &str,
        duration_ms: Option<u64>,
    ) -> Option<Self> {
        let url = match (&response.url, &response.b64_json) {
            (Some(url), _) if !url.is_empty() => url.clone(),
            (_, Some(b64)) if !b64.is_empty() => format!("data:image/png;base64,{}", b64),
            _ => return None,
        };
        Some(Self {
            id: Uuid::new_v4().to_string(),
            url,
            prompt: prompt.to_string(),
            aspect_ratio: aspect_ratio.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            model: model.to_string(),
            seed: response.seed.map(|s| s as f64),
            duration: duration_ms.map(|d| d as f64),
            is_blurred: None,
            is_upscaled: None,
        })
    }

    pub fn mark_upscaled(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.is_upscaled = Some(true);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSession {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowInputSettings {
    pub aspect_ratio_index: usize,
    /// 0 = 1K, 1 = 2K preset of the selected aspect ratio.
    pub resolution_index: usize,
    pub prompt: String,
}

impl FlowInputSettings {
    pub fn aspect_ratio_label(&self) -> &'static str {
        ASPECT_RATIOS
            .get(self.aspect_ratio_index)
            .unwrap_or_else(default_aspect_ratio)
            .label
    }

    pub fn dimensions(&self) -> AspectRatioPreset {
        let ratio = ASPECT_RATIOS
            .get(self.aspect_ratio_index)
            .unwrap_or_else(default_aspect_ratio);
        ratio
            .presets
            .get(self.resolution_index)
            .copied()
            .unwrap_or(ratio.presets[0])
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

pub struct FlowStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> FlowStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Decodes an envelope, or a bare legacy value written before versioning.
    /// Unreadable data is treated as absent.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.decode(key).ok().flatten()
    }

    /// `Ok(None)` when nothing is stored, `Err(raw)` when the stored value
    /// cannot be decoded.
    fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, String> {
        let Some(raw) = self.store.get(key) else {
            return Ok(None);
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding unreadable {}: {}", key, e);
                return Err(raw);
            }
        };

        let versioned = value
            .as_object()
            .filter(|o| o.contains_key("data"))
            .and_then(|o| o.get("version"))
            .and_then(Value::as_u64);
        let payload = match versioned {
            Some(v) if v == SCHEMA_VERSION as u64 => match value.get("data") {
                Some(data) => data.clone(),
                None => return Err(raw),
            },
            Some(v) => {
                warn!("Unsupported {} schema version {}", key, v);
                return Err(raw);
            }
            None => value,
        };

        match serde_json::from_value(payload) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!("Discarding malformed {}: {}", key, e);
                Err(raw)
            }
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, data: &T) {
        let envelope = Envelope {
            version: SCHEMA_VERSION,
            data,
        };
        match serde_json::to_string(&envelope) {
            Ok(raw) => self.store.set(key, raw),
            Err(e) => warn!("Failed to serialize {}: {}", key, e),
        }
    }

    pub fn load_sessions(&self) -> Vec<FlowSession> {
        self.read(FLOW_STORAGE_KEY).unwrap_or_default()
    }

    pub fn save_sessions(&mut self, sessions: &[FlowSession]) {
        self.write(FLOW_STORAGE_KEY, &sessions);
    }

    /// Sessions to modify and write back. An undecodable list is moved to
    /// `FLOW_STORAGE_UNREADABLE_KEY` first so the write cannot destroy it.
    fn sessions_for_write(&mut self) -> Vec<FlowSession> {
        match self.decode(FLOW_STORAGE_KEY) {
            Ok(sessions) => sessions.unwrap_or_default(),
            Err(raw) => {
                warn!(
                    "Keeping unreadable sessions under {}",
                    FLOW_STORAGE_UNREADABLE_KEY
                );
                self.store.set(FLOW_STORAGE_UNREADABLE_KEY, raw);
                Vec::new()
            }
        }
    }

    /// New sessions go to the front of the list.
    pub fn create_session(&mut self) -> FlowSession {
        let now = Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        let session = FlowSession {
            id: format!("flow-{}-{}", now, &suffix[..8]),
            name: format!("Flow {}", Local::now().format("%Y/%m/%d %H:%M:%S")),
            created_at: now,
            updated_at: now,
            images: Vec::new(),
        };
        let mut sessions = self.sessions_for_write();
        sessions.insert(0, session.clone());
        self.save_sessions(&sessions);
        session
    }

    /// Replaces a session's images. Returns `false` for an unknown id.
    pub fn update_session(&mut self, session_id: &str, images: Vec<GeneratedImage>) -> bool {
        let mut sessions = self.sessions_for_write();
        let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) else {
            return false;
        };
        session.images = images;
        session.updated_at = Utc::now().timestamp_millis().max(session.updated_at);
        self.save_sessions(&sessions);
        true
    }

    pub fn delete_session(&mut self, session_id: &str) {
        let sessions: Vec<FlowSession> = self
            .sessions_for_write()
            .into_iter()
            .filter(|s| s.id != session_id)
            .collect();
        self.save_sessions(&sessions);
    }

    pub fn load_input_settings(&self) -> FlowInputSettings {
        self.read(FLOW_INPUT_SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save_input_settings(&mut self, settings: &FlowInputSettings) {
        self.write(FLOW_INPUT_SETTINGS_KEY, settings);
    }

    pub fn clear(&mut self) {
        self.store.remove(FLOW_STORAGE_KEY);
        self.store.remove(FLOW_INPUT_SETTINGS_KEY);
    }
}
