use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::project::{read_json, write_json};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable overriding [`OllamaConfig::base_url`].
pub const ENV_BASE_URL: &str = "OLLAMA_HOST";
/// Environment variable overriding [`OllamaConfig::model`].
pub const ENV_MODEL: &str = "OLLAMA_MODEL";

// ── Ollama connection ────────────────────────────────────────────

/// Where the LLM server lives and which model to ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

impl OllamaConfig {
    /// Base URL without a trailing slash, so endpoint paths can be appended.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

// ── Agent settings ───────────────────────────────────────────────

/// Settings stored in the OS config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    pub version: u32,
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Upper bound on one generate round-trip. Local models can be slow.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const SETTINGS_VERSION: u32 = 1;

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            ollama: OllamaConfig::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AgentSettings {
    /// Apply `OLLAMA_HOST` / `OLLAMA_MODEL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_MODEL).ok(),
        )
    }

    /// Replace the base URL and/or model when a non-empty value is given.
    pub fn with_overrides(mut self, base_url: Option<String>, model: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.ollama.base_url = normalize_host(url.trim());
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.ollama.model = model.trim().to_string();
        }
        self
    }
}

/// `OLLAMA_HOST` is often given as a bare `host:port`.
fn normalize_host(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Load settings from the app config directory. Returns None if no settings file exists.
pub fn load_settings(app_config_dir: &Path) -> Option<AgentSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    match read_json::<AgentSettings>(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            log::warn!("ignoring unreadable settings at {}: {e}", path.display());
            None
        }
    }
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &AgentSettings) -> Result<(), AppError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&crate::paths::settings_path(app_config_dir), settings)
}
