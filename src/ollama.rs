//! Blocking client for the Ollama HTTP API: one `POST /api/generate` per
//! request, and a `GET /api/tags` availability check. No retries.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::settings::{AgentSettings, OllamaConfig};

/// Availability checks should fail fast even when generate requests may not.
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// A text-generation backend. [`OllamaClient`] is the real one; tests and
/// hosts may plug in others.
pub trait LanguageModel: Send + Sync {
    /// Whether the server answers at all.
    fn is_available(&self) -> bool;
    /// Send `prompt` and return the reply text verbatim.
    fn generate(&self, prompt: &str) -> Result<String, AppError>;
    /// Human-readable location of the server, used in error messages.
    fn endpoint(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

pub struct OllamaClient {
    http: reqwest::blocking::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Build a client for `config`. Fails when the base URL is unusable or
    /// the HTTP stack cannot be initialised.
    pub fn connect(config: OllamaConfig, timeout: Duration) -> Result<Self, AppError> {
        let base = config.normalized_base_url();
        let url = reqwest::Url::parse(base).map_err(|e| AppError::ClientUnavailable {
            message: format!("invalid base URL {base:?}: {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::ClientUnavailable {
                message: format!("unsupported URL scheme {:?}", url.scheme()),
            });
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ClientUnavailable {
                message: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    pub fn from_settings(settings: &AgentSettings) -> Result<Self, AppError> {
        Self::connect(
            settings.ollama.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        self.config.normalized_base_url()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate with an explicit model name instead of the configured one.
    pub fn generate_with_model(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.base_url());
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        log::debug!("POST {url} (model {model}, {} prompt bytes)", prompt.len());

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| {
                log::error!("Ollama request failed: {e}");
                AppError::from(e)
            })?;

        let status = response.status();
        let text = response.text()?;

        parse_generate_response(status.is_success(), status.as_u16(), &text).inspect_err(|e| {
            log::error!("{e}");
        })
    }
}

impl LanguageModel for OllamaClient {
    fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url());
        match self.http.get(&url).timeout(AVAILABILITY_TIMEOUT).send() {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Ollama not reachable at {}: {e}", self.base_url());
                false
            }
        }
    }

    fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.generate_with_model(&self.config.model, prompt)
    }

    fn endpoint(&self) -> &str {
        self.base_url()
    }
}

/// Run a blocking job on tokio's blocking pool and hand its result back to
/// the awaiting task.
pub async fn in_background<T, F>(job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Transport {
            message: format!("worker task failed: {e}"),
        })?
}

/// [`LanguageModel::generate`] on a blocking worker.
pub async fn generate_in_background(
    model: Arc<dyn LanguageModel>,
    prompt: String,
) -> Result<String, AppError> {
    in_background(move || model.generate(&prompt)).await
}

/// Interpret a generate response body.
///
/// A `"response"` string wins; an `"error"` field is a server-side failure.
/// Error statuses are still parsed first because Ollama reports errors such
/// as unknown models as JSON bodies on 4xx responses.
fn parse_generate_response(success: bool, status: u16, body: &str) -> Result<String, AppError> {
    let json: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) if success => {
            return Err(AppError::MalformedResponse {
                message: e.to_string(),
            })
        }
        Err(_) => {
            return Err(AppError::Transport {
                message: format!("HTTP {status}"),
            })
        }
    };

    if let Some(reply) = json.get("response") {
        return reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::MalformedResponse {
                message: "\"response\" is not a string".into(),
            });
    }

    if let Some(error) = json.get("error") {
        let message = error
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(AppError::Server { message });
    }

    Err(AppError::MalformedResponse {
        message: if success {
            "missing \"response\" field".into()
        } else {
            format!("HTTP {status} without error detail")
        },
    })
}
