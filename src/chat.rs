use std::sync::Arc;

use serde::Serialize;

use crate::agent::AgentTool;
use crate::error::AppError;
use crate::ollama::{self, LanguageModel};
use crate::prompt::build_prompt;

pub const GREETING: &str = "Hello! I'm your Ollama AI assistant. I can help you create junctions, \
wires, labels, and text elements.\n\nTry asking me to:\n- Add a junction at 100mm, 50mm\n\
- Draw a wire from 50mm, 50mm to 150mm, 50mm\n- Add a label 'VCC' at 100mm, 100mm";

pub const CLEARED: &str = "Chat cleared. How can I help you?";

pub const NOTHING_PARSED: &str = "I received your request but couldn't parse any commands.";

// ── ChatView trait ───────────────────────────────────────────────

/// Where chat messages end up. Lets the panel run without any particular UI.
pub trait ChatView {
    fn add_user_message(&mut self, text: &str);
    fn add_agent_message(&mut self, text: &str);
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

/// In-memory transcript.
#[derive(Debug, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last_agent_text(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.role == ChatRole::Agent)
            .map(|e| e.text.as_str())
    }
}

impl ChatView for ChatLog {
    fn add_user_message(&mut self, text: &str) {
        self.entries.push(ChatEntry {
            role: ChatRole::User,
            text: text.to_string(),
        });
    }

    fn add_agent_message(&mut self, text: &str) {
        self.entries.push(ChatEntry {
            role: ChatRole::Agent,
            text: text.to_string(),
        });
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── Pending request ──────────────────────────────────────────────

/// A submitted message waiting for the model. Running it blocks, so hosts
/// with an event loop run it on a worker and feed the result back through
/// [`ChatPanel::complete`].
#[derive(Clone)]
pub struct PendingRequest {
    model: Arc<dyn LanguageModel>,
    prompt: String,
}

impl PendingRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Check the server is up, then generate.
    pub fn run(&self) -> Result<String, AppError> {
        if !self.model.is_available() {
            return Err(AppError::ServerUnavailable {
                base_url: self.model.endpoint().to_string(),
            });
        }
        self.model.generate(&self.prompt)
    }

    /// [`run`](Self::run) on tokio's blocking pool.
    pub async fn run_in_background(self) -> Result<String, AppError> {
        ollama::in_background(move || self.run()).await
    }
}

// ── ChatPanel ────────────────────────────────────────────────────

/// Conversational front end over an [`AgentTool`]: one request in flight at
/// a time, every reply applied to the open schematic.
pub struct ChatPanel<V: ChatView> {
    view: V,
    tool: AgentTool,
    processing: bool,
    endpoint: String,
}

impl<V: ChatView> ChatPanel<V> {
    pub fn new(view: V, tool: AgentTool) -> Self {
        let endpoint = tool.state().settings().ollama.normalized_base_url().to_string();
        let mut panel = Self {
            view,
            tool,
            processing: false,
            endpoint,
        };
        panel.post_agent(GREETING);
        panel
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn clear(&mut self) {
        self.view.clear();
        self.post_agent(CLEARED);
    }

    /// Submit, run and complete in one blocking call. Returns `false` when the
    /// message was ignored.
    pub fn send_message(&mut self, text: &str) -> bool {
        let Some(request) = self.submit(text) else {
            return false;
        };
        let result = request.run();
        self.complete(result);
        true
    }

    /// Post the user's message and prepare the model request. Returns `None`
    /// for blank input or while another request is in flight.
    pub fn submit(&mut self, text: &str) -> Option<PendingRequest> {
        let message = text.trim();
        if message.is_empty() || self.processing {
            return None;
        }

        self.post_user(message);

        let model = match self.tool.model() {
            Ok(m) => m,
            Err(e) => {
                log::error!("chat: {e}");
                self.post_agent(&self.unavailable_message());
                return None;
            }
        };
        self.endpoint = model.endpoint().to_string();
        self.processing = true;

        Some(PendingRequest {
            model,
            prompt: build_prompt(message),
        })
    }

    /// Deliver the outcome of a request started with [`submit`](Self::submit).
    pub fn complete(&mut self, result: Result<String, AppError>) {
        match result {
            Ok(reply) => {
                self.post_agent(&reply);
                if !self.tool.parse_and_execute(&reply) {
                    self.post_agent(NOTHING_PARSED);
                }
            }
            Err(AppError::ServerUnavailable { .. }) => {
                self.post_agent(&self.unavailable_message());
            }
            Err(e @ AppError::Server { .. }) => {
                log::error!("chat: {e}");
                self.post_agent(&format!("Error: {e}"));
            }
            Err(e) => {
                log::error!("chat: {e}");
                self.post_agent(&format!(
                    "Error: Failed to communicate with Ollama server. Make sure Ollama is running on {}",
                    self.endpoint
                ));
            }
        }
        self.processing = false;
    }

    fn unavailable_message(&self) -> String {
        format!(
            "Error: Ollama server not available. Make sure Ollama is running on {}",
            self.endpoint
        )
    }

    fn post_user(&mut self, text: &str) {
        if !text.is_empty() {
            self.view.add_user_message(text);
        }
    }

    fn post_agent(&mut self, text: &str) {
        if !text.is_empty() {
            self.view.add_agent_message(text);
        }
    }
}
