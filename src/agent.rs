use std::sync::Arc;

use crate::error::AppError;
use crate::history::CommitSummary;
use crate::interpreter::{interpret, Interpretation};
use crate::ollama::{LanguageModel, OllamaClient};
use crate::prompt::build_prompt;
use crate::session::DraftingSession;
use crate::state::EditorState;

/// Undo description for everything one model reply places.
pub const AGENT_BATCH_MESSAGE: &str = "Ollama agent operation";

/// What happened to one request.
#[derive(Debug)]
pub enum AgentOutcome {
    /// At least one command was understood; `staged` of them reached the sheet.
    Applied {
        commands: usize,
        staged: usize,
        commit: Option<CommitSummary>,
    },
    /// The model answered but nothing in the reply was a command.
    NothingUnderstood,
    /// Empty request; nothing was sent.
    Ignored,
    Failed(AppError),
}

impl AgentOutcome {
    /// Message to show the user, if the outcome warrants one. Errors the
    /// server reported are passed through verbatim.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AgentOutcome::Applied { .. } | AgentOutcome::Ignored => None,
            AgentOutcome::NothingUnderstood => {
                Some("Agent response received but could not parse commands.".into())
            }
            AgentOutcome::Failed(AppError::ClientUnavailable { .. }) => Some(
                "Failed to initialize Ollama client. Please check your network configuration."
                    .into(),
            ),
            AgentOutcome::Failed(e @ AppError::Server { .. }) => Some(e.to_string()),
            AgentOutcome::Failed(_) => Some("Failed to communicate with Ollama server.".into()),
        }
    }
}

/// The result of running one reply through the interpreter and the session.
#[derive(Debug)]
pub struct Execution {
    pub interpretation: Interpretation,
    pub staged: usize,
    pub commit: Option<CommitSummary>,
}

impl Execution {
    /// Whether the reply contained any command at all.
    pub fn understood(&self) -> bool {
        !self.interpretation.commands.is_empty()
    }
}

/// Turns natural-language requests into schematic edits: prompt, one model
/// round-trip, then every understood command in a single undo step.
pub struct AgentTool {
    session: DraftingSession,
    model: Option<Arc<dyn LanguageModel>>,
}

impl AgentTool {
    /// A tool that connects to Ollama on first use, using the editor's settings.
    pub fn new(state: Arc<EditorState>) -> Self {
        Self {
            session: DraftingSession::new(state),
            model: None,
        }
    }

    pub fn with_model(state: Arc<EditorState>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            session: DraftingSession::new(state),
            model: Some(model),
        }
    }

    pub fn state(&self) -> &Arc<EditorState> {
        self.session.state()
    }

    /// The model, connecting on first call. A failed connect is not cached,
    /// so the next call tries again.
    pub fn model(&mut self) -> Result<Arc<dyn LanguageModel>, AppError> {
        if let Some(model) = &self.model {
            return Ok(Arc::clone(model));
        }
        let settings = self.session.state().settings();
        let client = OllamaClient::from_settings(&settings).inspect_err(|e| {
            log::error!("{e}");
        })?;
        log::info!(
            "using Ollama at {} with model {}",
            client.base_url(),
            client.model()
        );
        let model: Arc<dyn LanguageModel> = Arc::new(client);
        self.model = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Send `request` to the model and apply whatever it answers.
    pub fn process_request(&mut self, request: &str) -> AgentOutcome {
        let request = request.trim();
        if request.is_empty() {
            return AgentOutcome::Ignored;
        }

        let model = match self.model() {
            Ok(m) => m,
            Err(e) => return AgentOutcome::Failed(e),
        };

        let reply = match model.generate(&build_prompt(request)) {
            Ok(r) => r,
            Err(e) => return AgentOutcome::Failed(e),
        };

        let execution = self.execute(&reply);
        if execution.understood() {
            AgentOutcome::Applied {
                commands: execution.interpretation.commands.len(),
                staged: execution.staged,
                commit: execution.commit,
            }
        } else {
            AgentOutcome::NothingUnderstood
        }
    }

    /// Apply a model reply as one batch. Returns whether any command was found.
    pub fn parse_and_execute(&mut self, reply: &str) -> bool {
        self.execute(reply).understood()
    }

    /// Interpret `reply` and apply its commands inside one batch committed as
    /// [`AGENT_BATCH_MESSAGE`]. The batch is closed even when nothing parsed.
    pub fn execute(&mut self, reply: &str) -> Execution {
        let interpretation = interpret(reply);
        for skipped in &interpretation.skipped {
            log::debug!("reply line {} skipped: {:?}", skipped.line_number, skipped.reason);
        }

        let (staged, commit) = self
            .session
            .apply_batch(&interpretation.commands, AGENT_BATCH_MESSAGE);

        Execution {
            interpretation,
            staged,
            commit,
        }
    }
}
