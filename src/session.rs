use std::sync::Arc;

use crate::commit::Commit;
use crate::history::CommitSummary;
use crate::interpreter::DraftingCommand;
use crate::model::{SchItem, VecI};
use crate::state::EditorState;

/// Description used by [`DraftingSession::end_batch`] callers with nothing better to say.
pub const DEFAULT_BATCH_MESSAGE: &str = "Batch operation";

/// Whether `add_*` calls commit immediately or accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Every add is committed as its own undo step.
    Idle,
    /// Adds accumulate until `end_batch`.
    Batching,
}

/// Places primitives on the editor's current sheet through the commit
/// mechanism, either one undo step per primitive or one step per batch.
///
/// The session always owns exactly one pending commit; a fresh one is
/// allocated every time the previous one is pushed or discarded.
pub struct DraftingSession {
    state: Arc<EditorState>,
    commit: Commit,
    in_batch: bool,
}

impl DraftingSession {
    pub fn new(state: Arc<EditorState>) -> Self {
        Self {
            state,
            commit: Commit::new(),
            in_batch: false,
        }
    }

    pub fn state(&self) -> &Arc<EditorState> {
        &self.state
    }

    pub fn mode(&self) -> SessionMode {
        if self.in_batch {
            SessionMode::Batching
        } else {
            SessionMode::Idle
        }
    }

    /// Number of primitives staged but not yet committed.
    pub fn pending(&self) -> usize {
        self.commit.len()
    }

    /// Add a junction. Returns `false` only when no document is open.
    pub fn add_junction(&mut self, position: VecI) -> bool {
        self.stage(SchItem::junction(position), "Added junction")
    }

    /// Add a wire on the wire layer with the default stroke.
    pub fn add_wire(&mut self, start: VecI, end: VecI) -> bool {
        self.stage(SchItem::wire(start, end), "Added wire")
    }

    pub fn add_label(&mut self, position: VecI, text: &str) -> bool {
        self.stage(SchItem::label(position, text), "Added label")
    }

    pub fn add_text(&mut self, position: VecI, text: &str) -> bool {
        self.stage(SchItem::text(position, text), "Added text")
    }

    /// Enter batch mode. Anything staged and not yet committed is discarded.
    /// Calling this while already batching restarts the batch.
    pub fn begin_batch(&mut self) {
        if !self.commit.is_empty() {
            log::debug!("discarding {} uncommitted change(s)", self.commit.len());
        }
        self.in_batch = true;
        self.commit = Commit::new();
    }

    /// Commit the batch as a single undo step and leave batch mode. Outside a
    /// batch this only makes sure batch mode is off.
    pub fn end_batch(&mut self, message: &str) -> Option<CommitSummary> {
        let summary = if self.in_batch {
            self.push(message)
        } else {
            None
        };
        self.in_batch = false;
        summary
    }

    /// Apply one drafting command, converting millimetres to internal units.
    pub fn apply(&mut self, command: &DraftingCommand) -> bool {
        match command {
            DraftingCommand::AddJunction { position } => self.add_junction(position.to_iu()),
            DraftingCommand::AddWire { start, end } => self.add_wire(start.to_iu(), end.to_iu()),
            DraftingCommand::AddLabel { position, text } => {
                self.add_label(position.to_iu(), text)
            }
            DraftingCommand::AddText { position, text } => self.add_text(position.to_iu(), text),
        }
    }

    /// Apply `commands` in order inside one batch committed under `message`.
    /// Returns how many commands were staged and the pushed commit, if any.
    pub fn apply_batch(
        &mut self,
        commands: &[DraftingCommand],
        message: &str,
    ) -> (usize, Option<CommitSummary>) {
        self.begin_batch();
        let staged = commands.iter().filter(|cmd| self.apply(cmd)).count();
        let commit = self.end_batch(message);
        (staged, commit)
    }

    fn stage(&mut self, item: SchItem, description: &str) -> bool {
        let Some(sheet) = self.state.surface() else {
            log::warn!("cannot add {}: no schematic is open", item.kind_name());
            return false;
        };

        self.commit.add(item, sheet);

        if self.in_batch {
            true
        } else {
            self.push(description).is_some()
        }
    }

    /// Push the pending commit and allocate a fresh one.
    fn push(&mut self, message: &str) -> Option<CommitSummary> {
        let commit = std::mem::take(&mut self.commit);
        match commit.push(&self.state, message) {
            Ok(summary) => Some(summary),
            Err(e) => {
                log::error!("commit \"{message}\" failed: {e}");
                None
            }
        }
    }
}
