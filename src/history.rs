use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::{ItemId, Schematic};

/// Undo/redo state for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}

/// What a pushed commit did: its description and the items it added, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub description: String,
    pub added: Vec<ItemId>,
}

/// An undo entry: the document before the commit was applied, plus what the
/// commit did.
struct UndoEntry {
    summary: CommitSummary,
    snapshot: Schematic,
}

const MAX_UNDO_LEVELS: usize = 50;

/// Snapshot-based undo/redo. One pushed commit is exactly one undo step.
#[derive(Default)]
pub struct UndoHistory {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit. `before` is the document as it was before the commit
    /// touched it. Clears the redo stack.
    pub fn record(&mut self, summary: CommitSummary, before: Schematic) {
        self.undo_stack.push(UndoEntry {
            summary,
            snapshot: before,
        });
        if self.undo_stack.len() > MAX_UNDO_LEVELS {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Undo the last commit. Returns the description of what was undone.
    pub fn undo(&mut self, doc: &mut Schematic) -> Result<String, AppError> {
        let entry = self.undo_stack.pop().ok_or(AppError::Validation {
            message: "Nothing to undo".into(),
        })?;

        let current = std::mem::replace(doc, entry.snapshot);
        let description = entry.summary.description.clone();
        self.redo_stack.push(UndoEntry {
            summary: entry.summary,
            snapshot: current,
        });

        Ok(description)
    }

    /// Redo the last undone commit. Returns the description of what was redone.
    pub fn redo(&mut self, doc: &mut Schematic) -> Result<String, AppError> {
        let entry = self.redo_stack.pop().ok_or(AppError::Validation {
            message: "Nothing to redo".into(),
        })?;

        let current = std::mem::replace(doc, entry.snapshot);
        let description = entry.summary.description.clone();
        self.undo_stack.push(UndoEntry {
            summary: entry.summary,
            snapshot: current,
        });

        Ok(description)
    }

    pub fn undo_state(&self) -> UndoState {
        UndoState {
            can_undo: !self.undo_stack.is_empty(),
            can_redo: !self.redo_stack.is_empty(),
            undo_description: self.undo_stack.last().map(|e| e.summary.description.clone()),
            redo_description: self.redo_stack.last().map(|e| e.summary.description.clone()),
        }
    }

    /// Commits on the undo stack, oldest first.
    pub fn commits(&self) -> Vec<&CommitSummary> {
        self.undo_stack.iter().map(|e| &e.summary).collect()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Clear all undo/redo history (e.g. when another document is opened).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
