use crate::error::AppError;
use crate::history::CommitSummary;
use crate::model::SchItem;
use crate::state::EditorState;

/// One staged change.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitChange {
    Add { sheet: usize, item: SchItem },
}

/// A pending transaction against the editor. Changes are staged with
/// [`Commit::add`] and applied together by [`Commit::push`], which records a
/// single undo step. Dropping an unpushed commit discards it.
#[derive(Debug, Default)]
pub struct Commit {
    changes: Vec<CommitChange>,
}

impl Commit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `item` for insertion into `sheet`.
    pub fn add(&mut self, item: SchItem, sheet: usize) -> &mut Self {
        self.changes.push(CommitChange::Add { sheet, item });
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply all staged changes in order and record them as one undo step
    /// described by `message`. An empty commit still records a step.
    ///
    /// Either every change lands or none does.
    pub fn push(self, state: &EditorState, message: &str) -> Result<CommitSummary, AppError> {
        let mut guard = state.schematic.lock();
        let doc = guard.as_mut().ok_or(AppError::NoDocument)?;
        let before = doc.clone();

        let mut added = Vec::with_capacity(self.changes.len());
        for change in self.changes {
            match change {
                CommitChange::Add { sheet, item } => match doc.insert(sheet, item) {
                    Some(id) => added.push(id),
                    None => {
                        let err = if doc.sheet(sheet).is_none() {
                            AppError::InvalidIndex {
                                what: "sheet".into(),
                                index: sheet,
                            }
                        } else {
                            AppError::Validation {
                                message: "no item ids left in this schematic".into(),
                            }
                        };
                        *doc = before;
                        return Err(err);
                    }
                },
            }
        }

        let summary = CommitSummary {
            description: message.to_string(),
            added,
        };
        state.history.lock().record(summary.clone(), before);
        log::info!("committed \"{message}\" ({} item(s))", summary.added.len());
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::{Schematic, VecI};
    use crate::settings::AgentSettings;

    fn open_state() -> EditorState {
        EditorState::with_document(Schematic::new("t"), AgentSettings::default())
    }

    #[test]
    fn push_applies_in_order_as_one_undo_step() {
        let state = open_state();
        let mut commit = Commit::new();
        commit
            .add(SchItem::junction(VecI::new(0, 0)), 0)
            .add(SchItem::label(VecI::new(1, 1), "A"), 0);
        let summary = commit.push(&state, "two things").unwrap();

        assert_eq!(summary.added.len(), 2);
        state
            .with_schematic(|doc| {
                let sheet = doc.sheet(0).unwrap();
                assert_eq!(sheet.items[0].id, summary.added[0]);
                assert_eq!(
                    sheet.item(summary.added[1]),
                    Some(&SchItem::label(VecI::new(1, 1), "A"))
                );
            })
            .unwrap();
        assert_eq!(state.with_history(crate::history::UndoHistory::len), 1);

        state.undo().unwrap();
        assert_eq!(state.with_schematic(Schematic::item_count).unwrap(), 0);
    }

    #[test]
    fn empty_commit_still_records_a_step() {
        let state = open_state();
        let summary = Commit::new().push(&state, "nothing").unwrap();
        assert!(summary.added.is_empty());
        assert_eq!(
            state.undo_state().undo_description.as_deref(),
            Some("nothing")
        );
    }

    #[test]
    fn bad_sheet_rolls_back_whole_commit() {
        let state = open_state();
        let mut commit = Commit::new();
        commit
            .add(SchItem::junction(VecI::new(0, 0)), 0)
            .add(SchItem::junction(VecI::new(1, 0)), 9);
        assert!(commit.push(&state, "bad").is_err());
        assert_eq!(state.with_schematic(Schematic::item_count).unwrap(), 0);
        assert!(!state.undo_state().can_undo);
    }

    #[test]
    fn push_without_document_fails() {
        let state = EditorState::default();
        let mut commit = Commit::new();
        commit.add(SchItem::junction(VecI::new(0, 0)), 0);
        assert!(matches!(commit.push(&state, "x"), Err(AppError::NoDocument)));
    }
}
