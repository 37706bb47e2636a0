use std::path::PathBuf;

use parking_lot::Mutex;

use crate::error::AppError;
use crate::history::{UndoHistory, UndoState};
use crate::model::Schematic;
use crate::settings::AgentSettings;

// ── Editor State ───────────────────────────────────────────────────

/// Editor state shared between the agent tool, the chat panel and the CLI.
///
/// Locks are always taken schematic first, history second.
pub struct EditorState {
    pub schematic: Mutex<Option<Schematic>>,
    /// Index of the sheet drafting commands write into.
    pub current_sheet: Mutex<usize>,
    pub history: Mutex<UndoHistory>,
    /// Where the open schematic was loaded from, if anywhere.
    pub document_path: Mutex<Option<PathBuf>>,
    pub settings: Mutex<AgentSettings>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(AgentSettings::default())
    }
}

impl EditorState {
    /// An editor with no document open.
    pub fn new(settings: AgentSettings) -> Self {
        Self {
            schematic: Mutex::new(None),
            current_sheet: Mutex::new(0),
            history: Mutex::new(UndoHistory::new()),
            document_path: Mutex::new(None),
            settings: Mutex::new(settings),
        }
    }

    /// An editor with `schematic` open on its first sheet.
    pub fn with_document(schematic: Schematic, settings: AgentSettings) -> Self {
        let state = Self::new(settings);
        state.open(schematic, None);
        state
    }

    /// Open a document, replacing whatever was open. Undo history is reset.
    pub fn open(&self, schematic: Schematic, path: Option<PathBuf>) {
        log::info!("opened schematic \"{}\"", schematic.name);
        *self.schematic.lock() = Some(schematic);
        *self.current_sheet.lock() = 0;
        self.history.lock().clear();
        *self.document_path.lock() = path;
    }

    /// Close the open document, returning it.
    pub fn close(&self) -> Option<Schematic> {
        let closed = self.schematic.lock().take();
        self.history.lock().clear();
        *self.document_path.lock() = None;
        closed
    }

    /// The sheet drafting commands should target, or `None` when no document
    /// is open or the current sheet index is stale.
    pub fn surface(&self) -> Option<usize> {
        let guard = self.schematic.lock();
        let sheet = *self.current_sheet.lock();
        guard.as_ref()?.sheet(sheet).map(|_| sheet)
    }

    pub fn set_current_sheet(&self, index: usize) -> Result<(), AppError> {
        let guard = self.schematic.lock();
        let doc = guard.as_ref().ok_or(AppError::NoDocument)?;
        if doc.sheet(index).is_none() {
            return Err(AppError::InvalidIndex {
                what: "sheet".into(),
                index,
            });
        }
        *self.current_sheet.lock() = index;
        Ok(())
    }

    /// Read-only access to the open document. Locks the mutex for the duration of `f`.
    pub fn with_schematic<F, R>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&Schematic) -> R,
    {
        let guard = self.schematic.lock();
        guard.as_ref().map(f).ok_or(AppError::NoDocument)
    }

    /// Read-only access to the undo history.
    pub fn with_history<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&UndoHistory) -> R,
    {
        let guard = self.history.lock();
        f(&guard)
    }

    pub fn undo(&self) -> Result<String, AppError> {
        let mut guard = self.schematic.lock();
        let doc = guard.as_mut().ok_or(AppError::NoDocument)?;
        let description = self.history.lock().undo(doc)?;
        log::info!("undo: {description}");
        Ok(description)
    }

    pub fn redo(&self) -> Result<String, AppError> {
        let mut guard = self.schematic.lock();
        let doc = guard.as_mut().ok_or(AppError::NoDocument)?;
        let description = self.history.lock().redo(doc)?;
        log::info!("redo: {description}");
        Ok(description)
    }

    pub fn undo_state(&self) -> UndoState {
        self.history.lock().undo_state()
    }

    pub fn settings(&self) -> AgentSettings {
        self.settings.lock().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::Sheet;

    #[test]
    fn no_surface_without_document() {
        let state = EditorState::default();
        assert_eq!(state.surface(), None);
        assert!(matches!(state.undo(), Err(AppError::NoDocument)));
        assert!(state.with_schematic(|s| s.item_count()).is_err());
    }

    #[test]
    fn surface_follows_current_sheet() {
        let mut sch = Schematic::new("two sheets");
        sch.sheets.push(Sheet::new("Power"));
        let state = EditorState::with_document(sch, AgentSettings::default());
        assert_eq!(state.surface(), Some(0));
        state.set_current_sheet(1).unwrap();
        assert_eq!(state.surface(), Some(1));
        assert!(matches!(
            state.set_current_sheet(2),
            Err(AppError::InvalidIndex { index: 2, .. })
        ));
    }

    #[test]
    fn close_drops_surface() {
        let state = EditorState::with_document(Schematic::new("x"), AgentSettings::default());
        assert!(state.close().is_some());
        assert_eq!(state.surface(), None);
    }
}
