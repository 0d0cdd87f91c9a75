//! In-memory session storage.
//!
//! Each session owns an independent [`Editor`]. Sessions are created
//! lazily on first touch from a template editor so every session starts
//! with the same backgrounds and canvas dimensions. A per-session flag
//! serializes exports so two renders of the same scene cannot race.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use montage_core::{Editor, EditorResult, SceneDocument};

/// Default session identifier.
pub const DEFAULT_SESSION: &str = "default";

struct Session {
    editor: Editor,
    exporting: AtomicBool,
}

impl Session {
    fn fresh(editor: Editor) -> Self {
        Self {
            editor,
            exporting: AtomicBool::new(false),
        }
    }
}

/// Thread-safe store of per-session editors.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    template: Editor,
}

impl SessionStore {
    /// Create a new store whose sessions start from the given
    /// backgrounds and canvas dimensions. The default session is
    /// created eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if the background list is empty.
    pub fn new(
        backgrounds: Vec<String>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> EditorResult<Self> {
        let template = Editor::new(backgrounds, canvas_width, canvas_height)?;
        let mut sessions = HashMap::new();
        sessions.insert(
            DEFAULT_SESSION.to_string(),
            Session::fresh(template.clone()),
        );
        Ok(Self {
            sessions: Arc::new(RwLock::new(sessions)),
            template,
        })
    }

    /// Run a closure against the editor for a session, creating the
    /// session from the template if it does not exist yet.
    pub fn with_editor<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Editor) -> R,
    {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::fresh(self.template.clone()));
        f(&mut session.editor)
    }

    /// Snapshot of the scene state for a session.
    #[must_use]
    pub fn document(&self, session_id: &str) -> SceneDocument {
        self.with_editor(session_id, |editor| editor.document())
    }

    /// Try to claim the export slot for a session. Returns false if an
    /// export is already running for it.
    #[must_use]
    pub fn try_begin_export(&self, session_id: &str) -> bool {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::fresh(self.template.clone()));
        session
            .exporting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the export slot for a session.
    pub fn finish_export(&self, session_id: &str) {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(session) = sessions.get(session_id) {
            session.exporting.store(false, Ordering::SeqCst);
        }
    }

    /// List all session IDs.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.keys().cloned().collect()
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
