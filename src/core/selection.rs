//! Selection set and clipboard of one interactive session.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::orchestrator::MutationOrchestrator;
use super::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipboardAction {
    Copy,
    Cut,
}

/// A pending transfer of one or more entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardState {
    pub items: Vec<Entry>,
    pub action: ClipboardAction,
}

/// Tracks which entries of the displayed listing are selected, plus the
/// session clipboard.
///
/// Navigation clears the selection but keeps the clipboard, so a copy can
/// be pasted after moving to another folder.
#[derive(Debug, Default)]
pub struct SelectionModel {
    selected: HashSet<PathBuf>,
    clipboard: Option<ClipboardState>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `entry` the only selected entry.
    pub fn select(&mut self, entry: &Entry) {
        self.selected.clear();
        self.selected.insert(entry.path.clone());
    }

    /// Adds or removes `entry`; returns whether it is now selected.
    pub fn toggle(&mut self, entry: &Entry) -> bool {
        if self.selected.remove(&entry.path) {
            false
        } else {
            self.selected.insert(entry.path.clone());
            true
        }
    }

    pub fn select_all<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        self.selected = entries.into_iter().map(|e| e.path.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn on_navigate(&mut self) {
        self.clear();
    }

    /// Keeps only the selected paths for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Path) -> bool,
    {
        self.selected.retain(|path| keep(path));
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    /// Selected paths in a stable order.
    pub fn selected_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.selected.iter().cloned().collect();
        paths.sort();
        paths
    }

    pub fn copy_to_clipboard(&mut self, entries: Vec<Entry>) -> bool {
        self.set_clipboard(entries, ClipboardAction::Copy)
    }

    pub fn cut_to_clipboard(&mut self, entries: Vec<Entry>) -> bool {
        self.set_clipboard(entries, ClipboardAction::Cut)
    }

    /// An empty pick leaves the existing clipboard alone.
    fn set_clipboard(&mut self, items: Vec<Entry>, action: ClipboardAction) -> bool {
        if items.is_empty() {
            return false;
        }
        tracing::debug!("Clipboard now holds {} item(s) for {:?}", items.len(), action);
        self.clipboard = Some(ClipboardState { items, action });
        true
    }

    pub fn clipboard(&self) -> Option<&ClipboardState> {
        self.clipboard.as_ref()
    }

    /// Pastes the clipboard into `dir` and returns the paths that were written.
    ///
    /// One item goes through the single copy/move, several through the batch
    /// variant. A successful cut empties the clipboard; a copy stays for
    /// repeated pasting. Pasting an empty clipboard does nothing.
    pub fn paste_into(
        &mut self,
        dir: &Path,
        orchestrator: &MutationOrchestrator,
    ) -> Result<Vec<PathBuf>, CoreError> {
        let Some(clipboard) = self.clipboard.as_ref() else {
            return Ok(Vec::new());
        };
        let sources: Vec<PathBuf> = clipboard.items.iter().map(|e| e.path.clone()).collect();

        let written = match (clipboard.action, clipboard.items.as_slice()) {
            (ClipboardAction::Copy, [single]) => {
                vec![orchestrator.copy(&single.path, &dir.join(&single.name))?]
            }
            (ClipboardAction::Copy, _) => orchestrator.batch_copy(&sources, dir)?,
            (ClipboardAction::Cut, [single]) => {
                let destination = dir.join(&single.name);
                orchestrator.move_entry(&single.path, &destination)?;
                vec![destination]
            }
            (ClipboardAction::Cut, items) => {
                orchestrator.batch_move(&sources, dir)?;
                items.iter().map(|e| dir.join(&e.name)).collect()
            }
        };

        if clipboard.action == ClipboardAction::Cut {
            self.clipboard = None;
        }
        tracing::info!("Pasted {} item(s) into {}", written.len(), dir.display());
        Ok(written)
    }
}
