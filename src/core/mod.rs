pub mod allocator;
pub mod catalog;
pub mod error;
pub mod export;
pub mod hidden;
pub mod orchestrator;
pub mod search;
pub mod selection;
pub mod shortcut;
pub mod tree_generator;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whether an entry is a folder or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One filesystem object, captured at listing time.
///
/// Entries are immutable snapshots: a change on disk is reflected by
/// re-listing the parent, never by updating an entry in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Raw OS-reported name.
    pub name: String,
    /// `parent.join(name)`; unique within its parent.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Byte size, only present for files.
    pub size: Option<u64>,
    pub modified_at: Option<DateTime<Local>>,
}

impl Entry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// The filtered, baseline-sorted contents of one directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub current_path: PathBuf,
    /// Equal to `current_path` when the listing is a filesystem root.
    pub parent_path: PathBuf,
    pub directories: Vec<Entry>,
    pub files: Vec<Entry>,
}

impl DirectoryListing {
    pub fn is_root(&self) -> bool {
        self.parent_path == self.current_path
    }

    /// Directories first, then files, both in baseline order.
    pub fn items(&self) -> impl Iterator<Item = &Entry> {
        self.directories.iter().chain(self.files.iter())
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub use allocator::allocate_copy_destination;
pub use catalog::{DirectoryCatalog, TreeNode};
pub use error::{CoreError, ErrorKind, ShortcutError};
pub use hidden::HiddenFilter;
pub use orchestrator::MutationOrchestrator;
pub use search::{SearchFilter, SortDirection, SortField, SortSpec};
pub use selection::{ClipboardAction, ClipboardState, SelectionModel};
pub use shortcut::ShortcutResolver;
pub use tree_generator::TreeGenerator;
