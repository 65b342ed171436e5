//! Defines the session object: everything one interactive user manipulates.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{settings, AppConfig};
use crate::core::catalog::normalize_key;
use crate::core::{
    CoreError, DirectoryCatalog, DirectoryListing, Entry, HiddenFilter, MutationOrchestrator,
    SearchFilter, SelectionModel, ShortcutResolver, SortSpec,
};

/// Holds the complete, mutable state of one browsing session.
///
/// Wrapped in an `Arc<Mutex<...>>` by the boundary so each request runs
/// against it exclusively. The listing cache inside `catalog` is shared with
/// `orchestrator` and has its own lock.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where `config` is persisted; `None` keeps it in memory only.
    pub config_dir: Option<PathBuf>,
    pub catalog: Arc<DirectoryCatalog>,
    pub orchestrator: MutationOrchestrator,
    pub resolver: ShortcutResolver,
    pub selection: SelectionModel,
    /// The normalized absolute path of the displayed folder.
    pub current_path: PathBuf,
    /// Folders whose children are shown in the tree view.
    pub expanded_dirs: HashSet<PathBuf>,
    pub sort: Option<SortSpec>,
    pub search: SearchFilter,
}

impl AppState {
    pub fn new(config: AppConfig, config_dir: Option<PathBuf>) -> Self {
        let filter = HiddenFilter::with_extra_names(config.extra_hidden_names.iter().cloned());
        let catalog = Arc::new(DirectoryCatalog::new(filter));
        let current_path = config.initial_directory();
        let current_path = normalize_key(&current_path).unwrap_or(current_path);

        Self {
            sort: config.default_sort,
            orchestrator: MutationOrchestrator::new(Arc::clone(&catalog)),
            catalog,
            resolver: ShortcutResolver::new(),
            selection: SelectionModel::new(),
            current_path,
            expanded_dirs: HashSet::new(),
            search: SearchFilter::default(),
            config,
            config_dir,
        }
    }

    /// Makes `path` the displayed folder.
    ///
    /// Leaving a folder clears the selection and the search keyword; the
    /// clipboard survives. Nothing changes when the listing fails.
    pub fn navigate(&mut self, path: &Path) -> Result<Arc<DirectoryListing>, CoreError> {
        let key = normalize_key(path)?;
        let listing = self.catalog.list(&key)?;

        if key != self.current_path {
            self.selection.on_navigate();
            self.search = SearchFilter::default();
            tracing::info!("Navigated to {}", key.display());
        }
        self.current_path = key;
        self.remember_directory();
        Ok(listing)
    }

    /// Navigates to the parent folder; stays put at a filesystem root.
    pub fn go_up(&mut self) -> Result<Arc<DirectoryListing>, CoreError> {
        let listing = self.catalog.list(&self.current_path)?;
        if listing.is_root() {
            tracing::debug!("Already at root {}", listing.current_path.display());
            return Ok(listing);
        }
        let parent = listing.parent_path.clone();
        self.navigate(&parent)
    }

    pub fn current_listing(&self) -> Result<Arc<DirectoryListing>, CoreError> {
        self.catalog.list(&self.current_path)
    }

    /// The displayed items: search keyword applied, then the session sort.
    pub fn visible_entries(&self) -> Result<Vec<Entry>, CoreError> {
        self.catalog.view(&self.current_path, &self.search, self.sort)
    }

    /// Flips the tree expansion of `path`; returns whether it is now expanded.
    pub fn toggle_expansion(&mut self, path: &Path) -> Result<bool, CoreError> {
        let key = normalize_key(path)?;
        if self.expanded_dirs.remove(&key) {
            return Ok(false);
        }
        self.catalog.list(&key)?;
        self.expanded_dirs.insert(key);
        Ok(true)
    }

    /// Drops expansions of folders that no longer exist.
    pub fn prune_expansions(&mut self) {
        self.expanded_dirs.retain(|dir| dir.is_dir());
    }

    fn remember_directory(&mut self) {
        if self.config.last_directory.as_ref() == Some(&self.current_path) {
            return;
        }
        self.config.last_directory = Some(self.current_path.clone());
        if let Some(dir) = &self.config_dir {
            if let Err(e) = settings::save_config(&self.config, Some(dir)) {
                tracing::warn!("Failed to save last directory: {}", e);
            }
        }
    }
}
