//! Lists directories and keeps a lazily populated, per-path listing cache.
//!
//! A cache entry is created only when a path is listed (navigated into or
//! expanded in the tree). Mutations drop the entries they make stale through
//! the `invalidate*` family; derived sorts and searches read the cached
//! baseline and never write back.

use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::error::CoreError;
use super::hidden::HiddenFilter;
use super::search::{compare_names, sort_entries, SearchFilter, SortSpec};
use super::{DirectoryListing, Entry, EntryKind};

/// A node of the navigation tree. Only expanded directories carry children.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub is_expanded: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            is_directory: entry.is_directory(),
            is_expanded: false,
            children: Vec::new(),
        }
    }
}

pub struct DirectoryCatalog {
    filter: HiddenFilter,
    cache: RwLock<HashMap<PathBuf, Arc<DirectoryListing>>>,
    /// Bumped on every invalidation so a listing read concurrently with a
    /// mutation is not stored after the mutation dropped its key.
    generation: AtomicU64,
}

impl Default for DirectoryCatalog {
    fn default() -> Self {
        Self::new(HiddenFilter::default())
    }
}

impl DirectoryCatalog {
    pub fn new(filter: HiddenFilter) -> Self {
        Self {
            filter,
            cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the listing of `path`, reading the disk only on a cache miss.
    pub fn list(&self, path: &Path) -> Result<Arc<DirectoryListing>, CoreError> {
        let key = normalize_key(path)?;
        if let Some(hit) = self.read_cache().get(&key) {
            tracing::debug!("Listing cache hit for {}", key.display());
            return Ok(Arc::clone(hit));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let listing = Arc::new(self.read_listing(&key)?);

        let mut cache = self.write_cache();
        if self.generation.load(Ordering::Acquire) == generation {
            cache.insert(key, Arc::clone(&listing));
        }
        Ok(listing)
    }

    /// Drops any cached listing for `path` and lists it again.
    pub fn refresh(&self, path: &Path) -> Result<Arc<DirectoryListing>, CoreError> {
        self.invalidate(path);
        self.list(path)
    }

    /// Reads `dir` from disk without touching the cache.
    ///
    /// Hidden names are dropped before any entry is stat'ed; entries that
    /// vanish or cannot be stat'ed between `read_dir` and `stat` are skipped.
    pub fn read_listing(&self, dir: &Path) -> Result<DirectoryListing, CoreError> {
        let metadata = fs::metadata(dir).map_err(|e| CoreError::from_io(e, dir))?;
        if !metadata.is_dir() {
            return Err(CoreError::NotADirectory(dir.to_path_buf()));
        }

        let candidates: Vec<(String, PathBuf)> = fs::read_dir(dir)
            .map_err(|e| CoreError::from_io(e, dir))?
            .filter_map(|res| match res {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
            .filter(|(name, _)| !self.filter.is_hidden(name))
            .collect();

        let entries: Vec<Entry> = candidates
            .into_par_iter()
            .filter_map(|(name, path)| stat_entry(name, path))
            .collect();

        let (mut directories, mut files): (Vec<Entry>, Vec<Entry>) =
            entries.into_iter().partition(Entry::is_directory);
        directories.sort_by(compare_names);
        files.sort_by(compare_names);

        tracing::debug!(
            "Listed {}: {} directories, {} files",
            dir.display(),
            directories.len(),
            files.len()
        );

        Ok(DirectoryListing {
            current_path: dir.to_path_buf(),
            parent_path: dir.parent().unwrap_or(dir).to_path_buf(),
            directories,
            files,
        })
    }

    /// A derived view of the cached listing: keyword filter, then optional re-sort.
    pub fn view(
        &self,
        path: &Path,
        filter: &SearchFilter,
        sort: Option<SortSpec>,
    ) -> Result<Vec<Entry>, CoreError> {
        let listing = self.list(path)?;
        let visible = filter.apply(listing.items());
        Ok(sort_entries(visible, sort).into_iter().cloned().collect())
    }

    /// Finds the entry for `path`, preferring the cached parent listing.
    ///
    /// Hidden entries are reported as `NotFound`, the same as in listings.
    pub fn lookup(&self, path: &Path) -> Result<Entry, CoreError> {
        let key = normalize_key(path)?;
        if let Some(name) = key.file_name() {
            if self.filter.is_hidden(&name.to_string_lossy()) {
                tracing::debug!("Refusing lookup of hidden entry {}", key.display());
                return Err(CoreError::NotFound(key));
            }
        }
        if let Some(parent) = key.parent() {
            if let Some(listing) = self.read_cache().get(parent) {
                if let Some(entry) = listing.items().find(|e| e.path == key) {
                    return Ok(entry.clone());
                }
            }
        }

        let name = key
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string_lossy().into_owned());
        fs::metadata(&key).map_err(|e| CoreError::from_io(e, &key))?;
        stat_entry(name, key.clone()).ok_or(CoreError::NotFound(key))
    }

    /// Builds the navigation tree rooted at `root`.
    ///
    /// The root is always listed; any other directory is listed only if it
    /// is in `expanded`. One function serves every depth, and every listing
    /// goes through the cache.
    pub fn expand_tree(
        &self,
        root: &Path,
        expanded: &HashSet<PathBuf>,
    ) -> Result<TreeNode, CoreError> {
        let key = normalize_key(root)?;
        let listing = self.list(&key)?;
        let mut node = TreeNode {
            name: display_name(&key),
            path: key,
            is_directory: true,
            is_expanded: true,
            children: Vec::new(),
        };
        node.children = self.expand_children(&listing, expanded);
        Ok(node)
    }

    fn expand_children(
        &self,
        listing: &DirectoryListing,
        expanded: &HashSet<PathBuf>,
    ) -> Vec<TreeNode> {
        listing
            .items()
            .map(|entry| {
                let mut node = TreeNode::from_entry(entry);
                if entry.is_directory() && expanded.contains(&entry.path) {
                    match self.list(&entry.path) {
                        Ok(child) => {
                            node.is_expanded = true;
                            node.children = self.expand_children(&child, expanded);
                        }
                        Err(e) => {
                            tracing::warn!("Cannot expand {}: {}", entry.path.display(), e)
                        }
                    }
                }
                node
            })
            .collect()
    }

    /// Drops the cached listing of `path` itself.
    pub fn invalidate(&self, path: &Path) {
        let Ok(key) = normalize_key(path) else {
            return;
        };
        self.generation.fetch_add(1, Ordering::AcqRel);
        if self.write_cache().remove(&key).is_some() {
            tracing::debug!("Invalidated listing of {}", key.display());
        }
    }

    /// Drops the listing of the directory containing `path`.
    pub fn invalidate_parent(&self, path: &Path) {
        if let Ok(key) = normalize_key(path) {
            if let Some(parent) = key.parent() {
                self.invalidate(parent);
            }
        }
    }

    /// Drops the listings of `path` and of every cached descendant.
    pub fn invalidate_tree(&self, path: &Path) {
        let Ok(key) = normalize_key(path) else {
            return;
        };
        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut cache = self.write_cache();
        let before = cache.len();
        cache.retain(|cached, _| !cached.starts_with(&key));
        tracing::debug!(
            "Invalidated {} cached listings under {}",
            before - cache.len(),
            key.display()
        );
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        normalize_key(path)
            .map(|key| self.read_cache().contains_key(&key))
            .unwrap_or(false)
    }

    pub fn cached_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.read_cache().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn read_cache(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<PathBuf, Arc<DirectoryListing>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<PathBuf, Arc<DirectoryListing>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache key: absolute, with `.` segments and trailing separators removed.
pub fn normalize_key(path: &Path) -> Result<PathBuf, CoreError> {
    let absolute = std::path::absolute(path).map_err(|e| CoreError::from_io(e, path))?;
    Ok(absolute.components().collect())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn stat_entry(name: String, path: PathBuf) -> Option<Entry> {
    let metadata = match fs::metadata(&path) {
        Ok(md) => md,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    Some(Entry {
        name,
        path,
        kind,
        size: (kind == EntryKind::File).then(|| metadata.len()),
        modified_at: metadata.modified().ok().map(DateTime::<Local>::from),
    })
}
