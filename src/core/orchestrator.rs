//! Executes filesystem mutations and keeps the listing cache consistent.
//!
//! Every operation validates its existence preconditions first and reports
//! them as typed errors. Before returning success it invalidates the cached
//! listing of each directory whose contents it changed.

use std::fs::{self, Metadata, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::allocator::allocate_copy_destination;
use super::catalog::{normalize_key, DirectoryCatalog};
use super::error::CoreError;

pub struct MutationOrchestrator {
    catalog: Arc<DirectoryCatalog>,
}

impl MutationOrchestrator {
    pub fn new(catalog: Arc<DirectoryCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<DirectoryCatalog> {
        &self.catalog
    }

    pub fn rename(&self, old: &Path, new: &Path) -> Result<(), CoreError> {
        if !exists(old) {
            return Err(CoreError::SourceMissing(old.to_path_buf()));
        }
        if exists(new) {
            return Err(CoreError::DestinationExists(new.to_path_buf()));
        }

        fs::rename(old, new).map_err(|e| CoreError::from_io(e, old))?;

        self.catalog.invalidate_tree(old);
        self.catalog.invalidate_parent(old);
        self.catalog.invalidate_parent(new);
        tracing::info!("Renamed {} to {}", old.display(), new.display());
        Ok(())
    }

    /// Removes a file, or a folder with everything inside it.
    pub fn delete(&self, path: &Path) -> Result<(), CoreError> {
        let metadata = path
            .symlink_metadata()
            .map_err(|e| CoreError::from_io(e, path))?;
        remove_path(path, &metadata)?;

        self.catalog.invalidate_tree(path);
        self.catalog.invalidate_parent(path);
        tracing::info!("Deleted {}", path.display());
        Ok(())
    }

    /// Deletes every path that still exists and silently skips the rest.
    ///
    /// Returns how many paths were actually removed. The batch is not
    /// transactional: an OS failure stops it with earlier items already gone.
    pub fn batch_delete(&self, paths: &[PathBuf]) -> Result<usize, CoreError> {
        let mut removed = 0;
        for path in paths {
            if !exists(path) {
                tracing::debug!("Skipping already removed {}", path.display());
                continue;
            }
            self.delete(path)?;
            removed += 1;
        }
        tracing::info!("Batch delete removed {} of {} paths", removed, paths.len());
        Ok(removed)
    }

    pub fn create_file(&self, path: &Path) -> Result<(), CoreError> {
        if exists(path) {
            return Err(CoreError::AlreadyExists(path.to_path_buf()));
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| CoreError::from_io(e, path))?;

        self.catalog.invalidate_parent(path);
        tracing::info!("Created file {}", path.display());
        Ok(())
    }

    /// Creates the folder along with any missing ancestors.
    pub fn create_folder(&self, path: &Path) -> Result<(), CoreError> {
        if exists(path) {
            return Err(CoreError::AlreadyExists(path.to_path_buf()));
        }
        fs::create_dir_all(path).map_err(|e| CoreError::from_io(e, path))?;

        // Every created ancestor changed its own parent's listing.
        for ancestor in path.ancestors() {
            self.catalog.invalidate(ancestor);
        }
        tracing::info!("Created folder {}", path.display());
        Ok(())
    }

    /// Copies `source` to `destination` and returns where the copy landed.
    ///
    /// A copy onto its own source is redirected to a free `(副本)` sibling.
    /// A different, existing destination file is overwritten.
    pub fn copy(&self, source: &Path, destination: &Path) -> Result<PathBuf, CoreError> {
        if !exists(source) {
            return Err(CoreError::SourceMissing(source.to_path_buf()));
        }

        let destination = if same_path(source, destination) {
            allocate_copy_destination(destination)
        } else {
            destination.to_path_buf()
        };
        guard_recursive(source, &destination)?;

        copy_recursive(source, &destination)?;

        self.catalog.invalidate_tree(&destination);
        self.catalog.invalidate_parent(&destination);
        tracing::info!("Copied {} to {}", source.display(), destination.display());
        Ok(destination)
    }

    /// Moves `source` to `destination`, never overwriting an existing entry.
    ///
    /// Moving a path onto itself succeeds without touching the disk.
    pub fn move_entry(&self, source: &Path, destination: &Path) -> Result<(), CoreError> {
        if !exists(source) {
            return Err(CoreError::SourceMissing(source.to_path_buf()));
        }
        if same_path(source, destination) {
            tracing::debug!("Move of {} onto itself is a no-op", source.display());
            return Ok(());
        }
        if exists(destination) {
            return Err(CoreError::DestinationExists(destination.to_path_buf()));
        }
        guard_recursive(source, destination)?;

        if let Err(e) = fs::rename(source, destination) {
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ) {
                return Err(CoreError::from_io(e, source));
            }
            tracing::warn!(
                "Rename of {} failed ({}), falling back to copy and remove",
                source.display(),
                e
            );
            copy_recursive(source, destination)?;
            let metadata = source
                .symlink_metadata()
                .map_err(|e| CoreError::from_io(e, source))?;
            remove_path(source, &metadata)?;
        }

        self.catalog.invalidate_tree(source);
        self.catalog.invalidate_parent(source);
        self.catalog.invalidate_parent(destination);
        tracing::info!("Moved {} to {}", source.display(), destination.display());
        Ok(())
    }

    /// Copies each source to `destination_dir/<basename>`.
    ///
    /// Fails fast: the first missing source aborts the batch, and items
    /// copied before it stay copied.
    pub fn batch_copy(
        &self,
        sources: &[PathBuf],
        destination_dir: &Path,
    ) -> Result<Vec<PathBuf>, CoreError> {
        let mut landed = Vec::with_capacity(sources.len());
        for source in sources {
            if !exists(source) {
                return Err(CoreError::SourceMissing(source.clone()));
            }
            let destination = destination_dir.join(file_name(source)?);
            landed.push(self.copy(source, &destination)?);
        }
        Ok(landed)
    }

    /// Moves each source to `destination_dir/<basename>`, failing fast like
    /// [`batch_copy`](Self::batch_copy).
    pub fn batch_move(&self, sources: &[PathBuf], destination_dir: &Path) -> Result<(), CoreError> {
        for source in sources {
            if !exists(source) {
                return Err(CoreError::SourceMissing(source.clone()));
            }
            let destination = destination_dir.join(file_name(source)?);
            self.move_entry(source, &destination)?;
        }
        Ok(())
    }
}

/// Broken symlinks count as existing.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (normalize_key(a), normalize_key(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr, CoreError> {
    path.file_name().ok_or_else(|| {
        CoreError::Io(
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            path.to_path_buf(),
        )
    })
}

fn guard_recursive(source: &Path, destination: &Path) -> Result<(), CoreError> {
    if !source.is_dir() {
        return Ok(());
    }
    if let (Ok(src), Ok(dst)) = (normalize_key(source), normalize_key(destination)) {
        if dst.starts_with(&src) {
            return Err(CoreError::RecursiveDestination(src, dst));
        }
    }
    Ok(())
}

fn remove_path(path: &Path, metadata: &Metadata) -> Result<(), CoreError> {
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| CoreError::from_io(e, path))
}

fn copy_recursive(source: &Path, destination: &Path) -> Result<(), CoreError> {
    if !source.is_dir() {
        fs::copy(source, destination).map_err(|e| CoreError::from_io(e, source))?;
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            CoreError::Io(io::Error::other(e.to_string()), path)
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(Path::new(""));
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| CoreError::from_io(e, &target))?;
        } else if entry.path().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| CoreError::from_io(e, entry.path()))?;
        } else {
            tracing::warn!("Not copying special entry {}", entry.path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{create_tree, setup_test_logging};
    use tempfile::{tempdir, TempDir};

    fn harness() -> (TempDir, MutationOrchestrator) {
        setup_test_logging();
        let dir = tempdir().unwrap();
        create_tree(dir.path(), &["a.txt", "docs/", "docs/readme.md", "docs/sub/"]);
        let orchestrator = MutationOrchestrator::new(Arc::new(DirectoryCatalog::default()));
        (dir, orchestrator)
    }

    fn listed_names(orchestrator: &MutationOrchestrator, dir: &Path) -> Vec<String> {
        orchestrator
            .catalog()
            .list(dir)
            .unwrap()
            .items()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn test_rename_invalidates_parent_listing() {
        let (dir, orch) = harness();
        assert!(listed_names(&orch, dir.path()).contains(&"a.txt".to_string()));

        orch.rename(&dir.path().join("a.txt"), &dir.path().join("b.txt"))
            .unwrap();

        let names = listed_names(&orch, dir.path());
        assert!(!names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"b.txt".to_string()));
    }

    #[test]
    fn test_rename_of_directory_drops_cached_descendants() {
        let (dir, orch) = harness();
        let sub = dir.path().join("docs").join("sub");
        orch.catalog().list(&sub).unwrap();

        orch.rename(&dir.path().join("docs"), &dir.path().join("papers"))
            .unwrap();
        assert!(!orch.catalog().is_cached(&sub));
    }

    #[test]
    fn test_rename_preconditions() {
        let (dir, orch) = harness();
        assert!(matches!(
            orch.rename(&dir.path().join("gone"), &dir.path().join("x")),
            Err(CoreError::SourceMissing(_))
        ));
        assert!(matches!(
            orch.rename(&dir.path().join("a.txt"), &dir.path().join("docs")),
            Err(CoreError::DestinationExists(_))
        ));
    }

    #[test]
    fn test_copy_list_remove_round_trip() {
        let (dir, orch) = harness();
        let dest_dir = dir.path().join("docs");
        orch.catalog().list(&dest_dir).unwrap();

        let landed = orch
            .copy(&dir.path().join("a.txt"), &dest_dir.join("a.txt"))
            .unwrap();
        let name = landed.file_name().unwrap().to_string_lossy().into_owned();
        assert!(listed_names(&orch, &dest_dir).contains(&name));

        orch.delete(&landed).unwrap();
        assert!(!listed_names(&orch, &dest_dir).contains(&name));
    }

    #[test]
    fn test_copy_onto_itself_allocates_sibling() {
        let (dir, orch) = harness();
        let source = dir.path().join("a.txt");

        let first = orch.copy(&source, &source).unwrap();
        assert_eq!(first, dir.path().join("a(副本).txt"));
        let second = orch.copy(&source, &source).unwrap();
        assert_eq!(second, dir.path().join("a(副本1).txt"));
        assert_eq!(fs::read_to_string(&second).unwrap(), "a.txt");
    }

    #[test]
    fn test_copy_directory_recursively() {
        let (dir, orch) = harness();
        let landed = orch
            .copy(&dir.path().join("docs"), &dir.path().join("backup"))
            .unwrap();
        assert!(landed.join("readme.md").is_file());
        assert!(landed.join("sub").is_dir());
    }

    #[test]
    fn test_copy_into_own_subtree_is_rejected() {
        let (dir, orch) = harness();
        let docs = dir.path().join("docs");
        assert!(matches!(
            orch.copy(&docs, &docs.join("sub").join("docs")),
            Err(CoreError::RecursiveDestination(..))
        ));
        assert!(matches!(
            orch.copy(&dir.path().join("missing"), &docs),
            Err(CoreError::SourceMissing(_))
        ));
    }

    #[test]
    fn test_move_checks_collisions() {
        let (dir, orch) = harness();
        let source = dir.path().join("a.txt");

        orch.move_entry(&source, &source).unwrap();
        assert!(source.exists());

        fs::write(dir.path().join("taken.txt"), "").unwrap();
        assert!(matches!(
            orch.move_entry(&source, &dir.path().join("taken.txt")),
            Err(CoreError::DestinationExists(_))
        ));

        orch.move_entry(&source, &dir.path().join("docs").join("a.txt"))
            .unwrap();
        assert!(!source.exists());
        assert!(dir.path().join("docs").join("a.txt").is_file());
    }

    #[test]
    fn test_batch_delete_skips_missing_paths() {
        let (dir, orch) = harness();
        let existing = dir.path().join("a.txt");
        let removed = orch
            .batch_delete(&[existing.clone(), dir.path().join("never-there")])
            .unwrap();
        assert_eq!(removed, 1);
        assert!(!existing.exists());
    }

    #[test]
    fn test_batch_copy_fails_fast_without_rollback() {
        let (dir, orch) = harness();
        let target = dir.path().join("docs").join("sub");
        let result = orch.batch_copy(
            &[
                dir.path().join("a.txt"),
                dir.path().join("missing.txt"),
                dir.path().join("docs").join("readme.md"),
            ],
            &target,
        );

        assert!(matches!(result, Err(CoreError::SourceMissing(_))));
        assert!(target.join("a.txt").exists());
        assert!(!target.join("readme.md").exists());
    }

    #[test]
    fn test_batch_move_into_directory() {
        let (dir, orch) = harness();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        orch.batch_move(
            &[dir.path().join("a.txt"), dir.path().join("b.txt")],
            &dir.path().join("docs"),
        )
        .unwrap();

        let names = listed_names(&orch, &dir.path().join("docs"));
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"b.txt".to_string()));
        assert_eq!(listed_names(&orch, dir.path()), ["docs"]);
    }

    #[test]
    fn test_create_file_and_folder() {
        let (dir, orch) = harness();
        orch.catalog().list(dir.path()).unwrap();

        orch.create_file(&dir.path().join("new.txt")).unwrap();
        orch.create_folder(&dir.path().join("nested").join("deeper"))
            .unwrap();
        let names = listed_names(&orch, dir.path());
        assert!(names.contains(&"new.txt".to_string()));
        assert!(names.contains(&"nested".to_string()));

        assert!(matches!(
            orch.create_file(&dir.path().join("new.txt")),
            Err(CoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            orch.create_folder(&dir.path().join("docs")),
            Err(CoreError::AlreadyExists(_))
        ));
    }
}
