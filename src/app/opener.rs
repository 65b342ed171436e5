//! An abstraction over "open with the default application" to enable testing.

use std::io;
use std::path::Path;

/// Hands a file to whatever the OS associates with it.
/// Tests substitute a recording implementation.
pub trait Opener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// The production implementation that uses the `open` crate.
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        tracing::info!("Opening {} with the system default application", path.display());
        open::that(path)
    }
}
