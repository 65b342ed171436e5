use std::fs;
use std::path::Path;
use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// Wrapped in a `Once` so the global subscriber is set exactly one time,
/// even when tests run in parallel.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Returns true when the current process runs as root (UID 0).
/// Permission-sensitive tests skip themselves in that case.
#[inline]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no side effects.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Creates files and folders under `root`. Entries ending in `/` become
/// folders; every other entry becomes a file containing its own name.
pub fn create_tree(root: &Path, entries: &[&str]) {
    for entry in entries {
        let path = root.join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, entry.as_bytes()).unwrap();
        }
    }
}

/// A minimal shell-link buffer: the 0x4C-byte header with no ID list,
/// followed by `target` as NUL-terminated UTF-16LE.
pub fn shortcut_bytes(target: &str) -> Vec<u8> {
    let mut buf = vec![0u8; 0x4C];
    buf[0] = 0x4C;
    buf.extend(
        target
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes),
    );
    buf.resize(buf.len().max(0x200), 0);
    buf
}
