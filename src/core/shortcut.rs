//! Best-effort extraction of a folder target from a Windows `.lnk` file.
//!
//! This is not a shell-link decoder. The header is only trusted far enough
//! to skip the ID list; after that an ordered chain of strategies looks for
//! an embedded absolute drive-letter path. Anything that does not validate
//! is rejected, so a wrong folder is never followed.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::error::ShortcutError;

/// Size of the fixed shell-link header.
const HEADER_SIZE: usize = 0x4C;
/// First byte of every shortcut (the low byte of the header size).
const MAGIC_BYTE: u8 = 0x4C;
/// Offset of the 32-bit link flags field.
const FLAGS_OFFSET: usize = 0x14;
/// Flag bit announcing a target ID list after the header.
const HAS_ID_LIST: u32 = 0x1;
/// Byte length of the ID-list size prefix.
const ID_LIST_SIZE_LEN: usize = 2;
/// Offsets where a UTF-16 target path has been seen in real files.
const FALLBACK_OFFSETS: &[usize] = &[0x4C, 0x4E, 0x9C, 0x11C, 0x164, 0x1A4, 0x1F0];
/// Upper bound on bytes read for one candidate string.
const MAX_CANDIDATE_BYTES: usize = 500;

static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:\\").expect("drive path pattern is valid"));

static EMBEDDED_DRIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z]:\\[^<>:"|?*\x00-\x1F]{0,200}"#)
        .expect("embedded drive path pattern is valid")
});

static REPEATED_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\{2,}").expect("separator pattern is valid"));

/// One way of locating a candidate path in the raw bytes.
pub type Strategy = fn(&[u8]) -> Option<String>;

/// The fallback chain, tried in order until one candidate validates.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("header-offsets", scan_candidate_offsets),
    ("full-buffer", scan_whole_buffer),
];

/// What a probe knows about a path on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Directory,
    File,
}

/// Abstraction over the existence checks of the final validation steps,
/// so the resolver can be exercised without a Windows filesystem.
pub trait PathProbe: Send + Sync {
    fn probe(&self, path: &str) -> Option<ProbeKind>;
}

/// Probes the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskProbe;

impl PathProbe for DiskProbe {
    fn probe(&self, path: &str) -> Option<ProbeKind> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(if metadata.is_dir() {
            ProbeKind::Directory
        } else {
            ProbeKind::File
        })
    }
}

/// Turns shortcut files into validated folder paths.
pub struct ShortcutResolver<P: PathProbe = DiskProbe> {
    probe: P,
}

impl Default for ShortcutResolver<DiskProbe> {
    fn default() -> Self {
        Self { probe: DiskProbe }
    }
}

impl ShortcutResolver<DiskProbe> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: PathProbe> ShortcutResolver<P> {
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Reads `shortcut_path` and returns the folder it points at.
    pub fn resolve(&self, shortcut_path: &Path) -> Result<PathBuf, ShortcutError> {
        let bytes = std::fs::read(shortcut_path)
            .map_err(|e| ShortcutError::Io(e, shortcut_path.to_path_buf()))?;
        let target = self.resolve_bytes(&bytes)?;
        tracing::info!(
            "Resolved shortcut {} -> {}",
            shortcut_path.display(),
            target.display()
        );
        Ok(target)
    }

    /// Runs the full pipeline on an in-memory buffer, including the on-disk checks.
    pub fn resolve_bytes(&self, bytes: &[u8]) -> Result<PathBuf, ShortcutError> {
        let located = locate_target(bytes)?;
        let confirmed = self.confirm_on_disk(&located)?;
        Ok(PathBuf::from(confirmed))
    }

    fn confirm_on_disk(&self, located: &str) -> Result<String, ShortcutError> {
        let (path, kind) = match self.probe.probe(located) {
            Some(kind) => (located.to_string(), kind),
            None => {
                let repaired = repair(located);
                match self.probe.probe(&repaired) {
                    Some(kind) => (repaired, kind),
                    None => return Err(ShortcutError::TargetMissing(located.to_string())),
                }
            }
        };

        match kind {
            ProbeKind::Directory => Ok(path),
            ProbeKind::File => Err(ShortcutError::NotADirectory(path)),
        }
    }
}

/// Steps that need no filesystem: header checks, strategy chain, normalization, validation.
pub fn locate_target(bytes: &[u8]) -> Result<String, ShortcutError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ShortcutError::InvalidFormat(format!(
            "{} bytes is shorter than the {} byte header",
            bytes.len(),
            HEADER_SIZE
        )));
    }
    if bytes[0] != MAGIC_BYTE {
        return Err(ShortcutError::InvalidFormat(format!(
            "unexpected magic byte 0x{:02X}",
            bytes[0]
        )));
    }

    for (name, strategy) in STRATEGIES {
        match strategy(bytes) {
            Some(raw) => {
                let normalized = normalize(&raw);
                if DRIVE_PATH.is_match(&normalized) {
                    tracing::debug!("Shortcut strategy '{}' found {:?}", name, normalized);
                    return Ok(normalized);
                }
                tracing::debug!("Shortcut strategy '{}' produced invalid {:?}", name, raw);
            }
            None => tracing::debug!("Shortcut strategy '{}' found nothing", name),
        }
    }

    Err(ShortcutError::TargetNotFound)
}

/// Offset right after the ID list, or right after the header when there is none.
pub fn search_start(bytes: &[u8]) -> usize {
    let flags = read_u32_le(bytes, FLAGS_OFFSET).unwrap_or(0);
    if flags & HAS_ID_LIST == 0 {
        return HEADER_SIZE;
    }
    match read_u16_le(bytes, HEADER_SIZE) {
        Some(id_list_size) => HEADER_SIZE + ID_LIST_SIZE_LEN + usize::from(id_list_size),
        None => HEADER_SIZE,
    }
}

/// Strategy 1: decode a NUL-terminated UTF-16LE string at each known offset.
pub fn scan_candidate_offsets(bytes: &[u8]) -> Option<String> {
    let start = search_start(bytes);
    std::iter::once(start)
        .chain(FALLBACK_OFFSETS.iter().copied().filter(|&o| o != start))
        .filter_map(|offset| decode_utf16_at(bytes, offset))
        .find(|candidate| DRIVE_PATH.is_match(candidate))
}

/// Strategy 2: read the whole buffer as UTF-16LE, keep printable ASCII and
/// take the first drive-letter path. Both byte alignments are tried.
pub fn scan_whole_buffer(bytes: &[u8]) -> Option<String> {
    (0..2).find_map(|alignment| {
        let text: String = bytes
            .get(alignment..)?
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .map(|unit| match unit {
                // Unprintable units break the run so that two strings never merge.
                0x20..=0x7E => char::from(unit as u8),
                _ => '\n',
            })
            .collect();
        EMBEDDED_DRIVE_PATH
            .find(&text)
            .map(|m| m.as_str().trim_end().to_string())
    })
}

/// Decodes a NUL-terminated UTF-16LE string of at most [`MAX_CANDIDATE_BYTES`].
fn decode_utf16_at(bytes: &[u8], offset: usize) -> Option<String> {
    let end = bytes.len().min(offset.checked_add(MAX_CANDIDATE_BYTES)?);
    let window = bytes.get(offset..end)?;
    let units: Vec<u16> = window
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    if units.is_empty() {
        return None;
    }
    String::from_utf16(&units).ok()
}

/// Collapses repeated separators, converts `/` to `\` and trims trailing
/// separators while keeping the drive root (`C:\`) intact.
pub fn normalize(raw: &str) -> String {
    let backslashed = raw.trim().replace('/', "\\");
    let collapsed = REPEATED_SEPARATORS.replace_all(&backslashed, "\\");
    let trimmed = collapsed.trim_end_matches('\\');
    if trimmed.len() == 2 && trimmed.ends_with(':') {
        format!("{trimmed}\\")
    } else {
        trimmed.to_string()
    }
}

/// The one repair attempted before declaring a target missing.
fn repair(path: &str) -> String {
    let collapsed = path.replace("\\\\", "\\");
    match collapsed.strip_suffix('\\') {
        Some(stripped) if !stripped.ends_with(':') => stripped.to_string(),
        _ => collapsed,
    }
}

fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let slice = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([slice[0], slice[1]]))
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}
