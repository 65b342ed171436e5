//! Name-based policy deciding which directory entries never reach a listing.

use regex::RegexSet;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Patterns for transient, dot-prefixed and OS artifact names.
/// Matching is a disjunction, so order carries no meaning.
const HIDDEN_PATTERNS: &[&str] = &[
    // Office lock files and other transient temp files
    r"^~",
    // Unix-style hidden entries (also covers .DS_Store, .Trashes, ...)
    r"^\.",
    // Windows artifacts
    r"^desktop\.ini$",
    r"\.sys$",
    r"\.bak$",
    r"^Thumbs\.db$",
    r"^ehthumbs\.db$",
    r"^\$RECYCLE\.BIN$",
    r"^System Volume Information$",
    r"^bootmgr$",
    r"^BOOTSECT\.BAK$",
    // macOS artifacts
    r"^\.DS_Store$",
    r"^\.Spotlight-V100",
    r"^\.Trashes",
    r"^Icon\r$",
    r"^\.AppleDouble$",
    r"^\.LSOverride$",
];

static HIDDEN_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    // The patterns are compile-time constants; a failure here is a typo caught by the tests.
    RegexSet::new(HIDDEN_PATTERNS).unwrap_or_else(|e| {
        tracing::error!("Failed to build hidden-name patterns: {}", e);
        RegexSet::empty()
    })
});

/// Returns `true` if `name` matches one of the built-in hidden patterns.
pub fn is_hidden(name: &str) -> bool {
    HIDDEN_SET.is_match(name)
}

/// The built-in patterns plus optional user-configured exact names.
#[derive(Debug, Clone, Default)]
pub struct HiddenFilter {
    extra_names: HashSet<String>,
}

impl HiddenFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extra_names = names
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| !n.trim().is_empty())
            .collect();
        Self { extra_names }
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        is_hidden(name) || self.extra_names.contains(name)
    }
}
