//! Provides keyword filtering and user-requested re-sorting of listing items.
//!
//! Both operate on borrowed entries and return new vectors, so the cached
//! baseline listing is never reordered.

use super::Entry;
use crate::utils::file_detection::is_shortcut;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The column a derived sort is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Size,
    Modified,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A user-requested ordering on top of the baseline name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Cycles none -> ascending -> descending -> none for one column,
    /// the way a table header click does. Another column starts at ascending.
    pub fn toggle(current: Option<SortSpec>, field: SortField) -> Option<SortSpec> {
        match current {
            Some(spec) if spec.field == field => match spec.direction {
                SortDirection::Asc => Some(SortSpec::new(field, SortDirection::Desc)),
                SortDirection::Desc => None,
            },
            _ => Some(SortSpec::new(field, SortDirection::Asc)),
        }
    }
}

/// Case-insensitive substring match on the entry name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    keyword: String,
}

impl SearchFilter {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.keyword.is_empty() || entry.name.to_lowercase().contains(&self.keyword)
    }

    pub fn apply<'a, I>(&self, entries: I) -> Vec<&'a Entry>
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Returns `entries` re-ordered by `spec`; `None` keeps the given order.
pub fn sort_entries<'a>(mut entries: Vec<&'a Entry>, spec: Option<SortSpec>) -> Vec<&'a Entry> {
    let Some(spec) = spec else {
        return entries;
    };

    entries.sort_by(|a, b| {
        let ordering = match spec.field {
            SortField::Name => compare_names(a, b),
            SortField::Size => effective_size(a).cmp(&effective_size(b)),
            SortField::Modified => a.modified_at.cmp(&b.modified_at),
            SortField::Type => compare_types(a, b),
        };
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    entries
}

/// The baseline comparison used at listing time.
pub fn compare_names(a: &Entry, b: &Entry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Folders sort as zero bytes.
fn effective_size(entry: &Entry) -> u64 {
    if entry.is_directory() {
        0
    } else {
        entry.size.unwrap_or(0)
    }
}

/// Folders, then shortcuts, then other files; ties broken by name.
fn compare_types(a: &Entry, b: &Entry) -> Ordering {
    let rank = |e: &Entry| {
        if e.is_directory() {
            0
        } else if is_shortcut(&e.name) {
            1
        } else {
            2
        }
    };
    rank(a).cmp(&rank(b)).then_with(|| compare_names(a, b))
}
