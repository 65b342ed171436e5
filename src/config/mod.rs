pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::SortSpec;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// The last folder the session successfully navigated to.
    pub last_directory: Option<PathBuf>,
    pub restore_last_directory: bool,
    /// Fallback start folder; the home directory when unset.
    pub start_directory: Option<PathBuf>,
    pub default_sort: Option<SortSpec>,
    /// Exact names hidden on top of the built-in patterns.
    pub extra_hidden_names: Vec<String>,
    pub command_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// The folder a new session opens in.
    pub fn initial_directory(&self) -> PathBuf {
        let remembered = self
            .last_directory
            .as_ref()
            .filter(|_| self.restore_last_directory)
            .filter(|dir| dir.is_dir());
        remembered
            .or(self.start_directory.as_ref())
            .cloned()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_directory: None,
            restore_last_directory: true,
            start_directory: None,
            default_sort: None,
            extra_hidden_names: Vec::new(),
            command_timeout_secs: 30,
        }
    }
}
