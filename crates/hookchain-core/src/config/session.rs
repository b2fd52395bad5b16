//! Session (per host process) module-loading configuration.

use serde::{Deserialize, Serialize};

/// Which modules a session loads, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Modules to load at session start, in order.
    #[serde(default)]
    pub preload: Vec<String>,
    /// Modules listed in `preload` that should be skipped.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Log every hop through a handler chain.
    #[serde(default)]
    pub trace_dispatch: bool,
    /// Directory searched for dynamically loaded modules.
    #[serde(default = "default_library_dir")]
    pub library_dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preload: Vec::new(),
            disabled: Vec::new(),
            trace_dispatch: false,
            library_dir: default_library_dir(),
        }
    }
}

fn default_library_dir() -> String {
    "./modules".to_string()
}
