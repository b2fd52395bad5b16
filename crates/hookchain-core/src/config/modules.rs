//! Settings for the bundled demonstration modules.

use serde::{Deserialize, Serialize};

/// Per-module configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Pass-through trace module.
    #[serde(default)]
    pub passthrough: PassthroughConfig,
    /// Row-scrambling module.
    #[serde(default)]
    pub scramble: ScrambleConfig,
}

/// Pass-through trace module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassthroughConfig {
    /// Emit an `info` event for every intercepted call.
    #[serde(default = "default_true")]
    pub notice: bool,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self { notice: true }
    }
}

/// Row-scrambling module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrambleConfig {
    /// Sequence written once per byte of the original value.
    #[serde(default = "default_replacement")]
    pub replacement: String,
    /// Column type names the transform applies to.
    #[serde(default = "default_column_types")]
    pub column_types: Vec<String>,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            replacement: default_replacement(),
            column_types: default_column_types(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_replacement() -> String {
    "\u{1F4A9}".to_string()
}

fn default_column_types() -> Vec<String> {
    vec!["text".to_string(), "varchar".to_string()]
}
