//! Configuration schemas.
//!
//! All configuration structs are deserialized from a TOML file via the
//! `config` crate, overlaid with `HOOKCHAIN__*` environment variables. Each
//! sub-module represents a logical configuration section and every field
//! carries a default, so an empty or missing file is a valid configuration.

pub mod logging;
pub mod modules;
pub mod pipeline;
pub mod session;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::modules::ModulesConfig;
use self::pipeline::{MemoryConfig, PipelineConfig};
use self::session::SessionConfig;

use crate::error::AppError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Module loading settings for a host session.
    #[serde(default)]
    pub session: SessionConfig,
    /// Row-transform pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Scratch memory context settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Per-module settings for the bundled modules.
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. Environment variables prefixed with
    /// `HOOKCHAIN__` override file values; `session.preload` and
    /// `session.disabled` accept comma-separated lists.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("HOOKCHAIN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("session.preload")
                    .with_list_parse_key("session.disabled"),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Modules from `session.preload` that are not listed in
    /// `session.disabled`, in load order.
    pub fn enabled_modules(&self) -> Vec<String> {
        self.session
            .preload
            .iter()
            .filter(|name| !self.session.disabled.contains(name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::pipeline::NestedPolicy;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::default();
        assert!(config.session.preload.is_empty());
        assert_eq!(config.pipeline.nested, NestedPolicy::Outermost);
        assert_eq!(config.memory.scratch_limit_bytes, None);
        assert_eq!(config.modules.scramble.replacement, "\u{1F4A9}");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hookchain.toml");
        std::fs::write(
            &path,
            r##"
[session]
preload = ["passthrough", "scramble"]
disabled = ["passthrough"]
trace_dispatch = true

[pipeline]
nested = "every_level"

[memory]
scratch_limit_bytes = 4096

[modules.scramble]
replacement = "#"
column_types = ["varchar"]
"##,
        )
        .expect("write");

        let config = AppConfig::load(path.to_str().expect("utf-8 path")).expect("load");
        assert_eq!(config.session.preload, vec!["passthrough", "scramble"]);
        assert!(config.session.trace_dispatch);
        assert_eq!(config.pipeline.nested, NestedPolicy::EveryLevel);
        assert_eq!(config.memory.scratch_limit_bytes, Some(4096));
        assert_eq!(config.modules.scramble.replacement, "#");
        assert_eq!(config.enabled_modules(), vec!["scramble".to_string()]);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let config = AppConfig::load(path.to_str().expect("utf-8 path")).expect("load");
        assert!(config.enabled_modules().is_empty());
    }
}
