//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use hookchain_core::config::AppConfig;
use plugin_scramble::ScrambleSettings;

use crate::harness::BUILTIN_MODULES;
use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration without loading any module
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommand::Show => output::print_item(config, format),
        ConfigCommand::Validate => {
            let modules = config.enabled_modules();
            for name in &modules {
                if !BUILTIN_MODULES.contains(&name.as_str()) {
                    output::print_warning(&format!(
                        "'{name}' is not built in; it will be loaded from '{}'",
                        config.session.library_dir
                    ));
                }
            }
            if modules.iter().any(|m| m == plugin_scramble::MODULE_NAME) {
                ScrambleSettings::from_config(&config.modules.scramble)?;
            }

            output::print_success("Configuration is valid");
            output::print_kv("Modules", &modules.join(", "));
            output::print_kv("Nested policy", &format!("{:?}", config.pipeline.nested));
            output::print_kv(
                "Scratch limit",
                &config
                    .memory
                    .scratch_limit_bytes
                    .map_or_else(|| "unlimited".to_string(), |b| format!("{b} bytes")),
            );
        }
    }
    Ok(())
}
