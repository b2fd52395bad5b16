//! CLI command definitions and dispatch.

pub mod config;
pub mod hooks;
pub mod modules;
pub mod run;

use anyhow::Context;
use clap::{Parser, Subcommand};

use hookchain_core::config::AppConfig;

use crate::harness::Harness;
use crate::output::OutputFormat;

/// hookchain — compose host extension modules and inspect the result
#[derive(Debug, Parser)]
#[command(name = "hookchain", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/hookchain.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Module to load (repeatable); replaces `session.preload` when given
    #[arg(short = 'm', long = "module", value_name = "NAME")]
    pub modules: Vec<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List loaded modules in load order
    Modules,
    /// Show the handler chain of every extension point
    Hooks,
    /// Scan a relation of the mock host through the loaded modules
    Run(run::RunArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Loads the configuration file with command-line overrides applied.
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load(&self.config)
            .with_context(|| format!("Failed to load configuration from '{}'", self.config))?;
        if !self.modules.is_empty() {
            config.session.preload = self.modules.clone();
        }
        Ok(config)
    }

    /// Execute the CLI command
    pub fn execute(&self, config: AppConfig) -> anyhow::Result<()> {
        match &self.command {
            Commands::Config(args) => config::execute(args, &config, self.format),
            Commands::Modules => modules::execute(&Harness::open(config)?, self.format),
            Commands::Hooks => hooks::execute(&Harness::open(config)?, self.format),
            Commands::Run(args) => run::execute(args, &Harness::open(config)?, self.format),
        }
    }
}
