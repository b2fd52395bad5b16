//! What a module's init routine receives.

use hookchain_core::config::AppConfig;

use super::handle::PluginHandle;
use crate::hooks::registry::HookRegistry;

/// Capabilities handed to a module's init routine.
///
/// Row-transform registration goes through [`api`](ModuleInit::api); direct
/// interception of entry points goes through [`registry`](ModuleInit::registry).
/// A module that installs a handler keeps what `install` returns and chains
/// to it.
#[derive(Debug)]
pub struct ModuleInit<'a> {
    handle: &'a PluginHandle,
    registry: &'a HookRegistry,
    config: &'a AppConfig,
}

impl<'a> ModuleInit<'a> {
    pub(crate) fn new(
        handle: &'a PluginHandle,
        registry: &'a HookRegistry,
        config: &'a AppConfig,
    ) -> Self {
        Self {
            handle,
            registry,
            config,
        }
    }

    /// The module's handle.
    pub fn api(&self) -> &'a PluginHandle {
        self.handle
    }

    /// The extension-point registry.
    pub fn registry(&self) -> &'a HookRegistry {
        self.registry
    }

    /// Session configuration.
    pub fn config(&self) -> &'a AppConfig {
        self.config
    }

    /// Name of the module being initialized.
    pub fn module_name(&self) -> &'a str {
        self.handle.module_name()
    }
}
