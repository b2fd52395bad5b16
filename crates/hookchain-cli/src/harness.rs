//! A session over the mock host with the configured modules loaded.

use std::rc::Rc;

use anyhow::Context;
use tracing::info;

use hookchain_core::config::AppConfig;
use hookchain_core::host::mock::MockHost;
use hookchain_core::host::{DestReceiver, ParamList, Query, portal};
use hookchain_core::{AppError, AppResult};
use hookchain_plugin::loader::DynamicLoader;
use hookchain_plugin::{ModuleEntryFn, Session};

/// Modules compiled into the CLI.
pub const BUILTIN_MODULES: [&str; 2] = [plugin_passthrough::MODULE_NAME, plugin_scramble::MODULE_NAME];

/// Entry point of a built-in module.
pub fn builtin(name: &str) -> AppResult<ModuleEntryFn> {
    match name {
        plugin_passthrough::MODULE_NAME => Ok(plugin_passthrough::module_entry),
        plugin_scramble::MODULE_NAME => Ok(plugin_scramble::module_entry),
        other => Err(AppError::not_found(format!("No built-in module named '{other}'"))),
    }
}

/// Mock host, session and the libraries its dynamic modules came from.
///
/// Field order matters: the session holds handlers that may point into the
/// loader's libraries, so it is dropped first.
pub struct Harness {
    pub session: Session,
    pub host: Rc<MockHost>,
    loader: DynamicLoader,
}

impl Harness {
    /// Creates the session and loads every enabled module in order.
    ///
    /// Built-in names resolve to the bundled modules; anything else is
    /// looked up as a shared library in `session.library_dir`.
    pub fn open(config: AppConfig) -> anyhow::Result<Self> {
        let host = Rc::new(MockHost::with_sample_catalog());
        let mut loader = DynamicLoader::new(&config.session.library_dir);
        let session = Session::new(host.clone(), config);

        let records = session
            .preload(|name| {
                builtin(name).or_else(|_| {
                    // SAFETY: libraries in the configured directory are trusted
                    // to be hookchain modules built with this toolchain.
                    unsafe { loader.entry_by_name(name) }
                })
            })
            .context("Failed to preload modules")?;
        for record in &records {
            info!(module = %record.name, order = record.order, "Preloaded");
        }

        Ok(Self {
            session,
            host,
            loader,
        })
    }

    /// Runs a full scan of `relation` into `dest`.
    pub fn run(
        &self,
        relation: &str,
        dest: Box<dyn DestReceiver>,
    ) -> anyhow::Result<u64> {
        let relation = self.host.relation(relation).map_err(|e| {
            anyhow::anyhow!(
                "{e} (available: {})",
                self.host.relation_names().join(", ")
            )
        })?;
        let query = Query::select(relation.clone());
        let processed = portal::run_query(&self.session, &query, ParamList::default(), dest)?;
        Ok(processed)
    }

    /// Number of shared libraries held open.
    pub fn libraries(&self) -> usize {
        self.loader.loaded_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_preloads_builtins_in_order() {
        let mut config = AppConfig::default();
        config.session.preload = vec!["scramble".into(), "passthrough".into()];
        let harness = Harness::open(config).expect("open");

        let names: Vec<_> = harness
            .session
            .modules()
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["scramble", "passthrough"]);
        assert_eq!(harness.libraries(), 0);
    }

    #[test]
    fn test_open_fails_for_unknown_module() {
        let dir = std::env::temp_dir().join("hookchain-no-such-modules");
        let mut config = AppConfig::default();
        config.session.preload = vec!["passthrough".into(), "nowhere".into()];
        config.session.library_dir = dir.to_string_lossy().into_owned();

        let err = Harness::open(config).err().expect("unknown module");
        assert!(format!("{err:#}").contains("nowhere"));
    }
}
