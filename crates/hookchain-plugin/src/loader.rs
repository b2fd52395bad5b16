//! Dynamic module loader using `libloading` (feature-gated).

#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    use std::path::{Path, PathBuf};

    use tracing::{debug, error, info};

    use hookchain_core::{AppError, AppResult};

    use crate::modules::{MODULE_ENTRY_SYMBOL, ModuleEntryFn, ModuleRecord};
    use crate::session::Session;

    /// Loads modules from shared libraries (.so / .dll / .dylib).
    ///
    /// Handlers installed by a loaded module point into its library, so the
    /// loader must outlive every session the modules were loaded into.
    pub struct DynamicLoader {
        /// Directory searched by [`load_by_name`](Self::load_by_name).
        library_dir: PathBuf,
        /// Loaded libraries (kept alive for the lifetime of the loader).
        libraries: Vec<libloading::Library>,
    }

    impl DynamicLoader {
        /// Creates a loader searching `library_dir`.
        pub fn new(library_dir: impl Into<PathBuf>) -> Self {
            Self {
                library_dir: library_dir.into(),
                libraries: Vec::new(),
            }
        }

        /// Platform file name for module `name` inside the library directory.
        pub fn resolve(&self, name: &str) -> PathBuf {
            self.library_dir.join(libloading::library_filename(name))
        }

        /// Loads module `name` from the library directory into `session`.
        ///
        /// # Safety
        /// See [`load_from_path`](Self::load_from_path).
        pub unsafe fn load_by_name(
            &mut self,
            session: &Session,
            name: &str,
        ) -> AppResult<ModuleRecord> {
            let path = self.resolve(name);
            // SAFETY: upheld by the caller.
            unsafe { self.load_from_path(session, &path) }
        }

        /// Opens the library for module `name` and returns its entry point
        /// without calling it. Suitable as a [`Session::preload`] resolver.
        ///
        /// # Safety
        /// See [`load_from_path`](Self::load_from_path).
        pub unsafe fn entry_by_name(&mut self, name: &str) -> AppResult<ModuleEntryFn> {
            let path = self.resolve(name);
            // SAFETY: upheld by the caller.
            unsafe { self.open_entry(&path) }
        }

        /// Loads the library at `path` and calls its entry point.
        ///
        /// # Safety
        /// Runs arbitrary code from the library. The library must be built
        /// against the same hookchain version and compiler, and export
        /// `_hookchain_module_init` via `declare_module!`.
        pub unsafe fn load_from_path(
            &mut self,
            session: &Session,
            path: &Path,
        ) -> AppResult<ModuleRecord> {
            // SAFETY: upheld by the caller.
            let entry = unsafe { self.open_entry(path) }?;

            let record = entry(session).map_err(|e| {
                error!(path = %path.display(), error = %e, "Dynamic module init failed");
                e
            })?;

            info!(
                path = %path.display(),
                module = %record.name,
                "Dynamic module loaded"
            );
            Ok(record)
        }

        /// Opens `path`, keeps it alive, and resolves the entry symbol.
        unsafe fn open_entry(&mut self, path: &Path) -> AppResult<ModuleEntryFn> {
            // SAFETY: library initializers are trusted per the caller's contract.
            let lib = unsafe { libloading::Library::new(path) }.map_err(|e| {
                AppError::plugin(format!(
                    "Failed to load module library '{}': {}",
                    path.display(),
                    e
                ))
            })?;

            // SAFETY: the symbol's type is fixed by `declare_module!`.
            let entry: ModuleEntryFn = unsafe {
                let symbol = lib
                    .get::<ModuleEntryFn>(MODULE_ENTRY_SYMBOL)
                    .map_err(|e| {
                        AppError::plugin(format!(
                            "Module '{}' missing '_hookchain_module_init' symbol: {}",
                            path.display(),
                            e
                        ))
                    })?;
                *symbol
            };

            debug!(path = %path.display(), "Module library opened");
            self.libraries.push(lib);
            Ok(entry)
        }

        /// Number of libraries held open.
        pub fn loaded_count(&self) -> usize {
            self.libraries.len()
        }
    }

    impl std::fmt::Debug for DynamicLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicLoader")
                .field("library_dir", &self.library_dir)
                .field("loaded_count", &self.libraries.len())
                .finish()
        }
    }

    #[cfg(test)]
    mod tests {
        use std::rc::Rc;

        use hookchain_core::config::AppConfig;
        use hookchain_core::error::ErrorKind;
        use hookchain_core::host::mock::MockHost;

        use super::*;

        #[test]
        fn test_missing_library_is_a_plugin_error() {
            let dir = tempfile::tempdir().expect("tempdir");
            let session = Session::new(Rc::new(MockHost::with_sample_catalog()), AppConfig::default());
            let mut loader = DynamicLoader::new(dir.path());

            // SAFETY: the library does not exist, so no foreign code runs.
            let err = unsafe { loader.load_by_name(&session, "absent") }.expect_err("missing");
            assert_eq!(err.kind, ErrorKind::Plugin);
            assert!(err.message.contains("absent"));
            assert_eq!(loader.loaded_count(), 0);
            assert!(session.modules().is_empty());
        }

        #[test]
        fn test_non_library_file_is_a_plugin_error() {
            let dir = tempfile::tempdir().expect("tempdir");
            let mut loader = DynamicLoader::new(dir.path());
            std::fs::write(loader.resolve("bogus"), b"not a shared object").expect("write");

            // SAFETY: the file is not a loadable object, so no foreign code runs.
            let err = unsafe { loader.entry_by_name("bogus") }.expect_err("bogus");
            assert_eq!(err.kind, ErrorKind::Plugin);
            assert_eq!(loader.loaded_count(), 0);
        }
    }
}

/// Stub loader when dynamic feature is not enabled.
#[cfg(not(feature = "dynamic"))]
pub mod dynamic_loader {
    use std::path::PathBuf;

    use hookchain_core::{AppError, AppResult};

    use crate::modules::{ModuleEntryFn, ModuleRecord};
    use crate::session::Session;

    /// Stub dynamic loader.
    #[derive(Debug)]
    pub struct DynamicLoader {
        library_dir: PathBuf,
    }

    impl DynamicLoader {
        /// Creates a stub loader.
        pub fn new(library_dir: impl Into<PathBuf>) -> Self {
            Self {
                library_dir: library_dir.into(),
            }
        }

        /// Always fails: dynamic loading is compiled out.
        ///
        /// # Safety
        /// Trivially safe; `unsafe` only to match the real loader.
        pub unsafe fn load_by_name(
            &mut self,
            _session: &Session,
            name: &str,
        ) -> AppResult<ModuleRecord> {
            Err(self.unavailable(name))
        }

        /// Always fails: dynamic loading is compiled out.
        ///
        /// # Safety
        /// Trivially safe; `unsafe` only to match the real loader.
        pub unsafe fn entry_by_name(&mut self, name: &str) -> AppResult<ModuleEntryFn> {
            Err(self.unavailable(name))
        }

        fn unavailable(&self, name: &str) -> AppError {
            AppError::plugin(format!(
                "Cannot load '{name}' from '{}': built without the 'dynamic' feature",
                self.library_dir.display()
            ))
        }

        /// Number of libraries held open.
        pub fn loaded_count(&self) -> usize {
            0
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_stub_rejects_every_module() {
            let mut loader = DynamicLoader::new("modules");
            // SAFETY: the stub never touches the filesystem.
            let err = unsafe { loader.entry_by_name("anything") }.expect_err("stub");
            assert_eq!(err.kind, hookchain_core::error::ErrorKind::Plugin);
            assert!(err.message.contains("dynamic"));
        }
    }
}

pub use dynamic_loader::DynamicLoader;
