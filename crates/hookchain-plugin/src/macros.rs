//! Convenience macros for module development.

/// Generates a module's fixed-name load entry point.
///
/// Expands to `pub fn module_entry(&Session)`, which opens the load window
/// for `$name`, runs the module's [`Module::init`](crate::traits::Module::init),
/// and closes the window. With the calling crate's `dynamic-entry` feature
/// enabled it also exports the same function unmangled as
/// `_hookchain_module_init` for [`DynamicLoader`](crate::loader::DynamicLoader).
///
/// # Example
/// ```rust,ignore
/// pub struct Scramble;
/// impl Module for Scramble { /* ... */ }
///
/// declare_module!("scramble", Scramble);
/// ```
#[macro_export]
macro_rules! declare_module {
    ($name:expr, $module:expr) => {
        /// Name this module loads under.
        pub const MODULE_NAME: &str = $name;

        /// Loads this module into `session`.
        pub fn module_entry(
            session: &$crate::session::Session,
        ) -> $crate::hookchain_core::AppResult<$crate::modules::ModuleRecord> {
            session.load_module(MODULE_NAME, |cx| $crate::traits::Module::init(&$module, cx))
        }

        /// Unmangled load entry point for dynamic loading.
        #[cfg(feature = "dynamic-entry")]
        #[unsafe(no_mangle)]
        pub fn _hookchain_module_init(
            session: &$crate::session::Session,
        ) -> $crate::hookchain_core::AppResult<$crate::modules::ModuleRecord> {
            module_entry(session)
        }
    };
}
