//! Trait implemented by every module.

use hookchain_core::AppResult;

use crate::api::context::ModuleInit;

/// A loadable module.
///
/// `init` runs exactly once, inside the module's load window. It registers
/// row-transform stages through `cx.api()` and installs entry-point handlers
/// through `cx.registry()`. Returning an error aborts the load; nothing the
/// module registered before the error is rolled back.
///
/// # Example
/// ```rust,ignore
/// struct Audit;
///
/// impl Module for Audit {
///     fn init(&self, cx: &mut ModuleInit<'_>) -> AppResult<()> {
///         cx.registry().planner().install_with(|prev| {
///             planner_handler(move |session, query, params| {
///                 tracing::info!(query = %query.source_text, "planning");
///                 chain::planner(prev.as_deref(), session, query, params)
///             })
///         });
///         Ok(())
///     }
/// }
/// ```
pub trait Module {
    /// Registers the module's handlers and stages.
    fn init(&self, cx: &mut ModuleInit<'_>) -> AppResult<()>;
}
