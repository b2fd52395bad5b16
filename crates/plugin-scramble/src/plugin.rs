//! Scramble module implementation.

use tracing::info;

use hookchain_plugin_sdk::prelude::*;

use crate::config::ScrambleSettings;
use crate::rewriter::ScrambleRewriter;

/// Module that scrambles text-like columns of every result row and announces
/// itself whenever a query is planned.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrambleModule;

impl Module for ScrambleModule {
    fn init(&self, cx: &mut ModuleInit<'_>) -> AppResult<()> {
        let settings = ScrambleSettings::from_config(&cx.config().modules.scramble)?;
        let module = cx.module_name().to_string();

        cx.registry().planner().install_with(|prev| {
            planner_handler(move |session, query, params| {
                info!(module = %module, query = %query.source_text, "Output will be scrambled");
                chain::planner(prev.as_deref(), session, query, params)
            })
        });

        info!(
            replacement_bytes = settings.replacement.len(),
            column_types = ?settings.column_types,
            "Scramble transform configured"
        );
        cx.api()
            .register_output_rewriter(ColumnStage::new(ScrambleRewriter::new(settings)))
    }
}
