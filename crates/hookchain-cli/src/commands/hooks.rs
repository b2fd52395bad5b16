//! Extension point chain listing.

use serde::Serialize;
use tabled::Tabled;

use crate::harness::Harness;
use crate::output::{self, OutputFormat};

/// One extension point and its handler chain.
#[derive(Debug, Serialize, Tabled)]
struct HookRow {
    hook: String,
    installed: bool,
    /// Outermost handler first, ending at the host default.
    chain: String,
}

/// Print the chain of every extension point
pub fn execute(harness: &Harness, format: OutputFormat) -> anyhow::Result<()> {
    let rows: Vec<HookRow> = harness
        .session
        .hook_chains()
        .into_iter()
        .map(|summary| {
            let mut chain = summary.modules.clone();
            chain.push("standard".to_string());
            HookRow {
                hook: summary.hook.to_string(),
                installed: !summary.modules.is_empty(),
                chain: chain.join(" -> "),
            }
        })
        .collect();

    output::print_list(&rows, format);
    if format == OutputFormat::Table {
        let stages = harness.session.rewriters().modules();
        if !stages.is_empty() {
            output::print_kv("Output rewriters", &stages.join(" -> "));
        }
    }
    Ok(())
}
