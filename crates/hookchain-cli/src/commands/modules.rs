//! Loaded module listing.

use serde::Serialize;
use tabled::Tabled;

use crate::harness::Harness;
use crate::output::{self, OutputFormat};

/// One row of the module listing.
#[derive(Debug, Serialize, Tabled)]
struct ModuleRow {
    #[tabled(rename = "#")]
    order: usize,
    name: String,
    state: String,
    hooks: String,
    rewriters: usize,
    loaded_at: String,
}

/// Print every loaded module
pub fn execute(harness: &Harness, format: OutputFormat) -> anyhow::Result<()> {
    let rows: Vec<ModuleRow> = harness
        .session
        .modules()
        .iter()
        .map(|record| ModuleRow {
            order: record.order,
            name: record.name.clone(),
            state: record.state.to_string(),
            hooks: record
                .hooks
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            rewriters: record.rewriters,
            loaded_at: record.loaded_at.to_rfc3339(),
        })
        .collect();

    output::print_list(&rows, format);
    if format == OutputFormat::Table && harness.libraries() > 0 {
        output::print_kv("Shared libraries", &harness.libraries().to_string());
    }
    Ok(())
}
