//! Scan a mock relation through the loaded modules.

use clap::Args;
use serde_json::{Map, Value};
use tabled::builder::Builder;

use hookchain_core::host::Datum;
use hookchain_core::host::mock::RecordingDest;

use crate::harness::Harness;
use crate::output::{self, OutputFormat};

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Relation to scan (`users` or `notes`)
    pub relation: String,

    /// Stop after the destination has accepted this many rows
    #[arg(short, long)]
    pub limit: Option<usize>,
}

fn to_json(datum: &Datum) -> Value {
    match datum {
        Datum::Null => Value::Null,
        Datum::Bool(b) => Value::from(*b),
        Datum::Int4(i) => Value::from(*i),
        Datum::Int8(i) => Value::from(*i),
        Datum::Float8(f) => Value::from(*f),
        Datum::Varlena(v) => match v.as_str() {
            Some(text) => Value::from(text),
            None => Value::from(v.payload().to_vec()),
        },
    }
}

/// Execute the run command
pub fn execute(args: &RunArgs, harness: &Harness, format: OutputFormat) -> anyhow::Result<()> {
    let columns: Vec<String> = harness
        .host
        .relation(&args.relation)
        .map(|r| r.desc.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();

    let (dest, log) = RecordingDest::new();
    let dest = match args.limit {
        Some(limit) => dest.accept_limit(limit),
        None => dest,
    };
    let processed = harness.run(&args.relation, Box::new(dest))?;
    let rows = log.borrow().rows();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for row in &rows {
        builder.push_record(row.iter().map(|d| d.to_string()));
    }
    let json: Vec<Map<String, Value>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.iter().map(to_json))
                .collect()
        })
        .collect();

    output::print_table(builder.build(), &json, format);

    if format == OutputFormat::Table {
        let stats = harness.session.memory().stats();
        output::print_kv("Rows processed", &processed.to_string());
        output::print_kv("Rows delivered", &rows.len().to_string());
        output::print_kv(
            "Scratch values",
            &format!(
                "{} allocated, {} released, peak {} bytes",
                stats.allocations, stats.releases, stats.peak_bytes
            ),
        );
    }
    Ok(())
}
