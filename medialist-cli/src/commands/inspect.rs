use anyhow::{Context, Result};
use medialist_core::{ItemCodec, LoadReport, ReservedNamespaces, Value};
use std::fs;
use tracing::info;

use super::{catalog_without, read_input};
use crate::InspectFormat;

/// Options for the `inspect` subcommand
#[derive(Debug, Clone)]
pub struct InspectOptions<'a> {
    /// Where to write the rendered items; stdout when `None`
    pub output: Option<&'a str>,
    /// Print statistics only
    pub stats_only: bool,
    /// Rendering of the items
    pub format: InspectFormat,
    /// Format modules to treat as removed
    pub exclude_modules: &'a [String],
    /// Namespaces holding record types; defaults apply when empty
    pub reserved_namespaces: &'a [String],
}

pub fn execute(input: &str, opts: &InspectOptions<'_>) -> Result<()> {
    info!("Inspecting item list: {}", input);

    let data = read_input(input)?;
    let report = load(&data, opts)
        .with_context(|| format!("Failed to load item list: {}", input))?;

    println!("\n=== Load Results ===");
    println!("Items in stream:   {}", report.total);
    println!("Items recovered:   {}", report.items.len());
    println!("Items dropped:     {}", report.dropped);
    for unresolved in &report.unresolved {
        println!("  unresolved {} ({})", unresolved.qualified_name(), unresolved.reason);
    }
    println!();

    if opts.stats_only {
        return Ok(());
    }

    let rendered = match opts.format {
        InspectFormat::Json => serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize load report")?,
        InspectFormat::Text => render_text(&report),
    };

    if let Some(output_path) = opts.output {
        fs::write(output_path, rendered)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Items written to: {}", output_path);
    } else {
        println!("=== Items ===");
        println!("{}", rendered);
    }

    Ok(())
}

/// Tolerant load with the catalog and namespaces `opts` asks for
pub fn load(data: &[u8], opts: &InspectOptions<'_>) -> Result<LoadReport> {
    let catalog = catalog_without(opts.exclude_modules);
    let mut codec = ItemCodec::new(&catalog);
    if !opts.reserved_namespaces.is_empty() {
        codec = codec.reserved_namespaces(ReservedNamespaces::new(
            opts.reserved_namespaces.iter().cloned(),
        ));
    }

    Ok(codec.load_with_report(data)?)
}

fn render_text(report: &LoadReport) -> String {
    report
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let title = item.get("title").and_then(Value::as_str).unwrap_or("<untitled>");
            format!("#{} {} {:?} ({} fields)", i, item.ty().qualified_name(), title, item.fields().len())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
