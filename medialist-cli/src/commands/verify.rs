use anyhow::Result;
use colored::*;
use medialist_core::{
    decoder::{decode_graph_strict, read_header, StreamHeader},
    CodecError, ItemCodec, LoadReport, SerializationError, TypeCatalog,
};
use tracing::{info, warn};

use super::{catalog_without, read_input};

/// Outcome of checking one item list
#[derive(Debug)]
pub struct VerifyReport {
    /// Header, if it parsed
    pub header: Result<StreamHeader, CodecError>,
    /// Decode failing on the first unresolved type
    pub strict: Result<usize, CodecError>,
    /// Tolerant load
    pub tolerant: Result<LoadReport, SerializationError>,
}

impl VerifyReport {
    /// Every item decoded with its real type
    pub fn is_complete(&self) -> bool {
        self.strict.is_ok() && matches!(&self.tolerant, Ok(r) if r.dropped == 0)
    }

    /// Some items are usable
    pub fn is_recoverable(&self) -> bool {
        self.tolerant.is_ok()
    }
}

/// Decode `data` both strictly and tolerantly against `catalog`
pub fn check(data: &[u8], catalog: &TypeCatalog) -> VerifyReport {
    let strict = decode_graph_strict(data, catalog).map(|root| match root {
        medialist_core::Value::List(items) => items.len(),
        _ => 0,
    });

    VerifyReport {
        header: read_header(data),
        strict,
        tolerant: ItemCodec::new(catalog).load_with_report(data),
    }
}

pub fn execute(input: &str, exclude_modules: &[String]) -> Result<()> {
    info!("Verifying file: {}", input);

    let data = read_input(input)?;
    let catalog = catalog_without(exclude_modules);
    let report = check(&data, &catalog);

    println!("\n=== Header ===");
    match &report.header {
        Ok(header) => {
            println!("Format version:     {}", header.version);
            println!("CRC32C trailer:     {}", header.flags.has_crc32c());
        }
        Err(e) => println!("{} {}", "✗".red(), e),
    }

    println!("\n=== Strict Decode ===");
    match &report.strict {
        Ok(count) => println!("{} {} items, every type resolved", "✓".green(), count),
        Err(e) => {
            warn!("Strict decode failed: {}", e);
            println!("{} {}", "✗".red(), e);
        }
    }

    println!("\n=== Tolerant Load ===");
    match &report.tolerant {
        Ok(loaded) => {
            println!("Items recovered:    {}", loaded.items.len().to_string().green());
            if loaded.dropped > 0 {
                println!("Items dropped:      {}", loaded.dropped.to_string().red());
            } else {
                println!("Items dropped:      {}", loaded.dropped);
            }
            for unresolved in &loaded.unresolved {
                println!("  missing type {}", unresolved.qualified_name().yellow());
            }
        }
        Err(e) => println!("{} {}", "✗".red(), e),
    }

    println!("\n=== Summary ===");
    if report.is_complete() {
        println!("{} Item list is fully valid", "✓".green());
    } else if report.is_recoverable() {
        println!(
            "{} Item list is readable but some item types are missing",
            "!".yellow()
        );
    } else {
        println!("{} Item list cannot be loaded", "✗".red());
    }

    Ok(())
}
