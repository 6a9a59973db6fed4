//! Load a library after one of its format modules was removed

use medialist_core::{media, ItemCodec, Record, SerializationError, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Medialist Removed Plugin Example\n");

    let full = media::catalog();
    let mut library = Vec::new();
    for (i, (module, name)) in media::FORMAT_TYPES.iter().enumerate() {
        let ty = full.lookup(module, name)?;
        library.push(Record::from_fields(
            ty,
            [("title", Value::from(format!("Track {} ({})", i + 1, name)))],
        )?);
    }

    let data = ItemCodec::new(full).dump(&library)?;
    println!("Saved {} items with the full catalog\n", library.len());

    // A later build no longer ships the xiph formats
    let reduced = media::build_catalog().without_modules(&["application.formats.xiph"]);
    let report = ItemCodec::new(&reduced).load_with_report(&data)?;

    println!("Recovered {} of {} items:", report.items.len(), report.total);
    for item in &report.items {
        let title = item.get("title").and_then(Value::as_str).unwrap_or("?");
        println!("  {} [{}]", title, item.ty().name());
    }
    println!("Dropped {} items:", report.dropped);
    for unresolved in &report.unresolved {
        println!("  {} ({})", unresolved.qualified_name(), unresolved.reason);
    }

    // With no formats left at all, nothing survives and the load fails
    let empty = media::build_catalog().without_modules(&["application.formats"]);
    match ItemCodec::new(&empty).load(&data) {
        Err(SerializationError::AllTypesUnresolvable { dropped }) => {
            println!("\n✗ With every format removed, all {} items are unresolvable", dropped)
        }
        Err(e) => return Err(e.into()),
        Ok(items) => println!("\nUnexpectedly loaded {} items", items.len()),
    }

    Ok(())
}
