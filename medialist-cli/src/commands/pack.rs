use anyhow::{bail, Context, Result};
use medialist_core::{media, ItemCodec, Record, ReservedNamespaces, TypeCatalog, Value};
use serde::Deserialize;
use std::fs;
use tracing::{debug, info};

/// One item of the JSON input
#[derive(Debug, Deserialize)]
pub struct ItemSpec {
    /// Qualified record type, e.g. `application.formats.mp3.MP3File`
    #[serde(rename = "type")]
    pub ty: String,

    /// Tag fields
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

pub fn execute(input: &str, output: &str, format_version: u8, checksum: bool) -> Result<()> {
    info!("Packing items from {} to {}", input, output);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;

    let specs: Vec<ItemSpec> =
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON input")?;

    info!("Found {} items to pack", specs.len());

    let catalog = media::catalog();
    let records = build_records(catalog, specs)?;

    let data = ItemCodec::new(catalog)
        .format_version(format_version)
        .checksum(checksum)
        .dump(&records)
        .with_context(|| "Failed to encode item list")?;

    fs::write(output, &data)
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!(
        "Successfully packed {} items ({} bytes, format v{})",
        records.len(),
        data.len(),
        format_version
    );

    Ok(())
}

/// Resolve each spec against `catalog` and assign its fields
pub fn build_records(catalog: &TypeCatalog, specs: Vec<ItemSpec>) -> Result<Vec<Record>> {
    let reserved = ReservedNamespaces::default();

    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| -> Result<Record> {
            let ty = catalog
                .lookup_qualified(&spec.ty)
                .with_context(|| format!("Item {}: unknown type {}", i, spec.ty))?;

            if !reserved.contains_module(ty.module()) {
                bail!("Item {}: {} is not a media item type", i, spec.ty);
            }

            let fields = spec
                .fields
                .into_iter()
                .map(|(key, value)| (key, json_to_value(value)));
            let record = Record::from_fields(ty, fields)
                .with_context(|| format!("Item {}: invalid fields", i))?;

            debug!("Item {}: {} with {} fields", i, spec.ty, record.fields().len());
            Ok(record)
        })
        .collect()
}

/// Convert JSON into a codec value; objects become ordered maps with text keys
pub fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (Value::Str(k), json_to_value(v)))
                .collect(),
        ),
    }
}
