//! Loading and dumping media item lists
//!
//! Loading is tolerant of record types that no longer exist in the catalog,
//! e.g. because the format module that defined them was removed. Such items
//! are dropped and every other item is still returned. Only when nothing at
//! all survives is the load treated as failed.
//!
//! Decoding runs in two phases:
//! 1. The stream is decoded with a [`TypeResolver`] hook. Application record
//!    types come back as placeholder objects that remember their real type;
//!    unresolvable types come back as the universal placeholder.
//! 2. Universal placeholders are dropped and every other placeholder is
//!    retagged to its real type. Fields are moved over untouched; the record
//!    type's assignment hook does not run again.

use crate::catalog::TypeCatalog;
use crate::constants::DUMP_FORMAT_VERSION;
use crate::decoder::decode_graph;
use crate::encoder::GraphEncoder;
use crate::error::{CodecError, SerializationError};
use crate::media;
use crate::resolver::{ReservedNamespaces, TypeResolver, UnresolvedRef};
use crate::types::{Class, Object, Record, Value};
use bytes::Bytes;
use serde::Serialize;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Outcome of a tolerant load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// Recovered records, in stream order
    pub items: Vec<Record>,
    /// Number of items in the stream
    pub total: usize,
    /// Number of items dropped because their type did not resolve
    pub dropped: usize,
    /// Every class reference that failed to resolve
    pub unresolved: Vec<UnresolvedRef>,
}

/// Codec for lists of media item records
#[derive(Debug, Clone)]
pub struct ItemCodec<'c> {
    catalog: &'c TypeCatalog,
    reserved: ReservedNamespaces,
    format_version: u8,
    checksum: bool,
}

impl<'c> ItemCodec<'c> {
    /// Create a codec over `catalog` with the default reserved namespaces
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        Self {
            catalog,
            reserved: ReservedNamespaces::default(),
            format_version: DUMP_FORMAT_VERSION,
            checksum: true,
        }
    }

    /// Set the namespaces whose types are treated as application records
    pub fn reserved_namespaces(mut self, reserved: ReservedNamespaces) -> Self {
        self.reserved = reserved;
        self
    }

    /// Override the version `dump` writes (e.g. for older readers)
    pub fn format_version(mut self, version: u8) -> Self {
        self.format_version = version;
        self
    }

    /// Enable or disable the CRC32C trailer on dumped lists
    pub fn checksum(mut self, enabled: bool) -> Self {
        self.checksum = enabled;
        self
    }

    /// Decode a list, dropping items whose type cannot be resolved
    pub fn load(&self, data: &[u8]) -> Result<Vec<Record>, SerializationError> {
        self.load_with_report(data).map(|report| report.items)
    }

    /// Like [`load`](Self::load), also reporting what was dropped
    pub fn load_with_report(&self, data: &[u8]) -> Result<LoadReport, SerializationError> {
        let mut resolver = TypeResolver::new(&self.reserved);

        let root = decode_graph(data, self.catalog, |module, name, lookup| {
            Ok(resolver.resolve(module, name, lookup))
        })
        .map_err(SerializationError::MalformedStream)?;

        let items = match root {
            Value::List(items) => items,
            other => {
                return Err(SerializationError::MalformedStream(
                    CodecError::UnexpectedRoot(other.kind_name()),
                ))
            }
        };
        let total = items.len();

        #[cfg(feature = "logging")]
        debug!(
            "Decoded {} items, {} placeholder types",
            total,
            resolver.cached_types()
        );

        let items: Vec<Value> = if resolver.had_errors() {
            items
                .into_iter()
                .filter(|item| !matches!(item, Value::Object(obj) if resolver.is_universal(obj.class())))
                .collect()
        } else {
            items
        };

        let dropped = total - items.len();
        if items.is_empty() && total > 0 {
            return Err(SerializationError::AllTypesUnresolvable { dropped });
        }

        if dropped > 0 {
            #[cfg(feature = "logging")]
            warn!(
                "Dropped {} of {} items with unresolvable types",
                dropped, total
            );
        }

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| promote_item(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LoadReport {
            items: records,
            total,
            dropped,
            unresolved: resolver.into_unresolved(),
        })
    }

    /// Encode a list of records.
    ///
    /// # Panics
    ///
    /// If the first record's type is not in a reserved namespace. Only the
    /// first record is checked.
    pub fn dump(&self, records: &[Record]) -> Result<Bytes, SerializationError> {
        if let Some(first) = records.first() {
            assert!(
                self.reserved.contains_module(first.ty().module()),
                "dump expects application records, got {}",
                first.ty().qualified_name()
            );
        }

        let mut encoder = GraphEncoder::new(self.format_version)
            .map_err(SerializationError::EncodeRejected)?
            .with_crc32c(self.checksum);

        encoder
            .begin_list(records.len())
            .map_err(SerializationError::EncodeRejected)?;
        for record in records {
            encoder
                .write_object(record.ty(), record.fields())
                .map_err(SerializationError::EncodeRejected)?;
        }
        encoder.end_list();

        Ok(encoder.finish())
    }
}

/// Turn a top-level placeholder into the record it stands in for
fn promote_item(index: usize, item: Value) -> Result<Record, SerializationError> {
    match item {
        Value::Object(Object {
            class: Class::Placeholder(placeholder),
            mut fields,
        }) => {
            let real = placeholder.deferred_real_type().cloned().ok_or_else(|| {
                SerializationError::InternalInconsistency(format!(
                    "item {} ({}) has no deferred real type",
                    index,
                    placeholder.name()
                ))
            })?;

            for value in fields.values_mut() {
                promote_nested(value);
            }

            Ok(Record::from_raw_parts(real, fields))
        }
        Value::Object(obj) => Err(SerializationError::InternalInconsistency(format!(
            "item {} has non-record class {}",
            index,
            obj.class().name()
        ))),
        other => Err(SerializationError::InternalInconsistency(format!(
            "item {} is a {}, not a record",
            index,
            other.kind_name()
        ))),
    }
}

/// Retag placeholders nested inside field values.
///
/// Unresolvable nested objects cannot be dropped without changing the shape
/// of their parent, so they stay behind as a plain map of their fields.
fn promote_nested(value: &mut Value) {
    match value {
        Value::List(items) => items.iter_mut().for_each(promote_nested),
        Value::Map(entries) => {
            for (k, v) in entries.iter_mut() {
                promote_nested(k);
                promote_nested(v);
            }
        }
        Value::Object(obj) => {
            obj.fields.values_mut().for_each(promote_nested);

            let deferred = match &obj.class {
                Class::Placeholder(p) => Some(p.deferred_real_type().cloned()),
                Class::Real(_) => None,
            };

            match deferred {
                None => {}
                Some(Some(real)) => obj.class = Class::Real(real),
                Some(None) => {
                    #[cfg(feature = "logging")]
                    debug!("Keeping unresolvable nested object as a map");

                    let fields = core::mem::take(&mut obj.fields);
                    *value = Value::Map(
                        fields
                            .into_iter()
                            .map(|(k, v)| (Value::Str(k), v))
                            .collect(),
                    );
                }
            }
        }
        _ => {}
    }
}

/// Load a list against the default media catalog
pub fn load_media_items(data: &[u8]) -> Result<Vec<Record>, SerializationError> {
    ItemCodec::new(media::catalog()).load(data)
}

/// Dump a list with the default media catalog's settings
pub fn dump_media_items(records: &[Record]) -> Result<Bytes, SerializationError> {
    ItemCodec::new(media::catalog()).dump(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FORMAT_V1;
    use crate::encoder::encode_graph;
    use crate::types::{Fields, TypeDef, TypeHandle};

    struct Fixture {
        catalog: TypeCatalog,
        song: TypeHandle,
        video: TypeHandle,
        ordered: TypeHandle,
    }

    fn fixture() -> Fixture {
        let mut catalog = TypeCatalog::new();
        let song = catalog.register(TypeDef::new("tests.formats.song", "Song"));
        let video = catalog.register(TypeDef::new("tests.formats.video", "Video"));
        let ordered = catalog.register(TypeDef::new("collections", "OrderedDict"));
        Fixture {
            catalog,
            song,
            video,
            ordered,
        }
    }

    fn record(ty: &TypeHandle, title: &str) -> Record {
        Record::from_fields(ty.clone(), [("title", Value::from(title))]).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let fx = fixture();
        let codec = ItemCodec::new(&fx.catalog);
        let records = vec![record(&fx.song, "a"), record(&fx.video, "b"), record(&fx.song, "c")];

        let data = codec.dump(&records).unwrap();
        assert_eq!(codec.load(&data).unwrap(), records);
    }

    #[test]
    fn test_round_trip_v1() {
        let fx = fixture();
        let codec = ItemCodec::new(&fx.catalog).format_version(FORMAT_V1).checksum(false);
        let records = vec![record(&fx.song, "a"), record(&fx.song, "b")];

        let data = codec.dump(&records).unwrap();
        assert_eq!(data[4], FORMAT_V1);
        assert_eq!(codec.load(&data).unwrap(), records);
    }

    #[test]
    fn test_empty_list() {
        let fx = fixture();
        let codec = ItemCodec::new(&fx.catalog);
        let data = codec.dump(&[]).unwrap();
        assert!(codec.load(&data).unwrap().is_empty());
    }

    #[test]
    fn test_drops_unresolvable_items() {
        let fx = fixture();
        let records = vec![record(&fx.song, "a"), record(&fx.video, "b"), record(&fx.song, "c")];
        let data = ItemCodec::new(&fx.catalog).dump(&records).unwrap();

        let reduced = fx.catalog.without_modules(&["tests.formats.video"]);
        let report = ItemCodec::new(&reduced).load_with_report(&data).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].get("title"), Some(&Value::from("a")));
        assert_eq!(report.items[1].get("title"), Some(&Value::from("c")));
        assert_eq!(
            report.unresolved[0].qualified_name(),
            "tests.formats.video.Video"
        );
    }

    #[test]
    fn test_all_unresolvable_fails() {
        let fx = fixture();
        let data = ItemCodec::new(&fx.catalog)
            .dump(&[record(&fx.video, "b"), record(&fx.video, "c")])
            .unwrap();

        let reduced = fx.catalog.without_modules(&["tests.formats.video"]);
        assert_eq!(
            ItemCodec::new(&reduced).load(&data),
            Err(SerializationError::AllTypesUnresolvable { dropped: 2 })
        );
    }

    #[test]
    fn test_decode_bypasses_assign_hook() {
        let fx = fixture();
        let data = ItemCodec::new(&fx.catalog)
            .dump(&[record(&fx.song, "a")])
            .unwrap();

        let mut strict = TypeCatalog::new();
        strict.register(
            TypeDef::new("tests.formats.song", "Song")
                .with_assign_hook(|_, _| Err("read only".to_string())),
        );

        let items = ItemCodec::new(&strict).load(&data).unwrap();
        assert_eq!(items[0].get("title"), Some(&Value::from("a")));
        assert!(crate::decoder::decode_graph_strict(&data, &strict).is_err());
    }

    #[test]
    fn test_nested_objects() {
        let fx = fixture();
        let mut ordered = Fields::new();
        ordered.insert("x", Value::Int(1));
        let ordered = Object::instantiate(fx.ordered.clone(), ordered).unwrap();
        let inner = Object::instantiate(fx.video.clone(), Fields::new()).unwrap();

        let mut item = record(&fx.song, "a");
        item.set("~extra", Value::Object(ordered)).unwrap();
        item.set("~inner", Value::Object(inner)).unwrap();

        let data = ItemCodec::new(&fx.catalog).dump(&[item]).unwrap();

        let items = ItemCodec::new(&fx.catalog).load(&data).unwrap();
        let extra = items[0].get("~extra").and_then(Value::as_object).unwrap();
        assert_eq!(extra.class().real(), Some(&fx.ordered));
        let inner = items[0].get("~inner").and_then(Value::as_object).unwrap();
        assert_eq!(inner.class().real(), Some(&fx.video));

        let reduced = fx.catalog.without_modules(&["tests.formats.video"]);
        let items = ItemCodec::new(&reduced).load(&data).unwrap();
        assert_eq!(items[0].get("~inner"), Some(&Value::Map(vec![])));
    }

    #[test]
    fn test_non_list_root() {
        let fx = fixture();
        let data = encode_graph(&Value::Int(3), DUMP_FORMAT_VERSION, true).unwrap();
        assert_eq!(
            ItemCodec::new(&fx.catalog).load(&data),
            Err(SerializationError::MalformedStream(
                CodecError::UnexpectedRoot("int")
            ))
        );
    }

    #[test]
    fn test_non_record_items_are_inconsistent() {
        let fx = fixture();
        let codec = ItemCodec::new(&fx.catalog);

        let data = encode_graph(&Value::List(vec![Value::Int(3)]), DUMP_FORMAT_VERSION, true).unwrap();
        assert!(matches!(
            codec.load(&data),
            Err(SerializationError::InternalInconsistency(_))
        ));

        let foreign = Object::instantiate(fx.ordered.clone(), Fields::new()).unwrap();
        let data = encode_graph(
            &Value::List(vec![Value::Object(foreign)]),
            DUMP_FORMAT_VERSION,
            true,
        )
        .unwrap();
        assert!(matches!(
            codec.load(&data),
            Err(SerializationError::InternalInconsistency(_))
        ));
    }

    #[test]
    fn test_malformed() {
        let fx = fixture();
        let codec = ItemCodec::new(&fx.catalog);
        let data = codec.dump(&[record(&fx.song, "a")]).unwrap();

        assert!(matches!(
            codec.load(&data[..data.len() - 3]),
            Err(SerializationError::MalformedStream(_))
        ));
        assert!(matches!(
            codec.load(b""),
            Err(SerializationError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_dump_rejects_unsupported_version() {
        let fx = fixture();
        let codec = ItemCodec::new(&fx.catalog).format_version(42);
        assert_eq!(
            codec.dump(&[]),
            Err(SerializationError::EncodeRejected(
                CodecError::UnsupportedVersion(42)
            ))
        );
    }

    #[test]
    #[should_panic(expected = "dump expects application records")]
    fn test_dump_asserts_record_type() {
        let fx = fixture();
        let item = Record::new(fx.ordered.clone());
        let _ = ItemCodec::new(&fx.catalog).dump(&[item]);
    }

    #[test]
    fn test_media_helpers() {
        let catalog = media::catalog();
        let mp3 = catalog.lookup("application.formats.mp3", "MP3File").unwrap();
        let item = Record::from_fields(mp3, [("title", Value::from("x"))]).unwrap();

        let data = dump_media_items(std::slice::from_ref(&item)).unwrap();
        assert_eq!(load_media_items(&data).unwrap(), vec![item]);
    }
}
