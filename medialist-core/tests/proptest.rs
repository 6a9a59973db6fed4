//! Property-based tests using proptest

use medialist_core::{
    catalog::TypeCatalog,
    constants::{FORMAT_V1, FORMAT_V2},
    decoder::decode_graph_strict,
    types::{TypeDef, TypeHandle, Value},
    ItemCodec, Record, SerializationError,
};
use proptest::prelude::*;

fn fixture() -> (TypeCatalog, Vec<TypeHandle>) {
    let mut catalog = TypeCatalog::new();
    let types = vec![
        catalog.register(TypeDef::new("tests.formats.a", "A")),
        catalog.register(TypeDef::new("tests.formats.b", "B")),
        catalog.register(TypeDef::new("tests.formats.c", "C")),
    ];
    (catalog, types)
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        ".{0,16}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec((inner.clone(), inner), 0..4).prop_map(Value::Map),
        ]
    })
}

/// (type index, fields) per record
fn item_specs() -> impl Strategy<Value = Vec<(usize, Vec<(String, Value)>)>> {
    prop::collection::vec(
        (0usize..3, prop::collection::vec(("[a-z~#]{1,8}", value()), 0..5)),
        0..8,
    )
}

fn build(types: &[TypeHandle], specs: Vec<(usize, Vec<(String, Value)>)>) -> Vec<Record> {
    specs
        .into_iter()
        .map(|(ty, fields)| Record::from_fields(types[ty].clone(), fields).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn prop_round_trip_dump_load(specs in item_specs(), v1 in any::<bool>(), crc in any::<bool>()) {
        let (catalog, types) = fixture();
        let records = build(&types, specs);
        let version = if v1 { FORMAT_V1 } else { FORMAT_V2 };
        let codec = ItemCodec::new(&catalog).format_version(version).checksum(crc);

        let data = codec.dump(&records).unwrap();
        let loaded = codec.load(&data).unwrap();

        prop_assert_eq!(loaded, records);
    }

    #[test]
    fn prop_missing_type_drops_exactly_its_items(specs in item_specs(), missing in 0usize..3) {
        let (catalog, types) = fixture();
        let records = build(&types, specs);
        let data = ItemCodec::new(&catalog).dump(&records).unwrap();

        let module = types[missing].module().to_string();
        let reduced = catalog.without_modules(&[module]);
        let expected: Vec<Record> = records
            .iter()
            .filter(|r| !r.ty().ptr_eq(&types[missing]))
            .cloned()
            .collect();

        match ItemCodec::new(&reduced).load(&data) {
            Ok(loaded) => prop_assert_eq!(loaded, expected),
            Err(SerializationError::AllTypesUnresolvable { dropped }) => {
                prop_assert!(expected.is_empty());
                prop_assert_eq!(dropped, records.len());
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }

    #[test]
    fn prop_load_never_panics(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let (catalog, _) = fixture();
        let _ = ItemCodec::new(&catalog).load(&data);
        let _ = decode_graph_strict(&data, &catalog);
    }

    #[test]
    fn prop_load_never_panics_after_header(tail in prop::collection::vec(any::<u8>(), 0..1024)) {
        let (catalog, _) = fixture();
        let mut data = b"MLPK\x02\x00".to_vec();
        data.extend_from_slice(&tail);
        let _ = ItemCodec::new(&catalog).load(&data);
    }

    #[test]
    fn prop_truncation_is_rejected(
        specs in item_specs(),
        cut in any::<prop::sample::Index>(),
        crc in any::<bool>()
    ) {
        let (catalog, types) = fixture();
        let records = build(&types, specs);
        let codec = ItemCodec::new(&catalog).checksum(crc);
        let data = codec.dump(&records).unwrap();

        let at = cut.index(data.len());
        let result = codec.load(&data[..at]);
        prop_assert!(
            matches!(result, Err(SerializationError::MalformedStream(_))),
            "cut at {} of {} (crc {}) gave {:?}",
            at,
            data.len(),
            crc,
            result
        );
    }
}
