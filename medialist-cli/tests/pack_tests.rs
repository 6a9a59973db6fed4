use std::fs;
use tempfile::tempdir;

use medialist_cli::commands::pack;
use medialist_core::constants::{FORMAT_V1, FORMAT_V2};
use medialist_core::decoder::read_header;
use medialist_core::{load_media_items, media, Value};

fn write_file<P: AsRef<std::path::Path>>(p: P, s: &str) {
    fs::write(p, s.as_bytes()).unwrap();
}

const LIBRARY: &str = r#"[
  {"type": "application.formats.mp3.MP3File",
   "fields": {"title": "Intro", "artist": "Band", "~filename": "/music/01.mp3", "~#length": 184}},
  {"type": "application.formats.xiph.OggFile",
   "fields": {"title": "Outro", "~#rating": 0.8}}
]"#;

#[test]
fn pack_library_default_format() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("library.json");
    let out_path = td.path().join("library.mlp");
    write_file(&in_path, LIBRARY);

    pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), FORMAT_V2, true).unwrap();

    let bytes = fs::read(&out_path).unwrap();
    let header = read_header(&bytes).unwrap();
    assert_eq!(header.version, FORMAT_V2);
    assert!(header.flags.has_crc32c());

    let items = load_media_items(&bytes).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].ty().name(), "MP3File");
    assert_eq!(items[0].get("title"), Some(&Value::from("Intro")));
    assert_eq!(items[0].get("~#length"), Some(&Value::Int(184)));
    assert_eq!(items[1].ty().name(), "OggFile");
    assert_eq!(items[1].get("~#rating"), Some(&Value::Float(0.8)));
}

#[test]
fn pack_version_one_without_checksum() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("library.json");
    let out_path = td.path().join("library_v1.mlp");
    write_file(&in_path, LIBRARY);

    pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), FORMAT_V1, false).unwrap();

    let bytes = fs::read(&out_path).unwrap();
    let header = read_header(&bytes).unwrap();
    assert_eq!(header.version, FORMAT_V1);
    assert!(!header.flags.has_crc32c());
    assert_eq!(load_media_items(&bytes).unwrap().len(), 2);
}

#[test]
fn pack_rejects_unknown_type() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("bad.json");
    let out_path = td.path().join("bad.mlp");
    write_file(&in_path, r#"[{"type": "application.formats.wma.WMAFile", "fields": {}}]"#);

    let err = pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), FORMAT_V2, true)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("unknown type"));
    assert!(!out_path.exists());
}

#[test]
fn pack_rejects_container_as_item() {
    let specs: Vec<pack::ItemSpec> =
        serde_json::from_str(r#"[{"type": "collections.OrderedDict"}]"#).unwrap();

    let err = pack::build_records(media::catalog(), specs).unwrap_err();
    assert!(err.to_string().contains("not a media item type"));
}

#[test]
fn pack_rejects_invalid_tag() {
    let specs: Vec<pack::ItemSpec> = serde_json::from_str(
        r#"[{"type": "application.formats.mp3.MP3File", "fields": {"bad=key": "x"}}]"#,
    )
    .unwrap();

    let err = pack::build_records(media::catalog(), specs).unwrap_err();
    assert!(format!("{:#}", err).contains("invalid fields"));
}

#[test]
fn json_objects_become_text_keyed_maps() {
    let value = pack::json_to_value(serde_json::json!({"a": [1, 2.5, null], "b": true}));

    assert_eq!(
        value,
        Value::Map(vec![
            (
                Value::from("a"),
                Value::List(vec![Value::Int(1), Value::Float(2.5), Value::Null])
            ),
            (Value::from("b"), Value::Bool(true)),
        ])
    );
}
