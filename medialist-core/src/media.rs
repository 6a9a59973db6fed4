//! Default catalog of media item record types

use crate::catalog::TypeCatalog;
use crate::types::{TypeDef, Value};
use std::sync::OnceLock;

/// Module holding the base audio file record
pub const AUDIO_MODULE: &str = "application.formats._audio";

/// Base record type for every media item
pub const AUDIO_FILE: &str = "AudioFile";

/// Module path the base record lived under in older lists
pub const LEGACY_AUDIO_MODULE: &str = "application.formats.audio";

/// Format record types: (module, name)
pub const FORMAT_TYPES: &[(&str, &str)] = &[
    ("application.formats.mp3", "MP3File"),
    ("application.formats.xiph", "OggFile"),
    ("application.formats.xiph", "FLACFile"),
    ("application.formats.mp4", "MP4File"),
    ("application.formats.remote", "RemoteFile"),
];

/// Foreign container types that may appear inside item fields: (module, name)
pub const CONTAINER_TYPES: &[(&str, &str)] = &[
    ("collections", "OrderedDict"),
    ("collections", "deque"),
];

/// Tag assignment rules shared by every media record type.
///
/// Keys must be non-empty and free of `=` and newlines. Values of regular
/// tags are text, numbers or booleans; internal keys (leading `~`) may hold
/// anything.
pub fn check_tag(key: &str, value: &Value) -> Result<(), String> {
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if key.contains('=') || key.contains('\n') {
        return Err("key contains '=' or a newline".to_string());
    }
    if key.starts_with('~') {
        return Ok(());
    }
    match value {
        Value::Str(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(()),
        other => Err(format!("tag values must be text or numbers, got {}", other.kind_name())),
    }
}

/// Build a fresh media catalog
pub fn build_catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();

    let audio = catalog.register(TypeDef::new(AUDIO_MODULE, AUDIO_FILE).with_assign_hook(check_tag));
    catalog.register_alias(LEGACY_AUDIO_MODULE, AUDIO_FILE, &audio);

    for (module, name) in FORMAT_TYPES {
        catalog.register(TypeDef::new(*module, *name).with_assign_hook(check_tag));
    }

    for (module, name) in CONTAINER_TYPES {
        catalog.register(TypeDef::new(*module, *name));
    }

    catalog
}

/// Shared media catalog
pub fn catalog() -> &'static TypeCatalog {
    static CATALOG: OnceLock<TypeCatalog> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}
