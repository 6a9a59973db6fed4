//! # Medialist Core
//!
//! A fault-tolerant binary codec for lists of versioned media item records.
//!
//! Lists written by one build may be read by another that no longer ships
//! every record type (a format plugin was removed, a type moved). Loading
//! recovers every item whose type still resolves and drops the rest.
//!
//! ## Modules
//!
//! - `constants`: Wire format constants and limits
//! - `types`: Core types (Value, Record, TypeHandle, Class)
//! - `catalog`: Type registry consulted while decoding
//! - `encoder`: Tagged object graph encoding
//! - `decoder`: Tagged object graph decoding with a class resolve hook
//! - `resolver`: Placeholder-substituting resolve hook
//! - `serialize`: Tolerant `load` and `dump` of record lists
//! - `media`: Default media item catalog

#![warn(missing_docs)]

pub mod catalog;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod media;
pub mod resolver;
pub mod serialize;
pub mod types;

// Re-export commonly used types
pub use catalog::TypeCatalog;
pub use error::{CodecError, FieldError, LookupError, SerializationError};
pub use resolver::{ReservedNamespaces, TypeResolver};
pub use serialize::{dump_media_items, load_media_items, ItemCodec, LoadReport};
pub use types::{Class, Fields, Object, Record, TypeDef, TypeHandle, Value};

/// Result type alias for load/dump operations
pub type Result<T> = core::result::Result<T, SerializationError>;
