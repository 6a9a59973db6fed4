//! Error types for media list operations

use thiserror::Error;

/// A type reference the catalog could not resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No type is registered under the module qualifier
    #[error("No module named {0:?}")]
    ModuleNotFound(String),

    /// The module exists but does not define the name
    #[error("Module {module:?} has no type {name:?}")]
    NameNotFound {
        /// The module qualifier that was found.
        module: String,
        /// The missing type name.
        name: String,
    },
}

/// A record type refused a field assignment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{type_name} rejected field {key:?}: {reason}")]
pub struct FieldError {
    /// Qualified name of the rejecting type.
    pub type_name: String,
    /// The field key.
    pub key: String,
    /// Why the assignment was refused.
    pub reason: String,
}

/// Errors raised by the generic tagged-object codec
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Invalid stream marker detected
    #[error("Invalid stream marker: expected MLPK, got {0:?}")]
    BadMarker([u8; 4]),

    /// Unsupported format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// Flag bits this implementation does not understand
    #[error("Unknown format flags: {0:#010b}")]
    UnknownFlags(u8),

    /// Not enough data
    #[error("Truncated stream at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Offset where the read started.
        offset: usize,
        /// The number of bytes needed.
        needed: usize,
        /// The number of bytes actually left.
        available: usize,
    },

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:x}, got {actual:x}")]
    ChecksumMismatch {
        /// The checksum stored in the trailer.
        expected: u32,
        /// The checksum calculated over the stream.
        actual: u32,
    },

    /// Opcode not valid at this position
    #[error("Unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode {
        /// The offending byte.
        opcode: u8,
        /// Offset of the opcode.
        offset: usize,
    },

    /// Class table reference out of range
    #[error("Class reference {0} is not defined")]
    BadClassRef(u32),

    /// String payload is not UTF-8
    #[error("Invalid UTF-8 at offset {0}")]
    InvalidUtf8(usize),

    /// Lists, maps or objects nested too deeply
    #[error("Nesting depth exceeds maximum {0}")]
    DepthExceeded(usize),

    /// Data left after the stop opcode
    #[error("{0} trailing bytes after end of stream")]
    TrailingBytes(usize),

    /// Stream ended without a stop opcode
    #[error("Missing stop opcode")]
    MissingStop,

    /// The decoded root is not a list
    #[error("Expected a list at the root, got {0}")]
    UnexpectedRoot(&'static str),

    /// A class reference could not be resolved
    #[error("Unresolved class: {0}")]
    Unresolved(#[from] LookupError),

    /// A real type refused a decoded field
    #[error(transparent)]
    FieldRejected(#[from] FieldError),

    /// Placeholder classes only exist while decoding
    #[error("Cannot encode placeholder class {0}")]
    UnencodableClass(String),

    /// Length does not fit the u32 prefix
    #[error("Length {0} exceeds the format limit")]
    LengthOverflow(usize),
}

/// The single error kind crossing the `load`/`dump` boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializationError {
    /// The byte buffer is not a valid encoding
    #[error("Malformed item list: {0}")]
    MalformedStream(#[source] CodecError),

    /// Every item failed type resolution
    #[error("All class lookups failed ({dropped} items), something is wrong")]
    AllTypesUnresolvable {
        /// Number of items that were dropped.
        dropped: usize,
    },

    /// A decoded item escaped reclassification
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The encoder refused the item list
    #[error("Encoder rejected item list: {0}")]
    EncodeRejected(#[source] CodecError),
}
