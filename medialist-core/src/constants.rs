//! Constants and limits for the media list wire format

/// Stream marker - 4 bytes identifying a packed item list
pub const STREAM_MARKER: &[u8; 4] = b"MLPK";

/// Format version 1: every object carries an inline class definition
pub const FORMAT_V1: u8 = 1;

/// Format version 2: class definitions are memoized and referenced by index
pub const FORMAT_V2: u8 = 2;

/// Oldest format version the decoder understands
pub const MIN_FORMAT_VERSION: u8 = FORMAT_V1;

/// Newest format version the decoder understands
pub const MAX_FORMAT_VERSION: u8 = FORMAT_V2;

/// Version tag `dump` always writes.
///
/// Pinned rather than following `MAX_FORMAT_VERSION`, so stored lists only
/// change layout when this constant is bumped on purpose.
pub const DUMP_FORMAT_VERSION: u8 = FORMAT_V2;

/// Header size: marker (4) + version (1) + flags (1)
pub const HEADER_SIZE: usize = 6;

/// Size of CRC32C checksum in bytes
pub const CRC32C_SIZE: usize = 4;

/// Maximum nesting depth of lists, maps and objects
pub const MAX_DEPTH: usize = 256;

/// Namespaces whose types are application records rather than foreign containers
pub const DEFAULT_RESERVED_NAMESPACES: &[&str] = &["application", "tests"];

/// Opcodes of the tagged object stream
pub mod opcode {
    /// Null value
    pub const NONE: u8 = b'N';
    /// Boolean true
    pub const TRUE: u8 = b'T';
    /// Boolean false
    pub const FALSE: u8 = b'F';
    /// Signed 64-bit integer, big-endian
    pub const INT: u8 = b'I';
    /// IEEE-754 double, big-endian
    pub const FLOAT: u8 = b'D';
    /// UTF-8 string with u32 length prefix
    pub const STR: u8 = b'S';
    /// Raw bytes with u32 length prefix
    pub const BYTES: u8 = b'B';
    /// List with u32 item count
    pub const LIST: u8 = b'L';
    /// Ordered map with u32 entry count
    pub const MAP: u8 = b'M';
    /// Object: class reference, u32 field count, then (key, value) pairs
    pub const OBJECT: u8 = b'O';
    /// Class definition: module string, name string
    pub const CLASS: u8 = b'C';
    /// Reference into the class table (version 2 only)
    pub const GET_CLASS: u8 = b'G';
    /// End of stream
    pub const STOP: u8 = b'.';
}

/// Flags for stream options (stored as a single byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatFlags(u8);

impl FormatFlags {
    /// No flags set
    pub const NONE: u8 = 0b0000_0000;

    /// Stream has a CRC32C trailer
    pub const HAS_CRC32C: u8 = 0b0000_0001;

    /// All flag bits this implementation knows about
    pub const KNOWN: u8 = Self::HAS_CRC32C;

    /// Create new flags from raw byte
    pub const fn new(flags: u8) -> Self {
        Self(flags)
    }

    /// Get raw flags byte
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Check if CRC32C trailer is present
    pub const fn has_crc32c(&self) -> bool {
        (self.0 & Self::HAS_CRC32C) != 0
    }

    /// Bits set that this implementation does not understand
    pub const fn unknown_bits(&self) -> u8 {
        self.0 & !Self::KNOWN
    }

    /// Size of the trailer in bytes
    pub const fn trailer_size(&self) -> usize {
        if self.has_crc32c() {
            CRC32C_SIZE
        } else {
            0
        }
    }
}

impl Default for FormatFlags {
    fn default() -> Self {
        Self(Self::HAS_CRC32C)
    }
}

/// Whether `version` is one the decoder can dispatch on
pub const fn is_supported_version(version: u8) -> bool {
    version >= MIN_FORMAT_VERSION && version <= MAX_FORMAT_VERSION
}
