//! Object graph encoding

use crate::constants::{
    is_supported_version, opcode, FormatFlags, FORMAT_V2, HEADER_SIZE, MAX_DEPTH, STREAM_MARKER,
};
use crate::error::CodecError;
use crate::types::{Class, Fields, TypeHandle, Value};
use bytes::{BufMut, Bytes, BytesMut};
use hashbrown::HashMap;

/// Streaming encoder for the tagged object format
///
/// The stream is encoded with the following layout:
/// 1. Marker (4 bytes): "MLPK"
/// 2. Version (1 byte)
/// 3. Flags (1 byte)
/// 4. Opcode stream holding exactly one root value, then the stop opcode
/// 5. Trailer (optional, CRC32C over everything before it)
///
/// Lists are written with [`begin_list`](Self::begin_list) followed by their
/// items, so large item lists never need an intermediate [`Value::List`].
pub struct GraphEncoder {
    version: u8,
    flags: FormatFlags,
    body: BytesMut,
    classes: HashMap<TypeHandle, u32>,
    depth: usize,
}

impl GraphEncoder {
    /// Create an encoder writing format `version`, with a CRC32C trailer
    pub fn new(version: u8) -> Result<Self, CodecError> {
        if !is_supported_version(version) {
            return Err(CodecError::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            flags: FormatFlags::default(),
            body: BytesMut::new(),
            classes: HashMap::new(),
            depth: 0,
        })
    }

    /// Enable or disable the CRC32C trailer
    pub fn with_crc32c(mut self, enabled: bool) -> Self {
        let bits = if enabled {
            FormatFlags::HAS_CRC32C
        } else {
            FormatFlags::NONE
        };
        self.flags = FormatFlags::new(bits);
        self
    }

    /// Open a list of `len` items; the caller writes exactly `len` values next
    pub fn begin_list(&mut self, len: usize) -> Result<(), CodecError> {
        self.enter()?;
        self.body.put_u8(opcode::LIST);
        self.put_len(len)
    }

    /// Close the innermost list opened with [`begin_list`](Self::begin_list)
    pub fn end_list(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Write an instance of a real type
    pub fn write_object(&mut self, ty: &TypeHandle, fields: &Fields) -> Result<(), CodecError> {
        self.enter()?;
        self.body.put_u8(opcode::OBJECT);
        self.write_class(ty)?;
        self.put_len(fields.len())?;
        for (key, value) in fields.iter() {
            self.put_str(key)?;
            self.write_value(value)?;
        }
        self.depth -= 1;
        Ok(())
    }

    /// Write any value
    pub fn write_value(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Null => self.body.put_u8(opcode::NONE),
            Value::Bool(true) => self.body.put_u8(opcode::TRUE),
            Value::Bool(false) => self.body.put_u8(opcode::FALSE),
            Value::Int(i) => {
                self.body.put_u8(opcode::INT);
                self.body.put_i64(*i);
            }
            Value::Float(f) => {
                self.body.put_u8(opcode::FLOAT);
                self.body.put_f64(*f);
            }
            Value::Str(s) => {
                self.body.put_u8(opcode::STR);
                self.put_str(s)?;
            }
            Value::Bytes(b) => {
                self.body.put_u8(opcode::BYTES);
                self.put_len(b.len())?;
                self.body.put_slice(b);
            }
            Value::List(items) => {
                self.begin_list(items.len())?;
                for item in items {
                    self.write_value(item)?;
                }
                self.end_list();
            }
            Value::Map(entries) => {
                self.enter()?;
                self.body.put_u8(opcode::MAP);
                self.put_len(entries.len())?;
                for (k, v) in entries {
                    self.write_value(k)?;
                    self.write_value(v)?;
                }
                self.depth -= 1;
            }
            Value::Object(obj) => match obj.class() {
                Class::Real(ty) => self.write_object(ty, obj.fields())?,
                Class::Placeholder(_) => {
                    return Err(CodecError::UnencodableClass(obj.class().name()));
                }
            },
        }
        Ok(())
    }

    /// Append the stop opcode, header and trailer
    pub fn finish(self) -> Bytes {
        let trailer_size = self.flags.trailer_size();
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.body.len() + 1 + trailer_size);

        buf.put_slice(STREAM_MARKER);
        buf.put_u8(self.version);
        buf.put_u8(self.flags.as_u8());
        buf.put_slice(&self.body);
        buf.put_u8(opcode::STOP);

        if self.flags.has_crc32c() {
            let checksum = crc32c::crc32c(&buf);
            buf.put_u32(checksum);
        }

        buf.freeze()
    }

    fn write_class(&mut self, ty: &TypeHandle) -> Result<(), CodecError> {
        if self.version >= FORMAT_V2 {
            if let Some(&index) = self.classes.get(ty) {
                self.body.put_u8(opcode::GET_CLASS);
                self.body.put_u32(index);
                return Ok(());
            }
            let index = u32::try_from(self.classes.len())
                .map_err(|_| CodecError::LengthOverflow(self.classes.len()))?;
            self.classes.insert(ty.clone(), index);
        }

        self.body.put_u8(opcode::CLASS);
        self.put_str(ty.module())?;
        self.put_str(ty.name())
    }

    fn enter(&mut self) -> Result<(), CodecError> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::DepthExceeded(MAX_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn put_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.body.put_u32(len);
        Ok(())
    }

    fn put_str(&mut self, s: &str) -> Result<(), CodecError> {
        self.put_len(s.len())?;
        self.body.put_slice(s.as_bytes());
        Ok(())
    }
}

/// Encode a complete value graph
pub fn encode_graph(root: &Value, version: u8, with_crc32c: bool) -> Result<Bytes, CodecError> {
    let mut encoder = GraphEncoder::new(version)?.with_crc32c(with_crc32c);
    encoder.write_value(root)?;
    Ok(encoder.finish())
}
