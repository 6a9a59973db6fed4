//! Object graph decoding

use crate::catalog::TypeCatalog;
use crate::constants::{
    is_supported_version, opcode, FormatFlags, CRC32C_SIZE, FORMAT_V2, HEADER_SIZE, MAX_DEPTH,
    STREAM_MARKER,
};
use crate::error::{CodecError, LookupError};
use crate::types::{Class, Fields, Object, TypeHandle, Value};
use bytes::Buf;

/// Catalog lookup handed to a resolve hook as its fallback
pub type Lookup<'a> = dyn Fn(&str, &str) -> Result<TypeHandle, LookupError> + 'a;

/// Parsed stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Format version
    pub version: u8,
    /// Stream flags
    pub flags: FormatFlags,
}

/// Read and validate the fixed-size header
pub fn read_header(data: &[u8]) -> Result<StreamHeader, CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::Truncated {
            offset: 0,
            needed: HEADER_SIZE,
            available: data.len(),
        });
    }

    if &data[0..4] != STREAM_MARKER {
        let mut bad = [0u8; 4];
        bad.copy_from_slice(&data[0..4]);
        return Err(CodecError::BadMarker(bad));
    }

    let version = data[4];
    if !is_supported_version(version) {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let flags = FormatFlags::new(data[5]);
    if flags.unknown_bits() != 0 {
        return Err(CodecError::UnknownFlags(flags.unknown_bits()));
    }

    Ok(StreamHeader { version, flags })
}

/// Resolve hook that accepts only catalog types, failing on the first miss
pub fn strict_hook(module: &str, name: &str, lookup: &Lookup<'_>) -> Result<Class, LookupError> {
    lookup(module, name).map(Class::Real)
}

/// Decode a stream, resolving every class reference through `hook`.
///
/// The hook receives the referenced module and name plus the catalog lookup
/// and decides which class the decoder instantiates. Real classes run their
/// assignment hook for each field; placeholder classes take fields as-is.
pub fn decode_graph<H>(data: &[u8], catalog: &TypeCatalog, hook: H) -> Result<Value, CodecError>
where
    H: FnMut(&str, &str, &Lookup<'_>) -> Result<Class, LookupError>,
{
    let header = read_header(data)?;

    let mut end = data.len();
    if header.flags.has_crc32c() {
        if data.len() < HEADER_SIZE + CRC32C_SIZE {
            return Err(CodecError::Truncated {
                offset: HEADER_SIZE,
                needed: CRC32C_SIZE,
                available: data.len() - HEADER_SIZE,
            });
        }
        end -= CRC32C_SIZE;
        let expected = u32::from_be_bytes([data[end], data[end + 1], data[end + 2], data[end + 3]]);
        let actual = crc32c::crc32c(&data[..end]);
        if actual != expected {
            return Err(CodecError::ChecksumMismatch { expected, actual });
        }
    }

    let mut reader = StreamReader {
        buf: &data[HEADER_SIZE..end],
        base: HEADER_SIZE,
        len: end - HEADER_SIZE,
        version: header.version,
        catalog,
        hook,
        classes: Vec::new(),
    };

    let root = reader.read_value(0)?;
    reader.expect_stop()?;
    Ok(root)
}

/// Decode a stream with [`strict_hook`]
pub fn decode_graph_strict(data: &[u8], catalog: &TypeCatalog) -> Result<Value, CodecError> {
    decode_graph(data, catalog, strict_hook)
}

struct StreamReader<'a, H> {
    buf: &'a [u8],
    base: usize,
    len: usize,
    version: u8,
    catalog: &'a TypeCatalog,
    hook: H,
    classes: Vec<Class>,
}

impl<'a, H> StreamReader<'a, H>
where
    H: FnMut(&str, &str, &Lookup<'_>) -> Result<Class, LookupError>,
{
    fn offset(&self) -> usize {
        self.base + self.len - self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<(), CodecError> {
        if self.buf.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.offset(),
                needed: n,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    fn len_prefix(&mut self) -> Result<usize, CodecError> {
        Ok(self.u32()? as usize)
    }

    fn raw(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.len_prefix()?;
        self.need(len)?;
        let buf: &'a [u8] = self.buf;
        let (head, tail) = buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let offset = self.offset();
        let raw = self.raw()?;
        core::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8(offset))
    }

    fn enter(depth: usize) -> Result<usize, CodecError> {
        if depth >= MAX_DEPTH {
            return Err(CodecError::DepthExceeded(MAX_DEPTH));
        }
        Ok(depth + 1)
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, CodecError> {
        let offset = self.offset();
        let op = self.u8()?;

        let value = match op {
            opcode::NONE => Value::Null,
            opcode::TRUE => Value::Bool(true),
            opcode::FALSE => Value::Bool(false),
            opcode::INT => {
                self.need(8)?;
                Value::Int(self.buf.get_i64())
            }
            opcode::FLOAT => {
                self.need(8)?;
                Value::Float(self.buf.get_f64())
            }
            opcode::STR => Value::Str(self.string()?),
            opcode::BYTES => Value::Bytes(self.raw()?.to_vec()),
            opcode::LIST => {
                let depth = Self::enter(depth)?;
                let count = self.len_prefix()?;
                // Counts come from the stream; containers grow as items actually decode.
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.read_value(depth)?);
                }
                Value::List(items)
            }
            opcode::MAP => {
                let depth = Self::enter(depth)?;
                let count = self.len_prefix()?;
                let mut entries = Vec::new();
                for _ in 0..count {
                    let key = self.read_value(depth)?;
                    let value = self.read_value(depth)?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
            opcode::OBJECT => {
                let depth = Self::enter(depth)?;
                let class = self.read_class()?;
                let count = self.len_prefix()?;
                let mut fields = Fields::new();
                for _ in 0..count {
                    let key = self.string()?;
                    let value = self.read_value(depth)?;
                    fields.insert(key, value);
                }
                let object = match class {
                    Class::Real(ty) => Object::instantiate(ty, fields)?,
                    Class::Placeholder(p) => Object::placeholder(p, fields),
                };
                Value::Object(object)
            }
            other => {
                return Err(CodecError::UnknownOpcode {
                    opcode: other,
                    offset,
                })
            }
        };

        Ok(value)
    }

    fn read_class(&mut self) -> Result<Class, CodecError> {
        let offset = self.offset();
        match self.u8()? {
            opcode::CLASS => {
                let module = self.string()?;
                let name = self.string()?;
                let catalog = self.catalog;
                let lookup: &Lookup<'_> = &|m, n| catalog.lookup(m, n);
                let class = (self.hook)(&module, &name, lookup)?;
                self.classes.push(class.clone());
                Ok(class)
            }
            opcode::GET_CLASS if self.version >= FORMAT_V2 => {
                let index = self.u32()?;
                self.classes
                    .get(index as usize)
                    .cloned()
                    .ok_or(CodecError::BadClassRef(index))
            }
            other => Err(CodecError::UnknownOpcode {
                opcode: other,
                offset,
            }),
        }
    }

    fn expect_stop(&mut self) -> Result<(), CodecError> {
        if !self.buf.has_remaining() {
            return Err(CodecError::MissingStop);
        }
        let offset = self.offset();
        let op = self.buf.get_u8();
        if op != opcode::STOP {
            return Err(CodecError::UnknownOpcode { opcode: op, offset });
        }
        if self.buf.has_remaining() {
            return Err(CodecError::TrailingBytes(self.buf.remaining()));
        }
        Ok(())
    }
}
