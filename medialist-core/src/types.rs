//! Core types: type handles, decoded values and records

use crate::error::FieldError;
use core::fmt;
use core::hash::{Hash, Hasher};
use hashbrown::HashMap;
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Field assignment hook run when a real type is instantiated or a field is set
pub type AssignHook = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

/// Definition of a type in the catalog
pub struct TypeDef {
    module: String,
    name: String,
    assign: Option<AssignHook>,
}

impl TypeDef {
    /// Create a new type definition without an assignment hook
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            assign: None,
        }
    }

    /// Attach a hook that validates every field assignment
    pub fn with_assign_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.assign = Some(Arc::new(hook));
        self
    }

    /// Module qualifier, e.g. `application.formats.mp3`
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Type name within the module
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `module.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Run the assignment hook for one field
    pub fn check_field(&self, key: &str, value: &Value) -> Result<(), FieldError> {
        match &self.assign {
            Some(hook) => hook(key, value).map_err(|reason| FieldError {
                type_name: self.qualified_name(),
                key: key.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("has_assign_hook", &self.assign.is_some())
            .finish()
    }
}

/// Shared handle to a catalog type.
///
/// Equality and hashing are by identity: two handles are equal only if they
/// point at the same registered definition.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDef>);

impl TypeHandle {
    /// Wrap a definition
    pub fn new(def: TypeDef) -> Self {
        Self(Arc::new(def))
    }

    /// Whether both handles refer to the same definition
    pub fn ptr_eq(&self, other: &TypeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl core::ops::Deref for TypeHandle {
    type Target = TypeDef;

    fn deref(&self) -> &TypeDef {
        &self.0
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.qualified_name())
    }
}

/// Stand-in type used while a graph is being decoded.
///
/// Objects of a placeholder class hold their fields as a plain ordered
/// mapping; no assignment hook runs for them.
#[derive(Debug)]
pub struct PlaceholderType {
    name: String,
    deferred_real_type: Option<TypeHandle>,
}

impl PlaceholderType {
    /// The base placeholder for references that could not be resolved
    pub fn universal() -> Arc<Self> {
        Arc::new(Self {
            name: "placeholder".to_string(),
            deferred_real_type: None,
        })
    }

    /// A placeholder subtype standing in for `real`
    pub fn deferred(real: &TypeHandle) -> Arc<Self> {
        Arc::new(Self {
            name: real.name().to_string(),
            deferred_real_type: Some(real.clone()),
        })
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this placeholder becomes after decoding
    pub fn deferred_real_type(&self) -> Option<&TypeHandle> {
        self.deferred_real_type.as_ref()
    }
}

/// The class an object was instantiated from
#[derive(Debug, Clone)]
pub enum Class {
    /// A catalog type, instantiated normally
    Real(TypeHandle),
    /// A decode-time placeholder
    Placeholder(Arc<PlaceholderType>),
}

impl Class {
    /// Human readable name
    pub fn name(&self) -> String {
        match self {
            Class::Real(ty) => ty.qualified_name(),
            Class::Placeholder(p) => format!("<placeholder {}>", p.name()),
        }
    }

    /// The real type, if this is not a placeholder
    pub fn real(&self) -> Option<&TypeHandle> {
        match self {
            Class::Real(ty) => Some(ty),
            Class::Placeholder(_) => None,
        }
    }

    /// Check if this is a placeholder class
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Class::Placeholder(_))
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Class::Real(a), Class::Real(b)) => a == b,
            (Class::Placeholder(a), Class::Placeholder(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Ordered key→value field storage.
///
/// Keys keep their first insertion position; a key index makes lookups and
/// inserts constant time.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Fields {
    /// Create an empty field set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Insert a field, replacing an existing value in place.
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => Some(core::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a field, keeping the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Iterate over fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over field values mutably
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// An instance of a class inside a decoded graph
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub(crate) class: Class,
    pub(crate) fields: Fields,
}

impl Object {
    /// Instantiate a real type, running its assignment hook for every field
    pub fn instantiate(ty: TypeHandle, fields: Fields) -> Result<Self, FieldError> {
        for (key, value) in fields.iter() {
            ty.check_field(key, value)?;
        }
        Ok(Self {
            class: Class::Real(ty),
            fields,
        })
    }

    /// Build a placeholder object; fields are stored as-is
    pub(crate) fn placeholder(placeholder: Arc<PlaceholderType>, fields: Fields) -> Self {
        Self {
            class: Class::Placeholder(placeholder),
            fields,
        }
    }

    /// The object's class
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// The object's fields
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Set a field; real classes validate it first
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>, FieldError> {
        let key = key.into();
        if let Class::Real(ty) = &self.class {
            ty.check_field(&key, &value)?;
        }
        Ok(self.fields.insert(key, value))
    }
}

/// A value in a decoded object graph
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Str(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Ordered sequence
    List(Vec<Value>),
    /// Ordered mapping with arbitrary keys
    Map(Vec<(Value, Value)>),
    /// Class instance
    Object(Object),
}

impl Value {
    /// Short name of the variant, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Text content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Object content, if this is an object
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

/// A media item record: a catalog type plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: TypeHandle,
    fields: Fields,
}

impl Record {
    /// Create an empty record of type `ty`
    pub fn new(ty: TypeHandle) -> Self {
        Self {
            ty,
            fields: Fields::new(),
        }
    }

    /// Create a record, assigning each field through the type's hook
    pub fn from_fields<I, K>(ty: TypeHandle, fields: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut record = Self::new(ty);
        for (key, value) in fields {
            record.set(key, value)?;
        }
        Ok(record)
    }

    /// Adopt already-decoded fields without running the assignment hook
    pub(crate) fn from_raw_parts(ty: TypeHandle, fields: Fields) -> Self {
        Self { ty, fields }
    }

    /// Set a field through the type's assignment hook
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>, FieldError> {
        let key = key.into();
        self.ty.check_field(&key, &value)?;
        Ok(self.fields.insert(key, value))
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// The record's type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// The record's fields
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) if entries.iter().all(|(k, _)| k.as_str().is_some()) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            // Non-text keys have no JSON object form; emit [key, value] pairs
            Value::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (k, v) in entries {
                    seq.serialize_element(&(k, v))?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.fields.len() + 1))?;
                map.serialize_entry("__type__", &obj.class.name())?;
                for (k, v) in obj.fields.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Record", 2)?;
        s.serialize_field("type", &self.ty.qualified_name())?;
        s.serialize_field("fields", &self.fields)?;
        s.end()
    }
}
