//! Schema-driven records for callers that describe types at runtime instead of deriving them.
//!
//! A [`RecordSchema`] lists wire fields with a closed [`WireKind`] each; [`Value`] is the
//! matching dynamic data. For the same field list the bytes are identical to what
//! `#[derive(CborEncode)]` produces.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::bigint::BigInt;
use crate::cid::Cid;
use crate::codec::{CborDecode, CborEncode};
use crate::decode::Decoder;
use crate::deferred::Deferred;
use crate::encode::Encoder;
use crate::order::{canonical_permutation, cmp_text_keys};
use crate::record::{expect_tuple, read_field_key, read_record_len, skip_unknown_field};
use crate::{CborError, ErrorCode, Representation};

/// Integer width for [`WireKind::UInt`] and [`WireKind::Int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 8 bits.
    W8,
    /// 16 bits.
    W16,
    /// 32 bits.
    W32,
    /// 64 bits.
    W64,
}

impl Width {
    const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    const fn umax(self) -> u64 {
        u64::MAX >> (64 - self.bits())
    }

    const fn imin(self) -> i64 {
        i64::MIN >> (64 - self.bits())
    }

    const fn imax(self) -> i64 {
        i64::MAX >> (64 - self.bits())
    }
}

/// The closed set of field kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireKind {
    /// Unsigned integer of the given width.
    UInt(Width),
    /// Signed integer of the given width.
    Int(Width),
    /// Byte string; `fixed` requires an exact length.
    Bytes {
        /// Required length, if any.
        fixed: Option<usize>,
    },
    /// UTF-8 text string.
    Text,
    /// Boolean.
    Bool,
    /// Array of one element kind; `fixed` requires an exact length.
    Array {
        /// Element kind.
        elem: Box<WireKind>,
        /// Required length, if any.
        fixed: Option<usize>,
    },
    /// Text-keyed map of one value kind.
    Map(Box<WireKind>),
    /// Nested record.
    Struct(Arc<RecordSchema>),
    /// Content identifier link.
    Cid,
    /// Non-negative bignum.
    BigInt,
    /// Raw captured value.
    Deferred,
    /// `null` when absent.
    Optional(Box<WireKind>),
}

/// Dynamic data matching a [`WireKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Absent [`WireKind::Optional`].
    Null,
    /// [`WireKind::Bool`].
    Bool(bool),
    /// [`WireKind::UInt`].
    UInt(u64),
    /// [`WireKind::Int`].
    Int(i64),
    /// [`WireKind::Bytes`].
    Bytes(Vec<u8>),
    /// [`WireKind::Text`].
    Text(String),
    /// [`WireKind::Array`].
    Array(Vec<Value>),
    /// [`WireKind::Map`].
    Map(BTreeMap<String, Value>),
    /// [`WireKind::Struct`]: field values in declaration order.
    Record(Vec<Value>),
    /// [`WireKind::Cid`].
    Cid(Cid),
    /// [`WireKind::BigInt`].
    BigInt(BigInt),
    /// [`WireKind::Deferred`].
    Deferred(Deferred),
}

/// One wire field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Map key (ignored by tuple records).
    pub name: String,
    /// Field kind.
    pub kind: WireKind,
}

impl FieldSchema {
    /// Construct a field.
    pub fn new(name: impl Into<String>, kind: WireKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A record type described at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    repr: Representation,
    fields: Vec<FieldSchema>,
    key_order: Vec<usize>,
}

impl RecordSchema {
    /// Describe a record. The map key order is computed once here.
    ///
    /// Field names must be distinct; duplicates fail map encoding with `NonCanonicalMapOrder`.
    pub fn new(name: impl Into<String>, repr: Representation, fields: Vec<FieldSchema>) -> Self {
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        let key_order = canonical_permutation(&names);
        Self {
            name: name.into(),
            repr,
            fields,
            key_order,
        }
    }

    /// Describe a tuple record.
    pub fn tuple(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self::new(name, Representation::Tuple, fields)
    }

    /// Describe a map record.
    pub fn map(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self::new(name, Representation::Map, fields)
    }

    /// Record name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire representation.
    #[must_use]
    pub const fn representation(&self) -> Representation {
        self.repr
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// A record value with every field at its default.
    #[must_use]
    pub fn default_value(&self) -> Vec<Value> {
        self.fields.iter().map(|f| f.kind.default_value()).collect()
    }

    /// Encode `values` (one per field, declaration order).
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if `values` does not have one entry per field, `WrongMajorType`
    /// if a value does not match its field kind, or any encode error.
    pub fn encode<W: Write>(
        &self,
        values: &[Value],
        enc: &mut Encoder<W>,
    ) -> Result<(), CborError> {
        if values.len() != self.fields.len() {
            return Err(enc.err(ErrorCode::ArityMismatch));
        }
        match self.repr {
            Representation::Tuple => enc.array(self.fields.len(), |a| {
                for (field, value) in self.fields.iter().zip(values) {
                    a.with(|enc| field.kind.encode_value(value, enc))?;
                }
                Ok(())
            }),
            Representation::Map => enc.record(self.fields.len(), |m| {
                for &i in &self.key_order {
                    let field = &self.fields[i];
                    m.entry(&field.name, |enc| field.kind.encode_value(&values[i], enc))?;
                }
                Ok(())
            }),
        }
    }

    /// Decode one record, returning field values in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` for a tuple of the wrong length, or any decode error.
    pub fn decode<R: Read>(&self, dec: &mut Decoder<R>) -> Result<Vec<Value>, CborError> {
        match self.repr {
            Representation::Tuple => {
                expect_tuple(dec, self.fields.len())?;
                self.fields
                    .iter()
                    .map(|f| f.kind.decode_value(dec))
                    .collect()
            }
            Representation::Map => {
                let mut out = self.default_value();
                let len = read_record_len(dec)?;
                for _ in 0..len {
                    let key = read_field_key(dec)?;
                    match self.fields.iter().position(|f| f.name == key) {
                        Some(i) => out[i] = self.fields[i].kind.decode_value(dec)?,
                        None => skip_unknown_field(dec, "schema", &key)?,
                    }
                }
                Ok(out)
            }
        }
    }

    /// Encode into a fresh buffer.
    ///
    /// # Errors
    ///
    /// See [`RecordSchema::encode`].
    pub fn encode_to_vec(&self, values: &[Value]) -> Result<Vec<u8>, CborError> {
        let mut enc = Encoder::new();
        self.encode(values, &mut enc)?;
        Ok(enc.into_vec())
    }

    /// Decode exactly one record occupying all of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `TrailingBytes` if input remains, or any decode error.
    pub fn decode_from_slice(&self, bytes: &[u8]) -> Result<Vec<Value>, CborError> {
        let mut dec = Decoder::from_slice(bytes);
        let values = self.decode(&mut dec)?;
        if !dec.is_at_end()? {
            return Err(CborError::new(ErrorCode::TrailingBytes, dec.position()));
        }
        Ok(values)
    }
}

impl WireKind {
    /// The value a missing map-record field takes.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::UInt(_) => Value::UInt(0),
            Self::Int(_) => Value::Int(0),
            Self::Bytes { fixed } => Value::Bytes(vec![0; fixed.unwrap_or(0)]),
            Self::Text => Value::Text(String::new()),
            Self::Bool => Value::Bool(false),
            Self::Array { elem, fixed } => {
                Value::Array(vec![elem.default_value(); fixed.unwrap_or(0)])
            }
            Self::Map(_) => Value::Map(BTreeMap::new()),
            Self::Struct(schema) => Value::Record(schema.default_value()),
            Self::Cid => Value::Cid(Cid::undef()),
            Self::BigInt => Value::BigInt(BigInt::zero()),
            Self::Deferred => Value::Deferred(Deferred::new()),
            Self::Optional(_) => Value::Null,
        }
    }

    /// Encode `value` as this kind.
    ///
    /// # Errors
    ///
    /// Returns `WrongMajorType` if `value` does not match, `Overflow` if an integer exceeds the
    /// width, `ArityMismatch` for a fixed length mismatch, or any encode error.
    pub fn encode_value<W: Write>(
        &self,
        value: &Value,
        enc: &mut Encoder<W>,
    ) -> Result<(), CborError> {
        match (self, value) {
            (Self::UInt(w), Value::UInt(v)) => {
                if *v > w.umax() {
                    return Err(enc.err(ErrorCode::Overflow));
                }
                enc.uint(*v)
            }
            (Self::Int(w), Value::Int(v)) => {
                if *v < w.imin() || *v > w.imax() {
                    return Err(enc.err(ErrorCode::Overflow));
                }
                enc.int(*v)
            }
            (Self::Bytes { fixed }, Value::Bytes(b)) => {
                if fixed.is_some_and(|n| n != b.len()) {
                    return Err(enc.err(ErrorCode::ArityMismatch));
                }
                enc.bytes(b)
            }
            (Self::Text, Value::Text(s)) => enc.text(s),
            (Self::Bool, Value::Bool(b)) => enc.bool(*b),
            (Self::Array { elem, fixed }, Value::Array(items)) => {
                if fixed.is_some_and(|n| n != items.len()) {
                    return Err(enc.err(ErrorCode::ArityMismatch));
                }
                enc.array(items.len(), |a| {
                    for item in items {
                        a.with(|enc| elem.encode_value(item, enc))?;
                    }
                    Ok(())
                })
            }
            (Self::Map(kind), Value::Map(entries)) => {
                let mut sorted: Vec<(&String, &Value)> = entries.iter().collect();
                sorted.sort_by(|a, b| cmp_text_keys(a.0, b.0));
                enc.map(sorted.len(), |m| {
                    for (k, v) in sorted {
                        m.entry(k, |enc| kind.encode_value(v, enc))?;
                    }
                    Ok(())
                })
            }
            (Self::Struct(schema), Value::Record(values)) => schema.encode(values, enc),
            (Self::Cid, Value::Cid(cid)) => cid.encode(enc),
            (Self::BigInt, Value::BigInt(n)) => n.encode(enc),
            (Self::Deferred, Value::Deferred(d)) => d.encode(enc),
            (Self::Optional(_), Value::Null) => enc.null(),
            (Self::Optional(inner), v) => inner.encode_value(v, enc),
            _ => Err(enc.err(ErrorCode::WrongMajorType)),
        }
    }

    /// Decode one value of this kind.
    ///
    /// # Errors
    ///
    /// Returns the decode error for the kind.
    pub fn decode_value<R: Read>(&self, dec: &mut Decoder<R>) -> Result<Value, CborError> {
        let off = dec.position();
        match self {
            Self::UInt(w) => {
                let v = dec.read_uint()?;
                if v > w.umax() {
                    return Err(CborError::new(ErrorCode::Overflow, off));
                }
                Ok(Value::UInt(v))
            }
            Self::Int(w) => {
                let v = dec.read_int()?;
                if v < i128::from(w.imin()) || v > i128::from(w.imax()) {
                    return Err(CborError::new(ErrorCode::Overflow, off));
                }
                i64::try_from(v)
                    .map(Value::Int)
                    .map_err(|_| CborError::new(ErrorCode::Overflow, off))
            }
            Self::Bytes { fixed } => {
                let b = dec.read_bytes()?;
                if fixed.is_some_and(|n| n != b.len()) {
                    return Err(CborError::new(ErrorCode::ArityMismatch, off));
                }
                Ok(Value::Bytes(b))
            }
            Self::Text => dec.read_text().map(Value::Text),
            Self::Bool => dec.read_bool().map(Value::Bool),
            Self::Array { elem, fixed } => {
                let len = dec.read_array_len()?;
                if fixed.is_some_and(|n| n != len) {
                    return Err(CborError::new(ErrorCode::ArityMismatch, off));
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(elem.decode_value(dec)?);
                }
                Ok(Value::Array(items))
            }
            Self::Map(kind) => {
                let len = dec.read_map_len()?;
                let mut entries = BTreeMap::new();
                for _ in 0..len {
                    let key = dec.read_text()?;
                    let value = kind.decode_value(dec)?;
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
            Self::Struct(schema) => schema.decode(dec).map(Value::Record),
            Self::Cid => Cid::decode(dec).map(Value::Cid),
            Self::BigInt => BigInt::decode(dec).map(Value::BigInt),
            Self::Deferred => Deferred::decode(dec).map(Value::Deferred),
            Self::Optional(inner) => {
                if dec.take_null()? {
                    return Ok(Value::Null);
                }
                inner.decode_value(dec)
            }
        }
    }
}
