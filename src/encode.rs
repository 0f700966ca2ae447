use std::io::Write;

use crate::codec::CborEncode;
use crate::header::{encode_header, Major, CBOR_FALSE, CBOR_NULL, CBOR_TRUE};
use crate::limits::Limits;
use crate::order::is_strictly_increasing;
use crate::{CborError, ErrorCode};

/// Streaming encoder that writes canonical CBOR into any [`Write`] sink.
///
/// The default sink is a `Vec<u8>`. Bytes already handed to the sink are not rolled back when a
/// later call fails; encode into a scratch buffer when atomicity matters.
pub struct Encoder<W = Vec<u8>> {
    writer: W,
    written: u64,
    limits: Limits,
}

impl Encoder<Vec<u8>> {
    /// Create an encoder writing into a fresh `Vec<u8>`.
    #[must_use]
    pub const fn new() -> Self {
        Self::from_writer(Vec::new())
    }

    /// Create a `Vec`-backed encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_writer(Vec::with_capacity(capacity))
    }

    /// Borrow the bytes emitted so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.writer
    }

    /// Consume and return the encoded bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.writer
    }
}

impl Default for Encoder<Vec<u8>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Encoder<W> {
    /// Create an encoder over `writer` with default limits.
    pub const fn from_writer(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            limits: Limits::DEFAULT,
        }
    }

    /// Replace the limits this encoder enforces.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimits` if `limits` fails [`Limits::validate`].
    pub fn with_limits(mut self, limits: Limits) -> Result<Self, CborError> {
        self.limits = limits.validate()?;
        Ok(self)
    }

    /// The limits this encoder enforces.
    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Number of bytes written so far.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.written
    }

    /// Mutable access to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    #[inline]
    pub(crate) fn err(&self, code: ErrorCode) -> CborError {
        CborError::new(code, self.written)
    }

    /// Write already-encoded bytes verbatim.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), CborError> {
        self.writer
            .write_all(bytes)
            .map_err(|e| CborError::from_io(&e, self.written))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Write a header in its shortest form.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn header(&mut self, major: Major, arg: u64) -> Result<(), CborError> {
        self.write_raw(encode_header(major, arg).as_bytes())
    }

    fn len_header(
        &mut self,
        major: Major,
        len: usize,
        max: usize,
        code: ErrorCode,
    ) -> Result<(), CborError> {
        if len > max {
            return Err(self.err(code));
        }
        let arg = u64::try_from(len).map_err(|_| self.err(ErrorCode::LengthOverflow))?;
        self.header(major, arg)
    }

    /// Encode `null`.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn null(&mut self) -> Result<(), CborError> {
        self.write_raw(&[CBOR_NULL])
    }

    /// Encode a boolean.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn bool(&mut self, v: bool) -> Result<(), CborError> {
        self.write_raw(&[if v { CBOR_TRUE } else { CBOR_FALSE }])
    }

    /// Encode an unsigned integer as major 0.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn uint(&mut self, v: u64) -> Result<(), CborError> {
        self.header(Major::UnsignedInt, v)
    }

    /// Encode a signed integer: major 0 when non-negative, major 1 (`-1 - n`) otherwise.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn int(&mut self, v: i64) -> Result<(), CborError> {
        if v >= 0 {
            self.header(Major::UnsignedInt, v.unsigned_abs())
        } else {
            // -1 - v for v < 0 is |v| - 1, which always fits u64.
            self.header(Major::NegativeInt, v.unsigned_abs() - 1)
        }
    }

    /// Encode a byte string.
    ///
    /// # Errors
    ///
    /// Returns `TooLong` above `max_bytes_len`.
    pub fn bytes(&mut self, b: &[u8]) -> Result<(), CborError> {
        self.len_header(
            Major::ByteString,
            b.len(),
            self.limits.max_bytes_len,
            ErrorCode::TooLong,
        )?;
        self.write_raw(b)
    }

    /// Encode a text string.
    ///
    /// # Errors
    ///
    /// Returns `TooLong` above `max_text_len`.
    pub fn text(&mut self, s: &str) -> Result<(), CborError> {
        self.len_header(
            Major::TextString,
            s.len(),
            self.limits.max_text_len,
            ErrorCode::TooLong,
        )?;
        self.write_raw(s.as_bytes())
    }

    /// Encode a tag header. The tagged value must follow.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails.
    pub fn tag(&mut self, tag: u64) -> Result<(), CborError> {
        self.header(Major::Tag, tag)
    }

    /// Encode any [`CborEncode`] value.
    ///
    /// # Errors
    ///
    /// Returns the value's encode error.
    pub fn value<T: CborEncode + ?Sized>(&mut self, value: &T) -> Result<(), CborError> {
        value.encode(self)
    }

    /// Encode a definite-length array and fill it via the provided builder.
    ///
    /// # Errors
    ///
    /// Returns `TooLong` above `max_array_len`, or `ArityMismatch` if the builder emits a
    /// different number of items.
    pub fn array<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut ArrayEncoder<'_, W>) -> Result<(), CborError>,
    {
        self.len_header(
            Major::Array,
            len,
            self.limits.max_array_len,
            ErrorCode::TooLong,
        )?;
        let mut a = ArrayEncoder {
            enc: self,
            remaining: len,
        };
        f(&mut a)?;
        if a.remaining != 0 {
            return Err(self.err(ErrorCode::ArityMismatch));
        }
        Ok(())
    }

    /// Encode a definite-length map and fill it via the provided builder.
    ///
    /// Keys must arrive in canonical order.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` above `max_map_len`, `NonCanonicalMapOrder` for out-of-order or
    /// repeated keys, or `ArityMismatch` if the builder emits a different number of entries.
    pub fn map<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut MapEncoder<'_, W>) -> Result<(), CborError>,
    {
        let max = self.limits.max_map_len;
        self.bounded_map(len, max, f)
    }

    /// Encode a map-represented record. Same as [`Encoder::map`], bounded by
    /// `max_record_entries`.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` above `max_record_entries`, otherwise as [`Encoder::map`].
    pub fn record<F>(&mut self, len: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut MapEncoder<'_, W>) -> Result<(), CborError>,
    {
        let max = self.limits.max_record_entries;
        self.bounded_map(len, max, f)
    }

    fn bounded_map<F>(&mut self, len: usize, max: usize, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut MapEncoder<'_, W>) -> Result<(), CborError>,
    {
        self.len_header(Major::Map, len, max, ErrorCode::TooLarge)?;
        let mut m = MapEncoder {
            enc: self,
            remaining: len,
            prev_key: None,
        };
        f(&mut m)?;
        if m.remaining != 0 {
            return Err(self.err(ErrorCode::ArityMismatch));
        }
        Ok(())
    }
}

/// Builder for writing array elements.
pub struct ArrayEncoder<'a, W> {
    enc: &'a mut Encoder<W>,
    remaining: usize,
}

impl<W: Write> ArrayEncoder<'_, W> {
    fn consume_one(&mut self) -> Result<&mut Encoder<W>, CborError> {
        if self.remaining == 0 {
            return Err(self.enc.err(ErrorCode::ArityMismatch));
        }
        self.remaining -= 1;
        Ok(&mut *self.enc)
    }

    /// Encode `null` as the next element.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the declared length is exceeded, or the encode error.
    pub fn null(&mut self) -> Result<(), CborError> {
        self.consume_one()?.null()
    }

    /// Encode a text string as the next element.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the declared length is exceeded, or the encode error.
    pub fn text(&mut self, s: &str) -> Result<(), CborError> {
        self.consume_one()?.text(s)
    }

    /// Encode a [`CborEncode`] value as the next element.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the declared length is exceeded, or the encode error.
    pub fn value<T: CborEncode + ?Sized>(&mut self, value: &T) -> Result<(), CborError> {
        value.encode(self.consume_one()?)
    }

    /// Encode the next element with direct access to the encoder.
    ///
    /// The closure must write exactly one value.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the declared length is exceeded, or the closure's error.
    pub fn with<F>(&mut self, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut Encoder<W>) -> Result<(), CborError>,
    {
        f(self.consume_one()?)
    }
}

/// Builder for writing text-keyed map entries in canonical key order.
pub struct MapEncoder<'a, W> {
    enc: &'a mut Encoder<W>,
    remaining: usize,
    prev_key: Option<String>,
}

impl<W: Write> MapEncoder<'_, W> {
    /// Insert an entry. The closure must write exactly one value.
    ///
    /// # Errors
    ///
    /// Returns `NonCanonicalMapOrder` if `key` does not sort strictly after the previous key,
    /// `ArityMismatch` if the declared length is exceeded, or the encode error.
    pub fn entry<F>(&mut self, key: &str, f: F) -> Result<(), CborError>
    where
        F: FnOnce(&mut Encoder<W>) -> Result<(), CborError>,
    {
        if self.remaining == 0 {
            return Err(self.enc.err(ErrorCode::ArityMismatch));
        }
        match &mut self.prev_key {
            Some(prev) => {
                if !is_strictly_increasing(prev, key) {
                    return Err(self.enc.err(ErrorCode::NonCanonicalMapOrder));
                }
                prev.clear();
                prev.push_str(key);
            }
            None => self.prev_key = Some(key.to_owned()),
        }
        self.enc.text(key)?;
        f(&mut *self.enc)?;
        self.remaining -= 1;
        Ok(())
    }

    /// Insert an entry whose value is a [`CborEncode`] value.
    ///
    /// # Errors
    ///
    /// See [`MapEncoder::entry`].
    pub fn value<T: CborEncode + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), CborError> {
        self.entry(key, |enc| value.encode(enc))
    }
}
