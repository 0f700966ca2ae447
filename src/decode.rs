use std::io::{self, Read};

use crate::header::{decode_argument, follow_len, Header, Major, CBOR_NULL};
use crate::limits::Limits;
use crate::{utf8, CborError, ErrorCode};

/// Streaming decoder over any byte source.
///
/// The decoder holds a one-byte pushback slot so optional values can peek for `null` on
/// non-seekable readers. It reads byte-sized chunks from the source; wrap unbuffered sources
/// (files, sockets) in [`std::io::BufReader`].
pub struct Decoder<R> {
    reader: R,
    peeked: Option<u8>,
    pos: u64,
    limits: Limits,
}

impl<'a> Decoder<&'a [u8]> {
    /// Construct a decoder over an in-memory buffer with default limits.
    #[must_use]
    pub const fn from_slice(bytes: &'a [u8]) -> Self {
        Self {
            reader: bytes,
            peeked: None,
            pos: 0,
            limits: Limits::DEFAULT,
        }
    }
}

impl<R: Read> Decoder<R> {
    /// Construct a decoder with default limits.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            peeked: None,
            pos: 0,
            limits: Limits::DEFAULT,
        }
    }

    /// Construct a decoder with custom limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimits` if `limits` fails [`Limits::validate`].
    pub fn with_limits(reader: R, limits: Limits) -> Result<Self, CborError> {
        Ok(Self {
            reader,
            peeked: None,
            pos: 0,
            limits: limits.validate()?,
        })
    }

    /// Number of bytes consumed so far. A peeked byte is not counted until it is consumed.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.pos
    }

    /// The limits this decoder enforces.
    #[inline]
    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Return the underlying reader. A byte held in the pushback slot is lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    #[inline]
    fn err(&self, code: ErrorCode) -> CborError {
        CborError::new(code, self.pos)
    }

    fn fill_one(&mut self) -> Result<Option<u8>, CborError> {
        let mut b = [0u8; 1];
        loop {
            match self.reader.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(b[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(CborError::from_io(&e, self.pos)),
            }
        }
    }

    /// Look at the next byte without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` at end of input.
    pub fn peek_u8(&mut self) -> Result<u8, CborError> {
        if let Some(b) = self.peeked {
            return Ok(b);
        }
        let b = self
            .fill_one()?
            .ok_or_else(|| self.err(ErrorCode::UnexpectedEof))?;
        self.peeked = Some(b);
        Ok(b)
    }

    /// Returns `true` when the source has no more bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    pub fn is_at_end(&mut self) -> Result<bool, CborError> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        match self.fill_one()? {
            Some(b) => {
                self.peeked = Some(b);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    fn next_u8(&mut self) -> Result<u8, CborError> {
        let b = match self.peeked.take() {
            Some(b) => b,
            None => self
                .fill_one()?
                .ok_or_else(|| self.err(ErrorCode::UnexpectedEof))?,
        };
        self.pos += 1;
        Ok(b)
    }

    /// Fill `buf` completely from the source.
    pub(crate) fn read_into(&mut self, buf: &mut [u8]) -> Result<(), CborError> {
        let mut rest = buf;
        if rest.is_empty() {
            return Ok(());
        }
        if let Some(b) = self.peeked.take() {
            rest[0] = b;
            self.pos += 1;
            rest = &mut rest[1..];
        }
        self.reader
            .read_exact(rest)
            .map_err(|e| CborError::from_io(&e, self.pos))?;
        self.pos += rest.len() as u64;
        Ok(())
    }

    /// Read `len` bytes into a fresh buffer.
    pub(crate) fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, CborError> {
        let mut out = vec![0u8; len];
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Append `len` bytes from the source to `out`.
    pub(crate) fn read_append(&mut self, len: usize, out: &mut Vec<u8>) -> Result<(), CborError> {
        let start = out.len();
        out.resize(start + len, 0);
        self.read_into(&mut out[start..])
    }

    /// Consume and drop `len` bytes.
    pub(crate) fn discard(&mut self, len: u64) -> Result<(), CborError> {
        let mut left = len;
        if left > 0 && self.peeked.take().is_some() {
            self.pos += 1;
            left -= 1;
        }
        let copied = io::copy(&mut (&mut self.reader).take(left), &mut io::sink())
            .map_err(|e| CborError::from_io(&e, self.pos))?;
        self.pos += copied;
        if copied < left {
            return Err(self.err(ErrorCode::UnexpectedEof));
        }
        Ok(())
    }

    /// Read and validate the next header.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHeader`, `NonCanonicalEncoding` or `UnexpectedEof`.
    pub fn read_header(&mut self) -> Result<Header, CborError> {
        let off = self.pos;
        let ib = self.next_u8()?;
        let ai = ib & 0x1f;
        let n = follow_len(ai, off)?;
        let mut follow = [0u8; 8];
        self.read_into(&mut follow[..n])?;
        let arg = decode_argument(ai, &follow[..n], off)?;
        Ok(Header::new(Major::from_initial_byte(ib), arg))
    }

    /// Read a header and require its major type, returning the argument.
    ///
    /// # Errors
    ///
    /// Returns `WrongMajorType` if the major type differs.
    pub fn expect_major(&mut self, major: Major) -> Result<u64, CborError> {
        let off = self.pos;
        let h = self.read_header()?;
        if h.major != major {
            return Err(CborError::new(ErrorCode::WrongMajorType, off));
        }
        Ok(h.arg)
    }

    /// Read a length-carrying header of `major` and check it against `max`.
    pub(crate) fn read_len(
        &mut self,
        major: Major,
        max: usize,
        code: ErrorCode,
    ) -> Result<usize, CborError> {
        let off = self.pos;
        let arg = self.expect_major(major)?;
        let len = usize::try_from(arg).map_err(|_| CborError::new(code, off))?;
        if len > max {
            return Err(CborError::new(code, off));
        }
        Ok(len)
    }

    /// Decode an unsigned integer (major 0).
    ///
    /// # Errors
    ///
    /// Returns `WrongMajorType` for anything but major 0.
    pub fn read_uint(&mut self) -> Result<u64, CborError> {
        self.expect_major(Major::UnsignedInt)
    }

    /// Decode a signed integer from major 0 or major 1.
    ///
    /// # Errors
    ///
    /// Returns `WrongMajorType` for any other major type.
    pub fn read_int(&mut self) -> Result<i128, CborError> {
        let off = self.pos;
        let h = self.read_header()?;
        match h.major {
            Major::UnsignedInt => Ok(i128::from(h.arg)),
            Major::NegativeInt => Ok(-1 - i128::from(h.arg)),
            _ => Err(CborError::new(ErrorCode::WrongMajorType, off)),
        }
    }

    /// Decode a boolean.
    ///
    /// # Errors
    ///
    /// Returns `WrongMajorType` if the value is not major 7, and `BadBoolean` for simple
    /// values other than 20/21.
    pub fn read_bool(&mut self) -> Result<bool, CborError> {
        let off = self.pos;
        match self.expect_major(Major::Simple)? {
            20 => Ok(false),
            21 => Ok(true),
            _ => Err(CborError::new(ErrorCode::BadBoolean, off)),
        }
    }

    /// Consume a `null` if it is the next byte. Leaves any other byte in place.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` at end of input.
    pub fn take_null(&mut self) -> Result<bool, CborError> {
        if self.peek_u8()? == CBOR_NULL {
            self.next_u8()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Decode a text string.
    ///
    /// # Errors
    ///
    /// Returns `TooLong` above `max_text_len` and `Utf8Invalid` for bad UTF-8.
    pub fn read_text(&mut self) -> Result<String, CborError> {
        let off = self.pos;
        let len = self.read_len(Major::TextString, self.limits.max_text_len, ErrorCode::TooLong)?;
        let bytes = self.read_vec(len)?;
        utf8::into_string(bytes).map_err(|()| CborError::new(ErrorCode::Utf8Invalid, off))
    }

    /// Decode a byte string.
    ///
    /// # Errors
    ///
    /// Returns `TooLong` above `max_bytes_len`.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CborError> {
        let len = self.read_len(Major::ByteString, self.limits.max_bytes_len, ErrorCode::TooLong)?;
        self.read_vec(len)
    }

    /// Decode a byte string of exactly `N` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the length differs from `N`.
    pub fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], CborError> {
        let off = self.pos;
        let len = self.read_len(Major::ByteString, self.limits.max_bytes_len, ErrorCode::TooLong)?;
        if len != N {
            return Err(CborError::new(ErrorCode::ArityMismatch, off));
        }
        let mut out = [0u8; N];
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Decode an array header, returning its element count.
    ///
    /// # Errors
    ///
    /// Returns `TooLong` above `max_array_len`.
    pub fn read_array_len(&mut self) -> Result<usize, CborError> {
        self.read_len(Major::Array, self.limits.max_array_len, ErrorCode::TooLong)
    }

    /// Decode a map header, returning its entry count.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` above `max_map_len`.
    pub fn read_map_len(&mut self) -> Result<usize, CborError> {
        self.read_len(Major::Map, self.limits.max_map_len, ErrorCode::TooLarge)
    }

    /// Decode a tag header and require tag number `tag`.
    ///
    /// # Errors
    ///
    /// Returns `WrongMajorType` if the value is not a tag or carries another tag number.
    pub fn expect_tag(&mut self, tag: u64) -> Result<(), CborError> {
        let off = self.pos;
        if self.expect_major(Major::Tag)? != tag {
            return Err(CborError::new(ErrorCode::WrongMajorType, off));
        }
        Ok(())
    }

    /// Skip exactly one value using the link-scan traversal.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the value is malformed or truncated.
    pub fn skip_value(&mut self) -> Result<(), CborError> {
        crate::scan::skip_value(self).map(|_| ())
    }
}
