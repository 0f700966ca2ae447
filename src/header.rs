//! The `(major type, argument)` header that prefixes every CBOR value.
//!
//! Encoding always picks the shortest width; decoding rejects any wider-than-necessary form and
//! every indefinite-length or reserved marker.

use crate::{CborError, ErrorCode};

/// CBOR `null` (major 7, simple value 22). Written for absent optional values.
pub const CBOR_NULL: u8 = 0xf6;
/// CBOR `false` (major 7, simple value 20).
pub const CBOR_FALSE: u8 = 0xf4;
/// CBOR `true` (major 7, simple value 21).
pub const CBOR_TRUE: u8 = 0xf5;

/// Tag marking a content identifier.
pub const TAG_CID: u64 = 42;
/// Tag marking a non-negative bignum.
pub const TAG_BIGNUM: u64 = 2;

/// Longest possible header: marker byte plus an 8-byte argument.
pub const MAX_HEADER_LEN: usize = 9;

/// The eight CBOR major types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Major {
    /// Unsigned integer.
    UnsignedInt = 0,
    /// Negative integer, value `-1 - argument`.
    NegativeInt = 1,
    /// Byte string of `argument` bytes.
    ByteString = 2,
    /// UTF-8 text string of `argument` bytes.
    TextString = 3,
    /// Array of `argument` values.
    Array = 4,
    /// Map of `argument` key/value pairs.
    Map = 5,
    /// Tag number `argument` followed by one value.
    Tag = 6,
    /// Simple values (`false`, `true`, `null`, ...).
    Simple = 7,
}

impl Major {
    /// Extract the major type from an initial byte.
    #[inline]
    #[must_use]
    pub const fn from_initial_byte(ib: u8) -> Self {
        match ib >> 5 {
            0 => Self::UnsignedInt,
            1 => Self::NegativeInt,
            2 => Self::ByteString,
            3 => Self::TextString,
            4 => Self::Array,
            5 => Self::Map,
            6 => Self::Tag,
            _ => Self::Simple,
        }
    }

    #[inline]
    const fn bits(self) -> u8 {
        (self as u8) << 5
    }
}

/// A decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Major type.
    pub major: Major,
    /// Argument: literal value, length, element count, tag number or simple value.
    pub arg: u64,
}

impl Header {
    /// Construct a header.
    #[inline]
    #[must_use]
    pub const fn new(major: Major, arg: u64) -> Self {
        Self { major, arg }
    }

    /// Shortest encoding of this header.
    #[inline]
    #[must_use]
    pub fn encode(self) -> EncodedHeader {
        encode_header(self.major, self.arg)
    }
}

/// A header encoded into a stack buffer.
#[derive(Clone, Copy)]
pub struct EncodedHeader {
    buf: [u8; MAX_HEADER_LEN],
    len: u8,
}

impl EncodedHeader {
    /// The encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }
}

impl AsRef<[u8]> for EncodedHeader {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Encode `(major, arg)` using the shortest legal width (1, 2, 3, 5 or 9 bytes).
#[must_use]
pub fn encode_header(major: Major, arg: u64) -> EncodedHeader {
    let mut buf = [0u8; MAX_HEADER_LEN];
    let m = major.bits();
    let len = if let Ok(v8) = u8::try_from(arg) {
        if v8 < 24 {
            buf[0] = m | v8;
            1
        } else {
            buf[0] = m | 24;
            buf[1] = v8;
            2
        }
    } else if let Ok(v16) = u16::try_from(arg) {
        buf[0] = m | 25;
        buf[1..3].copy_from_slice(&v16.to_be_bytes());
        3
    } else if let Ok(v32) = u32::try_from(arg) {
        buf[0] = m | 26;
        buf[1..5].copy_from_slice(&v32.to_be_bytes());
        5
    } else {
        buf[0] = m | 27;
        buf[1..9].copy_from_slice(&arg.to_be_bytes());
        9
    };
    EncodedHeader { buf, len }
}

/// Number of bytes [`encode_header`] produces for `arg`.
#[inline]
#[must_use]
pub const fn header_len(arg: u64) -> usize {
    if arg < 24 {
        1
    } else if arg <= 0xff {
        2
    } else if arg <= 0xffff {
        3
    } else if arg <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// Number of argument bytes that follow an initial byte with additional info `ai`.
///
/// # Errors
///
/// Returns `MalformedHeader` for the reserved markers 28..30 and the indefinite-length marker 31.
#[inline]
pub const fn follow_len(ai: u8, off: u64) -> Result<usize, CborError> {
    match ai {
        0..=23 => Ok(0),
        24 => Ok(1),
        25 => Ok(2),
        26 => Ok(4),
        27 => Ok(8),
        _ => Err(CborError::new(ErrorCode::MalformedHeader, off)),
    }
}

/// Decode the argument from the additional info and its follow bytes, enforcing minimal width.
///
/// `follow` must hold exactly [`follow_len`]`(ai)` bytes.
///
/// # Errors
///
/// Returns `NonCanonicalEncoding` when the value would fit a shorter marker and
/// `MalformedHeader` for reserved or indefinite markers.
pub fn decode_argument(ai: u8, follow: &[u8], off: u64) -> Result<u64, CborError> {
    let non_canonical = || CborError::new(ErrorCode::NonCanonicalEncoding, off);
    let short = || CborError::new(ErrorCode::UnexpectedEof, off);
    match ai {
        0..=23 => Ok(u64::from(ai)),
        24 => {
            let v = *follow.first().ok_or_else(short)?;
            if v < 24 {
                return Err(non_canonical());
            }
            Ok(u64::from(v))
        }
        25 => {
            let b: [u8; 2] = follow.try_into().map_err(|_| short())?;
            let v = u64::from(u16::from_be_bytes(b));
            if u8::try_from(v).is_ok() {
                return Err(non_canonical());
            }
            Ok(v)
        }
        26 => {
            let b: [u8; 4] = follow.try_into().map_err(|_| short())?;
            let v = u64::from(u32::from_be_bytes(b));
            if u16::try_from(v).is_ok() {
                return Err(non_canonical());
            }
            Ok(v)
        }
        27 => {
            let b: [u8; 8] = follow.try_into().map_err(|_| short())?;
            let v = u64::from_be_bytes(b);
            if u32::try_from(v).is_ok() {
                return Err(non_canonical());
            }
            Ok(v)
        }
        _ => Err(CborError::new(ErrorCode::MalformedHeader, off)),
    }
}

/// Decode one header from the start of `bytes`, returning it with its encoded length.
///
/// # Errors
///
/// Returns `UnexpectedEof` on truncated input, or the errors of [`decode_argument`].
pub fn decode_header(bytes: &[u8]) -> Result<(Header, usize), CborError> {
    let ib = *bytes
        .first()
        .ok_or_else(|| CborError::new(ErrorCode::UnexpectedEof, 0))?;
    let ai = ib & 0x1f;
    let n = follow_len(ai, 0)?;
    let follow = bytes
        .get(1..=n)
        .ok_or_else(|| CborError::new(ErrorCode::UnexpectedEof, 1))?;
    let arg = decode_argument(ai, follow, 0)?;
    Ok((Header::new(Major::from_initial_byte(ib), arg), 1 + n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_len_matches_encoding() {
        for arg in [0, 23, 24, 255, 256, 65_535, 65_536, u64::from(u32::MAX), u64::MAX] {
            assert_eq!(
                encode_header(Major::UnsignedInt, arg).as_bytes().len(),
                header_len(arg)
            );
        }
    }

    #[test]
    fn decode_reports_consumed_length() {
        let (h, n) = decode_header(&[0x99, 0x01, 0x00, 0xff]).unwrap();
        assert_eq!(h, Header::new(Major::Array, 256));
        assert_eq!(n, 3);
    }

    #[test]
    fn truncated_follow_bytes_are_eof() {
        let err = decode_header(&[0x1a, 0x00, 0x01]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedEof);
    }
}
