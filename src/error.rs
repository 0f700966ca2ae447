use core::fmt;
use std::io;

/// A structured error code identifying why an encode or decode call failed.
///
/// Codes are string-free and `Copy` so they can be matched on directly in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Invalid configured limits.
    InvalidLimits,

    /// Unexpected end of input while decoding.
    UnexpectedEof,
    /// The underlying reader or writer failed.
    Io(io::ErrorKind),
    /// A length or counter does not fit the platform word size.
    LengthOverflow,
    /// Input contains bytes after the single CBOR value.
    TrailingBytes,

    /// Reserved (28..30) or indefinite-length (31) additional information.
    MalformedHeader,
    /// An argument was not encoded in its shortest form.
    NonCanonicalEncoding,

    /// A string, byte string or array exceeds its length bound.
    TooLong,
    /// A map, record or bignum exceeds its size bound.
    TooLarge,
    /// The value has a different major type (or tag) than the one expected.
    WrongMajorType,
    /// An integer does not fit the destination width.
    Overflow,
    /// A tuple record or fixed-size array has the wrong number of elements.
    ArityMismatch,
    /// A simple value other than `false`/`true` was found where a boolean was expected.
    BadBoolean,
    /// Text string is not valid UTF-8.
    Utf8Invalid,
    /// Map builder keys were not supplied in canonical order.
    NonCanonicalMapOrder,

    /// A CID payload does not start with the binary multibase marker `0x00`.
    UnsupportedMultibase,
    /// The undefined CID sentinel was encoded, or an empty CID was decoded.
    UndefinedLink,
    /// A [`crate::Deferred`] that never captured a value was encoded.
    PristineDeferred,
}

/// A codec error with a stable code and the byte offset where it was detected.
///
/// For decode errors `offset` is the input position of the offending header; for encode errors
/// it is the number of bytes already written to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CborError {
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset where the error was detected.
    pub offset: u64,
}

impl CborError {
    /// Construct an error with `code` at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: u64) -> Self {
        Self { code, offset }
    }

    pub(crate) fn from_io(err: &io::Error, offset: u64) -> Self {
        let code = match err.kind() {
            io::ErrorKind::UnexpectedEof => ErrorCode::UnexpectedEof,
            kind => ErrorCode::Io(kind),
        };
        Self::new(code, offset)
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.code {
            ErrorCode::InvalidLimits => "invalid CBOR limits",

            ErrorCode::UnexpectedEof => "unexpected end of input",
            ErrorCode::Io(kind) => {
                return write!(f, "cbor i/o failed at {}: {kind}", self.offset);
            }
            ErrorCode::LengthOverflow => "length overflow",
            ErrorCode::TrailingBytes => "trailing bytes after single CBOR item",

            ErrorCode::MalformedHeader => "malformed header (reserved or indefinite length)",
            ErrorCode::NonCanonicalEncoding => "non-canonical integer/length encoding",

            ErrorCode::TooLong => "length exceeds maximum allowed",
            ErrorCode::TooLarge => "container exceeds maximum allowed size",
            ErrorCode::WrongMajorType => "unexpected major type",
            ErrorCode::Overflow => "integer overflows destination width",
            ErrorCode::ArityMismatch => "wrong number of elements",
            ErrorCode::BadBoolean => "booleans must be simple value 20 or 21",
            ErrorCode::Utf8Invalid => "text must be valid UTF-8",
            ErrorCode::NonCanonicalMapOrder => "map keys not in canonical order",

            ErrorCode::UnsupportedMultibase => "cbor serialized CIDs must have binary multibase",
            ErrorCode::UndefinedLink => "undefined cid",
            ErrorCode::PristineDeferred => "cannot encode deferred value that was never populated",
        };
        write!(f, "cbor failed at {}: {msg}", self.offset)
    }
}

impl std::error::Error for CborError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_eof_maps_to_unexpected_eof() {
        let err = io::Error::from(io::ErrorKind::UnexpectedEof);
        assert_eq!(CborError::from_io(&err, 3).code, ErrorCode::UnexpectedEof);

        let err = io::Error::from(io::ErrorKind::BrokenPipe);
        assert_eq!(
            CborError::from_io(&err, 0).code,
            ErrorCode::Io(io::ErrorKind::BrokenPipe)
        );
    }

    #[test]
    fn display_includes_offset() {
        let err = CborError::new(ErrorCode::NonCanonicalEncoding, 7);
        assert_eq!(
            err.to_string(),
            "cbor failed at 7: non-canonical integer/length encoding"
        );
    }
}
