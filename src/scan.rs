//! Structural traversal of one encoded value.
//!
//! The walk keeps a single counter of values still owed, starting at 1. Every header pays one
//! value; arrays add their element count, maps twice their entry count and tags one for the
//! tagged value. Strings are consumed without interpretation. In link mode a tag 42 is followed
//! by its byte-string payload, which is reported as a [`Cid`] instead of being counted.
//!
//! The same walk backs link scanning, skipping of unknown record fields, single-value validation
//! and [`crate::Deferred`] capture.

use std::io::Read;

use tracing::debug;

use crate::cid::{cid_from_payload, Cid};
use crate::decode::Decoder;
use crate::header::{Header, Major, TAG_CID};
use crate::{CborError, ErrorCode};

/// What happens to the bytes a walk consumes.
trait Consume {
    fn header(&mut self, h: Header);
    fn payload<R: Read>(&mut self, dec: &mut Decoder<R>, len: usize) -> Result<(), CborError>;
}

struct Discard;

impl Consume for Discard {
    fn header(&mut self, _: Header) {}

    fn payload<R: Read>(&mut self, dec: &mut Decoder<R>, len: usize) -> Result<(), CborError> {
        dec.discard(len as u64)
    }
}

struct Capture<'a>(&'a mut Vec<u8>);

impl Consume for Capture<'_> {
    fn header(&mut self, h: Header) {
        self.0.extend_from_slice(h.encode().as_bytes());
    }

    fn payload<R: Read>(&mut self, dec: &mut Decoder<R>, len: usize) -> Result<(), CborError> {
        dec.read_append(len, self.0)
    }
}

/// How tags are treated.
enum Tags<'a> {
    /// Tag 42 payloads are parsed and reported.
    Links(&'a mut dyn FnMut(Cid)),
    /// Every tag is an opaque wrapper around one more value.
    Opaque,
}

fn walk<R: Read, C: Consume>(
    dec: &mut Decoder<R>,
    consume: &mut C,
    mut tags: Tags<'_>,
) -> Result<u64, CborError> {
    let start = dec.position();
    let limits = *dec.limits();
    let mut remaining: u64 = 1;

    while remaining > 0 {
        remaining -= 1;
        let off = dec.position();
        let h = dec.read_header()?;
        consume.header(h);

        let bounded = |max: usize, code: ErrorCode| -> Result<usize, CborError> {
            usize::try_from(h.arg)
                .ok()
                .filter(|&n| n <= max)
                .ok_or_else(|| CborError::new(code, off))
        };
        let owe = |remaining: u64, n: u64| -> Result<u64, CborError> {
            remaining
                .checked_add(n)
                .ok_or_else(|| CborError::new(ErrorCode::LengthOverflow, off))
        };

        match h.major {
            Major::UnsignedInt | Major::NegativeInt | Major::Simple => {}
            Major::ByteString => {
                let len = bounded(limits.max_bytes_len, ErrorCode::TooLong)?;
                consume.payload(dec, len)?;
            }
            Major::TextString => {
                let len = bounded(limits.max_text_len, ErrorCode::TooLong)?;
                consume.payload(dec, len)?;
            }
            Major::Array => {
                let len = bounded(limits.max_array_len, ErrorCode::TooLong)?;
                remaining = owe(remaining, len as u64)?;
            }
            Major::Map => {
                let len = bounded(limits.structural_map_len(), ErrorCode::TooLarge)?;
                remaining = owe(remaining, 2 * len as u64)?;
            }
            Major::Tag => match &mut tags {
                Tags::Links(on_link) if h.arg == TAG_CID => {
                    let inner_off = dec.position();
                    let len = dec.read_len(
                        Major::ByteString,
                        limits.max_scan_cid_len,
                        ErrorCode::TooLong,
                    )?;
                    let payload = dec.read_vec(len)?;
                    (*on_link)(cid_from_payload(payload, inner_off)?);
                }
                _ => remaining = owe(remaining, 1)?,
            },
        }
    }

    Ok(dec.position() - start)
}

/// Walk one value, calling `on_link` for every embedded CID in document order.
///
/// Returns the number of bytes consumed, which is the value's encoded length.
///
/// # Errors
///
/// Returns a decode error for malformed or truncated input, `WrongMajorType` if a tag 42 does
/// not wrap a byte string, and `TooLong` if a link payload exceeds `max_scan_cid_len`.
pub fn scan_for_links<R, F>(dec: &mut Decoder<R>, mut on_link: F) -> Result<u64, CborError>
where
    R: Read,
    F: FnMut(Cid),
{
    let mut found = 0usize;
    let mut count = |cid: Cid| {
        found += 1;
        on_link(cid);
    };
    let consumed = walk(dec, &mut Discard, Tags::Links(&mut count))?;
    debug!(links = found, bytes = consumed, "link scan complete");
    Ok(consumed)
}

/// Collect every CID embedded in the single value encoded in `bytes`.
///
/// # Errors
///
/// Returns `TrailingBytes` if `bytes` holds more than one value, or any scan error.
pub fn links_in(bytes: &[u8]) -> Result<Vec<Cid>, CborError> {
    let mut dec = Decoder::from_slice(bytes);
    let mut links = Vec::new();
    scan_for_links(&mut dec, |cid| links.push(cid))?;
    if !dec.is_at_end()? {
        return Err(CborError::new(ErrorCode::TrailingBytes, dec.position()));
    }
    Ok(links)
}

/// Check that `bytes` holds exactly one well-formed canonical value.
///
/// # Errors
///
/// Returns `UnexpectedEof` on truncation, `TrailingBytes` on extra data, or any scan error.
pub fn validate(bytes: &[u8]) -> Result<(), CborError> {
    let mut dec = Decoder::from_slice(bytes);
    walk(&mut dec, &mut Discard, Tags::Links(&mut |_| {}))?;
    if !dec.is_at_end()? {
        return Err(CborError::new(ErrorCode::TrailingBytes, dec.position()));
    }
    Ok(())
}

/// Consume one value without decoding it. Links are checked but dropped.
pub(crate) fn skip_value<R: Read>(dec: &mut Decoder<R>) -> Result<u64, CborError> {
    walk(dec, &mut Discard, Tags::Links(&mut |_| {}))
}

/// Append the exact bytes of one value to `out`.
pub(crate) fn capture_value<R: Read>(
    dec: &mut Decoder<R>,
    out: &mut Vec<u8>,
) -> Result<u64, CborError> {
    walk(dec, &mut Capture(out), Tags::Opaque)
}
