//! Runtime half of the record conventions shared by derived impls and [`crate::RecordSchema`].
//!
//! A *tuple* record is an array of exactly as many elements as the record has wire fields, in
//! declaration order; any other count is `ArityMismatch`. A *map* record is a text-keyed map in
//! canonical key order. Map decoding tolerates unknown keys (their values are skipped
//! structurally) and missing keys (fields keep their default). Tuple strictness and map
//! tolerance together are the schema-evolution rule: add fields to map records only.

use std::io::Read;

use tracing::trace;

use crate::decode::Decoder;
use crate::header::Major;
use crate::{CborError, ErrorCode};

/// Wire representation of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    /// Fixed-length array in declaration order.
    Tuple,
    /// Text-keyed map in canonical key order.
    #[default]
    Map,
}

/// Read a tuple record's array header and require exactly `fields` elements.
///
/// # Errors
///
/// Returns `ArityMismatch` for any other element count, `TooLong` above `max_array_len`.
pub fn expect_tuple<R: Read>(dec: &mut Decoder<R>, fields: usize) -> Result<(), CborError> {
    let off = dec.position();
    let len = dec.read_array_len()?;
    if len != fields {
        return Err(CborError::new(ErrorCode::ArityMismatch, off));
    }
    Ok(())
}

/// Read a map record's header, returning its entry count.
///
/// # Errors
///
/// Returns `TooLarge` above `max_record_entries`.
pub fn read_record_len<R: Read>(dec: &mut Decoder<R>) -> Result<usize, CborError> {
    let max = dec.limits().max_record_entries;
    dec.read_len(Major::Map, max, ErrorCode::TooLarge)
}

/// Read the next map record key.
///
/// # Errors
///
/// Returns `WrongMajorType` for non-text keys, `TooLong` above `max_text_len`.
pub fn read_field_key<R: Read>(dec: &mut Decoder<R>) -> Result<String, CborError> {
    dec.read_text()
}

/// Consume the value of a key the record does not declare.
///
/// # Errors
///
/// Returns a decode error if the value is malformed.
pub fn skip_unknown_field<R: Read>(
    dec: &mut Decoder<R>,
    record: &'static str,
    key: &str,
) -> Result<(), CborError> {
    let skipped = crate::scan::skip_value(dec)?;
    trace!(record, key, bytes = skipped, "skipped unknown field");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_count_must_match() {
        let mut dec = Decoder::from_slice(&[0x83, 1, 2, 3]);
        let err = expect_tuple(&mut dec, 4).unwrap_err();
        assert_eq!(err.code, ErrorCode::ArityMismatch);
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn unknown_field_value_is_consumed() {
        let mut dec = Decoder::from_slice(&[0xa1, 0x61, b'x', 0x82, 0x01, 0x41, 0xff, 0x07]);
        assert_eq!(read_record_len(&mut dec).unwrap(), 1);
        let key = read_field_key(&mut dec).unwrap();
        skip_unknown_field(&mut dec, "Test", &key).unwrap();
        assert_eq!(dec.read_uint().unwrap(), 7);
    }
}
