//! # cborgen
//!
//! Canonical, deterministic CBOR for records in content-addressed systems, where re-encoding must
//! reproduce identical bytes and embedded links must be discoverable without a full decode.
//!
//! ## Design principles
//!
//! - **Canonical bytes only.**
//!   Headers always use the shortest width; a decoder rejects wider-than-necessary headers and
//!   indefinite-length items, so a decoded value re-encodes to the bytes it came from.
//! - **Bounded against hostile input.**
//!   Every length is checked against [`Limits`] before any allocation or copy.
//! - **Streaming I/O.**
//!   [`Encoder`] writes to any [`std::io::Write`]; [`Decoder`] reads from any [`std::io::Read`]
//!   with a one-byte pushback for optional values.
//!
//! ## Wire conventions
//!
//! - Links ([`Cid`]): tag 42 over a byte string of `0x00` followed by the identifier bytes. The
//!   undefined identifier never encodes.
//! - Bignums ([`BigInt`]): tag 2 over the big-endian magnitude; only non-negative values exist.
//! - Absent optional values are `null` (`0xf6`).
//! - Records ([`CborEncode`]/[`CborDecode`] derives, or [`RecordSchema`]):
//!   - *tuple*: an array with exactly one element per field, in declaration order;
//!   - *map*: a text-keyed map in canonical key order (shorter key first, then byte-wise).
//!     Unknown keys are skipped and missing keys keep their default, which is how map records
//!     evolve. Tuple records never evolve: any length change is `ArityMismatch`.
//! - [`Deferred`] captures one value's exact bytes and writes them back verbatim.
//! - [`scan_for_links`] walks a value header by header and reports every embedded link.
//!
//! ## Derive
//!
//! ```
//! use cborgen::{decode_from_slice, encode_to_vec, CborDecode, CborEncode, Cid};
//!
//! #[derive(Debug, PartialEq, CborEncode, CborDecode)]
//! struct Entry {
//!     name: String,
//!     #[cbor(rename = "sz")]
//!     size: u64,
//!     link: Option<Cid>,
//! }
//!
//! let entry = Entry { name: "a".into(), size: 3, link: None };
//! let bytes = encode_to_vec(&entry).unwrap();
//! assert_eq!(bytes, [0xa3, 0x62, b's', b'z', 0x03, 0x64, b'l', b'i', b'n', b'k', 0xf6,
//!                    0x64, b'n', b'a', b'm', b'e', 0x61, b'a']);
//! assert_eq!(decode_from_slice::<Entry>(&bytes).unwrap(), entry);
//! ```
//!
//! ## Feature flags
//!
//! - `sha2` *(default)*: [`Cid::new_v1_sha256`], [`cid_of`] and [`Deferred::sha256`].
//! - `simdutf8`: SIMD-accelerated UTF-8 validation for decoded text.
//!
//! ## Logging
//!
//! Diagnostic events go through [`tracing`]: skipped unknown fields and buffer reuse at `trace`,
//! link-scan summaries at `debug`. No subscriber is installed.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod bigint;
mod cid;
mod codec;
mod decode;
mod deferred;
mod encode;
mod error;
pub mod header;
mod limits;
pub mod order;
mod record;
mod scan;
mod schema;
mod time;
mod utf8;

pub use crate::bigint::BigInt;
#[cfg(feature = "sha2")]
pub use crate::cid::DAG_CBOR_CODEC;
pub use crate::cid::{Cid, MULTIBASE_IDENTITY};
pub use crate::codec::{
    decode_from_reader, decode_from_slice, encode_into, encode_to_vec, CborArrayElem, CborDecode,
    CborEncode,
};
pub use crate::decode::Decoder;
pub use crate::deferred::Deferred;
pub use crate::encode::{ArrayEncoder, Encoder, MapEncoder};
pub use crate::error::{CborError, ErrorCode};
pub use crate::limits::{
    Limits, BYTE_ARRAY_MAX_LEN, MAX_BIGINT_LEN, MAX_CID_LEN, MAX_LENGTH, MAX_MAP_LEN,
    MAX_SCAN_CID_LEN,
};
pub use crate::record::Representation;
pub use crate::scan::{links_in, scan_for_links, validate};
pub use crate::schema::{FieldSchema, RecordSchema, Value, Width, WireKind};
pub use crate::time::CborTime;

pub use cborgen_derive::{CborDecode, CborEncode};

/// Runtime hooks called by derived impls.
#[doc(hidden)]
pub mod __private {
    pub use crate::record::{expect_tuple, read_field_key, read_record_len, skip_unknown_field};
}

/// The dag-cbor CIDv1 (SHA2-256) of `value`'s canonical encoding.
///
/// # Errors
///
/// Returns the value's encode error.
#[cfg(feature = "sha2")]
#[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
pub fn cid_of<T: CborEncode + ?Sized>(value: &T) -> Result<Cid, CborError> {
    let bytes = encode_to_vec(value)?;
    Ok(Cid::new_v1_sha256(DAG_CBOR_CODEC, &bytes))
}
