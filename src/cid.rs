//! Content identifier links: tag 42 wrapping a byte string of `0x00` (binary multibase) followed
//! by the raw identifier bytes.

use core::fmt;
use std::io::{Read, Write};

use crate::codec::{CborArrayElem, CborDecode, CborEncode};
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::header::{Major, TAG_CID};
use crate::{CborError, ErrorCode};

/// Binary multibase prefix carried in front of every encoded identifier.
pub const MULTIBASE_IDENTITY: u8 = 0x00;

/// Multicodec code for dag-cbor content.
#[cfg(feature = "sha2")]
pub const DAG_CBOR_CODEC: u64 = 0x71;

/// Multihash code for SHA2-256.
#[cfg(feature = "sha2")]
const SHA2_256_CODE: u64 = 0x12;

/// An opaque content identifier.
///
/// The codec never inspects the identifier's internal structure; it only carries its raw bytes.
/// The empty identifier is the undefined sentinel, which cannot be encoded.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    bytes: Vec<u8>,
}

impl Cid {
    /// The undefined sentinel.
    #[must_use]
    pub const fn undef() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Wrap raw identifier bytes (without the multibase prefix).
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns `true` for the undefined sentinel.
    #[must_use]
    pub fn is_undef(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the raw identifier bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Raw identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the identifier, returning its raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Build a CIDv1 over `data` with a SHA2-256 multihash.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    #[must_use]
    pub fn new_v1_sha256(codec: u64, data: &[u8]) -> Self {
        use sha2::{Digest, Sha256};

        let digest = Sha256::digest(data);
        let mut bytes = Vec::with_capacity(36 + digest.len());
        push_varint(&mut bytes, 1);
        push_varint(&mut bytes, codec);
        push_varint(&mut bytes, SHA2_256_CODE);
        push_varint(&mut bytes, digest.len() as u64);
        bytes.extend_from_slice(&digest);
        Self { bytes }
    }
}

#[cfg(feature = "sha2")]
fn push_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undef() {
            return f.write_str("Cid(undef)");
        }
        write!(f, "Cid({self})")
    }
}

/// Base16 multibase form (`f` prefix, lowercase hex).
impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&multibase::encode(multibase::Base::Base16Lower, &self.bytes))
    }
}

/// Interpret a tag-42 byte-string payload. `off` is the payload's header offset.
pub(crate) fn cid_from_payload(mut payload: Vec<u8>, off: u64) -> Result<Cid, CborError> {
    if payload.len() < 2 {
        return Err(CborError::new(ErrorCode::UndefinedLink, off));
    }
    if payload[0] != MULTIBASE_IDENTITY {
        return Err(CborError::new(ErrorCode::UnsupportedMultibase, off));
    }
    payload.remove(0);
    Ok(Cid { bytes: payload })
}

impl CborEncode for Cid {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        if self.is_undef() {
            return Err(enc.err(ErrorCode::UndefinedLink));
        }
        let len = self.bytes.len() + 1;
        if len > enc.limits().max_cid_len {
            return Err(enc.err(ErrorCode::TooLong));
        }
        enc.tag(TAG_CID)?;
        enc.header(Major::ByteString, len as u64)?;
        enc.write_raw(&[MULTIBASE_IDENTITY])?;
        enc.write_raw(&self.bytes)
    }
}

impl CborDecode for Cid {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        dec.expect_tag(TAG_CID)?;
        let off = dec.position();
        let max = dec.limits().max_cid_len;
        let len = dec.read_len(Major::ByteString, max, ErrorCode::TooLong)?;
        let payload = dec.read_vec(len)?;
        cid_from_payload(payload, off)
    }
}

impl CborArrayElem for Cid {}
