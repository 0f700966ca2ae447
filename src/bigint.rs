use std::io::{Read, Write};

use crate::codec::{CborArrayElem, CborDecode, CborEncode};
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::header::{Major, TAG_BIGNUM};
use crate::{CborError, ErrorCode};

/// Arbitrary-precision non-negative integer, encoded as tag 2 over its big-endian magnitude.
///
/// The magnitude is kept minimal (no leading zero bytes); zero has an empty magnitude.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BigInt {
    magnitude: Vec<u8>,
}

impl BigInt {
    /// Zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            magnitude: Vec::new(),
        }
    }

    /// Construct from big-endian magnitude bytes. Leading zero bytes are dropped.
    #[must_use]
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self {
            magnitude: bytes[start..].to_vec(),
        }
    }

    /// Minimal big-endian magnitude.
    #[must_use]
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    /// Returns `true` for zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// Convert to `u128` if it fits.
    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        if self.magnitude.len() > 16 {
            return None;
        }
        let mut buf = [0u8; 16];
        buf[16 - self.magnitude.len()..].copy_from_slice(&self.magnitude);
        Some(u128::from_be_bytes(buf))
    }
}

impl From<u64> for BigInt {
    fn from(v: u64) -> Self {
        Self::from_be_bytes(&v.to_be_bytes())
    }
}

impl From<u128> for BigInt {
    fn from(v: u128) -> Self {
        Self::from_be_bytes(&v.to_be_bytes())
    }
}

impl CborEncode for BigInt {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        if self.magnitude.len() > enc.limits().max_bigint_len {
            return Err(enc.err(ErrorCode::TooLarge));
        }
        enc.tag(TAG_BIGNUM)?;
        enc.header(Major::ByteString, self.magnitude.len() as u64)?;
        enc.write_raw(&self.magnitude)
    }
}

impl CborDecode for BigInt {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        dec.expect_tag(TAG_BIGNUM)?;
        let max = dec.limits().max_bigint_len;
        let len = dec.read_len(Major::ByteString, max, ErrorCode::TooLarge)?;
        let mut magnitude = dec.read_vec(len)?;
        let leading = magnitude.iter().take_while(|&&b| b == 0).count();
        magnitude.drain(..leading);
        Ok(Self { magnitude })
    }
}

impl CborArrayElem for BigInt {}
