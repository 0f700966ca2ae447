use std::io::{Read, Write};

use tracing::trace;

use crate::codec::{CborArrayElem, CborDecode, CborEncode};
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::scan::{capture_value, links_in};
use crate::{Cid, CborError, ErrorCode};

/// The exact encoded bytes of one CBOR value, captured without interpretation.
///
/// Decoding copies every header and payload byte of the next value, bounded by the decoder's
/// limits at every nesting level. Encoding writes the captured bytes back verbatim. A
/// `Deferred` that never captured anything is *pristine* and refuses to encode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Deferred {
    raw: Vec<u8>,
}

impl Deferred {
    /// A pristine value.
    #[must_use]
    pub const fn new() -> Self {
        Self { raw: Vec::new() }
    }

    /// Capture the encoding of `value`.
    ///
    /// # Errors
    ///
    /// Returns the value's encode error.
    pub fn from_value<T: CborEncode + ?Sized>(value: &T) -> Result<Self, CborError> {
        Ok(Self {
            raw: crate::encode_to_vec(value)?,
        })
    }

    /// Wrap bytes holding exactly one encoded value.
    ///
    /// # Errors
    ///
    /// Returns `TrailingBytes` if `bytes` holds more than one value, or any decode error.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, CborError> {
        crate::decode_from_slice(bytes)
    }

    /// Capture the next value from `dec` into `buf`, reusing its allocation.
    ///
    /// `buf` is cleared first and becomes the new value's backing storage. On error the buffer
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the value is malformed, truncated or exceeds a bound.
    pub fn decode_reusing<R: Read>(
        dec: &mut Decoder<R>,
        mut buf: Vec<u8>,
    ) -> Result<Self, CborError> {
        if buf.capacity() > 0 {
            trace!(capacity = buf.capacity(), "deferred reusing buffer");
        }
        buf.clear();
        capture_value(dec, &mut buf)?;
        Ok(Self { raw: buf })
    }

    /// Re-decode in place, reusing the current backing storage.
    ///
    /// # Errors
    ///
    /// See [`Deferred::decode_reusing`]. On error `self` is left pristine.
    pub fn redecode<R: Read>(&mut self, dec: &mut Decoder<R>) -> Result<(), CborError> {
        let buf = std::mem::take(&mut self.raw);
        *self = Self::decode_reusing(dec, buf)?;
        Ok(())
    }

    /// Returns `true` if nothing was ever captured.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.raw.is_empty()
    }

    /// The captured bytes (empty when pristine).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consume and return the captured bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    /// Decode the captured value as `T`.
    ///
    /// # Errors
    ///
    /// Returns `PristineDeferred` when pristine, or the decode error.
    pub fn decode_as<T: CborDecode>(&self) -> Result<T, CborError> {
        if self.is_pristine() {
            return Err(CborError::new(ErrorCode::PristineDeferred, 0));
        }
        crate::decode_from_slice(&self.raw)
    }

    /// CIDs embedded in the captured value, in document order.
    ///
    /// # Errors
    ///
    /// Returns `PristineDeferred` when pristine, or the scan error.
    pub fn links(&self) -> Result<Vec<Cid>, CborError> {
        if self.is_pristine() {
            return Err(CborError::new(ErrorCode::PristineDeferred, 0));
        }
        links_in(&self.raw)
    }

    /// SHA-256 of the captured bytes.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    #[must_use]
    pub fn sha256(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut out = [0u8; 32];
        out.copy_from_slice(Sha256::digest(&self.raw).as_slice());
        out
    }
}

impl CborEncode for Deferred {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        if self.is_pristine() {
            return Err(enc.err(ErrorCode::PristineDeferred));
        }
        enc.write_raw(&self.raw)
    }
}

impl CborDecode for Deferred {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        Self::decode_reusing(dec, Vec::new())
    }
}

impl CborArrayElem for Deferred {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_to_vec;

    #[test]
    fn pristine_refuses_to_encode() {
        let err = encode_to_vec(&Deferred::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::PristineDeferred);
    }

    #[test]
    fn reuse_keeps_allocation() {
        let buf = Vec::with_capacity(64);
        let ptr = buf.as_ptr();
        let mut dec = Decoder::from_slice(&[0x82, 0x01, 0x02]);
        let d = Deferred::decode_reusing(&mut dec, buf).unwrap();
        assert_eq!(d.as_bytes(), &[0x82, 0x01, 0x02]);
        assert_eq!(d.into_raw().as_ptr(), ptr);
    }

    #[test]
    fn null_is_captured_as_a_value() {
        let d: Deferred = crate::decode_from_slice(&[0xf6]).unwrap();
        assert_eq!(d.as_bytes(), &[0xf6]);
    }
}
