use crate::{CborError, ErrorCode};

/// Maximum text string length, array length and tuple arity.
pub const MAX_LENGTH: usize = 8192;

/// Maximum byte string length (2 MiB).
pub const BYTE_ARRAY_MAX_LEN: usize = 2 << 20;

/// Maximum number of entries in a `map<string, T>` value.
pub const MAX_MAP_LEN: usize = 4096;

/// Maximum length of a tagged CID payload, multibase marker included.
pub const MAX_CID_LEN: usize = 512;

/// Maximum CID payload length the link scanner will buffer.
pub const MAX_SCAN_CID_LEN: usize = 100;

/// Maximum bignum magnitude length in bytes.
pub const MAX_BIGINT_LEN: usize = 256;

/// Resource bounds enforced by [`crate::Encoder`] and [`crate::Decoder`].
///
/// The defaults are the wire constants every producer and consumer agrees on. Tightening them is
/// safe for decoding untrusted input; loosening them produces bytes other peers may reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum text string length in UTF-8 bytes.
    pub max_text_len: usize,
    /// Maximum byte string length.
    pub max_bytes_len: usize,
    /// Maximum array length (elements).
    pub max_array_len: usize,
    /// Maximum `map<string, T>` length (entries).
    pub max_map_len: usize,
    /// Maximum number of entries in a map-represented record.
    ///
    /// Structural walks (link scan, skip, [`crate::Deferred`] capture) cannot tell a record
    /// from a `map<string, T>`, so they accept the larger of this and `max_map_len`.
    pub max_record_entries: usize,
    /// Maximum CID payload length, multibase marker included.
    pub max_cid_len: usize,
    /// Maximum CID payload length accepted by the link scanner.
    pub max_scan_cid_len: usize,
    /// Maximum bignum magnitude length in bytes.
    pub max_bigint_len: usize,
}

impl Limits {
    /// The wire-format bounds.
    pub const DEFAULT: Self = Self {
        max_text_len: MAX_LENGTH,
        max_bytes_len: BYTE_ARRAY_MAX_LEN,
        max_array_len: MAX_LENGTH,
        max_map_len: MAX_MAP_LEN,
        max_record_entries: MAX_LENGTH,
        max_cid_len: MAX_CID_LEN,
        max_scan_cid_len: MAX_SCAN_CID_LEN,
        max_bigint_len: MAX_BIGINT_LEN,
    };

    /// Map bound applied by structural walks, which must admit both plain maps and records.
    #[must_use]
    pub const fn structural_map_len(&self) -> usize {
        if self.max_record_entries > self.max_map_len {
            self.max_record_entries
        } else {
            self.max_map_len
        }
    }

    /// Check the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimits` if the CID bounds cannot hold a marker byte plus one identifier
    /// byte, or if the scanner bound exceeds the general CID bound.
    pub const fn validate(self) -> Result<Self, CborError> {
        if self.max_cid_len < 2 || self.max_scan_cid_len < 2 {
            return Err(CborError::new(ErrorCode::InvalidLimits, 0));
        }
        if self.max_scan_cid_len > self.max_cid_len {
            return Err(CborError::new(ErrorCode::InvalidLimits, 0));
        }
        Ok(self)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_validate() {
        assert_eq!(Limits::DEFAULT.validate(), Ok(Limits::DEFAULT));
        assert_eq!(BYTE_ARRAY_MAX_LEN, 2_097_152);
    }

    #[test]
    fn scan_bound_above_cid_bound_is_rejected() {
        let limits = Limits {
            max_scan_cid_len: 600,
            ..Limits::DEFAULT
        };
        let err = limits.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidLimits);
    }

    #[test]
    fn structural_walks_take_the_wider_map_bound() {
        assert_eq!(Limits::DEFAULT.structural_map_len(), MAX_LENGTH);
        let limits = Limits {
            max_map_len: 10_000,
            ..Limits::DEFAULT
        };
        assert_eq!(limits.structural_map_len(), 10_000);
    }
}
