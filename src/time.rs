use std::io::{Read, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec::{CborArrayElem, CborDecode, CborEncode};
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::{CborError, ErrorCode};

/// A wall-clock instant encoded as a signed integer of nanoseconds since the Unix epoch.
///
/// Instants outside roughly 1677..2262 do not fit and fail with `Overflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CborTime(pub SystemTime);

impl CborTime {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// Nanoseconds since the Unix epoch, if representable as `i64`.
    #[must_use]
    pub fn unix_nanos(&self) -> Option<i64> {
        match self.0.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_nanos()).ok(),
            Err(before) => i64::try_from(before.duration().as_nanos()).ok().map(|n| -n),
        }
    }

    /// Build from nanoseconds since the Unix epoch.
    #[must_use]
    pub fn from_unix_nanos(nanos: i64) -> Self {
        let magnitude = Duration::from_nanos(nanos.unsigned_abs());
        if nanos >= 0 {
            Self(UNIX_EPOCH + magnitude)
        } else {
            Self(UNIX_EPOCH - magnitude)
        }
    }
}

impl Default for CborTime {
    fn default() -> Self {
        Self(UNIX_EPOCH)
    }
}

impl From<SystemTime> for CborTime {
    fn from(t: SystemTime) -> Self {
        Self(t)
    }
}

impl From<CborTime> for SystemTime {
    fn from(t: CborTime) -> Self {
        t.0
    }
}

impl CborEncode for CborTime {
    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> Result<(), CborError> {
        let nanos = self.unix_nanos().ok_or_else(|| enc.err(ErrorCode::Overflow))?;
        enc.int(nanos)
    }
}

impl CborDecode for CborTime {
    fn decode<R: Read>(dec: &mut Decoder<R>) -> Result<Self, CborError> {
        i64::decode(dec).map(Self::from_unix_nanos)
    }
}

impl CborArrayElem for CborTime {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_from_slice, encode_to_vec};

    #[test]
    fn pre_epoch_is_negative() {
        let t = CborTime::from_unix_nanos(-1_500);
        assert_eq!(encode_to_vec(&t).unwrap(), vec![0x39, 0x05, 0xdb]);
        assert_eq!(decode_from_slice::<CborTime>(&[0x39, 0x05, 0xdb]).unwrap(), t);
    }

    #[test]
    fn nanosecond_precision_survives() {
        let t = CborTime::from_unix_nanos(1_700_000_000_123_456_789);
        let back: CborTime = decode_from_slice(&encode_to_vec(&t).unwrap()).unwrap();
        assert_eq!(back.unix_nanos(), Some(1_700_000_000_123_456_789));
    }
}
