//! UTF-8 checks for decoded text strings.

/// Turn a decoded text payload into a `String`, rejecting invalid UTF-8.
#[cfg(feature = "simdutf8")]
#[inline]
pub fn into_string(bytes: Vec<u8>) -> Result<String, ()> {
    simdutf8::basic::from_utf8(&bytes)
        .map(str::to_owned)
        .map_err(|_| ())
}

/// Turn a decoded text payload into a `String`, rejecting invalid UTF-8.
#[cfg(not(feature = "simdutf8"))]
#[inline]
pub fn into_string(bytes: Vec<u8>) -> Result<String, ()> {
    String::from_utf8(bytes).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_lone_continuation_byte() {
        assert_eq!(into_string(b"ok".to_vec()), Ok("ok".to_owned()));
        assert!(into_string(vec![b'a', 0x80]).is_err());
        assert!(into_string(vec![0xc3]).is_err());
    }
}
