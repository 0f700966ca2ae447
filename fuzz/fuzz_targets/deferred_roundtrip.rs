#![no_main]

use libfuzzer_sys::fuzz_target;

use cborgen::{decode_from_slice, encode_to_vec, validate, Deferred};

fuzz_target!(|data: &[u8]| {
    // Anything the validator accepts must be captured and written back byte for byte.
    if validate(data).is_ok() {
        let raw: Deferred = decode_from_slice(data).expect("capture after validate");
        assert_eq!(raw.as_bytes(), data);
        assert_eq!(encode_to_vec(&raw).expect("re-encode"), data);
    }
});
