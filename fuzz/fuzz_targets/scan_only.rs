#![no_main]

use libfuzzer_sys::fuzz_target;

use cborgen::{scan_for_links, Decoder};

fuzz_target!(|data: &[u8]| {
    let mut dec = Decoder::from_slice(data);
    if let Ok(consumed) = scan_for_links(&mut dec, |_| {}) {
        assert!(consumed <= data.len() as u64);
        assert_eq!(consumed, dec.position());
    }
});
