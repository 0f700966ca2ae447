#![no_main]

use libfuzzer_sys::fuzz_target;

use cborgen::{decode_from_slice, encode_to_vec, BigInt, CborDecode, CborEncode, Cid};

#[derive(Debug, Default, PartialEq, CborEncode, CborDecode)]
#[cbor(tuple)]
struct Header {
    version: u8,
    parent: Option<Cid>,
}

#[derive(Debug, Default, PartialEq, CborEncode, CborDecode)]
struct Record {
    header: Header,
    name: String,
    tags: Vec<String>,
    weight: BigInt,
    delta: i32,
}

fuzz_target!(|data: &[u8]| {
    // Decoded records re-encode canonically and decode back to the same value.
    if let Ok(rec) = decode_from_slice::<Record>(data) {
        let out = encode_to_vec(&rec).expect("re-encode");
        let again: Record = decode_from_slice(&out).expect("decode re-encoded");
        assert_eq!(again, rec);
    }
});
