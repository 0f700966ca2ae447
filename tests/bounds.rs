use std::collections::BTreeMap;

use cborgen::header::{encode_header, Major};
use cborgen::{
    decode_from_slice, encode_to_vec, validate, BigInt, CborDecode, CborEncode, Decoder, Deferred,
    Encoder, ErrorCode, Limits, BYTE_ARRAY_MAX_LEN, MAX_BIGINT_LEN, MAX_LENGTH, MAX_MAP_LEN,
};

fn tstr_encoded(len: usize) -> Vec<u8> {
    let mut out = encode_header(Major::TextString, len as u64).as_bytes().to_vec();
    out.extend(std::iter::repeat(b'x').take(len));
    out
}

fn bstr_encoded(len: usize) -> Vec<u8> {
    let mut out = encode_header(Major::ByteString, len as u64).as_bytes().to_vec();
    out.resize(out.len() + len, 0xaa);
    out
}

// `n` entries keyed k0000, k0001, ...; equal-length keys sort byte-wise.
fn wide_record(enc: &mut Encoder, n: usize) -> Result<(), cborgen::CborError> {
    enc.record(n, |m| {
        for i in 0..n {
            m.value(&format!("k{i:04}"), &0u8)?;
        }
        Ok(())
    })
}

#[test]
fn text_at_limit_is_accepted() {
    let s = "x".repeat(MAX_LENGTH);
    let bytes = encode_to_vec(&s).unwrap();
    assert_eq!(bytes, tstr_encoded(MAX_LENGTH));
    assert_eq!(decode_from_slice::<String>(&bytes).unwrap(), s);
}

#[test]
fn text_over_limit_is_too_long_both_ways() {
    let s = "x".repeat(MAX_LENGTH + 1);
    let err = encode_to_vec(&s).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
    assert_eq!(err.offset, 0);

    let err = decode_from_slice::<String>(&tstr_encoded(MAX_LENGTH + 1)).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
    assert_eq!(err.offset, 0);
}

#[test]
fn declared_length_is_checked_before_reading() {
    // claims 2^32 bytes; nothing follows
    let bytes = [0x5b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
    let err = decode_from_slice::<Vec<u8>>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);

    let bytes = [0x9a, 0x00, 0x10, 0x00, 0x00];
    let err = decode_from_slice::<Vec<u64>>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
    assert_eq!(validate(&bytes).unwrap_err().code, ErrorCode::TooLong);
}

#[test]
fn oversized_maps_are_too_large() {
    let mut bytes = encode_header(Major::Map, (MAX_MAP_LEN + 1) as u64).as_bytes().to_vec();
    bytes.push(0x00);
    let err = decode_from_slice::<BTreeMap<String, u8>>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLarge);
    assert_eq!(validate(&bytes).unwrap_err().code, ErrorCode::TooLarge);
}

#[test]
fn bytes_at_limit_are_accepted() {
    let b = vec![0xaau8; BYTE_ARRAY_MAX_LEN];
    let bytes = encode_to_vec(&b).unwrap();
    assert_eq!(bytes, bstr_encoded(BYTE_ARRAY_MAX_LEN));
    assert_eq!(decode_from_slice::<Vec<u8>>(&bytes).unwrap(), b);
}

#[test]
fn bytes_over_limit_are_too_long_both_ways() {
    let err = encode_to_vec(&vec![0xaau8; BYTE_ARRAY_MAX_LEN + 1]).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
    assert_eq!(err.offset, 0);

    let bytes = bstr_encoded(BYTE_ARRAY_MAX_LEN + 1);
    let err = decode_from_slice::<Vec<u8>>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
    assert_eq!(err.offset, 0);
    assert_eq!(validate(&bytes).unwrap_err().code, ErrorCode::TooLong);
}

#[test]
fn map_builder_over_limit_is_too_large() {
    let mut enc = Encoder::new();
    let err = enc.map(MAX_MAP_LEN + 1, |_| Ok(())).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLarge);
    assert_eq!(err.offset, 0);
    assert!(enc.as_bytes().is_empty());

    let mut enc = Encoder::new();
    enc.map(0, |_| Ok(())).unwrap();
    assert_eq!(enc.as_bytes(), [0xa0]);
}

#[test]
fn bigint_magnitude_limit_both_ways() {
    let at_limit = BigInt::from_be_bytes(&vec![0x01; MAX_BIGINT_LEN]);
    let bytes = encode_to_vec(&at_limit).unwrap();
    assert_eq!(decode_from_slice::<BigInt>(&bytes).unwrap(), at_limit);

    let over = BigInt::from_be_bytes(&vec![0x01; MAX_BIGINT_LEN + 1]);
    assert_eq!(encode_to_vec(&over).unwrap_err().code, ErrorCode::TooLarge);

    let mut bytes = vec![0xc2];
    bytes.extend(bstr_encoded(MAX_BIGINT_LEN + 1));
    let err = decode_from_slice::<BigInt>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLarge);
    assert_eq!(err.offset, 1);
}

#[test]
fn records_are_bounded_by_record_entries() {
    let mut enc = Encoder::new();
    wide_record(&mut enc, MAX_MAP_LEN + 1).unwrap();
    assert_eq!(&enc.as_bytes()[..3], [0xb9, 0x10, 0x01]);

    let limit = Limits::default().max_record_entries;
    let err = wide_record(&mut Encoder::new(), limit + 1).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLarge);
    assert_eq!(err.offset, 0);
}

#[derive(Debug, Default, PartialEq, CborEncode, CborDecode)]
struct Holder {
    body: Option<Deferred>,
    tag: u8,
}

#[test]
fn wide_records_pass_structural_walks() {
    let mut enc = Encoder::new();
    wide_record(&mut enc, 5000).unwrap();
    let wide = enc.into_vec();
    validate(&wide).unwrap();

    // { "body": wide, "extra": wide, "tag": 7 }
    let mut enc = Encoder::new();
    enc.map(3, |m| {
        m.entry("tag", |e| e.uint(7))?;
        m.entry("body", |e| e.write_raw(&wide))?;
        m.entry("extra", |e| e.write_raw(&wide))
    })
    .unwrap();
    let bytes = enc.into_vec();

    let holder = decode_from_slice::<Holder>(&bytes).unwrap();
    assert_eq!(holder.tag, 7);
    let body = holder.body.unwrap();
    assert_eq!(body.as_bytes(), wide.as_slice());

    let mut dec = Decoder::new(bytes.as_slice());
    dec.skip_value().unwrap();

    let err = decode_from_slice::<BTreeMap<String, u8>>(&wide).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLarge);
}

#[test]
fn custom_limits_apply_to_nested_values() {
    let limits = Limits { max_text_len: 4, ..Limits::default() };
    // [[ "hello" ]]
    let bytes = [0x81, 0x81, 0x65, b'h', b'e', b'l', b'l', b'o'];
    let mut dec = Decoder::with_limits(bytes.as_slice(), limits).unwrap();
    let err = Vec::<Vec<String>>::decode(&mut dec).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
    assert_eq!(err.offset, 2);

    let mut dec = Decoder::with_limits(bytes.as_slice(), limits).unwrap();
    let err = dec.skip_value().unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
}

#[test]
fn encoder_limits_are_configurable() {
    let limits = Limits { max_array_len: 2, ..Limits::default() };
    let mut enc = Encoder::new().with_limits(limits).unwrap();
    let err = enc.value(&vec![1u16, 2, 3]).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooLong);
}

#[test]
fn inconsistent_limits_are_invalid() {
    let limits = Limits { max_scan_cid_len: 600, ..Limits::default() };
    assert_eq!(limits.validate().unwrap_err().code, ErrorCode::InvalidLimits);
    assert!(Decoder::with_limits(b"".as_slice(), limits).is_err());
    assert!(Encoder::new().with_limits(Limits { max_cid_len: 1, ..limits }).is_err());
}

#[test]
fn builder_arity_is_enforced() {
    let mut enc = Encoder::new();
    let err = enc.array(2, |a| a.value(&1u8)).unwrap_err();
    assert_eq!(err.code, ErrorCode::ArityMismatch);

    let mut enc = Encoder::new();
    let err = enc
        .map(2, |m| {
            m.value("b", &1u8)?;
            m.value("a", &2u8)
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NonCanonicalMapOrder);
}

#[test]
fn invalid_utf8_is_rejected() {
    let err = decode_from_slice::<String>(&[0x62, 0xc3, 0x28]).unwrap_err();
    assert_eq!(err.code, ErrorCode::Utf8Invalid);
}
