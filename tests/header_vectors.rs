use cborgen::header::{decode_header, encode_header, header_len, Major};
use cborgen::{decode_from_slice, encode_to_vec, validate, Decoder, ErrorCode};

#[test]
fn unsigned_headers_use_minimal_width() {
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (23, &[0x17]),
        (24, &[0x18, 0x18]),
        (255, &[0x18, 0xff]),
        (256, &[0x19, 0x01, 0x00]),
        (65_535, &[0x19, 0xff, 0xff]),
        (65_536, &[0x1a, 0x00, 0x01, 0x00, 0x00]),
        (u64::from(u32::MAX), &[0x1a, 0xff, 0xff, 0xff, 0xff]),
        (
            1 << 32,
            &[0x1b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00],
        ),
    ];
    for &(n, expected) in cases {
        let h = encode_header(Major::UnsignedInt, n);
        assert_eq!(h.as_bytes(), expected, "n = {n}");
        assert_eq!(header_len(n), expected.len());
        assert_eq!(encode_to_vec(&n).unwrap(), expected);

        let (decoded, used) = decode_header(expected).unwrap();
        assert_eq!(decoded.major, Major::UnsignedInt);
        assert_eq!(decoded.arg, n);
        assert_eq!(used, expected.len());
    }
}

#[test]
fn major_type_occupies_high_bits() {
    assert_eq!(encode_header(Major::TextString, 3).as_bytes(), [0x63]);
    assert_eq!(encode_header(Major::Map, 24).as_bytes(), [0xb8, 0x18]);
    assert_eq!(encode_header(Major::Tag, 42).as_bytes(), [0xd8, 0x2a]);
}

#[test]
fn wider_than_necessary_is_rejected() {
    let cases: &[&[u8]] = &[
        &[0x18, 0x05],
        &[0x19, 0x00, 0xff],
        &[0x1a, 0x00, 0x00, 0xff, 0xff],
        &[0x1b, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff],
        &[0x78, 0x00],
    ];
    for bytes in cases {
        let err = decode_header(bytes).unwrap_err();
        assert_eq!(err.code, ErrorCode::NonCanonicalEncoding, "{bytes:02x?}");
        assert_eq!(validate(bytes).unwrap_err().code, ErrorCode::NonCanonicalEncoding);
    }
}

#[test]
fn reserved_and_indefinite_markers_are_malformed() {
    for ai in 28u8..=31 {
        for major in [0x00u8, 0x40, 0x60, 0x80, 0xa0] {
            let err = decode_header(&[major | ai]).unwrap_err();
            assert_eq!(err.code, ErrorCode::MalformedHeader);
            assert_eq!(err.offset, 0);
        }
    }
}

#[test]
fn truncated_follow_bytes_hit_eof() {
    let err = decode_from_slice::<u64>(&[0x19, 0x01]).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnexpectedEof);

    let err = decode_from_slice::<u64>(&[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnexpectedEof);
}

#[test]
fn errors_report_offset_of_failing_header() {
    // [1, 2, 0x18 0x05]
    let bytes = [0x83, 0x01, 0x02, 0x18, 0x05];
    let err = decode_from_slice::<Vec<u64>>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::NonCanonicalEncoding);
    assert_eq!(err.offset, 3);
}

#[test]
fn decoder_tracks_position() {
    let bytes = [0x19, 0x01, 0x00, 0x61, b'a'];
    let mut dec = Decoder::from_slice(&bytes);
    assert_eq!(dec.read_uint().unwrap(), 256);
    assert_eq!(dec.position(), 3);
    assert_eq!(dec.read_text().unwrap(), "a");
    assert!(dec.is_at_end().unwrap());
}

#[test]
fn negative_integers_use_minus_one_encoding() {
    assert_eq!(encode_to_vec(&-1i64).unwrap(), [0x20]);
    assert_eq!(encode_to_vec(&-24i64).unwrap(), [0x37]);
    assert_eq!(encode_to_vec(&-25i64).unwrap(), [0x38, 0x18]);
    assert_eq!(
        encode_to_vec(&i64::MIN).unwrap(),
        [0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
    );
    assert_eq!(decode_from_slice::<i64>(&[0x38, 0x18]).unwrap(), -25);
}

#[test]
fn out_of_range_integers_overflow() {
    assert_eq!(
        decode_from_slice::<u8>(&[0x19, 0x01, 0x00]).unwrap_err().code,
        ErrorCode::Overflow
    );
    assert_eq!(decode_from_slice::<i8>(&[0x38, 0x80]).unwrap_err().code, ErrorCode::Overflow);
    assert_eq!(
        decode_from_slice::<i64>(&[0x3b, 0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap_err().code,
        ErrorCode::Overflow
    );
}

#[test]
fn booleans_and_null() {
    assert_eq!(encode_to_vec(&true).unwrap(), [0xf5]);
    assert_eq!(encode_to_vec(&false).unwrap(), [0xf4]);
    assert_eq!(decode_from_slice::<bool>(&[0xf6]).unwrap_err().code, ErrorCode::BadBoolean);
    assert_eq!(decode_from_slice::<bool>(&[0x01]).unwrap_err().code, ErrorCode::WrongMajorType);
    assert_eq!(encode_to_vec(&None::<u8>).unwrap(), [0xf6]);
    assert_eq!(decode_from_slice::<Option<u8>>(&[0xf6]).unwrap(), None);
    assert_eq!(decode_from_slice::<Option<u8>>(&[0x07]).unwrap(), Some(7));
}
