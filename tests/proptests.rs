// Property-based tests for canonical roundtrips, link scanning and record evolution.
//
// Sizes stay small to keep CI fast.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use std::collections::BTreeMap;

use cborgen::header::{header_len, Major};
use cborgen::order::cmp_text_keys;
use cborgen::{
    decode_from_slice, encode_to_vec, links_in, validate, BigInt, CborDecode, CborEncode, Cid,
    Deferred, ErrorCode,
};

fn arb_key() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('a', 'z'), 0..12)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_cid() -> impl Strategy<Value = Cid> {
    proptest::collection::vec(any::<u8>(), 2..40).prop_map(Cid::from_bytes)
}

#[derive(Debug, Default, Clone, PartialEq, CborEncode, CborDecode)]
struct Doc {
    title: String,
    links: Vec<Cid>,
    counts: BTreeMap<String, u64>,
    delta: i64,
    blob: Vec<u8>,
    size: BigInt,
    parent: Option<Cid>,
}

#[derive(Debug, Default, Clone, PartialEq, CborEncode, CborDecode)]
struct DocV0 {
    title: String,
    delta: i64,
}

fn arb_doc() -> impl Strategy<Value = Doc> {
    (
        arb_key(),
        proptest::collection::vec(arb_cid(), 0..6),
        proptest::collection::btree_map(arb_key(), any::<u64>(), 0..8),
        any::<i64>(),
        proptest::collection::vec(any::<u8>(), 0..64),
        proptest::collection::vec(any::<u8>(), 0..20),
        proptest::option::of(arb_cid()),
    )
        .prop_map(|(title, links, counts, delta, blob, size, parent)| Doc {
            title,
            links,
            counts,
            delta,
            blob,
            size: BigInt::from_be_bytes(&size),
            parent,
        })
}

proptest! {
    #[test]
    fn uint_header_is_minimal(n in any::<u64>()) {
        let bytes = encode_to_vec(&n).unwrap();
        prop_assert_eq!(bytes.len(), header_len(n));
        prop_assert_eq!(decode_from_slice::<u64>(&bytes).unwrap(), n);

        // one width up is always rejected
        let wider: Vec<u8> = match bytes.len() {
            1 => vec![0x18, n as u8],
            2 => { let mut v = vec![0x19]; v.extend_from_slice(&(n as u16).to_be_bytes()); v }
            3 => { let mut v = vec![0x1a]; v.extend_from_slice(&(n as u32).to_be_bytes()); v }
            5 => { let mut v = vec![0x1b]; v.extend_from_slice(&n.to_be_bytes()); v }
            _ => return Ok(()),
        };
        let err = decode_from_slice::<u64>(&wider).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::NonCanonicalEncoding);
    }

    #[test]
    fn doc_roundtrip_is_byte_identical(doc in arb_doc()) {
        let bytes = encode_to_vec(&doc).unwrap();
        validate(&bytes).unwrap();

        let back: Doc = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(&back, &doc);
        prop_assert_eq!(encode_to_vec(&back).unwrap(), bytes.clone());

        let raw: Deferred = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(raw.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn scan_finds_every_short_link(doc in arb_doc()) {
        let bytes = encode_to_vec(&doc).unwrap();
        let mut expected: Vec<Cid> = doc.links.clone();
        if let Some(p) = &doc.parent {
            // "links" sorts before "parent"
            expected.push(p.clone());
        }
        prop_assert_eq!(links_in(&bytes).unwrap(), expected);
    }

    #[test]
    fn map_keys_are_canonically_ordered(keys in proptest::collection::btree_set(arb_key(), 0..16)) {
        let map: BTreeMap<String, u8> = keys.iter().map(|k| (k.clone(), 0)).collect();
        let bytes = encode_to_vec(&map).unwrap();

        let mut dec = cborgen::Decoder::from_slice(&bytes);
        let n = dec.read_map_len().unwrap();
        let mut prev: Option<String> = None;
        for _ in 0..n {
            let k = dec.read_text().unwrap();
            dec.read_uint().unwrap();
            if let Some(p) = &prev {
                prop_assert_eq!(cmp_text_keys(p, &k), std::cmp::Ordering::Less);
            }
            prev = Some(k);
        }
    }

    #[test]
    fn older_readers_accept_newer_docs(doc in arb_doc()) {
        let bytes = encode_to_vec(&doc).unwrap();
        let old: DocV0 = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(old.clone(), DocV0 { title: doc.title.clone(), delta: doc.delta });

        let widened: Doc = decode_from_slice(&encode_to_vec(&old).unwrap()).unwrap();
        prop_assert_eq!(widened.title, doc.title);
        prop_assert!(widened.links.is_empty());
    }

    #[test]
    fn arbitrary_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        if validate(&bytes).is_ok() {
            let raw: Deferred = decode_from_slice(&bytes).unwrap();
            prop_assert_eq!(raw.as_bytes(), bytes.as_slice());
        }
        let _ = decode_from_slice::<Doc>(&bytes);
        let _ = cborgen::header::decode_header(&bytes);
        let _ = Major::from_initial_byte(bytes.first().copied().unwrap_or(0));
    }
}
