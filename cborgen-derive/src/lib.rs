//! Derive macros for `cborgen`.
//!
//! `#[derive(CborEncode, CborDecode)]` on a struct generates a record codec. The container
//! attribute picks the representation:
//!
//! - `#[cbor(map)]` *(default for named fields)*: text-keyed map in canonical key order.
//! - `#[cbor(tuple)]` *(always for tuple structs)*: array in declaration order.
//! - `#[cbor(transparent)]`: the single field's encoding, unwrapped.
//!
//! Field attributes: `#[cbor(rename = "key")]` and `#[cbor(skip)]`. Skipped fields are not
//! written and decode to `Default::default()`. Map records require `Default` on every field.

extern crate proc_macro;

mod attrs;
mod decode;
mod encode;
mod types;
mod util;

use proc_macro::TokenStream;
use syn::{parse_macro_input, Data, DeriveInput};

use crate::attrs::parse_cbor_container_attrs;

#[proc_macro_derive(CborEncode, attributes(cbor))]
pub fn derive_cbor_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let res = match &input.data {
        Data::Struct(data) => parse_cbor_container_attrs(&input.attrs)
            .and_then(|repr| encode::encode_struct(&input.ident, &input.generics, data, repr)),
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "CborEncode can only be derived for structs",
        )),
    };
    match res {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(CborDecode, attributes(cbor))]
pub fn derive_cbor_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let res = match &input.data {
        Data::Struct(data) => parse_cbor_container_attrs(&input.attrs)
            .and_then(|repr| decode::decode_struct(&input.ident, &input.generics, data, repr)),
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "CborDecode can only be derived for structs",
        )),
    };
    match res {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
