use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, DataStruct, Fields, Generics, Ident};

use crate::attrs::Repr;
use crate::util::{add_where_bound, canonical_order, collect_fields, RecordField};

fn construct(fields: &Fields, values: &[TokenStream]) -> TokenStream {
    match fields {
        Fields::Named(named) => {
            let idents = named.named.iter().map(|f| &f.ident);
            quote! { Self { #(#idents: #values),* } }
        }
        Fields::Unnamed(_) => quote! { Self(#(#values),*) },
        Fields::Unit => quote! { Self },
    }
}

fn tuple_body(fields: &Fields, all: &[RecordField]) -> TokenStream {
    let arity = all.iter().filter(|f| !f.skip).count();
    // Struct expressions evaluate in source order, which is the wire order.
    let values: Vec<TokenStream> = all
        .iter()
        .map(|f| {
            if f.skip {
                quote! { ::core::default::Default::default() }
            } else {
                quote! { ::cborgen::CborDecode::decode(dec)? }
            }
        })
        .collect();
    let build = construct(fields, &values);
    quote! {
        ::cborgen::__private::expect_tuple(dec, #arity)?;
        Ok(#build)
    }
}

fn map_body(name: &Ident, fields: &Fields, all: &[RecordField]) -> syn::Result<TokenStream> {
    let active = canonical_order(all)?;
    let record = name.to_string();

    let locals = all.iter().map(|f| {
        let local = &f.local;
        let ty = &f.ty;
        if f.skip {
            quote! { let #local: #ty = ::core::default::Default::default(); }
        } else {
            quote! { let mut #local: #ty = ::core::default::Default::default(); }
        }
    });
    let arms = active.iter().map(|f| {
        let key = &f.key;
        let local = &f.local;
        quote! { #key => { #local = ::cborgen::CborDecode::decode(dec)?; } }
    });
    let values: Vec<TokenStream> = all
        .iter()
        .map(|f| {
            let local = &f.local;
            quote! { #local }
        })
        .collect();
    let build = construct(fields, &values);

    Ok(quote! {
        #(#locals)*
        let __len = ::cborgen::__private::read_record_len(dec)?;
        for _ in 0..__len {
            let __key = ::cborgen::__private::read_field_key(dec)?;
            match __key.as_str() {
                #(#arms)*
                _ => ::cborgen::__private::skip_unknown_field(dec, #record, &__key)?,
            }
        }
        Ok(#build)
    })
}

pub(crate) fn decode_struct(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
    repr: Repr,
) -> syn::Result<TokenStream> {
    let fields = collect_fields(&data.fields, name)?;
    let repr = match (&data.fields, repr) {
        (Fields::Unnamed(_), Repr::Map) => Repr::Tuple,
        (_, r) => r,
    };

    let body = match repr {
        Repr::Map => map_body(name, &data.fields, &fields)?,
        Repr::Tuple => tuple_body(&data.fields, &fields),
        Repr::Transparent => {
            if fields.iter().filter(|f| !f.skip).count() != 1 {
                return Err(syn::Error::new(
                    data.fields.span(),
                    "`cbor(transparent)` requires exactly one non-skipped field",
                ));
            }
            let values: Vec<TokenStream> = fields
                .iter()
                .map(|f| {
                    if f.skip {
                        quote! { ::core::default::Default::default() }
                    } else {
                        quote! { ::cborgen::CborDecode::decode(dec)? }
                    }
                })
                .collect();
            let build = construct(&data.fields, &values);
            quote! { Ok(#build) }
        }
    };

    let mut generics = generics.clone();
    {
        let wc = generics.make_where_clause();
        for f in fields.iter().filter(|f| !f.recursive) {
            if !f.skip {
                add_where_bound(wc, &f.ty, quote!(::cborgen::CborDecode));
            }
            if f.skip || repr == Repr::Map {
                add_where_bound(wc, &f.ty, quote!(::core::default::Default));
            }
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::cborgen::CborDecode for #name #ty_generics #where_clause {
            fn decode<__R: ::std::io::Read>(
                dec: &mut ::cborgen::Decoder<__R>,
            ) -> ::core::result::Result<Self, ::cborgen::CborError> {
                #body
            }
        }
    })
}
