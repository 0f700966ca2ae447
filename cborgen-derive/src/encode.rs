use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, DataStruct, Fields, Generics, Ident};

use crate::attrs::Repr;
use crate::util::{add_where_bound, canonical_order, collect_fields, RecordField};

fn map_body(active: &[&RecordField]) -> TokenStream {
    if active.is_empty() {
        return quote! { enc.record(0, |_| Ok(())) };
    }
    let len = active.len();
    let entries = active.iter().map(|f| {
        let key = &f.key;
        let member = &f.member;
        quote! { m.value(#key, &self.#member)?; }
    });
    quote! {
        enc.record(#len, |m| {
            #(#entries)*
            Ok(())
        })
    }
}

fn tuple_body(active: &[&RecordField]) -> TokenStream {
    if active.is_empty() {
        return quote! { enc.array(0, |_| Ok(())) };
    }
    let len = active.len();
    let items = active.iter().map(|f| {
        let member = &f.member;
        quote! { a.value(&self.#member)?; }
    });
    quote! {
        enc.array(#len, |a| {
            #(#items)*
            Ok(())
        })
    }
}

pub(crate) fn encode_struct(
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
        Repr::Map => map_body(&canonical_order(&fields)?),
        Repr::Tuple => {
            let active: Vec<&RecordField> = fields.iter().filter(|f| !f.skip).collect();
            tuple_body(&active)
        }
        Repr::Transparent => {
            let active: Vec<&RecordField> = fields.iter().filter(|f| !f.skip).collect();
            let [inner] = active.as_slice() else {
                return Err(syn::Error::new(
                    data.fields.span(),
                    "`cbor(transparent)` requires exactly one non-skipped field",
                ));
            };
            let member = &inner.member;
            quote! { ::cborgen::CborEncode::encode(&self.#member, enc) }
        }
    };

    let mut generics = generics.clone();
    {
        let wc = generics.make_where_clause();
        for f in fields.iter().filter(|f| !f.skip && !f.recursive) {
            add_where_bound(wc, &f.ty, quote!(::cborgen::CborEncode));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::cborgen::CborEncode for #name #ty_generics #where_clause {
            fn encode<__W: ::std::io::Write>(
                &self,
                enc: &mut ::cborgen::Encoder<__W>,
            ) -> ::core::result::Result<(), ::cborgen::CborError> {
                #body
            }
        }

        impl #impl_generics ::cborgen::CborArrayElem for #name #ty_generics #where_clause {}
    })
}
