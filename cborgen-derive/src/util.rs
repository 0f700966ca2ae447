use proc_macro2::TokenStream;
use quote::format_ident;
use syn::{
    parse_quote, spanned::Spanned, Fields, Ident, Index, Member, Type, WhereClause,
    WherePredicate,
};

use crate::attrs::{ensure_no_cbor_attrs, parse_cbor_field_attrs};
use crate::types::type_mentions_self;

pub(crate) fn add_where_bound(wc: &mut WhereClause, ty: &Type, bound: TokenStream) {
    let pred: WherePredicate = parse_quote!(#ty: #bound);
    wc.predicates.push(pred);
}

/// One struct field as seen by the generated code.
pub(crate) struct RecordField {
    pub(crate) member: Member,
    /// Local binding used while decoding map records.
    pub(crate) local: Ident,
    pub(crate) ty: Type,
    pub(crate) key: String,
    pub(crate) skip: bool,
    pub(crate) recursive: bool,
}

pub(crate) fn collect_fields(fields: &Fields, self_ident: &Ident) -> syn::Result<Vec<RecordField>> {
    let mut out = Vec::with_capacity(fields.len());
    match fields {
        Fields::Named(named) => {
            for field in &named.named {
                let attrs = parse_cbor_field_attrs(&field.attrs)?;
                let Some(ident) = field.ident.clone() else {
                    return Err(syn::Error::new(field.span(), "expected named field"));
                };
                let key = attrs.rename.as_ref().map_or_else(
                    || ident.to_string().trim_start_matches("r#").to_owned(),
                    syn::LitStr::value,
                );
                out.push(RecordField {
                    local: format_ident!("__field_{}", ident.to_string().trim_start_matches("r#")),
                    member: Member::Named(ident),
                    recursive: type_mentions_self(&field.ty, self_ident),
                    ty: field.ty.clone(),
                    key,
                    skip: attrs.skip,
                });
            }
        }
        Fields::Unnamed(unnamed) => {
            for (idx, field) in unnamed.unnamed.iter().enumerate() {
                ensure_no_cbor_attrs(&field.attrs, "tuple struct fields")?;
                out.push(RecordField {
                    member: Member::Unnamed(Index::from(idx)),
                    local: format_ident!("__field_{}", idx),
                    recursive: type_mentions_self(&field.ty, self_ident),
                    ty: field.ty.clone(),
                    key: idx.to_string(),
                    skip: false,
                });
            }
        }
        Fields::Unit => {}
    }
    Ok(out)
}

/// Sort by canonical key order: encoded length first, then bytes.
pub(crate) fn canonical_order(fields: &[RecordField]) -> syn::Result<Vec<&RecordField>> {
    let mut active: Vec<&RecordField> = fields.iter().filter(|f| !f.skip).collect();
    active.sort_by(|a, b| {
        a.key
            .len()
            .cmp(&b.key.len())
            .then_with(|| a.key.as_bytes().cmp(b.key.as_bytes()))
    });
    for pair in active.windows(2) {
        if pair[0].key == pair[1].key {
            return Err(syn::Error::new(
                pair[1].member.span(),
                format!("duplicate cbor key `{}`", pair[1].key),
            ));
        }
    }
    Ok(active)
}
