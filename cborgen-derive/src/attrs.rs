use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, LitStr};

#[derive(Default, Clone)]
pub(crate) struct CborFieldAttr {
    pub(crate) rename: Option<LitStr>,
    pub(crate) skip: bool,
}

/// Record representation selected on the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum Repr {
    #[default]
    Map,
    Tuple,
    Transparent,
}

pub(crate) fn ensure_no_cbor_attrs(attrs: &[Attribute], ctx: &str) -> syn::Result<()> {
    for a in attrs {
        if a.path().is_ident("cbor") {
            return Err(syn::Error::new(
                a.span(),
                format!("`#[cbor(...)]` is not supported on {ctx}"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn parse_cbor_field_attrs(attrs: &[Attribute]) -> syn::Result<CborFieldAttr> {
    let mut out = CborFieldAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("cbor") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                if out.skip {
                    return Err(meta.error("duplicate `cbor(skip)`"));
                }
                out.skip = true;
                return Ok(());
            }
            if meta.path.is_ident("rename") {
                if out.rename.is_some() {
                    return Err(meta.error("duplicate `cbor(rename=...)`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit);
                return Ok(());
            }
            Err(meta.error("unsupported `cbor(...)` field attribute (allowed: rename, skip)"))
        })?;
    }

    if out.skip && out.rename.is_some() {
        return Err(syn::Error::new(
            Span::call_site(),
            "`cbor(skip)` cannot be combined with `rename`",
        ));
    }

    Ok(out)
}

pub(crate) fn parse_cbor_container_attrs(attrs: &[Attribute]) -> syn::Result<Repr> {
    let mut seen: Option<Repr> = None;

    for attr in attrs {
        if !attr.path().is_ident("cbor") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let repr = if meta.path.is_ident("map") {
                Repr::Map
            } else if meta.path.is_ident("tuple") {
                Repr::Tuple
            } else if meta.path.is_ident("transparent") {
                Repr::Transparent
            } else {
                return Err(meta.error(
                    "unsupported `cbor(...)` container attribute \
                     (allowed: map, tuple, transparent)",
                ));
            };
            if seen.is_some() {
                return Err(
                    meta.error("only one of `cbor(map)`, `cbor(tuple)`, `cbor(transparent)`")
                );
            }
            seen = Some(repr);
            Ok(())
        })?;
    }

    Ok(seen.unwrap_or_default())
}
