use syn::{GenericArgument, Ident, PathArguments, Type, TypePath};

/// Whether `ty` names the deriving type anywhere inside it (`Option<Box<Self>>`,
/// `Vec<crate::Node>`, ...). Such fields get no where-bound; it would be cyclic.
pub(crate) fn type_mentions_self(ty: &Type, self_ident: &Ident) -> bool {
    match ty {
        Type::Path(tp) => path_mentions_self(tp, self_ident),
        Type::Reference(r) => type_mentions_self(&r.elem, self_ident),
        Type::Array(a) => type_mentions_self(&a.elem, self_ident),
        Type::Slice(s) => type_mentions_self(&s.elem, self_ident),
        Type::Paren(p) => type_mentions_self(&p.elem, self_ident),
        Type::Group(g) => type_mentions_self(&g.elem, self_ident),
        Type::Tuple(t) => t.elems.iter().any(|e| type_mentions_self(e, self_ident)),
        _ => false,
    }
}

fn path_mentions_self(tp: &TypePath, self_ident: &Ident) -> bool {
    if let Some(q) = &tp.qself {
        if type_mentions_self(&q.ty, self_ident) {
            return true;
        }
    }

    let segs = &tp.path.segments;
    if let Some((last, prefix)) = segs.iter().collect::<Vec<_>>().split_last() {
        let local_prefix = prefix
            .iter()
            .all(|s| s.ident == "crate" || s.ident == "self" || s.ident == "super");
        if tp.qself.is_none() && local_prefix && (last.ident == "Self" || last.ident == *self_ident)
        {
            return true;
        }
    }

    segs.iter().any(|seg| {
        let PathArguments::AngleBracketed(args) = &seg.arguments else {
            return false;
        };
        args.args.iter().any(|arg| {
            matches!(arg, GenericArgument::Type(inner) if type_mentions_self(inner, self_ident))
        })
    })
}
