//! Type resolution: classify a declared `syn::Type` into a [`Shape`].
//!
//! Resolution is best-effort. Anything outside the supported grammar returns
//! `None` and the caller decides whether that is worth a word.
use std::collections::BTreeSet;

use quote::ToTokens;
use syn::{GenericArgument, Path, PathArguments, Type, TypeParamBound, TypePath};

use crate::ir::{Capability, PointerKind, Resolved, Shape};

const MAP_CONTAINERS: [&str; 3] = ["HashMap", "BTreeMap", "IndexMap"];

pub fn resolve_type(ty: &Type) -> Option<Resolved> {
    let mut modules = BTreeSet::new();
    let shape = resolve_into(ty, &mut modules)?;
    Some(Resolved { shape, modules })
}

fn resolve_into(ty: &Type, modules: &mut BTreeSet<String>) -> Option<Shape> {
    match ty {
        Type::Paren(paren) => resolve_into(&paren.elem, modules),
        Type::Group(group) => resolve_into(&group.elem, modules),
        Type::Array(array) => {
            let elem = resolve_into(&array.elem, modules)?;
            let len = array.len.to_token_stream().to_string();
            Some(Shape::Sequence { elem: Box::new(elem), len: Some(len) })
        }
        Type::Tuple(tuple) => {
            let mut parts = Vec::with_capacity(tuple.elems.len());
            for elem in &tuple.elems {
                parts.push(resolve_into(elem, modules)?.render());
            }
            let name = match parts.as_slice() {
                [single] => format!("({single},)"),
                _ => format!("({})", parts.join(", ")),
            };
            Some(Shape::scalar(name))
        }
        Type::Path(path) => resolve_path(path, modules),
        _ => None,
    }
}

fn resolve_path(ty: &TypePath, modules: &mut BTreeSet<String>) -> Option<Shape> {
    if ty.qself.is_some() {
        return None;
    }
    let prefix = render_prefix(&ty.path, modules)?;
    let last = ty.path.segments.last()?;
    let ident = last.ident.to_string();

    let args = match &last.arguments {
        PathArguments::None => Vec::new(),
        PathArguments::AngleBracketed(angle) => angle.args.iter().collect(),
        PathArguments::Parenthesized(_) => return None,
    };
    let types: Vec<&Type> = args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
        .collect();
    let only_types = types.len() == args.len();

    match (ident.as_str(), types.as_slice()) {
        ("Option", [inner]) if only_types => Some(Shape::Pointer {
            kind: PointerKind::Option,
            inner: Box::new(resolve_into(inner, modules)?),
        }),
        ("Box", [inner]) if only_types => Some(Shape::Pointer {
            kind: PointerKind::Box,
            inner: Box::new(resolve_into(inner, modules)?),
        }),
        ("Vec", [elem]) if only_types => Some(Shape::Sequence {
            elem: Box::new(resolve_into(elem, modules)?),
            len: None,
        }),
        (name, [key, value]) if only_types && MAP_CONTAINERS.contains(&name) => {
            Some(Shape::Associative {
                container: format!("{prefix}{ident}"),
                key: Box::new(resolve_into(key, modules)?),
                value: Box::new(resolve_into(value, modules)?),
            })
        }
        ("Poly", [inner]) if only_types => {
            let capability = resolve_capability(inner, modules)?;
            Some(Shape::Scalar {
                name: format!("{prefix}Poly<{}>", capability.ty),
                capability: Some(capability),
            })
        }
        _ => {
            let mut rendered = Vec::with_capacity(args.len());
            for arg in &args {
                rendered.push(render_generic_arg(arg, modules)?);
            }
            let name = if rendered.is_empty() {
                format!("{prefix}{ident}")
            } else {
                format!("{prefix}{ident}<{}>", rendered.join(", "))
            };
            Some(Shape::scalar(name))
        }
    }
}

fn resolve_capability(ty: &Type, modules: &mut BTreeSet<String>) -> Option<Capability> {
    let mut own = BTreeSet::new();
    let capability = match ty {
        Type::TraitObject(object) => {
            let mut bounds = Vec::new();
            let mut traits = Vec::new();
            for bound in &object.bounds {
                match bound {
                    TypeParamBound::Trait(bound) => {
                        let path = render_path(&bound.path, &mut own)?;
                        traits.push(bound.path.segments.last()?.ident.to_string());
                        bounds.push(path);
                    }
                    TypeParamBound::Lifetime(lifetime) => bounds.push(lifetime.to_string()),
                    _ => return None,
                }
            }
            Capability {
                ty: format!("dyn {}", bounds.join(" + ")),
                traits,
                modules: BTreeSet::new(),
            }
        }
        Type::Paren(paren) => return resolve_capability(&paren.elem, modules),
        other => {
            let shape = resolve_into(other, &mut own)?;
            Capability { ty: shape.render(), traits: Vec::new(), modules: BTreeSet::new() }
        }
    };
    modules.extend(own.iter().cloned());
    Some(Capability { modules: own, ..capability })
}

fn render_generic_arg(arg: &GenericArgument, modules: &mut BTreeSet<String>) -> Option<String> {
    match arg {
        GenericArgument::Type(ty) => Some(resolve_into(ty, modules)?.render()),
        GenericArgument::Lifetime(lifetime) => Some(lifetime.to_string()),
        GenericArgument::Const(expr) => Some(expr.to_token_stream().to_string()),
        _ => None,
    }
}

/// Renders a trait or type path, recording its module root if it has one.
pub fn render_path(path: &Path, modules: &mut BTreeSet<String>) -> Option<String> {
    let prefix = render_prefix(path, modules)?;
    let last = path.segments.last()?;
    match &last.arguments {
        PathArguments::None => Some(format!("{prefix}{}", last.ident)),
        PathArguments::AngleBracketed(angle) => {
            let mut rendered = Vec::with_capacity(angle.args.len());
            for arg in &angle.args {
                rendered.push(render_generic_arg(arg, modules)?);
            }
            Some(format!("{prefix}{}<{}>", last.ident, rendered.join(", ")))
        }
        PathArguments::Parenthesized(_) => None,
    }
}

/// Everything up to and including the last `::`, rewritten for a child module.
fn render_prefix(path: &Path, modules: &mut BTreeSet<String>) -> Option<String> {
    let count = path.segments.len();
    let mut out = String::new();
    if path.leading_colon.is_some() {
        out.push_str("::");
    }
    for (i, segment) in path.segments.iter().take(count.saturating_sub(1)).enumerate() {
        if !matches!(segment.arguments, PathArguments::None) {
            return None;
        }
        let ident = segment.ident.to_string();
        if i == 0 {
            if path.leading_colon.is_some() {
                modules.insert(format!("::{ident}"));
            } else {
                modules.insert(ident.clone());
            }
            out.push_str(&rewrite_root(&ident));
        } else {
            out.push_str(&ident);
        }
        out.push_str("::");
    }
    Some(out)
}

/// Generated code lives one module below its source.
pub fn rewrite_root(root: &str) -> String {
    match root {
        "self" => String::from("super"),
        "super" => String::from("super::super"),
        other => other.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolve(src: &str) -> Option<Resolved> {
        resolve_type(&syn::parse_str::<Type>(src).unwrap())
    }

    fn shape(src: &str) -> Shape {
        resolve(src).unwrap().shape
    }

    #[test]
    fn bare_names_are_scalars() {
        assert_eq!(shape("i64"), Shape::scalar("i64"));
        assert_eq!(shape("String"), Shape::scalar("String"));
        assert!(resolve("Level").unwrap().modules.is_empty());
    }

    #[test]
    fn selectors_record_their_module() {
        let resolved = resolve("log::Level").unwrap();
        assert_eq!(resolved.shape, Shape::scalar("log::Level"));
        assert_eq!(resolved.modules.into_iter().collect::<Vec<_>>(), vec!["log"]);

        let resolved = resolve("::log::Level").unwrap();
        assert_eq!(resolved.shape, Shape::scalar("::log::Level"));
        assert!(resolved.modules.contains("::log"));
    }

    #[test]
    fn relative_paths_move_up_one_module() {
        assert_eq!(shape("self::model::Level"), Shape::scalar("super::model::Level"));
        assert_eq!(shape("super::Level"), Shape::scalar("super::super::Level"));
        assert_eq!(shape("crate::Level"), Shape::scalar("crate::Level"));
    }

    #[test]
    fn nested_containers() {
        let resolved = resolve("Option<HashMap<String, Vec<Box<chrono::Weekday>>>>").unwrap();
        assert_eq!(
            resolved.shape.render(),
            "Option<HashMap<String, Vec<Box<chrono::Weekday>>>>"
        );
        assert!(resolved.modules.contains("chrono"));
        match resolved.shape {
            Shape::Pointer { kind: PointerKind::Option, inner } => match *inner {
                Shape::Associative { container, key, .. } => {
                    assert_eq!(container, "HashMap");
                    assert_eq!(*key, Shape::scalar("String"));
                }
                other => panic!("expected map, got {other:?}"),
            },
            other => panic!("expected option, got {other:?}"),
        }
    }

    #[test]
    fn fixed_arrays_keep_their_length() {
        assert_eq!(
            shape("[Option<Box<Level>>; 4]"),
            Shape::Sequence {
                elem: Box::new(Shape::Pointer {
                    kind: PointerKind::Option,
                    inner: Box::new(Shape::Pointer {
                        kind: PointerKind::Box,
                        inner: Box::new(Shape::scalar("Level")),
                    }),
                }),
                len: Some(String::from("4")),
            }
        );
    }

    #[test]
    fn map_container_prefix_is_kept() {
        let resolved = resolve("std::collections::BTreeMap<i32, u8>").unwrap();
        assert_eq!(resolved.shape.render(), "std::collections::BTreeMap<i32, u8>");
        assert!(resolved.modules.contains("std"));
    }

    #[test]
    fn poly_leaf_carries_its_capability() {
        let resolved = resolve("Vec<Poly<dyn events::Labeled + Send>>").unwrap();
        let capability = resolved.shape.capability().unwrap();
        assert_eq!(capability.ty, "dyn events::Labeled + Send");
        assert_eq!(capability.traits, vec!["Labeled", "Send"]);
        assert!(capability.modules.contains("events"));
        assert!(resolved.modules.contains("events"));
        assert_eq!(
            resolved.shape.envelope_type("polyjson"),
            "Vec<polyjson::Envelope>"
        );
    }

    #[test]
    fn map_keys_stay_concrete_in_envelope_types() {
        let shape = shape("BTreeMap<(u8, String), Poly<dyn Labeled>>");
        assert_eq!(
            shape.envelope_type("rt"),
            "BTreeMap<(u8, String), rt::Envelope>"
        );
        assert!(!shape.has_poly_key());
    }

    #[test]
    fn generic_scalars_render_their_arguments() {
        assert_eq!(shape("HashSet<String>"), Shape::scalar("HashSet<String>"));
        assert_eq!(shape("Cow<'static, str>"), Shape::scalar("Cow<'static, str>"));
        assert_eq!(shape("ArrayVec<u8, 4>"), Shape::scalar("ArrayVec<u8, 4>"));
    }

    #[test]
    fn unsupported_types_fail_to_classify() {
        for src in [
            "&'static str",
            "fn(u8) -> u8",
            "[u8]",
            "dyn Labeled",
            "impl Labeled",
            "<T as Tr>::Out",
            "Vec<fn()>",
            "Box<dyn Fn(u8)>",
            "Poly<dyn Fn(u8)>",
        ] {
            assert_eq!(resolve(src), None, "{src}");
        }
    }
}
