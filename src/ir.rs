// Strongly-typed IR for codegen. No syn types here.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Scalar {
        name: String,                    // rendered type, ready to paste into generated code
        capability: Option<Capability>,  // set only for `Poly<C>` leaves
    },
    Sequence {
        elem: Box<Shape>,
        len: Option<String>,             // `[T; N]` when set, `Vec<T>` otherwise
    },
    Associative {
        container: String,               // `HashMap`, `std::collections::BTreeMap`, ...
        key: Box<Shape>,
        value: Box<Shape>,
    },
    Pointer {
        kind: PointerKind,
        inner: Box<Shape>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Option,
    Box,
}

/// The `C` of a `Poly<C>` leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    pub ty: String,          // `dyn Labeled`
    pub traits: Vec<String>, // last idents of the traits named by a `dyn` capability
    pub modules: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub shape: Shape,
    pub modules: BTreeSet<String>, // path roots the rendered type relies on
}

impl Shape {
    pub fn scalar(name: impl Into<String>) -> Self {
        Shape::Scalar { name: name.into(), capability: None }
    }

    /// Source text of the type this shape was resolved from.
    pub fn render(&self) -> String {
        match self {
            Shape::Scalar { name, .. } => name.clone(),
            Shape::Sequence { elem, len: None } => format!("Vec<{}>", elem.render()),
            Shape::Sequence { elem, len: Some(len) } => format!("[{}; {len}]", elem.render()),
            Shape::Associative { container, key, value } => {
                format!("{container}<{}, {}>", key.render(), value.render())
            }
            Shape::Pointer { kind: PointerKind::Option, inner } => format!("Option<{}>", inner.render()),
            Shape::Pointer { kind: PointerKind::Box, inner } => format!("Box<{}>", inner.render()),
        }
    }

    /// Same as [`Shape::render`] with every polymorphic leaf replaced by the envelope.
    pub fn envelope_type(&self, runtime: &str) -> String {
        match self {
            Shape::Scalar { capability: Some(_), .. } => format!("{runtime}::Envelope"),
            Shape::Scalar { name, .. } => name.clone(),
            Shape::Sequence { elem, len: None } => format!("Vec<{}>", elem.envelope_type(runtime)),
            Shape::Sequence { elem, len: Some(len) } => {
                format!("[{}; {len}]", elem.envelope_type(runtime))
            }
            Shape::Associative { container, key, value } => {
                format!("{container}<{}, {}>", key.render(), value.envelope_type(runtime))
            }
            Shape::Pointer { kind: PointerKind::Option, inner } => {
                format!("Option<{}>", inner.envelope_type(runtime))
            }
            Shape::Pointer { kind: PointerKind::Box, inner } => {
                format!("Box<{}>", inner.envelope_type(runtime))
            }
        }
    }

    /// The polymorphic leaf reached through element/value/pointee positions.
    pub fn capability(&self) -> Option<&Capability> {
        match self {
            Shape::Scalar { capability, .. } => capability.as_ref(),
            Shape::Sequence { elem, .. } => elem.capability(),
            Shape::Associative { value, .. } => value.capability(),
            Shape::Pointer { inner, .. } => inner.capability(),
        }
    }

    /// True if any leaf, map keys included, is polymorphic.
    pub fn contains_poly(&self) -> bool {
        match self {
            Shape::Scalar { capability, .. } => capability.is_some(),
            Shape::Sequence { elem, .. } => elem.contains_poly(),
            Shape::Associative { key, value, .. } => key.contains_poly() || value.contains_poly(),
            Shape::Pointer { inner, .. } => inner.contains_poly(),
        }
    }

    pub fn has_poly_key(&self) -> bool {
        match self {
            Shape::Scalar { .. } => false,
            Shape::Sequence { elem, .. } => elem.has_poly_key(),
            Shape::Associative { key, value, .. } => key.contains_poly() || value.has_poly_key(),
            Shape::Pointer { inner, .. } => inner.has_poly_key(),
        }
    }

    /// Container shape under any number of pointers, as used by newtype declarations.
    pub fn peel_pointers(&self) -> &Shape {
        match self {
            Shape::Pointer { inner, .. } => inner.peel_pointers(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Directives {
    pub marshal: bool,
    pub register: Option<String>, // discriminator, already defaulted to the type name
    pub inject: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: String,               // declared type as written (after path rewriting)
    pub shape: Shape,
    pub annotations: Vec<String>, // raw `#[serde(..)]` arguments
    pub polymorphic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclKind {
    Record {
        fields: Vec<Field>,
        skipped: Vec<String>, // unclassifiable fields, rebuilt with `Default::default()`
    },
    /// Newtype over a sequence; every element is polymorphic.
    Sequence { shape: Shape },
    /// Newtype over a map; every value is polymorphic, keys never are.
    Associative { shape: Shape },
    /// Registered only; nothing to marshal.
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decl {
    pub name: String,
    pub directives: Directives,
    pub kind: DeclKind,
    pub capabilities: Vec<String>, // `dyn Trait` casts to register next to the discriminator
}

impl Decl {
    pub fn marshals(&self) -> bool {
        !matches!(self.kind, DeclKind::Opaque)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Module {
    pub decls: Vec<Decl>,
    pub imports: BTreeMap<String, String>, // name -> `use` path, only the referenced ones
}

impl Module {
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn debug_view_keeps_shape_and_declaration_tags_apart() {
        let shape = Shape::Pointer {
            kind: PointerKind::Option,
            inner: Box::new(Shape::Sequence { elem: Box::new(Shape::scalar("u8")), len: None }),
        };
        let kind = DeclKind::Sequence { shape };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["kind"], json!("sequence"));
        assert_eq!(value["shape"]["shape"], json!("pointer"));
        assert_eq!(value["shape"]["kind"], json!("option"));
        assert_eq!(value["shape"]["inner"]["shape"], json!("sequence"));
    }
}
