//! Emits the companion module for a lowered source file.
use crate::config::Options;
use crate::ir::{Decl, DeclKind, Field, Module, PointerKind, Shape};

pub const HEADER: &str = "// @generated by polyjson. DO NOT EDIT.";

const INDENT: &str = "    ";

// ————————————————————————————————————————————————————————————————————————————
// DRIVER
// ————————————————————————————————————————————————————————————————————————————

pub struct Codegen<'a> {
    options: &'a Options,
    blocks: Vec<String>,
}

impl<'a> Codegen<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self { options, blocks: Vec::new() }
    }

    pub fn emit(&mut self, module: &Module) {
        let mut prelude = vec![String::from("use super::*;")];
        prelude.extend(module.imports.values().map(|path| format!("use {path};")));
        self.blocks.push(prelude.join("\n"));

        for decl in module.decls.iter().filter(|d| d.marshals()) {
            tracing::debug!(name = %decl.name, "emitting marshal code");
            self.emit_marshal(decl);
        }
        let registered: Vec<(&Decl, &str)> = module
            .decls
            .iter()
            .filter_map(|decl| Some((decl, decl.directives.register.as_deref()?)))
            .collect();
        for (decl, discriminator) in &registered {
            self.blocks.push(self.discriminator_impl(&decl.name, discriminator));
        }
        if !registered.is_empty() {
            self.blocks.push(self.register_fn(&registered));
        }
    }

    pub fn into_string(self) -> String {
        let mut out = String::from(HEADER);
        out.push_str("\n\n");
        out.push_str(&self.blocks.join("\n\n"));
        out.push('\n');
        out
    }

    fn rt(&self) -> &str {
        &self.options.runtime_path
    }

    fn emit_marshal(&mut self, decl: &Decl) {
        let shadow = self.options.shadow_name(&decl.name);
        let (shadow_decl, to_shadow, from_shadow, uses_registry, has_fields) = match &decl.kind {
            DeclKind::Record { fields, skipped } => (
                self.record_shadow(&shadow, decl, fields),
                self.record_to_shadow(&shadow, fields),
                self.record_from_shadow(&decl.name, fields, skipped),
                fields.iter().any(|f| f.polymorphic),
                !fields.is_empty(),
            ),
            DeclKind::Sequence { shape } | DeclKind::Associative { shape } => (
                self.newtype_shadow(&shadow, decl, shape),
                format!("Ok({shadow}({}))", self.wrap(shape, &Src::place("self.0"), 1)),
                format!("Ok({}({}))", decl.name, self.unwrap(shape, "shadow.0", &decl.name, 1)),
                true,
                true,
            ),
            DeclKind::Opaque => return,
        };
        self.blocks.push(shadow_decl);

        let rt = self.rt();
        let shadow_param = if has_fields { "shadow" } else { "_shadow" };
        let registry_param = if uses_registry { "registry" } else { "_registry" };
        let shadowed = [
            format!("impl {rt}::Shadowed for {} {{", decl.name),
            format!("{INDENT}type Shadow = {shadow};"),
            String::new(),
            format!("{INDENT}fn to_shadow(&self) -> Result<{shadow}, {rt}::Error> {{"),
            indent_block(&to_shadow, 2),
            format!("{INDENT}}}"),
            String::new(),
            format!(
                "{INDENT}fn from_shadow({shadow_param}: {shadow}, {registry_param}: &{rt}::Registry) -> Result<Self, {rt}::Error> {{"
            ),
            indent_block(&from_shadow, 2),
            format!("{INDENT}}}"),
            String::from("}"),
        ];
        self.blocks.push(shadowed.join("\n"));
        self.blocks.push(self.serde_impls(&decl.name));
    }

    // ————————————————————————————————————————————————————————————————————————
    // DECLARATIONS
    // ————————————————————————————————————————————————————————————————————————

    fn shadow_attrs(&self, decl: &Decl) -> Vec<String> {
        let mut lines = vec![String::from("#[derive(serde::Serialize, serde::Deserialize)]")];
        lines.extend(decl.directives.inject.iter().cloned());
        lines
    }

    fn record_shadow(&self, shadow: &str, decl: &Decl, fields: &[Field]) -> String {
        let mut lines = self.shadow_attrs(decl);
        if fields.is_empty() {
            lines.push(format!("pub struct {shadow} {{}}"));
            return lines.join("\n");
        }
        lines.push(format!("pub struct {shadow} {{"));
        for field in fields {
            if field.polymorphic {
                lines.push(format!("{INDENT}// polymorphic: {}", field.ty));
            }
            for args in &field.annotations {
                lines.push(format!("{INDENT}#[serde({args})]"));
            }
            let ty = if field.polymorphic {
                field.shape.envelope_type(self.rt())
            } else {
                field.ty.clone()
            };
            lines.push(format!("{INDENT}{}: {ty},", field.name));
        }
        lines.push(String::from("}"));
        lines.join("\n")
    }

    fn newtype_shadow(&self, shadow: &str, decl: &Decl, shape: &Shape) -> String {
        let mut lines = self.shadow_attrs(decl);
        lines.push(format!("pub struct {shadow}({});", shape.envelope_type(self.rt())));
        lines.join("\n")
    }

    fn record_to_shadow(&self, shadow: &str, fields: &[Field]) -> String {
        if fields.is_empty() {
            return format!("Ok({shadow} {{}})");
        }
        let mut lines = vec![format!("Ok({shadow} {{")];
        for field in fields {
            let place = format!("self.{}", field.name);
            let expr = if field.polymorphic {
                self.wrap(&field.shape, &Src::place(&place), 1)
            } else {
                format!("{place}.clone()")
            };
            lines.push(format!("{INDENT}{}: {expr},", field.name));
        }
        lines.push(String::from("})"));
        lines.join("\n")
    }

    fn record_from_shadow(&self, name: &str, fields: &[Field], skipped: &[String]) -> String {
        if fields.is_empty() && skipped.is_empty() {
            return format!("Ok({name} {{}})");
        }
        let mut lines = vec![format!("Ok({name} {{")];
        for field in fields {
            let place = format!("shadow.{}", field.name);
            let expr = if field.polymorphic {
                self.unwrap(&field.shape, &place, &format!("{name}.{}", field.name), 1)
            } else {
                place
            };
            lines.push(format!("{INDENT}{}: {expr},", field.name));
        }
        for field in skipped {
            lines.push(format!("{INDENT}{field}: Default::default(),"));
        }
        lines.push(String::from("})"));
        lines.join("\n")
    }

    fn serde_impls(&self, name: &str) -> String {
        let rt = self.rt();
        [
            format!("impl serde::Serialize for {name} {{"),
            format!(
                "{INDENT}fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {{"
            ),
            format!("{INDENT}{INDENT}{rt}::serialize(self, serializer)"),
            format!("{INDENT}}}"),
            String::from("}"),
            String::new(),
            format!("impl<'de> serde::Deserialize<'de> for {name} {{"),
            format!(
                "{INDENT}fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {{"
            ),
            format!("{INDENT}{INDENT}{rt}::deserialize(deserializer)"),
            format!("{INDENT}}}"),
            String::from("}"),
        ]
        .join("\n")
    }

    fn discriminator_impl(&self, name: &str, discriminator: &str) -> String {
        [
            format!("impl {}::Discriminated for {name} {{", self.rt()),
            format!("{INDENT}fn discriminator(&self) -> &str {{"),
            format!("{INDENT}{INDENT}{discriminator:?}"),
            format!("{INDENT}}}"),
            String::from("}"),
        ]
        .join("\n")
    }

    fn register_fn(&self, registered: &[(&Decl, &str)]) -> String {
        let rt = self.rt();
        let mut lines = vec![
            String::from("/// Registers the discriminated types declared alongside this module."),
            format!("pub fn register(registry: &{rt}::Registry) {{"),
        ];
        for (decl, discriminator) in registered {
            let name = &decl.name;
            let lit = format!("{discriminator:?}");
            lines.push(format!(
                "{INDENT}registry.register({lit}, || -> Box<dyn {rt}::Discriminated> {{ Box::new({name}::default()) }});"
            ));
            lines.push(format!(
                "{INDENT}registry.register_nil({lit}, || {rt}::TypedNil::of::<{name}>({lit}));"
            ));
            let casts = std::iter::once(format!("dyn {rt}::Discriminated"))
                .chain(decl.capabilities.iter().cloned());
            for cap in casts {
                lines.push(format!(
                    "{INDENT}registry.register_cast::<{cap}, {name}>(|v| -> Box<{cap}> {{ v }});"
                ));
            }
        }
        lines.push(String::from("}"));
        lines.join("\n")
    }

    // ————————————————————————————————————————————————————————————————————————
    // EXPRESSIONS
    // ————————————————————————————————————————————————————————————————————————

    /// Expression building the shadow value of `src` (borrowed).
    fn wrap(&self, shape: &Shape, src: &Src, depth: usize) -> String {
        let rt = self.rt();
        match shape {
            Shape::Scalar { capability: Some(_), .. } => {
                format!("{rt}::Envelope::wrap({})?", src.borrow)
            }
            Shape::Scalar { .. } => format!("Clone::clone({})", src.borrow),
            Shape::Pointer { kind: PointerKind::Option, inner } => {
                let v = format!("v{depth}");
                let inner = self.wrap(inner, &Src::reference(&v), depth + 1);
                format!("match {} {{ Some({v}) => Some({inner}), None => None }}", src.borrow)
            }
            Shape::Pointer { kind: PointerKind::Box, inner } => {
                let pointee = format!("Box::as_ref({})", src.borrow);
                format!("Box::new({})", self.wrap(inner, &Src::reference(&pointee), depth))
            }
            Shape::Sequence { elem, len } => {
                let v = format!("v{depth}");
                let elem = self.wrap(elem, &Src::reference(&v), depth + 1);
                let mapped = format!("{}.iter().map(|{v}| Ok::<_, {rt}::Error>({elem}))", src.base);
                match len {
                    None => format!("{mapped}.collect::<Result<Vec<_>, {rt}::Error>>()?"),
                    Some(_) => format!("{rt}::try_array({mapped})?"),
                }
            }
            Shape::Associative { container, value, .. } => {
                let (k, v) = (format!("k{depth}"), format!("v{depth}"));
                let value = self.wrap(value, &Src::reference(&v), depth + 1);
                format!(
                    "{}.iter().map(|({k}, {v})| Ok::<_, {rt}::Error>(({k}.clone(), {value}))).collect::<Result<{container}<_, _>, {rt}::Error>>()?",
                    src.base
                )
            }
        }
    }

    /// Expression rebuilding the original value from the owned shadow `expr`.
    fn unwrap(&self, shape: &Shape, expr: &str, owner: &str, depth: usize) -> String {
        let rt = self.rt();
        match shape {
            Shape::Scalar { capability: Some(capability), .. } => {
                format!("{expr}.open::<{}>(registry, {owner:?})?", capability.ty)
            }
            Shape::Scalar { .. } => expr.to_owned(),
            Shape::Pointer { kind: PointerKind::Option, inner } => {
                let v = format!("v{depth}");
                let inner = self.unwrap(inner, &v, owner, depth + 1);
                format!("match {expr} {{ Some({v}) => Some({inner}), None => None }}")
            }
            Shape::Pointer { kind: PointerKind::Box, inner } => {
                let pointee = format!("(*{expr})");
                format!("Box::new({})", self.unwrap(inner, &pointee, owner, depth))
            }
            Shape::Sequence { elem, len } => {
                let v = format!("v{depth}");
                let elem = self.unwrap(elem, &v, owner, depth + 1);
                let mapped = format!("{expr}.into_iter().map(|{v}| Ok::<_, {rt}::Error>({elem}))");
                match len {
                    None => format!("{mapped}.collect::<Result<Vec<_>, {rt}::Error>>()?"),
                    Some(_) => format!("{rt}::try_array({mapped})?"),
                }
            }
            Shape::Associative { container, value, .. } => {
                let (k, v) = (format!("k{depth}"), format!("v{depth}"));
                let value = self.unwrap(value, &v, owner, depth + 1);
                format!(
                    "{expr}.into_iter().map(|({k}, {v})| Ok::<_, {rt}::Error>(({k}, {value}))).collect::<Result<{container}<_, _>, {rt}::Error>>()?"
                )
            }
        }
    }
}

/// Where a wrapped value comes from: a field place (borrowed with `&`) or an
/// expression that is already a reference.
struct Src {
    borrow: String,
    base: String,
}

impl Src {
    fn place(place: &str) -> Self {
        Self { borrow: format!("&{place}"), base: place.to_owned() }
    }

    fn reference(expr: &str) -> Self {
        Self { borrow: expr.to_owned(), base: expr.to_owned() }
    }
}

fn indent_block(text: &str, levels: usize) -> String {
    let pad = INDENT.repeat(levels);
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}
