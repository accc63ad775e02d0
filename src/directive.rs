//! Directive parsing from doc comments.
//!
//! Every directive is a doc line starting with one of the markers below,
//! after leading whitespace. Other doc text is ignored.
use syn::{Attribute, Expr, ExprLit, Lit, Meta};

use crate::ir::Directives;

pub const MARSHAL: &str = "polyjson:marshal";
pub const REGISTER: &str = "polyjson:register";
pub const INJECT: &str = "polyjson:inject";
pub const POLY: &str = "polyjson:poly";
pub const SERDE: &str = "polyjson:serde";

const TRUTHY: &str = "true";

/// Field-level markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDirectives {
    pub polymorphic: bool,
    pub annotations: Vec<String>,
}

/// Doc lines of an item or field, one entry per physical line.
pub fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(meta) = &attr.meta {
            if let Expr::Lit(ExprLit { lit: Lit::Str(text), .. }) = &meta.value {
                lines.extend(text.value().lines().map(str::to_owned));
            }
        }
    }
    lines
}

pub fn parse_decl(attrs: &[Attribute], type_name: &str) -> Directives {
    let mut directives = Directives::default();
    for line in doc_lines(attrs) {
        let line = line.trim_start();
        if line.starts_with(MARSHAL) {
            directives.marshal = true;
        } else if let Some(rest) = line.strip_prefix(REGISTER) {
            let name = rest.trim();
            let name = if name.is_empty() { type_name } else { name };
            directives.register = Some(name.to_owned());
        } else if let Some(rest) = line.strip_prefix(INJECT) {
            let rest = rest.trim_start();
            if !rest.trim().is_empty() {
                directives.inject.push(rest.trim_end().to_owned());
            }
        }
    }
    directives
}

pub fn parse_field(attrs: &[Attribute]) -> FieldDirectives {
    let mut directives = FieldDirectives::default();
    for line in doc_lines(attrs) {
        let line = line.trim_start();
        if let Some(value) = line.strip_prefix(POLY) {
            directives.polymorphic = value.trim_start().starts_with(TRUTHY);
        } else if let Some(args) = line.strip_prefix(SERDE) {
            let args = args.trim();
            if !args.is_empty() {
                directives.annotations.push(args.to_owned());
            }
        }
    }
    directives
}
