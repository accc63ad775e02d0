//! Lowering: parsed source file → [`Module`] IR.
use std::collections::{BTreeMap, BTreeSet};

use syn::{Fields, File, Item, ItemEnum, ItemStruct, Type, TypeParamBound, UseTree};

use crate::config::{Options, SkipPolicy};
use crate::directive;
use crate::error::GenerateError;
use crate::ir::{Capability, Decl, DeclKind, Directives, Field, Module, Shape};
use crate::resolve::{render_path, resolve_type, rewrite_root};

/// Roots every Rust file can name without a `use`.
const BUILTIN_ROOTS: [&str; 7] = ["crate", "self", "super", "Self", "std", "core", "alloc"];

const DISCRIMINATED: &str = "Discriminated";

/// Bounds every registered type satisfies without an `impl` in the file.
const IMPLIED_BOUNDS: [&str; 3] = [DISCRIMINATED, "Send", "Sync"];

pub fn lower_file(file: &File, options: &Options) -> Result<Module, GenerateError> {
    let scope = Scope::collect(file, options);
    let mut module = Module::default();

    for item in &file.items {
        let decl = match item {
            Item::Struct(item) => scope.lower_struct(item, &mut module.imports)?,
            Item::Enum(item) => scope.lower_enum(item, &mut module.imports)?,
            _ => None,
        };
        if let Some(decl) = decl {
            tracing::debug!(name = %decl.name, kind = decl_kind_name(&decl.kind), "lowered declaration");
            module.decls.push(decl);
        }
    }
    Ok(module)
}

fn decl_kind_name(kind: &DeclKind) -> &'static str {
    match kind {
        DeclKind::Record { .. } => "record",
        DeclKind::Sequence { .. } => "sequence",
        DeclKind::Associative { .. } => "associative",
        DeclKind::Opaque => "opaque",
    }
}

/// `impl Trait for Type` with no generics on either side.
struct TraitImpl {
    self_ty: String,
    trait_name: String,
    trait_path: syn::Path,
}

/// File-wide facts that individual declarations are checked against.
struct Scope<'a> {
    options: &'a Options,
    imports: BTreeMap<String, String>,
    declared: BTreeSet<String>,
    capabilities: BTreeSet<String>,
    /// Every distinct `C` of a `Poly<C>` in the file, keyed by rendered type.
    poly_types: BTreeMap<String, Capability>,
    impls: Vec<TraitImpl>,
}

impl<'a> Scope<'a> {
    fn collect(file: &File, options: &'a Options) -> Self {
        let mut scope = Scope {
            options,
            imports: BTreeMap::new(),
            declared: BTreeSet::new(),
            capabilities: BTreeSet::new(),
            poly_types: BTreeMap::new(),
            impls: Vec::new(),
        };
        let mut supertraits: Vec<(String, Vec<String>)> = Vec::new();

        for item in &file.items {
            match item {
                Item::Use(item) => collect_use(&item.tree, String::new(), &mut scope.imports),
                Item::Impl(item) => {
                    if let Some(found) = trait_impl(item) {
                        scope.impls.push(found);
                    }
                }
                Item::Trait(item) => {
                    let supers = item
                        .supertraits
                        .iter()
                        .filter_map(|bound| match bound {
                            TypeParamBound::Trait(bound) => {
                                bound.path.segments.last().map(|s| s.ident.to_string())
                            }
                            _ => None,
                        })
                        .collect();
                    supertraits.push((item.ident.to_string(), supers));
                }
                Item::Struct(item) => {
                    for field in &item.fields {
                        if let Some(resolved) = resolve_type(&field.ty) {
                            collect_poly_types(&resolved.shape, &mut scope.poly_types);
                        }
                    }
                }
                _ => {}
            }
            if let Some(name) = item_name(item) {
                scope.declared.insert(name);
            }
        }

        for capability in scope.poly_types.values() {
            let named = capability.traits.iter().filter(|t| !IMPLIED_BOUNDS.contains(&t.as_str()));
            scope.capabilities.extend(named.cloned());
        }
        // Capability-ness flows down supertrait chains declared in the file.
        scope.capabilities.insert(String::from(DISCRIMINATED));
        loop {
            let before = scope.capabilities.len();
            for (name, supers) in &supertraits {
                if supers.iter().any(|s| scope.capabilities.contains(s)) {
                    scope.capabilities.insert(name.clone());
                }
            }
            if scope.capabilities.len() == before {
                break;
            }
        }
        scope.capabilities.remove(DISCRIMINATED);
        scope
    }

    fn lower_struct(
        &self,
        item: &ItemStruct,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<Option<Decl>, GenerateError> {
        let name = item.ident.to_string();
        let directives = directive::parse_decl(&item.attrs, &name);
        if !directives.marshal && directives.register.is_none() {
            return Ok(None);
        }
        if !item.generics.params.is_empty() {
            skip(self.options.skip_policy, &name, "generic declarations are not supported")?;
            return Ok(None);
        }
        let kind = if !directives.marshal {
            DeclKind::Opaque
        } else {
            match &item.fields {
                Fields::Named(_) => self.lower_record(&name, item, imports)?,
                Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                    match self.lower_newtype(&name, &fields.unnamed[0].ty, imports)? {
                        Some(kind) => kind,
                        None => return Ok(None),
                    }
                }
                _ => {
                    skip(
                        self.options.skip_policy,
                        &name,
                        "only records and single-field sequence or map wrappers can be marshalled",
                    )?;
                    return Ok(None);
                }
            }
        };
        let capabilities = self.capabilities_of(&name, &directives, imports)?;
        Ok(Some(Decl { name, directives, kind, capabilities }))
    }

    fn lower_enum(
        &self,
        item: &ItemEnum,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<Option<Decl>, GenerateError> {
        let name = item.ident.to_string();
        let directives = directive::parse_decl(&item.attrs, &name);
        if directives.marshal {
            skip(self.options.skip_policy, &name, "enums cannot be marshalled")?;
            return Ok(None);
        }
        if directives.register.is_none() {
            return Ok(None);
        }
        if !item.generics.params.is_empty() {
            skip(self.options.skip_policy, &name, "generic declarations are not supported")?;
            return Ok(None);
        }
        let capabilities = self.capabilities_of(&name, &directives, imports)?;
        Ok(Some(Decl { name, directives, kind: DeclKind::Opaque, capabilities }))
    }

    fn lower_record(
        &self,
        owner: &str,
        item: &ItemStruct,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<DeclKind, GenerateError> {
        let mut fields = Vec::new();
        let mut skipped = Vec::new();

        for field in &item.fields {
            let Some(ident) = &field.ident else { continue };
            let name = ident.to_string();
            let path = format!("{owner}.{name}");
            let flags = directive::parse_field(&field.attrs);

            let Some(resolved) = resolve_type(&field.ty) else {
                if flags.polymorphic {
                    return Err(GenerateError::NotPolymorphic {
                        owner: owner.to_owned(),
                        field: name,
                        ty: type_text(&field.ty),
                    });
                }
                skip(self.options.skip_policy, &path, "field type cannot be classified")?;
                skipped.push(name);
                continue;
            };

            let shape = resolved.shape;
            if flags.polymorphic {
                check_polymorphic(owner, &name, &shape)?;
            } else if shape.contains_poly() {
                return Err(GenerateError::UnmarkedPoly {
                    owner: owner.to_owned(),
                    field: name,
                    ty: shape.render(),
                });
            }
            self.check_modules(&resolved.modules, &path, imports)?;

            fields.push(Field {
                name,
                ty: shape.render(),
                shape,
                annotations: flags.annotations,
                polymorphic: flags.polymorphic,
            });
        }
        Ok(DeclKind::Record { fields, skipped })
    }

    fn lower_newtype(
        &self,
        owner: &str,
        ty: &Type,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<Option<DeclKind>, GenerateError> {
        let Some(resolved) = resolve_type(ty) else {
            skip(self.options.skip_policy, owner, "wrapped type cannot be classified")?;
            return Ok(None);
        };
        let shape = resolved.shape;
        let kind = match shape.peel_pointers() {
            Shape::Sequence { .. } => DeclKind::Sequence { shape: shape.clone() },
            Shape::Associative { .. } => DeclKind::Associative { shape: shape.clone() },
            Shape::Scalar { .. } | Shape::Pointer { .. } => {
                skip(self.options.skip_policy, owner, "wrapped type is not a sequence or map")?;
                return Ok(None);
            }
        };
        check_polymorphic(owner, "0", &shape)?;
        self.check_modules(&resolved.modules, owner, imports)?;
        Ok(Some(kind))
    }

    /// Rendered `dyn Trait` types this declaration can be cast to.
    fn capabilities_of(
        &self,
        name: &str,
        directives: &Directives,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<Vec<String>, GenerateError> {
        let mut out = Vec::new();
        if directives.register.is_none() {
            return Ok(out);
        }
        for found in self.impls.iter().filter(|i| i.self_ty == name) {
            if !self.capabilities.contains(&found.trait_name) {
                continue;
            }
            let mut modules = BTreeSet::new();
            let Some(path) = render_path(&found.trait_path, &mut modules) else {
                continue;
            };
            self.check_modules(&modules, name, imports)?;
            let ty = format!("dyn {path}");
            if !out.contains(&ty) {
                out.push(ty);
            }
        }

        // `Poly<dyn A + Send>` is its own type id, so it needs its own cast.
        let implemented: BTreeSet<&str> = self
            .impls
            .iter()
            .filter(|i| i.self_ty == name)
            .map(|i| i.trait_name.as_str())
            .chain(IMPLIED_BOUNDS)
            .collect();
        for (ty, capability) in &self.poly_types {
            let bare_discriminated = capability.traits == [DISCRIMINATED];
            if out.contains(ty) || capability.traits.is_empty() || bare_discriminated {
                continue;
            }
            if capability.traits.iter().all(|t| implemented.contains(t.as_str())) {
                self.check_modules(&capability.modules, name, imports)?;
                out.push(ty.clone());
            }
        }
        Ok(out)
    }

    fn check_modules(
        &self,
        modules: &BTreeSet<String>,
        owner: &str,
        imports: &mut BTreeMap<String, String>,
    ) -> Result<(), GenerateError> {
        for module in modules {
            if module.starts_with("::") || BUILTIN_ROOTS.contains(&module.as_str()) {
                continue;
            }
            if let Some(path) = self.imports.get(module) {
                imports.insert(module.clone(), path.clone());
                continue;
            }
            if self.declared.contains(module) || self.options.extern_crates.contains(module) {
                continue;
            }
            return Err(GenerateError::UnknownModule {
                module: module.clone(),
                owner: owner.to_owned(),
            });
        }
        Ok(())
    }
}

fn check_polymorphic(owner: &str, field: &str, shape: &Shape) -> Result<(), GenerateError> {
    if shape.has_poly_key() {
        return Err(GenerateError::PolymorphicKey {
            owner: owner.to_owned(),
            field: field.to_owned(),
            ty: shape.render(),
        });
    }
    if shape.capability().is_none() {
        return Err(GenerateError::NotPolymorphic {
            owner: owner.to_owned(),
            field: field.to_owned(),
            ty: shape.render(),
        });
    }
    Ok(())
}

fn skip(policy: SkipPolicy, owner: &str, reason: &str) -> Result<(), GenerateError> {
    match policy {
        SkipPolicy::Silent => {
            tracing::trace!(%owner, reason, "left untouched");
            Ok(())
        }
        SkipPolicy::Warn => {
            tracing::warn!(%owner, reason, "left untouched");
            Ok(())
        }
        SkipPolicy::Deny => Err(GenerateError::Unclassified {
            owner: owner.to_owned(),
            reason: reason.to_owned(),
        }),
    }
}

fn type_text(ty: &Type) -> String {
    quote::ToTokens::to_token_stream(ty).to_string()
}

fn collect_poly_types(shape: &Shape, out: &mut BTreeMap<String, Capability>) {
    match shape {
        Shape::Scalar { capability: Some(capability), .. } => {
            out.entry(capability.ty.clone()).or_insert_with(|| capability.clone());
        }
        Shape::Scalar { .. } => {}
        Shape::Sequence { elem, .. } => collect_poly_types(elem, out),
        Shape::Associative { key, value, .. } => {
            collect_poly_types(key, out);
            collect_poly_types(value, out);
        }
        Shape::Pointer { inner, .. } => collect_poly_types(inner, out),
    }
}

fn collect_use(tree: &UseTree, prefix: String, out: &mut BTreeMap<String, String>) {
    let join = |ident: &syn::Ident| {
        let ident = ident.to_string();
        if prefix.is_empty() {
            rewrite_root(&ident)
        } else {
            format!("{prefix}::{ident}")
        }
    };
    match tree {
        UseTree::Path(path) => collect_use(&path.tree, join(&path.ident), out),
        UseTree::Name(name) if name.ident == "self" => {
            if let Some(last) = prefix.rsplit("::").next() {
                let key = if last == "super" { None } else { Some(last.to_owned()) };
                if let Some(key) = key {
                    out.insert(key, prefix.clone());
                }
            }
        }
        UseTree::Name(name) => {
            out.insert(name.ident.to_string(), join(&name.ident));
        }
        UseTree::Rename(rename) => {
            let path = format!("{} as {}", join(&rename.ident), rename.rename);
            out.insert(rename.rename.to_string(), path);
        }
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_use(tree, prefix.clone(), out);
            }
        }
        UseTree::Glob(_) => {}
    }
}

fn trait_impl(item: &syn::ItemImpl) -> Option<TraitImpl> {
    if !item.generics.params.is_empty() {
        return None;
    }
    let (negative, trait_path, _) = item.trait_.as_ref()?;
    if negative.is_some() {
        return None;
    }
    let Type::Path(self_ty) = item.self_ty.as_ref() else {
        return None;
    };
    let self_ty = self_ty.path.get_ident()?.to_string();
    let trait_name = trait_path.segments.last()?.ident.to_string();
    Some(TraitImpl { self_ty, trait_name, trait_path: trait_path.clone() })
}

fn item_name(item: &Item) -> Option<String> {
    let ident = match item {
        Item::Mod(item) => &item.ident,
        Item::Struct(item) => &item.ident,
        Item::Enum(item) => &item.ident,
        Item::Union(item) => &item.ident,
        Item::Trait(item) => &item.ident,
        Item::Type(item) => &item.ident,
        Item::Const(item) => &item.ident,
        Item::Static(item) => &item.ident,
        Item::Fn(item) => &item.sig.ident,
        Item::ExternCrate(item) => item.rename.as_ref().map(|(_, r)| r).unwrap_or(&item.ident),
        _ => return None,
    };
    Some(ident.to_string())
}
