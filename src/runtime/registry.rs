//! Discriminator → constructor registry.
//!
//! Three independent tables behind one reader/writer lock: value
//! constructors, nil constructors, and capability casts keyed by
//! `(capability, concrete)` type ids. Lookups share the lock; every
//! registration takes it exclusively. Constructors run after the lock is
//! released, so they may register types themselves.
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::poly::{Discriminated, TypedNil};
use crate::error::{ConstructorKind, Error};

type Constructor = Arc<dyn Fn() -> Box<dyn Discriminated> + Send + Sync>;
type NilConstructor = Arc<dyn Fn() -> TypedNil + Send + Sync>;
/// Stored type-erased; the concrete type is `Caster<C>`.
type ErasedCaster = Box<dyn Any + Send + Sync>;
type Caster<C> = Box<dyn Fn(Box<dyn Any + Send + Sync>) -> Option<Box<C>> + Send + Sync>;

#[derive(Default)]
struct Tables {
    constructors: HashMap<String, Constructor>,
    nil_constructors: HashMap<String, NilConstructor>,
    casts: HashMap<(TypeId, TypeId), ErasedCaster>,
}

#[derive(Default)]
pub struct Registry {
    tables: RwLock<Tables>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by the `serde` impls of generated types.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Last registration for a discriminator wins.
    pub fn register<F>(&self, discriminator: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Discriminated> + Send + Sync + 'static,
    {
        let discriminator = discriminator.into();
        tracing::trace!(%discriminator, "register constructor");
        self.tables.write().constructors.insert(discriminator, Arc::new(constructor));
    }

    pub fn register_nil<F>(&self, discriminator: impl Into<String>, constructor: F)
    where
        F: Fn() -> TypedNil + Send + Sync + 'static,
    {
        let discriminator = discriminator.into();
        tracing::trace!(%discriminator, "register nil constructor");
        self.tables.write().nil_constructors.insert(discriminator, Arc::new(constructor));
    }

    /// Declares that `T` can be viewed as the capability `C` (a `dyn Trait`).
    pub fn register_cast<C, T>(&self, upcast: fn(Box<T>) -> Box<C>)
    where
        C: ?Sized + 'static,
        T: Any + Send + Sync,
    {
        tracing::trace!(
            capability = std::any::type_name::<C>(),
            concrete = std::any::type_name::<T>(),
            "register cast"
        );
        let caster: Caster<C> =
            Box::new(move |any: Box<dyn Any + Send + Sync>| any.downcast::<T>().ok().map(upcast));
        self.tables
            .write()
            .casts
            .insert((TypeId::of::<C>(), TypeId::of::<T>()), Box::new(caster));
    }

    /// Registers both constructors and the `dyn Discriminated` cast for `T`.
    pub fn register_type<T>(&self, discriminator: &str)
    where
        T: Discriminated + Default,
    {
        let name = discriminator.to_owned();
        self.register(discriminator, || -> Box<dyn Discriminated> { Box::new(T::default()) });
        self.register_nil(discriminator, move || TypedNil::of::<T>(name.clone()));
        self.register_cast::<dyn Discriminated, T>(|v| -> Box<dyn Discriminated> { v });
    }

    /// Fresh zero value of the type registered under `discriminator`.
    pub fn lookup(&self, discriminator: &str) -> Result<Box<dyn Discriminated>, Error> {
        let constructor = self
            .tables
            .read()
            .constructors
            .get(discriminator)
            .cloned()
            .ok_or_else(|| Error::not_found(discriminator, ConstructorKind::Value))?;
        Ok(constructor())
    }

    pub fn lookup_nil(&self, discriminator: &str) -> Result<TypedNil, Error> {
        let constructor = self
            .tables
            .read()
            .nil_constructors
            .get(discriminator)
            .cloned()
            .ok_or_else(|| Error::not_found(discriminator, ConstructorKind::Nil))?;
        Ok(constructor())
    }

    /// True if the concrete type `concrete` has a registered cast to `C`.
    pub fn implements<C: ?Sized + 'static>(&self, concrete: TypeId) -> bool {
        self.tables.read().casts.contains_key(&(TypeId::of::<C>(), concrete))
    }

    /// Views `value` as the capability `C`. `None` when no cast from its concrete type is registered.
    pub fn cast<C: ?Sized + 'static>(&self, value: Box<dyn Discriminated>) -> Option<Box<C>> {
        let key = (TypeId::of::<C>(), value.as_any().type_id());
        let tables = self.tables.read();
        let caster = tables.casts.get(&key)?.downcast_ref::<Caster<C>>()?;
        caster(value.into_any())
    }

    /// Sorted snapshot of every discriminator with a value constructor.
    pub fn discriminators(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().constructors.keys().cloned().collect();
        names.sort();
        names
    }
}
