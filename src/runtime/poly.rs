use std::any::{Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;

/// Object-safe serialization surface of a concrete value.
///
/// Blanket-implemented; user types never implement it by hand.
pub trait Payload: Any + Send + Sync {
    fn to_payload(&self) -> serde_json::Result<Box<RawValue>>;
    /// Replaces `self` with the value decoded from `raw`.
    fn load_payload(&mut self, raw: &RawValue) -> serde_json::Result<()>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T> Payload for T
where
    T: Serialize + DeserializeOwned + Any + Send + Sync,
{
    fn to_payload(&self) -> serde_json::Result<Box<RawValue>> {
        serde_json::value::to_raw_value(self)
    }

    fn load_payload(&mut self, raw: &RawValue) -> serde_json::Result<()> {
        *self = serde_json::from_str(raw.get())?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// Every registered concrete type reports the discriminator it was registered under.
///
/// Capability traits extend this one: `trait Shape: Discriminated { .. }`.
pub trait Discriminated: Payload {
    fn discriminator(&self) -> &str;
}

/// A known concrete type with no value, the result of decoding `{"_type": "X", "data": null}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedNil {
    discriminator: String,
    type_id: TypeId,
    type_name: &'static str,
}

impl TypedNil {
    pub fn of<T: Any>(discriminator: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// A field whose concrete type is only known at run time.
///
/// `C` is a capability trait object such as `dyn Shape`.
pub enum Poly<C: ?Sized> {
    /// No discriminator, no value.
    Nil,
    /// Discriminator known, value absent.
    TypedNil(TypedNil),
    Value(Box<C>),
}

impl<C: ?Sized> Default for Poly<C> {
    fn default() -> Self {
        Poly::Nil
    }
}

impl<C: ?Sized> From<Box<C>> for Poly<C> {
    fn from(value: Box<C>) -> Self {
        Poly::Value(value)
    }
}

impl<C: ?Sized> From<TypedNil> for Poly<C> {
    fn from(nil: TypedNil) -> Self {
        Poly::TypedNil(nil)
    }
}

impl<C: ?Sized> Poly<C> {
    pub fn is_nil(&self) -> bool {
        matches!(self, Poly::Nil)
    }

    pub fn get(&self) -> Option<&C> {
        match self {
            Poly::Value(value) => Some(&**value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut C> {
        match self {
            Poly::Value(value) => Some(&mut **value),
            _ => None,
        }
    }

    pub fn into_inner(self) -> Option<Box<C>> {
        match self {
            Poly::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<C: ?Sized + Discriminated> Poly<C> {
    /// `None` only for [`Poly::Nil`].
    pub fn discriminator(&self) -> Option<&str> {
        match self {
            Poly::Nil => None,
            Poly::TypedNil(nil) => Some(nil.discriminator()),
            Poly::Value(value) => Some(value.discriminator()),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.get()?.as_any().downcast_ref::<T>()
    }
}

impl<C: ?Sized + Discriminated> fmt::Debug for Poly<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Poly::Nil => f.write_str("Nil"),
            Poly::TypedNil(nil) => f.debug_tuple("TypedNil").field(&nil.discriminator).finish(),
            Poly::Value(value) => {
                let payload = value.to_payload();
                let mut out = f.debug_tuple("Value");
                out.field(&value.discriminator());
                match &payload {
                    Ok(raw) => out.field(&raw.get()),
                    Err(err) => out.field(err),
                };
                out.finish()
            }
        }
    }
}

/// Values compare by discriminator and serialized payload.
impl<C: ?Sized + Discriminated> PartialEq for Poly<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Poly::Nil, Poly::Nil) => true,
            (Poly::TypedNil(a), Poly::TypedNil(b)) => a == b,
            (Poly::Value(a), Poly::Value(b)) => {
                let same_type = a.discriminator() == b.discriminator()
                    && a.as_any().type_id() == b.as_any().type_id();
                if !same_type {
                    return false;
                }
                match (a.to_payload(), b.to_payload()) {
                    (Ok(a), Ok(b)) => a.get() == b.get(),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Circle {
        radius: f64,
    }

    impl Discriminated for Circle {
        fn discriminator(&self) -> &str {
            "circle"
        }
    }

    fn circle(radius: f64) -> Poly<dyn Discriminated> {
        let value: Box<dyn Discriminated> = Box::new(Circle { radius });
        Poly::from(value)
    }

    #[test]
    fn default_is_nil() {
        let poly: Poly<dyn Discriminated> = Poly::default();
        assert!(poly.is_nil());
        assert_eq!(poly.discriminator(), None);
        assert!(poly.get().is_none());
    }

    #[test]
    fn values_compare_by_payload() {
        assert_eq!(circle(1.0), circle(1.0));
        assert_ne!(circle(1.0), circle(2.0));
        assert_ne!(circle(1.0), Poly::Nil);
    }

    #[test]
    fn typed_nil_keeps_its_type() {
        let poly: Poly<dyn Discriminated> = TypedNil::of::<Circle>("circle").into();
        assert!(!poly.is_nil());
        assert_eq!(poly.discriminator(), Some("circle"));
        assert!(poly.get().is_none());
        match &poly {
            Poly::TypedNil(nil) => {
                assert!(nil.is::<Circle>());
                assert!(nil.type_name().ends_with("Circle"));
            }
            other => panic!("{other:?}"),
        }
        assert_ne!(poly, circle(0.0));
    }

    #[test]
    fn downcast_to_concrete() {
        let poly = circle(3.5);
        assert_eq!(poly.downcast_ref::<Circle>().map(|c| c.radius), Some(3.5));
        assert!(poly.downcast_ref::<String>().is_none());
        assert_eq!(format!("{poly:?}"), r#"Value("circle", "{\"radius\":3.5}")"#);
    }

    #[test]
    fn load_payload_replaces_value() {
        let mut value = Circle::default();
        let raw = RawValue::from_string(String::from(r#"{"radius": 2.0}"#)).unwrap();
        value.load_payload(&raw).unwrap();
        assert_eq!(value.radius, 2.0);
        assert!(value.load_payload(&RawValue::from_string(String::from("[]")).unwrap()).is_err());
    }
}
