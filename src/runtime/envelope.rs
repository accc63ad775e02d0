use std::any::type_name;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::poly::{Discriminated, Poly};
use super::registry::Registry;
use crate::error::Error;

/// Wire form of a polymorphic value: `{"_type": "<discriminator>", "data": <payload or null>}`.
///
/// An empty discriminator means nil and the payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "_type", default)]
    pub discriminator: String,
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.discriminator == other.discriminator
            && self.data.as_deref().map(RawValue::get) == other.data.as_deref().map(RawValue::get)
    }
}

impl Envelope {
    pub fn nil() -> Self {
        Self::default()
    }

    pub fn is_nil(&self) -> bool {
        self.discriminator.is_empty()
    }

    pub fn wrap<C: ?Sized + Discriminated>(value: &Poly<C>) -> Result<Self, Error> {
        match value {
            Poly::Nil => Ok(Self::nil()),
            Poly::TypedNil(nil) => Ok(Self {
                discriminator: nil.discriminator().to_owned(),
                data: None,
            }),
            Poly::Value(value) => Ok(Self {
                discriminator: value.discriminator().to_owned(),
                data: Some(value.to_payload()?),
            }),
        }
    }

    /// Rebuilds the value through `registry`. `owner` names the field being
    /// decoded and only shows up in capability errors.
    pub fn open<C: ?Sized + 'static>(self, registry: &Registry, owner: &str) -> Result<Poly<C>, Error> {
        if self.is_nil() {
            return Ok(Poly::Nil);
        }
        let discriminator = self.discriminator;
        let mismatch = |discriminator: String| Error::CapabilityMismatch {
            discriminator,
            declared: type_name::<C>().to_owned(),
            owner: owner.to_owned(),
        };

        let Some(data) = self.data.filter(|raw| raw.get().trim() != "null") else {
            let nil = registry.lookup_nil(&discriminator)?;
            if !registry.implements::<C>(nil.type_id()) {
                return Err(mismatch(discriminator));
            }
            return Ok(Poly::TypedNil(nil));
        };

        let mut value = registry.lookup(&discriminator)?;
        if !registry.implements::<C>(value.as_any().type_id()) {
            return Err(mismatch(discriminator));
        }
        value.load_payload(&data)?;
        match registry.cast::<C>(value) {
            Some(value) => Ok(Poly::Value(value)),
            None => Err(mismatch(discriminator)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructorKind;
    use crate::runtime::TypedNil;
    use pretty_assertions::assert_eq;

    trait Shape: Discriminated {
        fn sides(&self) -> u32;
    }

    trait Animal: Discriminated {}

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Triangle {
        base: f64,
        height: f64,
    }

    impl Discriminated for Triangle {
        fn discriminator(&self) -> &str {
            "triangle"
        }
    }

    impl Shape for Triangle {
        fn sides(&self) -> u32 {
            3
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.register_type::<Triangle>("triangle");
        registry.register_cast::<dyn Shape, Triangle>(|v| -> Box<dyn Shape> { v });
        registry
    }

    fn envelope(src: &str) -> Envelope {
        serde_json::from_str(src).unwrap()
    }

    #[test]
    fn wire_shape() {
        let value: Box<dyn Shape> = Box::new(Triangle { base: 2.0, height: 1.5 });
        let wrapped = Envelope::wrap(&Poly::from(value)).unwrap();
        assert_eq!(
            serde_json::to_string(&wrapped).unwrap(),
            r#"{"_type":"triangle","data":{"base":2.0,"height":1.5}}"#
        );
        assert_eq!(
            serde_json::to_string(&Envelope::wrap::<dyn Shape>(&Poly::Nil).unwrap()).unwrap(),
            r#"{"_type":"","data":null}"#
        );
        let nil: Poly<dyn Shape> = TypedNil::of::<Triangle>("triangle").into();
        assert_eq!(
            serde_json::to_string(&Envelope::wrap(&nil).unwrap()).unwrap(),
            r#"{"_type":"triangle","data":null}"#
        );
    }

    #[test]
    fn empty_discriminator_ignores_payload() {
        let registry = Registry::new();
        let poly = envelope(r#"{"_type": "", "data": {"base": 1}}"#)
            .open::<dyn Shape>(&registry, "Holder.shape")
            .unwrap();
        assert!(poly.is_nil());
        assert!(envelope("{}").open::<dyn Shape>(&registry, "Holder.shape").unwrap().is_nil());
    }

    #[test]
    fn payload_is_loaded_into_registered_type() {
        let poly = envelope(r#"{"_type": "triangle", "data": {"base": 4, "height": 2}}"#)
            .open::<dyn Shape>(&registry(), "Holder.shape")
            .unwrap();
        assert_eq!(poly.get().map(|s| s.sides()), Some(3));
        assert_eq!(
            poly.downcast_ref::<Triangle>(),
            Some(&Triangle { base: 4.0, height: 2.0 })
        );
    }

    #[test]
    fn null_payload_yields_typed_nil() {
        for src in [r#"{"_type": "triangle", "data": null}"#, r#"{"_type": "triangle"}"#] {
            match envelope(src).open::<dyn Shape>(&registry(), "Holder.shape").unwrap() {
                Poly::TypedNil(nil) => assert!(nil.is::<Triangle>()),
                other => panic!("{other:?}"),
            }
        }
    }

    #[test]
    fn unknown_discriminator_is_not_found() {
        for (src, expected) in [
            (r#"{"_type": "hexagon", "data": {}}"#, ConstructorKind::Value),
            (r#"{"_type": "hexagon", "data": null}"#, ConstructorKind::Nil),
            (r#"{"_type": "hexagon"}"#, ConstructorKind::Nil),
        ] {
            match envelope(src).open::<dyn Shape>(&registry(), "Holder.shape") {
                Err(Error::NotFound { discriminator, kind }) => {
                    assert_eq!(discriminator, "hexagon");
                    assert_eq!(kind, expected, "{src}");
                }
                other => panic!("{:?}", other.map(|p| p.discriminator().map(str::to_owned))),
            }
        }
    }

    #[test]
    fn capability_mismatch_names_everything() {
        for src in [
            r#"{"_type": "triangle", "data": {"base": 1, "height": 1}}"#,
            r#"{"_type": "triangle", "data": "not even an object"}"#,
            r#"{"_type": "triangle", "data": null}"#,
        ] {
            match envelope(src).open::<dyn Animal>(&registry(), "Zoo.resident") {
                Err(Error::CapabilityMismatch { discriminator, declared, owner }) => {
                    assert_eq!(discriminator, "triangle");
                    assert!(declared.contains("Animal"), "{declared}");
                    assert_eq!(owner, "Zoo.resident");
                }
                other => panic!("{:?}", other.map(|p| p.discriminator().map(str::to_owned))),
            }
        }
    }

    #[test]
    fn malformed_payload_is_a_json_error() {
        for src in [
            r#"{"_type": "triangle", "data": {"base": "x", "height": 1}}"#,
            r#"{"_type": "triangle", "data": "triangle"}"#,
        ] {
            let err = envelope(src)
                .open::<dyn Shape>(&registry(), "Holder.shape")
                .unwrap_err();
            assert!(matches!(err, Error::Json(_)), "{err}");
        }
    }
}
