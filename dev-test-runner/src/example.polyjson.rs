// @generated by polyjson. DO NOT EDIT.

use super::*;
use std::collections;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExampleShadow {
    #[serde(rename = "id")]
    a: i64,
    b: f64,
    // polymorphic: Poly<dyn Described>
    c: polyjson::Envelope,
    // polymorphic: Poly<dyn Described>
    d: polyjson::Envelope,
    // polymorphic: Poly<dyn Described>
    e: polyjson::Envelope,
    f: Level,
    // polymorphic: Option<Vec<Poly<dyn Described>>>
    g: Option<Vec<polyjson::Envelope>>,
    // polymorphic: Option<HashMap<String, Poly<dyn Described>>>
    h: Option<HashMap<String, polyjson::Envelope>>,
    #[serde(default)]
    o: [Option<Level>; 4],
    // polymorphic: Poly<dyn Described>
    p: polyjson::Envelope,
    // polymorphic: Box<Poly<dyn Labeled>>
    q: Box<polyjson::Envelope>,
    // polymorphic: [Poly<dyn Labeled>; 2]
    r: [polyjson::Envelope; 2],
    // polymorphic: Option<BTreeMap<String, Vec<Poly<dyn Labeled>>>>
    s: Option<BTreeMap<String, Vec<polyjson::Envelope>>>,
    // polymorphic: Vec<Poly<dyn Labeled + Send>>
    t: Vec<polyjson::Envelope>,
    timeout: std::time::Duration,
    tags: collections::BTreeSet<String>,
}

impl polyjson::Shadowed for Example {
    type Shadow = ExampleShadow;

    fn to_shadow(&self) -> Result<ExampleShadow, polyjson::Error> {
        Ok(ExampleShadow {
            a: self.a.clone(),
            b: self.b.clone(),
            c: polyjson::Envelope::wrap(&self.c)?,
            d: polyjson::Envelope::wrap(&self.d)?,
            e: polyjson::Envelope::wrap(&self.e)?,
            f: self.f.clone(),
            g: match &self.g { Some(v1) => Some(v1.iter().map(|v2| Ok::<_, polyjson::Error>(polyjson::Envelope::wrap(v2)?)).collect::<Result<Vec<_>, polyjson::Error>>()?), None => None },
            h: match &self.h { Some(v1) => Some(v1.iter().map(|(k2, v2)| Ok::<_, polyjson::Error>((k2.clone(), polyjson::Envelope::wrap(v2)?))).collect::<Result<HashMap<_, _>, polyjson::Error>>()?), None => None },
            o: self.o.clone(),
            p: polyjson::Envelope::wrap(&self.p)?,
            q: Box::new(polyjson::Envelope::wrap(Box::as_ref(&self.q))?),
            r: polyjson::try_array(self.r.iter().map(|v1| Ok::<_, polyjson::Error>(polyjson::Envelope::wrap(v1)?)))?,
            s: match &self.s { Some(v1) => Some(v1.iter().map(|(k2, v2)| Ok::<_, polyjson::Error>((k2.clone(), v2.iter().map(|v3| Ok::<_, polyjson::Error>(polyjson::Envelope::wrap(v3)?)).collect::<Result<Vec<_>, polyjson::Error>>()?))).collect::<Result<BTreeMap<_, _>, polyjson::Error>>()?), None => None },
            t: self.t.iter().map(|v1| Ok::<_, polyjson::Error>(polyjson::Envelope::wrap(v1)?)).collect::<Result<Vec<_>, polyjson::Error>>()?,
            timeout: self.timeout.clone(),
            tags: self.tags.clone(),
        })
    }

    fn from_shadow(shadow: ExampleShadow, registry: &polyjson::Registry) -> Result<Self, polyjson::Error> {
        Ok(Example {
            a: shadow.a,
            b: shadow.b,
            c: shadow.c.open::<dyn Described>(registry, "Example.c")?,
            d: shadow.d.open::<dyn Described>(registry, "Example.d")?,
            e: shadow.e.open::<dyn Described>(registry, "Example.e")?,
            f: shadow.f,
            g: match shadow.g { Some(v1) => Some(v1.into_iter().map(|v2| Ok::<_, polyjson::Error>(v2.open::<dyn Described>(registry, "Example.g")?)).collect::<Result<Vec<_>, polyjson::Error>>()?), None => None },
            h: match shadow.h { Some(v1) => Some(v1.into_iter().map(|(k2, v2)| Ok::<_, polyjson::Error>((k2, v2.open::<dyn Described>(registry, "Example.h")?))).collect::<Result<HashMap<_, _>, polyjson::Error>>()?), None => None },
            o: shadow.o,
            p: shadow.p.open::<dyn Described>(registry, "Example.p")?,
            q: Box::new((*shadow.q).open::<dyn Labeled>(registry, "Example.q")?),
            r: polyjson::try_array(shadow.r.into_iter().map(|v1| Ok::<_, polyjson::Error>(v1.open::<dyn Labeled>(registry, "Example.r")?)))?,
            s: match shadow.s { Some(v1) => Some(v1.into_iter().map(|(k2, v2)| Ok::<_, polyjson::Error>((k2, v2.into_iter().map(|v3| Ok::<_, polyjson::Error>(v3.open::<dyn Labeled>(registry, "Example.s")?)).collect::<Result<Vec<_>, polyjson::Error>>()?))).collect::<Result<BTreeMap<_, _>, polyjson::Error>>()?), None => None },
            t: shadow.t.into_iter().map(|v1| Ok::<_, polyjson::Error>(v1.open::<dyn Labeled + Send>(registry, "Example.t")?)).collect::<Result<Vec<_>, polyjson::Error>>()?,
            timeout: shadow.timeout,
            tags: shadow.tags,
            note: Default::default(),
        })
    }
}

impl serde::Serialize for Example {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        polyjson::serialize(self, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Example {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        polyjson::deserialize(deserializer)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ItemsShadow(Option<Vec<polyjson::Envelope>>);

impl polyjson::Shadowed for Items {
    type Shadow = ItemsShadow;

    fn to_shadow(&self) -> Result<ItemsShadow, polyjson::Error> {
        Ok(ItemsShadow(match &self.0 { Some(v1) => Some(v1.iter().map(|v2| Ok::<_, polyjson::Error>(polyjson::Envelope::wrap(v2)?)).collect::<Result<Vec<_>, polyjson::Error>>()?), None => None }))
    }

    fn from_shadow(shadow: ItemsShadow, registry: &polyjson::Registry) -> Result<Self, polyjson::Error> {
        Ok(Items(match shadow.0 { Some(v1) => Some(v1.into_iter().map(|v2| Ok::<_, polyjson::Error>(v2.open::<dyn Described>(registry, "Items")?)).collect::<Result<Vec<_>, polyjson::Error>>()?), None => None }))
    }
}

impl serde::Serialize for Items {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        polyjson::serialize(self, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Items {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        polyjson::deserialize(deserializer)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct CatalogShadow(HashMap<String, polyjson::Envelope>);

impl polyjson::Shadowed for Catalog {
    type Shadow = CatalogShadow;

    fn to_shadow(&self) -> Result<CatalogShadow, polyjson::Error> {
        Ok(CatalogShadow(self.0.iter().map(|(k1, v1)| Ok::<_, polyjson::Error>((k1.clone(), polyjson::Envelope::wrap(v1)?))).collect::<Result<HashMap<_, _>, polyjson::Error>>()?))
    }

    fn from_shadow(shadow: CatalogShadow, registry: &polyjson::Registry) -> Result<Self, polyjson::Error> {
        Ok(Catalog(shadow.0.into_iter().map(|(k1, v1)| Ok::<_, polyjson::Error>((k1, v1.open::<dyn Described>(registry, "Catalog")?))).collect::<Result<HashMap<_, _>, polyjson::Error>>()?))
    }
}

impl serde::Serialize for Catalog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        polyjson::serialize(self, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Catalog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        polyjson::deserialize(deserializer)
    }
}

impl polyjson::Discriminated for B {
    fn discriminator(&self) -> &str {
        "beta"
    }
}

impl polyjson::Discriminated for C {
    fn discriminator(&self) -> &str {
        "C"
    }
}

impl polyjson::Discriminated for Level {
    fn discriminator(&self) -> &str {
        "level"
    }
}

/// Registers the discriminated types declared alongside this module.
pub fn register(registry: &polyjson::Registry) {
    registry.register("beta", || -> Box<dyn polyjson::Discriminated> { Box::new(B::default()) });
    registry.register_nil("beta", || polyjson::TypedNil::of::<B>("beta"));
    registry.register_cast::<dyn polyjson::Discriminated, B>(|v| -> Box<dyn polyjson::Discriminated> { v });
    registry.register_cast::<dyn Described, B>(|v| -> Box<dyn Described> { v });
    registry.register("C", || -> Box<dyn polyjson::Discriminated> { Box::new(C::default()) });
    registry.register_nil("C", || polyjson::TypedNil::of::<C>("C"));
    registry.register_cast::<dyn polyjson::Discriminated, C>(|v| -> Box<dyn polyjson::Discriminated> { v });
    registry.register_cast::<dyn Described, C>(|v| -> Box<dyn Described> { v });
    registry.register_cast::<dyn Labeled, C>(|v| -> Box<dyn Labeled> { v });
    registry.register_cast::<dyn Labeled + Send, C>(|v| -> Box<dyn Labeled + Send> { v });
    registry.register("level", || -> Box<dyn polyjson::Discriminated> { Box::new(Level::default()) });
    registry.register_nil("level", || polyjson::TypedNil::of::<Level>("level"));
    registry.register_cast::<dyn polyjson::Discriminated, Level>(|v| -> Box<dyn polyjson::Discriminated> { v });
    registry.register_cast::<dyn Labeled, Level>(|v| -> Box<dyn Labeled> { v });
    registry.register_cast::<dyn Labeled + Send, Level>(|v| -> Box<dyn Labeled + Send> { v });
}
