//! Fixture types exercising every supported field shape.
//!
//! `example.polyjson.rs` is generated from this file:
//! `polyjson generate -i dev-test-runner/src/example.rs`
use std::collections;
use std::collections::{BTreeMap, HashMap};

use polyjson::{Discriminated, Poly, Registry};
use serde::{Deserialize, Serialize};

#[path = "example.polyjson.rs"]
mod generated;

pub trait Described: Discriminated {
    fn describe(&self) -> String;
}

pub trait Labeled: Discriminated {
    fn label(&self) -> String;
}

/// Registered by hand in [`register_all`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct A {
    pub a: i64,
    pub b: f64,
}

impl Discriminated for A {
    fn discriminator(&self) -> &str {
        "A"
    }
}

impl Described for A {
    fn describe(&self) -> String {
        format!("A({}, {})", self.a, self.b)
    }
}

impl Labeled for A {
    fn label(&self) -> String {
        format!("a{}", self.a)
    }
}

/// polyjson:register beta
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct B {
    pub a: String,
    pub b: f64,
}

impl Described for B {
    fn describe(&self) -> String {
        format!("B({}, {})", self.a, self.b)
    }
}

/// polyjson:register
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct C {
    pub a: String,
    pub b: String,
}

impl Described for C {
    fn describe(&self) -> String {
        format!("C({}, {})", self.a, self.b)
    }
}

impl Labeled for C {
    fn label(&self) -> String {
        format!("{}-{}", self.a, self.b)
    }
}

/// polyjson:register level
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Info,
    Warn,
    Error,
}

impl Labeled for Level {
    fn label(&self) -> String {
        format!("{self:?}").to_lowercase()
    }
}

/// polyjson:marshal
/// polyjson:inject #[serde(deny_unknown_fields)]
#[derive(Debug, Default, PartialEq)]
pub struct Example {
    /// polyjson:serde rename = "id"
    pub a: i64,
    pub b: f64,
    /// polyjson:poly true
    pub c: Poly<dyn Described>,
    /// polyjson:poly true
    pub d: Poly<dyn Described>,
    /// polyjson:poly true
    pub e: Poly<dyn Described>,
    pub f: Level,
    /// polyjson:poly true
    pub g: Option<Vec<Poly<dyn Described>>>,
    /// polyjson:poly true
    pub h: Option<HashMap<String, Poly<dyn Described>>>,
    /// polyjson:serde default
    pub o: [Option<Level>; 4],
    /// polyjson:poly true
    pub p: Poly<dyn Described>,
    /// polyjson:poly true
    pub q: Box<Poly<dyn Labeled>>,
    /// polyjson:poly true
    pub r: [Poly<dyn Labeled>; 2],
    /// polyjson:poly true
    pub s: Option<BTreeMap<String, Vec<Poly<dyn Labeled>>>>,
    /// polyjson:poly true
    pub t: Vec<Poly<dyn Labeled + Send>>,
    pub timeout: std::time::Duration,
    pub tags: collections::BTreeSet<String>,
    /// Not serialized; comes back as the default.
    pub note: &'static str,
}

/// polyjson:marshal
#[derive(Debug, Default, PartialEq)]
pub struct Items(pub Option<Vec<Poly<dyn Described>>>);

/// polyjson:marshal
#[derive(Debug, Default, PartialEq)]
pub struct Catalog(pub HashMap<String, Poly<dyn Described>>);

pub fn register_all(registry: &Registry) {
    registry.register_type::<A>("A");
    registry.register_cast::<dyn Described, A>(|v| -> Box<dyn Described> { v });
    registry.register_cast::<dyn Labeled, A>(|v| -> Box<dyn Labeled> { v });
    registry.register_cast::<dyn Labeled + Send, A>(|v| -> Box<dyn Labeled + Send> { v });
    generated::register(registry);
}
