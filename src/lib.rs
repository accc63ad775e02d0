//! Companion serialization for fields typed by a capability trait.
//!
//! Two halves live here. The generator reads Rust source, finds declarations
//! carrying `polyjson:*` doc directives, and emits a child module with shadow
//! types and `serde` impls. The runtime is what that module links against: a
//! discriminator registry plus the `{"_type", "data"}` envelope.
//!
//! ```ignore
//! /// polyjson:marshal
//! pub struct Drawing {
//!     /// polyjson:poly true
//!     pub shapes: Vec<Poly<dyn Shape>>,
//! }
//!
//! #[path = "drawing.polyjson.rs"]
//! mod generated;
//! ```
pub mod codegen;
pub mod config;
pub mod directive;
pub mod error;
pub mod ir;
pub mod lower;
pub mod resolve;

mod runtime;

pub use config::{Options, SkipPolicy};
pub use error::{ConfigError, ConstructorKind, Error, GenerateError};
pub use runtime::{
    deserialize, from_slice, from_slice_in, from_str, from_str_in, serialize, to_string, to_vec,
    try_array, Discriminated, Envelope, Payload, Poly, Registry, Shadowed, TypedNil,
};

/// Parses and lowers one source file.
pub fn describe(source: &str, options: &Options) -> Result<ir::Module, GenerateError> {
    let file = syn::parse_file(source)?;
    lower::lower_file(&file, options)
}

/// Companion module text for `source`, or `None` when nothing in it qualifies.
pub fn generate(source: &str, options: &Options) -> Result<Option<String>, GenerateError> {
    let module = describe(source, options)?;
    if module.is_empty() {
        return Ok(None);
    }
    let mut codegen = codegen::Codegen::new(options);
    codegen.emit(&module);
    Ok(Some(codegen.into_string()))
}
