//! Run-time half: what generated code links against.
mod codec;
mod envelope;
mod poly;
mod registry;

pub use codec::{
    deserialize, from_slice, from_slice_in, from_str, from_str_in, serialize, to_string, to_vec,
    try_array, Shadowed,
};
pub use envelope::Envelope;
pub use poly::{Discriminated, Payload, Poly, TypedNil};
pub use registry::Registry;
