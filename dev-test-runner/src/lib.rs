//! End-to-end fixture for the generator: a source module plus its committed
//! companion, exercised by the tests in `tests/`.
pub mod example;
