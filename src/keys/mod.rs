//! Keys module - Key name normalization and accessor parsing.

mod accessor;
mod normalizer;

pub use accessor::*;
pub use normalizer::*;
