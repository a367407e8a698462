//! Rules module - Validation and transformation pipelines keyed by regular expressions.

mod pipeline;

pub use pipeline::*;
