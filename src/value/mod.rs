//! Value module - In-memory representation of container data.
//!
//! This module provides the tagged value union, comparison operators and merge helpers.

mod compare;
mod value;

pub use compare::*;
pub use value::*;
