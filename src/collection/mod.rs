//! Collection module - Ordered lists with change tracking and paging.
//!
//! A [`Collection`] keeps its elements dense: deleting an element shifts the
//! following ones down, so positions taken before a delete are stale after it.

mod collection;

#[cfg(test)]
mod collection_test;

pub use collection::*;
