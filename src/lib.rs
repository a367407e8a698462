//! # Blue Data
//!
//! Mutable structured-data containers with change tracking.
//!
//! A container wraps a key/value map, remembers what every key looked like
//! before it was edited, runs writes through validation and preparation
//! rules and converts its data to and from JSON, YAML, XML, a serialized
//! format and plain objects. Collections apply the same discipline to an
//! ordered list and add paging.
//!
//! ## Modules
//!
//! - [`value`] - The `Value` union, string-keyed maps, opaque objects and comparison operators
//! - [`keys`] - Accessor-name parsing and memoized key normalization
//! - [`rules`] - Ordered (key pattern, action) pipelines for validation and transforms
//! - [`codec`] - Conversions between container data and external representations
//! - [`container`] - The dirty-tracking key/value store
//! - [`collection`] - Ordered lists with dirty tracking, reindexing and paging

pub mod codec;
pub mod collection;
pub mod container;
pub mod keys;
pub mod rules;
pub mod value;

pub use codec::{CodecError, Format, XmlOptions};
pub use collection::Collection;
pub use container::{ConfigError, DataContainer, ErrorLog, ErrorRecord, Options};
pub use keys::{Accessor, KeyNormalizer, Verb};
pub use rules::{Check, RuleError, TransformRules, ValidationRules};
pub use value::{Map, Object, Operator, Value};
