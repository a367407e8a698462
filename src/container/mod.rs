//! Container module - The dirty-tracking key/value store.
//!
//! A [`DataContainer`] keeps its live data next to the values each key held
//! before it was first touched, plus the set of keys added since the last
//! checkpoint. That bookkeeping is enough to restore the data, report what
//! changed, or accept all edits as the new baseline.
//!
//! Writes go through the validation and preparation pipelines, reads through
//! the retrieve pipeline. Failures never escape as errors: they are appended
//! to the container's [`ErrorLog`] and the affected call returns `None`.

mod data;
mod errors;
mod options;


pub use data::*;
pub use errors::*;
pub use options::*;
