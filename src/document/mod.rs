//! Document model
//!
//! A document is a flat mapping from field name to a scalar [`Value`].
//! Stored documents always carry a string `_id`.

mod document;
mod value;

pub use document::{Document, DocumentError, DocumentId, ID_FIELD};
pub use value::Value;
pub(crate) use value::{cmp_floats, cmp_int_float, I64_EDGE};
