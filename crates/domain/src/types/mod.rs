//! Shared vocabulary types: pure data, serializable, no I/O.

mod property_bag;
pub use property_bag::{PropertyBag, PropertyValue};
