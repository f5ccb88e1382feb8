//! Host object model types.
//!
//! A deliberately small object model: classes with an ordered namespace and a
//! C3 method resolution order, instances with an attribute map, native
//! functions, properties and an insertion-ordered dict. It provides exactly the
//! capabilities the record engine consumes (install attributes on a class,
//! read/write/delete instance attributes, raise errors) plus protocol dispatch
//! through class attributes.
pub mod class;
pub mod dict;
pub mod function;

pub use class::{ClassBuilder, ClassObject, Instance};
pub use dict::Dict;
pub use function::{Function, Property};
