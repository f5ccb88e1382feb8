//! Field declarations.
//!
//! A [`FieldSpec`] describes one field of a record: its name, its default (a
//! fixed value or a factory) and which generated methods it participates in.
//! Specs are plain values; semantic checks such as "default and
//! default_factory are mutually exclusive" happen when a class is transformed.

use crate::{
    args::KwargsValues,
    exception::{ExcType, RunResult},
    value::Value,
};

/// Name carried by a field marker before it is adopted by a class body.
pub const UNSET_NAME: &str = "<UNSET>";

/// Metadata for one declared field.
///
/// Equality compares names only: two specs are "the same field" when they
/// declare the same attribute, which is what override-by-name merging needs.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    default: Value,
    default_factory: Value,
    init: bool,
    repr: bool,
    hash: Option<bool>,
    compare: bool,
}

/// Creates a field marker with every option at its default.
///
/// Place the result in a class body to declare a field explicitly:
///
/// ```ignore
/// ClassObject::builder("Inventory")
///     .attr("items", field().default_factory(Value::builtin_list()))
///     .attr("label", field().default("none").compare(false))
/// ```
#[must_use]
pub fn field() -> FieldSpec {
    FieldSpec::unset()
}

/// Parses `field(...)` keyword arguments into a [`FieldSpec`].
///
/// Recognized keywords are `default`, `default_factory`, `init`, `repr`,
/// `hash` and `compare`. `hash` accepts `None` for "follow compare".
pub fn field_from_kwargs(kwargs: KwargsValues) -> RunResult<FieldSpec> {
    let mut spec = field();
    for (key, value) in kwargs {
        spec = match key.as_str() {
            "default" => spec.default(value),
            "default_factory" => spec.default_factory(value),
            "init" => spec.init(expect_bool("field", &key, &value)?),
            "repr" => spec.repr(expect_bool("field", &key, &value)?),
            "compare" => spec.compare(expect_bool("field", &key, &value)?),
            "hash" => {
                if value.is_none() {
                    spec.hash(None)
                } else {
                    spec.hash(Some(expect_bool("field", &key, &value)?))
                }
            }
            _ => return Err(ExcType::type_error_unexpected_keyword("field", &key)),
        };
    }
    Ok(spec)
}

/// Reads a boolean keyword argument, rejecting other types.
pub(crate) fn expect_bool(func: &str, key: &str, value: &Value) -> RunResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(ExcType::type_error(format!(
            "{func}() argument '{key}' must be bool, not {}",
            other.type_name()
        ))),
    }
}

impl FieldSpec {
    fn unset() -> Self {
        Self {
            name: UNSET_NAME.to_owned(),
            default: Value::Missing,
            default_factory: Value::Missing,
            init: true,
            repr: true,
            hash: None,
            compare: true,
        }
    }

    /// Sets the fixed default used when the constructor argument is omitted.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Sets a zero-argument callable invoked once per construction when the
    /// argument is omitted.
    #[must_use]
    pub fn default_factory(mut self, factory: impl Into<Value>) -> Self {
        self.default_factory = factory.into();
        self
    }

    #[must_use]
    pub fn init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    #[must_use]
    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = repr;
        self
    }

    /// Tri-state hash participation; `None` follows `compare`.
    #[must_use]
    pub fn hash(mut self, hash: Option<bool>) -> Self {
        self.hash = hash;
        self
    }

    #[must_use]
    pub fn compare(mut self, compare: bool) -> Self {
        self.compare = compare;
        self
    }

    /// Returns a copy of this spec adopted under `name`.
    #[must_use]
    pub(crate) fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fixed default, or `Value::Missing`.
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The default factory, or `Value::Missing`.
    #[must_use]
    pub fn default_factory_value(&self) -> &Value {
        &self.default_factory
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        !self.default.is_missing()
    }

    #[must_use]
    pub fn has_default_factory(&self) -> bool {
        !self.default_factory.is_missing()
    }

    #[must_use]
    pub fn in_init(&self) -> bool {
        self.init
    }

    #[must_use]
    pub fn in_repr(&self) -> bool {
        self.repr
    }

    #[must_use]
    pub fn in_compare(&self) -> bool {
        self.compare
    }

    /// The explicit hash flag, if any.
    #[must_use]
    pub fn hash_flag(&self) -> Option<bool> {
        self.hash
    }

    /// Whether the field's value is part of the generated hash.
    #[must_use]
    pub fn contributes_to_hash(&self) -> bool {
        self.hash.unwrap_or(self.compare)
    }

    /// Name of the private instance slot backing this field.
    #[must_use]
    pub fn storage_name(&self) -> String {
        format!("_{}", self.name)
    }

    /// Produces the value for an omitted constructor argument: the factory's
    /// fresh result, the fixed default, or `None` when the field has neither.
    pub(crate) fn make_default(&self) -> RunResult<Option<Value>> {
        if self.has_default_factory() {
            return self.default_factory.call(crate::args::ArgValues::Empty).map(Some);
        }
        if self.has_default() {
            return Ok(Some(self.default.clone()));
        }
        Ok(None)
    }

    /// `Field('name', default_repr)`.
    pub fn py_repr(&self) -> RunResult<String> {
        Ok(format!(
            "Field({}, {})",
            crate::value::string_repr(&self.name),
            self.default.py_repr()?
        ))
    }
}

impl PartialEq for FieldSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FieldSpec {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_participation_follows_compare() {
        assert!(field().contributes_to_hash());
        assert!(!field().compare(false).contributes_to_hash());
        assert!(field().compare(false).hash(Some(true)).contributes_to_hash());
        assert!(!field().hash(Some(false)).contributes_to_hash());
    }

    #[test]
    fn equality_is_by_name() {
        let a = field().default(1).named("x");
        let b = field().default(2).init(false).named("x");
        assert_eq!(a, b);
        assert_ne!(a, field().named("y"));
    }

    #[test]
    fn repr_shows_name_and_default() {
        assert_eq!(field().default(3).named("a").py_repr().unwrap(), "Field('a', 3)");
        assert_eq!(field().py_repr().unwrap(), "Field('<UNSET>', MISSING)");
    }

    #[test]
    fn kwargs_reject_unknown_keys() {
        let err = field_from_kwargs(vec![("kw_only".to_owned(), Value::Bool(true))]).unwrap_err();
        assert_eq!(err.message(), Some("field() got an unexpected keyword argument 'kw_only'"));
        let spec = field_from_kwargs(vec![("hash".to_owned(), Value::None)]).unwrap();
        assert_eq!(spec.hash_flag(), None);
    }
}
