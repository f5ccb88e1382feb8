//! Field collection and policy resolution for a record class.
//!
//! [`TransformSpec::new`] reads a class description once, at decoration time:
//! it merges inherited fields with the class's own declarations and resolves
//! which methods to generate. The result is immutable and ends up stored on
//! the class inside a [`FieldRegistry`].

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    exception::{ExcType, RunResult},
    field::{FieldSpec, field},
    options::{FieldOrder, RecordOptions},
    tracer::TransformTracer,
    types::ClassObject,
    value::Value,
};

/// Class attribute under which the field registry is stored.
///
/// Its presence anywhere in a class's MRO is what makes the class a record.
pub const FIELDS_ATTR: &str = "__dataclass_fields__";

/// What the transform does with `__hash__`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum HashMode {
    /// Install a `__hash__` over the hash-participating fields.
    Generate,
    /// Set `__hash__ = None`, removing any inherited hash.
    Suppress,
    /// Leave `__hash__` alone.
    Inherit,
}

impl HashMode {
    /// Resolves the hash policy from the class flags.
    ///
    /// | `unsafe_hash` | `eq` | `frozen` | mode |
    /// |---|---|---|---|
    /// | true | any | any | Generate |
    /// | false | true | true | Generate |
    /// | false | true | false | Suppress |
    /// | false | false | any | Inherit |
    #[must_use]
    pub fn resolve(eq: bool, frozen: bool, unsafe_hash: bool) -> Self {
        if unsafe_hash || (eq && frozen) {
            Self::Generate
        } else if eq {
            Self::Suppress
        } else {
            Self::Inherit
        }
    }
}

/// Resolved description of a record class.
#[derive(Debug, Clone)]
#[expect(clippy::struct_excessive_bools, reason = "one flag per generated method")]
pub struct TransformSpec {
    class_name: String,
    init: bool,
    repr: bool,
    eq: bool,
    order: bool,
    frozen: bool,
    post_init: bool,
    hash_mode: HashMode,
    fields: Vec<Rc<FieldSpec>>,
}

impl TransformSpec {
    /// Collects the fields of `cls` and resolves its policy.
    ///
    /// Fields start from the nearest base record's registry. The class's own
    /// namespace is then walked in declaration order: `field()` markers are
    /// adopted under their attribute name, callables and dunder names are
    /// skipped, and any other value becomes a field with that value as its
    /// default. A redeclared name replaces the earlier entry but keeps its
    /// position.
    pub fn new<Tr: TransformTracer>(cls: &Rc<ClassObject>, options: &RecordOptions, tracer: &mut Tr) -> RunResult<Self> {
        let class_name = cls.name().to_owned();
        if options.order && !options.eq {
            return Err(ExcType::value_error("eq must be true if order is true"));
        }

        let mut collected: IndexMap<String, Rc<FieldSpec>> = IndexMap::new();
        if let Some(base) = base_registry(cls) {
            check_frozen_inheritance(base.spec(), options.frozen)?;
            for inherited in base.fields() {
                tracer.on_field_collected(&class_name, inherited, true);
                collected.insert(inherited.name().to_owned(), Rc::clone(inherited));
            }
        }

        for (name, value) in cls.own_attrs() {
            let Some(declared) = declared_field(&name, &value) else {
                continue;
            };
            validate_field(&declared)?;
            let declared = Rc::new(declared);
            if let Some(existing) = collected.get_mut(&name) {
                tracer.on_field_overridden(&class_name, &declared);
                *existing = declared;
            } else {
                tracer.on_field_collected(&class_name, &declared, false);
                collected.insert(name, declared);
            }
        }

        if options.field_order == FieldOrder::Alphabetical {
            collected.sort_keys();
        }

        let spec = Self {
            init: options.init && !cls.has_own_attr("__init__"),
            repr: options.repr && !cls.has_own_attr("__repr__"),
            eq: options.eq,
            order: options.order,
            frozen: options.frozen,
            post_init: cls.mro_lookup_attr("__post_init__").is_some_and(|v| v.is_callable()),
            hash_mode: HashMode::resolve(options.eq, options.frozen, options.unsafe_hash),
            fields: collected.into_values().collect(),
            class_name,
        };
        tracer.on_policy_resolved(&spec);
        Ok(spec)
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether `__init__` is generated.
    #[must_use]
    pub fn init(&self) -> bool {
        self.init
    }

    /// Whether `__repr__` is generated.
    #[must_use]
    pub fn repr(&self) -> bool {
        self.repr
    }

    #[must_use]
    pub fn eq(&self) -> bool {
        self.eq
    }

    #[must_use]
    pub fn order(&self) -> bool {
        self.order
    }

    #[must_use]
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the generated `__init__` calls `__post_init__`.
    #[must_use]
    pub fn post_init(&self) -> bool {
        self.post_init
    }

    #[must_use]
    pub fn hash_mode(&self) -> HashMode {
        self.hash_mode
    }

    /// All fields in resolved order.
    #[must_use]
    pub fn fields(&self) -> &[Rc<FieldSpec>] {
        &self.fields
    }
}

/// The registry stored on a record class under [`FIELDS_ATTR`].
///
/// Maps field names to specs in resolved order and keeps the resolved policy
/// so subclasses and introspection can consult it.
#[derive(Debug)]
pub struct FieldRegistry {
    spec: TransformSpec,
    by_name: IndexMap<String, Rc<FieldSpec>>,
}

impl FieldRegistry {
    #[must_use]
    pub fn new(spec: TransformSpec) -> Self {
        let by_name = spec
            .fields
            .iter()
            .map(|f| (f.name().to_owned(), Rc::clone(f)))
            .collect();
        Self { spec, by_name }
    }

    #[must_use]
    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    /// Fields in resolved order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Rc<FieldSpec>> {
        self.by_name.values()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<FieldSpec>> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Finds the registry a class resolves through its MRO, its own included.
#[must_use]
pub fn lookup_registry(cls: &ClassObject) -> Option<Rc<FieldRegistry>> {
    match cls.mro_lookup_attr(FIELDS_ATTR) {
        Some(Value::Registry(registry)) => Some(registry),
        _ => None,
    }
}

/// The registry of the nearest base class in MRO order, skipping `cls` itself.
fn base_registry(cls: &Rc<ClassObject>) -> Option<Rc<FieldRegistry>> {
    cls.mro().iter().skip(1).find_map(|base| match base.own_attr(FIELDS_ATTR) {
        Some(Value::Registry(registry)) => Some(registry),
        _ => None,
    })
}

fn check_frozen_inheritance(base: &TransformSpec, frozen: bool) -> RunResult<()> {
    match (base.frozen(), frozen) {
        (true, false) => Err(ExcType::type_error("cannot inherit non-frozen dataclass from a frozen one")),
        (false, true) => Err(ExcType::type_error("cannot inherit frozen dataclass from a non-frozen one")),
        _ => Ok(()),
    }
}

/// Interprets one class-body attribute, returning `None` for non-fields.
fn declared_field(name: &str, value: &Value) -> Option<FieldSpec> {
    if name.starts_with("__") {
        return None;
    }
    match value {
        Value::Field(marker) => Some(marker.named(name)),
        Value::Function(_) | Value::Class(_) | Value::Property(_) | Value::Registry(_) => None,
        raw => Some(field().default(raw.clone()).named(name)),
    }
}

fn validate_field(field: &FieldSpec) -> RunResult<()> {
    if field.has_default() && field.has_default_factory() {
        return Err(ExcType::value_error("cannot specify both default and default_factory"));
    }
    if let default @ (Value::List(_) | Value::Dict(_)) = field.default_value() {
        return Err(ExcType::value_error(format!(
            "mutable default <class '{}'> for field {} is not allowed: use default_factory",
            default.type_name(),
            field.name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_mode_table() {
        assert_eq!(HashMode::resolve(true, true, false), HashMode::Generate);
        assert_eq!(HashMode::resolve(true, false, false), HashMode::Suppress);
        assert_eq!(HashMode::resolve(false, false, false), HashMode::Inherit);
        assert_eq!(HashMode::resolve(false, true, false), HashMode::Inherit);
        assert_eq!(HashMode::resolve(false, false, true), HashMode::Generate);
        assert_eq!(HashMode::resolve(true, false, true), HashMode::Generate);
    }

    #[test]
    fn dunder_and_callable_attributes_are_not_fields() {
        assert!(declared_field("__slots__", &Value::Int(1)).is_none());
        assert!(declared_field("method", &Value::function("method", |_| Ok(Value::None))).is_none());
        let implicit = declared_field("_private", &Value::Int(1)).unwrap();
        assert_eq!(implicit.name(), "_private");
        assert!(implicit.has_default());
    }
}
