//! Introspection over installed records: `is_dataclass`, `fields`, `replace`,
//! `asdict` and `astuple`.
//!
//! Everything here reads the [`FieldRegistry`] the installer stored on the
//! class; nothing re-derives fields from the class namespace.

use std::rc::Rc;

use crate::{
    args::{ArgValues, KwargsValues},
    exception::{ExcType, RunError, RunResult},
    field::FieldSpec,
    resource::DataDepthGuard,
    transform_spec::{FieldRegistry, lookup_registry},
    types::Instance,
    value::Value,
};

/// The registry of a record class or record instance.
fn registry_of(obj: &Value) -> Option<Rc<FieldRegistry>> {
    match obj {
        Value::Class(cls) => lookup_registry(cls),
        Value::Instance(inst) => lookup_registry(inst.class()),
        _ => None,
    }
}

/// The instance and registry of a record instance; classes are rejected.
fn record_instance<'a>(obj: &'a Value, func: &str) -> RunResult<(&'a Rc<Instance>, Rc<FieldRegistry>)> {
    if let Value::Instance(inst) = obj
        && let Some(registry) = lookup_registry(inst.class())
    {
        return Ok((inst, registry));
    }
    Err(ExcType::type_error(format!("{func}() should be called on dataclass instances")))
}

/// Returns true if `obj` is a record class or an instance of one.
#[must_use]
pub fn is_dataclass(obj: &Value) -> bool {
    registry_of(obj).is_some()
}

/// Same as [`is_dataclass`].
#[must_use]
pub fn is_record(obj: &Value) -> bool {
    is_dataclass(obj)
}

/// The resolved fields of a record class or instance, in order.
pub fn fields(obj: &Value) -> RunResult<Vec<Rc<FieldSpec>>> {
    let registry = registry_of(obj)
        .ok_or_else(|| ExcType::type_error("must be called with a dataclass type or instance"))?;
    Ok(registry.fields().cloned().collect())
}

/// Creates a new instance of `obj`'s class with some fields replaced.
///
/// Every name in `changes` is checked before anything is constructed:
/// `init=False` fields raise `ValueError`; names that are not fields, or that
/// appear twice, raise `TypeError`. The new instance is then built by calling the class with, for
/// each `init=True` field, the replacement or the current value.
pub fn replace(obj: &Value, changes: KwargsValues) -> RunResult<Value> {
    let (inst, registry) = record_instance(obj, "replace")?;

    for (i, (name, _)) in changes.iter().enumerate() {
        if changes[..i].iter().any(|(seen, _)| seen == name) {
            return Err(ExcType::type_error_multiple_values("__init__", name));
        }
        match registry.get(name) {
            Some(field) if !field.in_init() => {
                return Err(ExcType::value_error(format!(
                    "field {name} is declared with init=False, it cannot be specified with replace()"
                )));
            }
            Some(_) => {}
            None => return Err(ExcType::type_error_unexpected_keyword("__init__", name)),
        }
    }

    let mut changes = changes;
    let mut kwargs: KwargsValues = Vec::with_capacity(registry.len());
    for field in registry.fields().filter(|f| f.in_init()) {
        let value = match changes.iter().position(|(name, _)| name == field.name()) {
            Some(index) => changes.swap_remove(index).1,
            None => obj.get_attr(field.name())?,
        };
        kwargs.push((field.name().to_owned(), value));
    }

    Value::Class(Rc::clone(inst.class())).call(ArgValues::Kwargs(kwargs))
}

/// Converts a record instance to a dict of its field values, recursively.
///
/// Nested records, lists, tuples and dicts are converted too; `None`, bools,
/// numbers and strings are copied as is.
pub fn asdict(obj: &Value) -> RunResult<Value> {
    asdict_with(obj, |pairs| {
        Value::dict(pairs.into_iter().map(|(name, value)| (Value::from(name), value)))
    })
}

/// [`asdict`] with a custom constructor for every converted record.
///
/// `dict_factory` receives the `(name, value)` pairs of one record, in field
/// order, with values already converted.
pub fn asdict_with(
    obj: &Value,
    dict_factory: impl Fn(Vec<(String, Value)>) -> RunResult<Value>,
) -> RunResult<Value> {
    record_instance(obj, "asdict")?;
    convert(obj, &RecordShape::Dict(&dict_factory))
}

/// Converts a record instance to a tuple of its field values, recursively.
pub fn astuple(obj: &Value) -> RunResult<Value> {
    astuple_with(obj, |values| Ok(Value::tuple(values)))
}

/// [`astuple`] with a custom constructor for every converted record.
pub fn astuple_with(obj: &Value, tuple_factory: impl Fn(Vec<Value>) -> RunResult<Value>) -> RunResult<Value> {
    record_instance(obj, "astuple")?;
    convert(obj, &RecordShape::Tuple(&tuple_factory))
}

/// What a record becomes during deep conversion.
enum RecordShape<'f> {
    Dict(&'f dyn Fn(Vec<(String, Value)>) -> RunResult<Value>),
    Tuple(&'f dyn Fn(Vec<Value>) -> RunResult<Value>),
}

impl RecordShape<'_> {
    fn func_name(&self) -> &'static str {
        match self {
            Self::Dict(_) => "asdict",
            Self::Tuple(_) => "astuple",
        }
    }

    fn recursion_context(&self) -> &'static str {
        match self {
            Self::Dict(_) => "in asdict()",
            Self::Tuple(_) => "in astuple()",
        }
    }

    fn build(&self, pairs: Vec<(String, Value)>) -> RunResult<Value> {
        match self {
            Self::Dict(factory) => factory(pairs),
            Self::Tuple(factory) => factory(pairs.into_iter().map(|(_, value)| value).collect()),
        }
    }
}

fn convert(value: &Value, shape: &RecordShape<'_>) -> RunResult<Value> {
    let _depth = DataDepthGuard::enter(shape.recursion_context())?;
    match value {
        Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => Ok(value.clone()),
        Value::Instance(inst) => {
            let Some(registry) = lookup_registry(inst.class()) else {
                return Err(cannot_convert(value, shape));
            };
            let mut pairs = Vec::with_capacity(registry.len());
            for field in registry.fields() {
                let item = value.get_attr(field.name())?;
                pairs.push((field.name().to_owned(), convert(&item, shape)?));
            }
            shape.build(pairs)
        }
        Value::List(items) => {
            // snapshot, conversion may call back into host code
            let items = items.borrow().clone();
            let converted = items
                .iter()
                .map(|item| convert(item, shape))
                .collect::<RunResult<Vec<_>>>()?;
            Ok(Value::list(converted))
        }
        Value::Tuple(items) => {
            let converted = items
                .iter()
                .map(|item| convert(item, shape))
                .collect::<RunResult<Vec<_>>>()?;
            Ok(Value::tuple(converted))
        }
        Value::Dict(dict) => {
            let pairs: Vec<(Value, Value)> = dict.borrow().iter().cloned().collect();
            let mut converted = Vec::with_capacity(pairs.len());
            for (key, item) in &pairs {
                converted.push((convert(key, shape)?, convert(item, shape)?));
            }
            Value::dict(converted)
        }
        other => Err(cannot_convert(other, shape)),
    }
}

fn cannot_convert(value: &Value, shape: &RecordShape<'_>) -> RunError {
    ExcType::type_error(format!(
        "{}() cannot convert value of type '{}'",
        shape.func_name(),
        value.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decorator::dataclass, field::field, types::ClassObject};

    fn leaf() -> Value {
        let cls = ClassObject::builder("Leaf").attr("v", field()).build().unwrap();
        Value::Class(dataclass(&cls).unwrap())
    }

    #[test]
    fn plain_values_are_not_records() {
        assert!(!is_dataclass(&Value::Int(1)));
        assert!(!is_record(&Value::None));
        let plain = ClassObject::builder("Plain").build().unwrap();
        assert!(!is_dataclass(&Value::Class(plain)));
    }

    #[test]
    fn depth_limit_stops_self_referencing_list() {
        let cls = leaf();
        let items = Value::list(Vec::new());
        if let Value::List(inner) = &items {
            inner.borrow_mut().push(items.clone());
        }
        let record = cls.call(ArgValues::kwargs([("v", items.clone())])).unwrap();
        let err = asdict(&record).unwrap_err();
        assert!(err.is(ExcType::RecursionError), "{err}");
        // break the cycle so the test does not leak
        if let Value::List(inner) = &items {
            inner.borrow_mut().clear();
        }
    }
}
