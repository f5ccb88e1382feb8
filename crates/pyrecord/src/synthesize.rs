//! Generated record methods.
//!
//! Each generated method is a native closure capturing the part of the
//! resolved field list it needs, so no per-call lookup of the registry is
//! necessary. The closures follow the same calling convention as any method in
//! a class namespace: the instance arrives as the first positional argument.

use std::rc::Rc;

use ahash::AHashMap;

use crate::{
    args::ArgValues,
    exception::{ExcType, RunResult},
    field::FieldSpec,
    py_hash,
    transform_spec::{HashMode, TransformSpec},
    types::{Instance, Property},
    value::{CmpOp, ReprGuard, Value, compare_sequences, sequence_eq},
};

/// Builds every attribute the transform installs, in installation order.
///
/// Per-field properties come first, then `__init__`, `__repr__`, `__eq__`,
/// the ordering methods and `__hash__`, each only when the policy asks for it.
/// A suppressed hash is returned as `("__hash__", Value::None)`.
#[must_use]
pub fn methods(spec: &TransformSpec) -> Vec<(String, Value)> {
    let mut out: Vec<(String, Value)> = spec
        .fields()
        .iter()
        .map(|field| (field.name().to_owned(), field_property(field, spec.frozen())))
        .collect();

    if spec.init() {
        out.push(("__init__".to_owned(), init_method(spec)));
    }
    if spec.repr() {
        out.push(("__repr__".to_owned(), repr_method(spec)));
    }
    if spec.eq() {
        out.push(("__eq__".to_owned(), eq_method(spec)));
    }
    if spec.order() {
        for op in [CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Ge] {
            out.push((op.dunder().to_owned(), order_method(spec, op)));
        }
    }
    match spec.hash_mode() {
        HashMode::Generate => out.push(("__hash__".to_owned(), hash_method(spec))),
        HashMode::Suppress => out.push(("__hash__".to_owned(), Value::None)),
        HashMode::Inherit => {}
    }
    out
}

fn field_names(spec: &TransformSpec, include: impl Fn(&FieldSpec) -> bool) -> Rc<[String]> {
    spec.fields()
        .iter()
        .map(|f| &**f)
        .filter(|f| include(f))
        .map(|f| f.name().to_owned())
        .collect()
}

fn receiver_instance<'a>(receiver: &'a Value, method: &str) -> RunResult<&'a Rc<Instance>> {
    receiver.as_instance().ok_or_else(|| {
        ExcType::type_error(format!(
            "descriptor '{method}' requires an instance, not '{}'",
            receiver.type_name()
        ))
    })
}

/// Reads the public values of `names` from an instance, in order.
fn field_values(receiver: &Value, names: &[String]) -> RunResult<Vec<Value>> {
    names.iter().map(|name| receiver.get_attr(name)).collect()
}

/// Field values of both operands, or `None` when they are not instances of the same class.
fn same_class_values(lhs: &Value, rhs: &Value, names: &[String]) -> RunResult<Option<(Vec<Value>, Vec<Value>)>> {
    match (lhs, rhs) {
        (Value::Instance(a), Value::Instance(b)) if Rc::ptr_eq(a.class(), b.class()) => {
            Ok(Some((field_values(lhs, names)?, field_values(rhs, names)?)))
        }
        _ => Ok(None),
    }
}

// ============================================================================
// __init__
// ============================================================================

/// A field as seen by the constructor: its spec plus its private slot name.
struct InitSlot {
    field: Rc<FieldSpec>,
    storage: String,
}

/// Keyword-only constructor.
///
/// Arguments are fully validated (positional count, unknown names, missing
/// required names) before any default factory runs or any slot is written.
fn init_method(spec: &TransformSpec) -> Value {
    let slots: Rc<[InitSlot]> = spec
        .fields()
        .iter()
        .map(|field| InitSlot {
            field: Rc::clone(field),
            storage: field.storage_name(),
        })
        .collect();
    let post_init = spec.post_init();

    Value::function("__init__", move |args: ArgValues| {
        let (positional, kwargs) = args.into_parts();
        let given = positional.len();
        let mut positional = positional.into_iter();
        let Some(receiver) = positional.next() else {
            return Err(ExcType::type_error(
                "__init__() missing 1 required positional argument: 'self'",
            ));
        };
        if given > 1 {
            return Err(ExcType::type_error_too_many_positional("__init__", 1, given));
        }
        let instance = receiver_instance(&receiver, "__init__")?;

        let mut supplied: AHashMap<String, Value> = AHashMap::with_capacity(kwargs.len());
        for (key, value) in kwargs {
            let accepted = slots.iter().any(|s| s.field.in_init() && s.field.name() == key);
            if !accepted {
                return Err(ExcType::type_error_unexpected_keyword("__init__", &key));
            }
            if supplied.contains_key(&key) {
                return Err(ExcType::type_error_multiple_values("__init__", &key));
            }
            supplied.insert(key, value);
        }

        let missing: Vec<&str> = slots
            .iter()
            .map(|s| &s.field)
            .filter(|f| {
                f.in_init() && !f.has_default() && !f.has_default_factory() && !supplied.contains_key(f.name())
            })
            .map(|f| f.name())
            .collect();
        if !missing.is_empty() {
            return Err(ExcType::type_error_missing_kwonly_with_names("__init__", &missing));
        }

        let mut values: Vec<(&str, Value)> = Vec::with_capacity(slots.len());
        for slot in slots.iter() {
            let value = match supplied.remove(slot.field.name()) {
                Some(value) => Some(value),
                None => slot.field.make_default()?,
            };
            if let Some(value) = value {
                values.push((slot.storage.as_str(), value));
            }
        }
        for (storage, value) in values {
            instance.set_slot(storage, value);
        }

        if post_init {
            receiver.call_method("__post_init__", ArgValues::Empty)?;
        }
        Ok(Value::None)
    })
}

// ============================================================================
// __repr__
// ============================================================================

/// `ClassName(a=1, b='x')` over `repr=true` fields, using the runtime class name.
/// A record reached again while its own repr is running renders as `...`.
fn repr_method(spec: &TransformSpec) -> Value {
    let names = field_names(spec, FieldSpec::in_repr);
    Value::function("__repr__", move |args: ArgValues| {
        let receiver = args.get_one_arg("__repr__")?;
        let instance = receiver_instance(&receiver, "__repr__")?;
        let Some(_guard) = ReprGuard::enter(receiver.addr().unwrap_or(0)) else {
            return Ok(Value::from("..."));
        };
        let mut out = String::from(instance.class().name());
        out.push('(');
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push('=');
            out.push_str(&receiver.get_attr(name)?.py_repr()?);
        }
        out.push(')');
        Ok(Value::from(out))
    })
}

// ============================================================================
// __eq__ and ordering
// ============================================================================

/// Field-tuple equality; an instance always equals itself, even with NaN fields.
fn eq_method(spec: &TransformSpec) -> Value {
    let names = field_names(spec, FieldSpec::in_compare);
    Value::function("__eq__", move |args: ArgValues| {
        let (lhs, rhs) = args.get_two_args("__eq__")?;
        if lhs.is(&rhs) {
            return Ok(Value::Bool(true));
        }
        match same_class_values(&lhs, &rhs, &names)? {
            Some((a, b)) => Ok(Value::Bool(sequence_eq(&a, &b)?)),
            None => Ok(Value::NotImplemented),
        }
    })
}

fn order_method(spec: &TransformSpec, op: CmpOp) -> Value {
    let names = field_names(spec, FieldSpec::in_compare);
    Value::function(op.dunder(), move |args: ArgValues| {
        let (lhs, rhs) = args.get_two_args(op.dunder())?;
        match same_class_values(&lhs, &rhs, &names)? {
            Some((a, b)) => Ok(Value::Bool(compare_sequences(&a, &b, op)?)),
            None => Ok(Value::NotImplemented),
        }
    })
}

// ============================================================================
// __hash__
// ============================================================================

/// Hash of the tuple of hash-participating field values.
fn hash_method(spec: &TransformSpec) -> Value {
    let names = field_names(spec, FieldSpec::contributes_to_hash);
    Value::function("__hash__", move |args: ArgValues| {
        let receiver = args.get_one_arg("__hash__")?;
        let lanes = names
            .iter()
            .map(|name| receiver.get_attr(name)?.py_hash())
            .collect::<RunResult<Vec<_>>>()?;
        Ok(Value::Int(py_hash::hash_tuple(&lanes)))
    })
}

// ============================================================================
// Field properties
// ============================================================================

/// Property routing public access to the field's private slot.
///
/// On frozen records the setter and deleter always raise `FrozenInstanceError`;
/// the generated constructor writes slots directly and is unaffected.
fn field_property(field: &FieldSpec, frozen: bool) -> Value {
    let name: Rc<str> = field.name().into();
    let storage: Rc<str> = field.storage_name().into();

    let getter = {
        let (name, storage) = (Rc::clone(&name), Rc::clone(&storage));
        Value::function(name.to_string(), move |args: ArgValues| {
            let receiver = args.get_one_arg(&name)?;
            let instance = receiver_instance(&receiver, &name)?;
            instance
                .get_slot(&storage)
                .ok_or_else(|| ExcType::attribute_error(instance.class().name(), &name))
        })
    };

    let setter = {
        let (name, storage) = (Rc::clone(&name), Rc::clone(&storage));
        Value::function(name.to_string(), move |args: ArgValues| {
            if frozen {
                return Err(ExcType::frozen_instance_error(&name));
            }
            let (receiver, value) = args.get_two_args(&name)?;
            receiver_instance(&receiver, &name)?.set_slot(&*storage, value);
            Ok(Value::None)
        })
    };

    let deleter = Value::function(name.to_string(), move |args: ArgValues| {
        if frozen {
            return Err(ExcType::frozen_instance_delete_error(&name));
        }
        let receiver = args.get_one_arg(&name)?;
        let instance = receiver_instance(&receiver, &name)?;
        if instance.del_slot(&storage) {
            Ok(Value::None)
        } else {
            Err(ExcType::attribute_error(instance.class().name(), &name))
        }
    });

    Property::new(getter).with_setter(setter).with_deleter(deleter).into()
}
