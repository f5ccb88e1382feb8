use std::{
    borrow::Cow,
    cell::RefCell,
    cmp::Ordering,
    fmt::{self, Write},
    rc::Rc,
};

use ahash::AHashSet;

use crate::{
    args::ArgValues,
    exception::{ExcType, RunResult},
    field::FieldSpec,
    py_hash,
    resource::DataDepthGuard,
    transform_spec::FieldRegistry,
    types::{ClassObject, Dict, Function, Instance, Property},
};

/// A value in the host object model.
///
/// Scalars are stored inline; containers and objects are reference counted so
/// that cloning a `Value` aliases the same object, the way assignment does in
/// Python. Identity (`is`) is pointer identity of the shared allocation.
///
/// The model is single-threaded: `Value` is `!Send` because of `Rc`/`RefCell`.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Self>>>),
    Tuple(Rc<[Self]>),
    Dict(Rc<RefCell<Dict>>),
    Instance(Rc<Instance>),
    Class(Rc<ClassObject>),
    Function(Rc<Function>),
    Property(Rc<Property>),
    /// A `field(...)` marker placed in a class body, or a resolved field.
    Field(Rc<FieldSpec>),
    /// The installed field registry of a record class (`__dataclass_fields__`).
    Registry(Rc<FieldRegistry>),
    /// Returned by binary dunder methods to defer to the reflected operation.
    NotImplemented,
    /// The `MISSING` sentinel: "no value supplied". Equal only to itself.
    Missing,
}

/// Rich comparison operator used for ordering dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn dunder(self) -> &'static str {
        match self {
            Self::Lt => "__lt__",
            Self::Le => "__le__",
            Self::Gt => "__gt__",
            Self::Ge => "__ge__",
        }
    }

    /// The operator tried on the right operand when the left one returns `NotImplemented`.
    pub fn reflected(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }
}

impl Value {
    /// Creates a new list value.
    #[must_use]
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    /// Creates a new tuple value.
    #[must_use]
    pub fn tuple(items: Vec<Self>) -> Self {
        Self::Tuple(items.into())
    }

    /// Creates a new dict value; fails if a key is unhashable.
    pub fn dict(pairs: impl IntoIterator<Item = (Self, Self)>) -> RunResult<Self> {
        Ok(Self::Dict(Rc::new(RefCell::new(Dict::from_pairs(pairs)?))))
    }

    /// Wraps a native closure as a callable function value.
    #[must_use]
    pub fn function(name: impl Into<String>, body: impl Fn(ArgValues) -> RunResult<Self> + 'static) -> Self {
        Self::Function(Rc::new(Function::new(name, body)))
    }

    /// Wraps a zero-argument producer, suitable for `default_factory`.
    #[must_use]
    pub fn factory(name: impl Into<String>, produce: impl Fn() -> RunResult<Self> + 'static) -> Self {
        let name = name.into();
        let fn_name = name.clone();
        Self::function(name, move |args: ArgValues| {
            args.check_zero_args(&fn_name)?;
            produce()
        })
    }

    /// The builtin `list` type used as a factory: returns a fresh empty list per call.
    #[must_use]
    pub fn builtin_list() -> Self {
        Self::factory("list", || Ok(Self::list(Vec::new())))
    }

    /// The builtin `dict` type used as a factory: returns a fresh empty dict per call.
    #[must_use]
    pub fn builtin_dict() -> Self {
        Self::factory("dict", || Ok(Self::Dict(Rc::new(RefCell::new(Dict::new())))))
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    #[must_use]
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented)
    }

    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Class(_))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_instance(&self) -> Option<&Rc<Instance>> {
        match self {
            Self::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_class(&self) -> Option<&Rc<ClassObject>> {
        match self {
            Self::Class(cls) => Some(cls),
            _ => None,
        }
    }

    /// Returns a snapshot of the list items, or `None` if this is not a list.
    #[must_use]
    pub fn list_items(&self) -> Option<Vec<Self>> {
        match self {
            Self::List(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }

    /// Address of the shared allocation, for identity checks and identity hashing.
    pub(crate) fn addr(&self) -> Option<usize> {
        let ptr = match self {
            Self::Str(s) => Rc::as_ptr(s).cast::<()>(),
            Self::List(l) => Rc::as_ptr(l).cast::<()>(),
            Self::Tuple(t) => Rc::as_ptr(t).cast::<()>(),
            Self::Dict(d) => Rc::as_ptr(d).cast::<()>(),
            Self::Instance(i) => Rc::as_ptr(i).cast::<()>(),
            Self::Class(c) => Rc::as_ptr(c).cast::<()>(),
            Self::Function(f) => Rc::as_ptr(f).cast::<()>(),
            Self::Property(p) => Rc::as_ptr(p).cast::<()>(),
            Self::Field(f) => Rc::as_ptr(f).cast::<()>(),
            Self::Registry(r) => Rc::as_ptr(r).cast::<()>(),
            _ => return None,
        };
        Some(ptr as usize)
    }

    /// Identity comparison, Python's `is`.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) | (Self::Missing, Self::Missing) | (Self::NotImplemented, Self::NotImplemented) => {
                true
            }
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => match (self.addr(), other.addr()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Name of the value's type as Python reports it in error messages.
    #[must_use]
    pub fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Instance(inst) => return Cow::Borrowed(inst.class().name()),
            Self::Class(_) => "type",
            Self::Function(_) => "function",
            Self::Property(_) => "property",
            Self::Field(_) => "Field",
            Self::Registry(_) => "FieldRegistry",
            Self::NotImplemented => "NotImplementedType",
            Self::Missing => "_MISSING_TYPE",
        })
    }

    /// Python truthiness.
    #[must_use]
    pub fn py_bool(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.borrow().is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::Dict(dict) => !dict.borrow().is_empty(),
            _ => true,
        }
    }

    /// Calls the value with the given arguments.
    pub fn call(&self, args: ArgValues) -> RunResult<Self> {
        match self {
            Self::Function(f) => f.call(args),
            Self::Class(cls) => ClassObject::instantiate(cls, args),
            other => Err(ExcType::type_error_not_callable(other.type_name())),
        }
    }

    /// Looks up `name` on the value's class and calls it with the value as receiver.
    ///
    /// Falls back to a callable stored directly on the instance, called without a receiver.
    pub fn call_method(&self, name: &str, args: ArgValues) -> RunResult<Self> {
        match self {
            Self::Instance(inst) => match inst.class().mro_lookup_attr(name) {
                Some(method @ Self::Function(_)) => method.call(args.with_receiver(self.clone())),
                Some(_) | None => Instance::get_attr(inst, name)?.call(args),
            },
            other => other.get_attr(name)?.call(args),
        }
    }

    /// Reads an attribute, honoring properties declared on the class.
    pub fn get_attr(&self, name: &str) -> RunResult<Self> {
        match self {
            Self::Instance(inst) => Instance::get_attr(inst, name),
            Self::Class(cls) => cls.get_attr(name),
            other => Err(ExcType::attribute_error(other.type_name(), name)),
        }
    }

    /// Writes an attribute, honoring properties declared on the class.
    pub fn set_attr(&self, name: &str, value: Self) -> RunResult<()> {
        match self {
            Self::Instance(inst) => Instance::set_attr(inst, name, value),
            Self::Class(cls) => {
                cls.set_attr(name, value);
                Ok(())
            }
            other => Err(ExcType::attribute_error(other.type_name(), name)),
        }
    }

    /// Deletes an attribute, honoring properties declared on the class.
    pub fn del_attr(&self, name: &str) -> RunResult<()> {
        match self {
            Self::Instance(inst) => Instance::del_attr(inst, name),
            Self::Class(cls) => cls.del_attr(name),
            other => Err(ExcType::attribute_error(other.type_name(), name)),
        }
    }

    /// Python `repr()`, dispatching to `__repr__` for instances.
    pub fn py_repr(&self) -> RunResult<String> {
        let mut out = String::new();
        self.py_repr_fmt(&mut out)?;
        Ok(out)
    }

    fn py_repr_fmt(&self, out: &mut String) -> RunResult<()> {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(i) => push_fmt(out, format_args!("{i}")),
            Self::Float(f) => out.push_str(&float_repr(*f)),
            Self::Str(s) => out.push_str(&string_repr(s)),
            Self::List(items) => {
                let Some(_active) = ReprGuard::enter(self.addr().unwrap_or(0)) else {
                    out.push_str("[...]");
                    return Ok(());
                };
                let _depth = DataDepthGuard::enter(REPR_CONTEXT)?;
                let items = items.borrow().clone();
                out.push('[');
                repr_sequence(&items, out)?;
                out.push(']');
            }
            Self::Tuple(items) => {
                let _depth = DataDepthGuard::enter(REPR_CONTEXT)?;
                out.push('(');
                repr_sequence(items, out)?;
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::Dict(dict) => {
                let Some(_active) = ReprGuard::enter(self.addr().unwrap_or(0)) else {
                    out.push_str("{...}");
                    return Ok(());
                };
                let _depth = DataDepthGuard::enter(REPR_CONTEXT)?;
                let pairs: Vec<(Self, Self)> = dict.borrow().iter().cloned().collect();
                out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.py_repr_fmt(out)?;
                    out.push_str(": ");
                    v.py_repr_fmt(out)?;
                }
                out.push('}');
            }
            Self::Instance(inst) => match inst.class().mro_lookup_attr("__repr__") {
                Some(method) if method.is_callable() => {
                    let _depth = DataDepthGuard::enter(REPR_CONTEXT)?;
                    match method.call(ArgValues::One(self.clone()))? {
                        Self::Str(s) => out.push_str(&s),
                        other => {
                            return Err(ExcType::type_error(format!(
                                "__repr__ returned non-string (type {})",
                                other.type_name()
                            )));
                        }
                    }
                }
                _ => push_fmt(
                    out,
                    format_args!("<{} object at {:#x}>", inst.class().name(), self.addr().unwrap_or(0)),
                ),
            },
            Self::Class(cls) => push_fmt(out, format_args!("<class '{}'>", cls.name())),
            Self::Function(f) => push_fmt(out, format_args!("<function {}>", f.name())),
            Self::Property(_) => out.push_str("<property object>"),
            Self::Field(field) => out.push_str(&field.py_repr()?),
            Self::Registry(registry) => {
                out.push('{');
                for (i, field) in registry.fields().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&string_repr(field.name()));
                    out.push_str(": ");
                    out.push_str(&field.py_repr()?);
                }
                out.push('}');
            }
            Self::NotImplemented => out.push_str("NotImplemented"),
            Self::Missing => out.push_str("MISSING"),
        }
        Ok(())
    }

    /// Python `==`.
    ///
    /// Instances dispatch to `__eq__`, then the reflected `__eq__` of the other
    /// operand, then fall back to identity.
    pub fn py_eq(&self, other: &Self) -> RunResult<bool> {
        if matches!(self, Self::Instance(_)) || matches!(other, Self::Instance(_)) {
            let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
            return instance_eq(self, other);
        }
        if let (Some(a), Some(b)) = (Number::of(self), Number::of(other)) {
            return Ok(a.partial_cmp(b) == Some(Ordering::Equal));
        }
        Ok(match (self, other) {
            (Self::None, Self::None)
            | (Self::Missing, Self::Missing)
            | (Self::NotImplemented, Self::NotImplemented) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                sequence_eq(&a, &b)?
            }
            (Self::Tuple(a), Self::Tuple(b)) => {
                let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
                sequence_eq(a, b)?
            }
            (Self::Dict(a), Self::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
                let a = a.borrow().clone();
                let b = b.borrow().clone();
                a.py_eq(&b)?
            }
            (Self::Field(a), Self::Field(b)) => a == b,
            _ => self.is(other),
        })
    }

    /// Python `!=`, the negation of [`Value::py_eq`].
    pub fn py_ne(&self, other: &Self) -> RunResult<bool> {
        Ok(!self.py_eq(other)?)
    }

    pub fn py_lt(&self, other: &Self) -> RunResult<bool> {
        self.py_cmp(CmpOp::Lt, other)
    }

    pub fn py_le(&self, other: &Self) -> RunResult<bool> {
        self.py_cmp(CmpOp::Le, other)
    }

    pub fn py_gt(&self, other: &Self) -> RunResult<bool> {
        self.py_cmp(CmpOp::Gt, other)
    }

    pub fn py_ge(&self, other: &Self) -> RunResult<bool> {
        self.py_cmp(CmpOp::Ge, other)
    }

    /// Ordering comparison with reflected-operand fallback.
    pub(crate) fn py_cmp(&self, op: CmpOp, other: &Self) -> RunResult<bool> {
        if matches!(self, Self::Instance(_)) || matches!(other, Self::Instance(_)) {
            let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
            if let Some(result) = call_binary_dunder(self, op.dunder(), other)?
                && !result.is_not_implemented()
            {
                return Ok(result.py_bool());
            }
            if let Some(result) = call_binary_dunder(other, op.reflected().dunder(), self)?
                && !result.is_not_implemented()
            {
                return Ok(result.py_bool());
            }
            return Err(ExcType::type_error_compare(op.symbol(), self.type_name(), other.type_name()));
        }
        if let (Some(a), Some(b)) = (Number::of(self), Number::of(other)) {
            return Ok(a.partial_cmp(b).is_some_and(|ord| op.matches(ord)));
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(op.matches(a.cmp(b))),
            (Self::List(a), Self::List(b)) => {
                let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                compare_sequences(&a, &b, op)
            }
            (Self::Tuple(a), Self::Tuple(b)) => {
                let _depth = DataDepthGuard::enter(COMPARE_CONTEXT)?;
                compare_sequences(a, b, op)
            }
            _ => Err(ExcType::type_error_compare(op.symbol(), self.type_name(), other.type_name())),
        }
    }

    /// Python `hash()`.
    ///
    /// Instances dispatch to `__hash__`; a class attribute `__hash__ = None`
    /// marks instances as unhashable. Without `__hash__`, instances hash by identity.
    pub fn py_hash(&self) -> RunResult<i64> {
        match self {
            Self::None => Ok(py_hash::NONE_HASH),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Int(i) => Ok(py_hash::hash_int(*i)),
            Self::Float(f) => Ok(py_hash::hash_float(*f)),
            Self::Str(s) => Ok(py_hash::hash_str(s)),
            Self::Tuple(items) => {
                let _depth = DataDepthGuard::enter(HASH_CONTEXT)?;
                let lanes = items.iter().map(Self::py_hash).collect::<RunResult<Vec<_>>>()?;
                Ok(py_hash::hash_tuple(&lanes))
            }
            Self::List(_) | Self::Dict(_) => Err(ExcType::type_error_unhashable(self.type_name())),
            Self::Field(field) => Ok(py_hash::hash_str(field.name())),
            Self::Missing => Ok(py_hash::hash_str("MISSING")),
            Self::NotImplemented => Ok(py_hash::hash_str("NotImplemented")),
            Self::Instance(inst) => match inst.class().mro_lookup_attr("__hash__") {
                Some(Self::None) => Err(ExcType::type_error_unhashable(self.type_name())),
                Some(method) if method.is_callable() => {
                    let _depth = DataDepthGuard::enter(HASH_CONTEXT)?;
                    match method.call(ArgValues::One(self.clone()))? {
                        // results that fit a machine word are used as is; -1 is reserved
                        Self::Int(-1) => Ok(-2),
                        Self::Int(h) => Ok(h),
                        Self::Bool(b) => Ok(i64::from(b)),
                        _ => Err(ExcType::type_error("__hash__ method should return an integer")),
                    }
                }
                _ => Ok(py_hash::hash_pointer(self.addr().unwrap_or(0))),
            },
            Self::Class(_) | Self::Function(_) | Self::Property(_) | Self::Registry(_) => {
                Ok(py_hash::hash_pointer(self.addr().unwrap_or(0)))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<FieldSpec> for Value {
    fn from(value: FieldSpec) -> Self {
        Self::Field(Rc::new(value))
    }
}

impl From<Rc<ClassObject>> for Value {
    fn from(value: Rc<ClassObject>) -> Self {
        Self::Class(value)
    }
}

impl From<Property> for Value {
    fn from(value: Property) -> Self {
        Self::Property(Rc::new(value))
    }
}

/// Numeric view used for cross-type comparison of bool, int and float.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Int(i64::from(*b))),
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Float(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn partial_cmp(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (Self::Int(a), Self::Float(b)) => (a as f64).partial_cmp(&b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(&b),
        }
    }
}

const REPR_CONTEXT: &str = "while getting the repr of an object";
const COMPARE_CONTEXT: &str = "in comparison";
const HASH_CONTEXT: &str = "while hashing an object";

thread_local! {
    /// Addresses of the containers and records whose repr is running on this thread.
    static REPR_ACTIVE: RefCell<AHashSet<usize>> = RefCell::new(AHashSet::new());
}

/// Marks an object as being repr'd; dropping the guard clears the mark.
pub(crate) struct ReprGuard(usize);

impl ReprGuard {
    /// Returns `None` if `key` is already being repr'd (a reference cycle).
    pub(crate) fn enter(key: usize) -> Option<Self> {
        REPR_ACTIVE.with(|active| active.borrow_mut().insert(key).then(|| Self(key)))
    }
}

impl Drop for ReprGuard {
    fn drop(&mut self) {
        REPR_ACTIVE.with(|active| {
            active.borrow_mut().remove(&self.0);
        });
    }
}

/// Calls `receiver.<dunder>(other)` if the receiver is an instance whose class defines it.
fn call_binary_dunder(receiver: &Value, dunder: &str, other: &Value) -> RunResult<Option<Value>> {
    let Value::Instance(inst) = receiver else {
        return Ok(None);
    };
    match inst.class().mro_lookup_attr(dunder) {
        Some(method) if method.is_callable() => method
            .call(ArgValues::Two(receiver.clone(), other.clone()))
            .map(Some),
        _ => Ok(None),
    }
}

fn instance_eq(lhs: &Value, rhs: &Value) -> RunResult<bool> {
    if let Some(result) = call_binary_dunder(lhs, "__eq__", rhs)?
        && !result.is_not_implemented()
    {
        return Ok(result.py_bool());
    }
    if let Some(result) = call_binary_dunder(rhs, "__eq__", lhs)?
        && !result.is_not_implemented()
    {
        return Ok(result.py_bool());
    }
    Ok(lhs.is(rhs))
}

/// Element-wise equality; identical elements compare equal without calling `__eq__`.
pub(crate) fn sequence_eq(a: &[Value], b: &[Value]) -> RunResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !(x.is(y) || x.py_eq(y)?) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Lexicographic sequence comparison, the way Python compares tuples.
///
/// The first pair of elements that are not equal decides the result; when one
/// sequence is a prefix of the other, the lengths decide.
pub(crate) fn compare_sequences(a: &[Value], b: &[Value], op: CmpOp) -> RunResult<bool> {
    for (x, y) in a.iter().zip(b) {
        if !(x.is(y) || x.py_eq(y)?) {
            return x.py_cmp(op, y);
        }
    }
    Ok(op.matches(a.len().cmp(&b.len())))
}

fn repr_sequence(items: &[Value], out: &mut String) -> RunResult<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.py_repr_fmt(out)?;
    }
    Ok(())
}

fn push_fmt(out: &mut String, args: fmt::Arguments<'_>) {
    // Writing into a String cannot fail.
    let _ = out.write_fmt(args);
}

/// Python `repr()` of a float: shortest round-trip digits, exponent form
/// outside `1e-4 <= |x| < 1e16`.
#[must_use]
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{value:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }
    let mut out = value.to_string();
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

/// Python `repr()` of a string: single quotes unless the text contains a single
/// quote and no double quote.
#[must_use]
pub(crate) fn string_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => push_fmt(&mut out, format_args!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_repr_matches_python() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-2.5), "-2.5");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn string_repr_picks_quotes() {
        assert_eq!(string_repr("abc"), "'abc'");
        assert_eq!(string_repr("it's"), "\"it's\"");
        assert_eq!(string_repr("a'b\"c"), "'a\\'b\"c'");
        assert_eq!(string_repr("line\n"), "'line\\n'");
    }

    #[test]
    fn numeric_equality_crosses_types() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)).unwrap());
        assert!(Value::Bool(true).py_eq(&Value::Int(1)).unwrap());
        assert!(!Value::Float(f64::NAN).py_eq(&Value::Float(f64::NAN)).unwrap());
        assert!(!Value::None.py_eq(&Value::Missing).unwrap());
    }

    #[test]
    fn tuple_ordering_is_lexicographic() {
        let short = Value::tuple(vec![Value::Int(1)]);
        let long = Value::tuple(vec![Value::Int(1), Value::Int(0)]);
        assert!(short.py_lt(&long).unwrap());
        assert!(!long.py_le(&short).unwrap());
        let err = Value::Int(1).py_lt(&Value::from("a")).unwrap_err();
        assert_eq!(err.message(), Some("'<' not supported between instances of 'int' and 'str'"));
    }
}
