use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    args::ArgValues,
    exception::{ExcType, RunResult, SimpleException},
    value::Value,
};

/// Maximum length of a computed MRO.
const MAX_MRO_LENGTH: usize = 256;

/// A class object: a name, its bases and an ordered namespace.
///
/// The namespace keeps insertion order, which is the declaration order of the
/// class body. Record field collection depends on that order.
///
/// When called (instantiated), creates an `Instance` with an empty attribute
/// map, then calls `__init__` if one resolves through the MRO.
pub struct ClassObject {
    /// The class name (e.g., "Point").
    name: String,
    /// Direct base classes, in declaration order.
    bases: Vec<Rc<Self>>,
    /// C3 linearization of the bases. Does NOT include this class itself, so
    /// the class never holds a strong reference to itself.
    mro_tail: Vec<Rc<Self>>,
    /// Class attributes and methods in declaration order.
    namespace: RefCell<IndexMap<String, Value>>,
}

impl ClassObject {
    /// Creates a class with the given bases, computing its MRO.
    ///
    /// Fails with `TypeError` when the bases admit no consistent linearization.
    pub fn new(name: impl Into<String>, bases: Vec<Rc<Self>>) -> RunResult<Rc<Self>> {
        let name = name.into();
        let mro_tail = compute_c3_mro(&name, &bases)?;
        Ok(Rc::new(Self {
            name,
            bases,
            mro_tail,
            namespace: RefCell::new(IndexMap::new()),
        }))
    }

    /// Starts building a class body.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bases(&self) -> &[Rc<Self>] {
        &self.bases
    }

    /// Full MRO, starting with this class.
    #[must_use]
    pub fn mro(self: &Rc<Self>) -> Vec<Rc<Self>> {
        let mut mro = Vec::with_capacity(self.mro_tail.len() + 1);
        mro.push(Rc::clone(self));
        mro.extend(self.mro_tail.iter().cloned());
        mro
    }

    /// Returns an attribute defined directly on this class (not inherited).
    #[must_use]
    pub fn own_attr(&self, name: &str) -> Option<Value> {
        self.namespace.borrow().get(name).cloned()
    }

    #[must_use]
    pub fn has_own_attr(&self, name: &str) -> bool {
        self.namespace.borrow().contains_key(name)
    }

    /// Snapshot of the class's own namespace in declaration order.
    #[must_use]
    pub fn own_attrs(&self) -> Vec<(String, Value)> {
        self.namespace
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Looks up an attribute by walking the MRO (this class first, then bases in MRO order).
    #[must_use]
    pub fn mro_lookup_attr(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.own_attr(name) {
            return Some(value);
        }
        self.mro_tail.iter().find_map(|base| base.own_attr(name))
    }

    /// Reads a class attribute, failing with `AttributeError` if nothing resolves.
    pub fn get_attr(&self, name: &str) -> RunResult<Value> {
        self.mro_lookup_attr(name).ok_or_else(|| {
            SimpleException::new_msg(
                ExcType::AttributeError,
                format!("type object '{}' has no attribute '{name}'", self.name),
            )
            .into()
        })
    }

    /// Sets an attribute in this class's namespace. Replacing keeps the original position.
    pub fn set_attr(&self, name: impl Into<String>, value: Value) {
        self.namespace.borrow_mut().insert(name.into(), value);
    }

    /// Removes an attribute from this class's namespace.
    pub fn del_attr(&self, name: &str) -> RunResult<()> {
        match self.namespace.borrow_mut().shift_remove(name) {
            Some(_) => Ok(()),
            None => Err(SimpleException::new_msg(
                ExcType::AttributeError,
                format!("type object '{}' has no attribute '{name}'", self.name),
            )
            .into()),
        }
    }

    /// Checks if this class is `other` or inherits from it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Rc<Self>) -> bool {
        std::ptr::eq(self, Rc::as_ptr(other)) || self.mro_tail.iter().any(|base| Rc::ptr_eq(base, other))
    }

    /// Calls the class: creates an instance and runs `__init__` on it.
    pub(crate) fn instantiate(cls: &Rc<Self>, args: ArgValues) -> RunResult<Value> {
        let instance = Value::Instance(Rc::new(Instance::new(Rc::clone(cls))));
        match cls.mro_lookup_attr("__init__") {
            Some(init) if init.is_callable() => {
                let returned = init.call(args.with_receiver(instance.clone()))?;
                if !returned.is_none() {
                    return Err(ExcType::type_error(format!(
                        "__init__() should return None, not '{}'",
                        returned.type_name()
                    )));
                }
            }
            _ => {
                if !args.is_empty() {
                    return Err(ExcType::type_error(format!("{}() takes no arguments", cls.name)));
                }
            }
        }
        Ok(instance)
    }
}

impl fmt::Debug for ClassObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassObject")
            .field("name", &self.name)
            .field("attrs", &self.namespace.borrow().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builds a class body attribute by attribute, in declaration order.
///
/// ```ignore
/// let point = ClassObject::builder("Point")
///     .attr("x", 0)
///     .attr("y", field().default_factory(Value::builtin_list()))
///     .build()?;
/// ```
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    bases: Vec<Rc<ClassObject>>,
    attrs: Vec<(String, Value)>,
}

impl ClassBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            attrs: Vec::new(),
        }
    }

    /// Adds a base class.
    #[must_use]
    pub fn base(mut self, base: &Rc<ClassObject>) -> Self {
        self.bases.push(Rc::clone(base));
        self
    }

    /// Declares a class attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Declares a method; it receives the instance as its first positional argument.
    #[must_use]
    pub fn method(self, name: &str, body: impl Fn(ArgValues) -> RunResult<Value> + 'static) -> Self {
        self.attr(name, Value::function(name, body))
    }

    pub fn build(self) -> RunResult<Rc<ClassObject>> {
        let cls = ClassObject::new(self.name, self.bases)?;
        for (name, value) in self.attrs {
            cls.set_attr(name, value);
        }
        Ok(cls)
    }
}

/// An instance of a user class.
///
/// Attribute reads and writes go through any `Property` the class declares
/// under that name; otherwise they use the instance's own attribute map. The
/// generated record methods address private slots directly via
/// [`Instance::get_slot`] and [`Instance::set_slot`], bypassing properties.
pub struct Instance {
    class: Rc<ClassObject>,
    attrs: RefCell<IndexMap<String, Value>>,
}

impl Instance {
    #[must_use]
    pub fn new(class: Rc<ClassObject>) -> Self {
        Self {
            class,
            attrs: RefCell::new(IndexMap::new()),
        }
    }

    #[must_use]
    pub fn class(&self) -> &Rc<ClassObject> {
        &self.class
    }

    /// Reads an entry of the attribute map without descriptor dispatch.
    #[must_use]
    pub fn get_slot(&self, name: &str) -> Option<Value> {
        self.attrs.borrow().get(name).cloned()
    }

    /// Writes an entry of the attribute map without descriptor dispatch.
    pub fn set_slot(&self, name: impl Into<String>, value: Value) {
        self.attrs.borrow_mut().insert(name.into(), value);
    }

    /// Removes an entry of the attribute map, returning whether it existed.
    pub fn del_slot(&self, name: &str) -> bool {
        self.attrs.borrow_mut().shift_remove(name).is_some()
    }

    /// Names in the attribute map, in insertion order.
    #[must_use]
    pub fn slot_names(&self) -> Vec<String> {
        self.attrs.borrow().keys().cloned().collect()
    }

    pub(crate) fn get_attr(inst: &Rc<Self>, name: &str) -> RunResult<Value> {
        let class_attr = inst.class.mro_lookup_attr(name);
        if let Some(Value::Property(prop)) = &class_attr {
            return prop.get(Value::Instance(Rc::clone(inst)), name);
        }
        if let Some(value) = inst.get_slot(name) {
            return Ok(value);
        }
        class_attr.ok_or_else(|| ExcType::attribute_error(inst.class.name(), name))
    }

    pub(crate) fn set_attr(inst: &Rc<Self>, name: &str, value: Value) -> RunResult<()> {
        if let Some(Value::Property(prop)) = inst.class.mro_lookup_attr(name) {
            return prop.set(Value::Instance(Rc::clone(inst)), name, value);
        }
        inst.set_slot(name, value);
        Ok(())
    }

    pub(crate) fn del_attr(inst: &Rc<Self>, name: &str) -> RunResult<()> {
        if let Some(Value::Property(prop)) = inst.class.mro_lookup_attr(name) {
            return prop.delete(Value::Instance(Rc::clone(inst)), name);
        }
        if inst.del_slot(name) {
            Ok(())
        } else {
            Err(ExcType::attribute_error(inst.class.name(), name))
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("slots", &self.attrs.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Computes the C3 linearization of `bases`, excluding the class being defined.
///
/// This is the same algorithm used by CPython since Python 2.3.
fn compute_c3_mro(name: &str, bases: &[Rc<ClassObject>]) -> RunResult<Vec<Rc<ClassObject>>> {
    if bases.is_empty() {
        return Ok(Vec::new());
    }

    let mut linearizations: Vec<Vec<Rc<ClassObject>>> = bases
        .iter()
        .map(|base| {
            let mut lin = vec![Rc::clone(base)];
            lin.extend(base.mro_tail.iter().cloned());
            lin
        })
        .collect();
    linearizations.push(bases.to_vec());

    let mut result: Vec<Rc<ClassObject>> = Vec::new();
    loop {
        linearizations.retain(|l| !l.is_empty());
        if linearizations.is_empty() {
            break;
        }

        // A good head does not appear in the tail of any list.
        let next = linearizations
            .iter()
            .map(|lin| &lin[0])
            .find(|candidate| {
                !linearizations
                    .iter()
                    .any(|other| other[1..].iter().any(|c| Rc::ptr_eq(c, candidate)))
            })
            .cloned();

        let Some(next) = next else {
            let base_names: Vec<&str> = bases.iter().map(|b| b.name()).collect();
            return Err(ExcType::type_error(format!(
                "Cannot create a consistent method resolution order (MRO) for bases {}",
                base_names.join(", ")
            )));
        };
        for lin in &mut linearizations {
            if lin.first().is_some_and(|head| Rc::ptr_eq(head, &next)) {
                lin.remove(0);
            }
        }
        result.push(next);

        if result.len() > MAX_MRO_LENGTH {
            return Err(ExcType::type_error(format!("MRO of class {name} exceeds maximum length")));
        }
    }
    Ok(result)
}
