use std::fmt;

use crate::{
    args::ArgValues,
    exception::{ExcType, RunResult},
    value::Value,
};

/// Body of a native function.
pub type NativeFn = dyn Fn(ArgValues) -> RunResult<Value>;

/// A callable implemented in Rust.
///
/// Methods stored in a class namespace receive the instance as their first
/// positional argument, the same calling convention Python uses for plain
/// functions looked up through a class.
pub struct Function {
    name: String,
    body: Box<NativeFn>,
}

impl Function {
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Fn(ArgValues) -> RunResult<Value> + 'static) -> Self {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: ArgValues) -> RunResult<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A data descriptor stored on a class: attribute access on instances is
/// routed through its getter, setter and deleter.
///
/// Each accessor is any callable value. The getter and deleter receive the
/// instance; the setter receives the instance and the new value.
#[derive(Debug, Clone, Default)]
pub struct Property {
    fget: Option<Value>,
    fset: Option<Value>,
    fdel: Option<Value>,
}

impl Property {
    #[must_use]
    pub fn new(fget: Value) -> Self {
        Self {
            fget: Some(fget),
            fset: None,
            fdel: None,
        }
    }

    #[must_use]
    pub fn with_setter(mut self, fset: Value) -> Self {
        self.fset = Some(fset);
        self
    }

    #[must_use]
    pub fn with_deleter(mut self, fdel: Value) -> Self {
        self.fdel = Some(fdel);
        self
    }

    pub(crate) fn get(&self, instance: Value, attr: &str) -> RunResult<Value> {
        match &self.fget {
            Some(fget) => fget.call(ArgValues::One(instance)),
            None => Err(ExcType::attribute_error_read_only(instance.type_name(), attr, "getter")),
        }
    }

    pub(crate) fn set(&self, instance: Value, attr: &str, value: Value) -> RunResult<()> {
        match &self.fset {
            Some(fset) => fset.call(ArgValues::Two(instance, value)).map(drop),
            None => Err(ExcType::attribute_error_read_only(instance.type_name(), attr, "setter")),
        }
    }

    pub(crate) fn delete(&self, instance: Value, attr: &str) -> RunResult<()> {
        match &self.fdel {
            Some(fdel) => fdel.call(ArgValues::One(instance)).map(drop),
            None => Err(ExcType::attribute_error_read_only(instance.type_name(), attr, "deleter")),
        }
    }
}
