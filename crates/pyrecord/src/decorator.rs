use std::rc::Rc;

use crate::{
    args::{ArgValues, KwargsValues},
    exception::{ExcType, RunResult},
    install,
    options::RecordOptions,
    synthesize,
    tracer::{NoopTracer, TransformTracer},
    transform_spec::TransformSpec,
    types::ClassObject,
    value::Value,
};

/// A configured record transform, reusable across classes.
///
/// ```ignore
/// let frozen = dataclass_with(RecordOptions::default().frozen(true));
/// let point = frozen.apply(&point_cls)?;
/// let pair = frozen.apply(&pair_cls)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataclass {
    options: RecordOptions,
}

impl Dataclass {
    #[must_use]
    pub fn new(options: RecordOptions) -> Self {
        Self { options }
    }

    /// Builds a transform from `dataclass(...)` keyword arguments.
    pub fn from_kwargs(kwargs: KwargsValues) -> RunResult<Self> {
        RecordOptions::from_kwargs(kwargs).map(Self::new)
    }

    #[must_use]
    pub fn options(&self) -> &RecordOptions {
        &self.options
    }

    /// Transforms `cls` in place and returns it.
    pub fn apply(&self, cls: &Rc<ClassObject>) -> RunResult<Rc<ClassObject>> {
        self.apply_traced(cls, &mut NoopTracer)
    }

    /// Like [`Dataclass::apply`], reporting every transform step to `tracer`.
    ///
    /// Nothing is written to the class unless collection and validation succeed.
    pub fn apply_traced<Tr: TransformTracer>(&self, cls: &Rc<ClassObject>, tracer: &mut Tr) -> RunResult<Rc<ClassObject>> {
        let spec = TransformSpec::new(cls, &self.options, tracer)?;
        let methods = synthesize::methods(&spec);
        install::install(cls, spec, methods, tracer);
        Ok(Rc::clone(cls))
    }

    /// The transform as a host callable taking one class and returning it.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::function("dataclass", move |args: ArgValues| {
            let target = args.get_one_arg("dataclass")?;
            match target {
                Value::Class(cls) => Ok(Value::Class(self.apply(&cls)?)),
                other => Err(ExcType::type_error(format!(
                    "dataclass() should be called on a class, not '{}'",
                    other.type_name()
                ))),
            }
        })
    }
}

/// Transforms `cls` with the default options, like a bare `@dataclass`.
pub fn dataclass(cls: &Rc<ClassObject>) -> RunResult<Rc<ClassObject>> {
    Dataclass::default().apply(cls)
}

/// A transform with explicit options, like `@dataclass(frozen=True, ...)`.
#[must_use]
pub fn dataclass_with(options: RecordOptions) -> Dataclass {
    Dataclass::new(options)
}
