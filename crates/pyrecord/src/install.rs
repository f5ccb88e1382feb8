use std::rc::Rc;

use crate::{
    tracer::TransformTracer,
    transform_spec::{FIELDS_ATTR, FieldRegistry, TransformSpec},
    types::ClassObject,
    value::Value,
};

/// Writes the generated attributes onto `cls` and stores the field registry.
///
/// `methods` is the output of [`crate::synthesize::methods`]; user-defined
/// `__init__`/`__repr__` were already excluded when the policy was resolved.
/// The registry is written last, under [`FIELDS_ATTR`], which is the only
/// marker that makes the class (and its subclasses) a record.
pub fn install<Tr: TransformTracer>(
    cls: &Rc<ClassObject>,
    spec: TransformSpec,
    methods: Vec<(String, Value)>,
    tracer: &mut Tr,
) -> Rc<FieldRegistry> {
    let class_name = spec.class_name().to_owned();
    for (name, value) in methods {
        if name == "__hash__" && value.is_none() {
            tracer.on_hash_suppressed(&class_name);
        }
        tracer.on_method_installed(&class_name, &name);
        cls.set_attr(name, value);
    }

    let registry = Rc::new(FieldRegistry::new(spec));
    cls.set_attr(FIELDS_ATTR, Value::Registry(Rc::clone(&registry)));
    tracer.on_registry_stored(&class_name, registry.len());
    registry
}
