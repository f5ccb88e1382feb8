#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "hash arithmetic narrows deliberately")]
#![expect(clippy::cast_sign_loss, reason = "sign-changing casts are intentional")]
#![expect(clippy::cast_possible_wrap, reason = "wrap behavior mirrors CPython")]

mod args;
mod decorator;
mod exception;
mod field;
mod functions;
mod install;
mod options;
mod py_hash;
mod resource;
mod synthesize;
pub mod tracer;
mod transform_spec;
pub mod types;
mod value;

pub use crate::{
    args::{ArgValues, KwargsValues},
    decorator::{Dataclass, dataclass, dataclass_with},
    exception::{ExcType, RunError, RunResult, SimpleException},
    field::{FieldSpec, UNSET_NAME, field, field_from_kwargs},
    functions::{asdict, asdict_with, astuple, astuple_with, fields, is_dataclass, is_record, replace},
    install::install,
    options::{FieldOrder, RecordOptions},
    resource::MAX_DATA_RECURSION_DEPTH,
    synthesize::methods as synthesize_methods,
    tracer::{NoopTracer, RecordingTracer, StderrTracer, TraceEvent, TransformTracer},
    transform_spec::{FIELDS_ATTR, FieldRegistry, HashMode, TransformSpec, lookup_registry},
    types::{ClassBuilder, ClassObject, Dict, Function, Instance, Property},
    value::Value,
};
