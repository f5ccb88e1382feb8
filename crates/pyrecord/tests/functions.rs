//! Tests for the introspection functions: `is_dataclass`, `fields`, `replace`,
//! `asdict` and `astuple`.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use pyrecord::{
    ArgValues, ClassObject, ExcType, MAX_DATA_RECURSION_DEPTH, RecordOptions, RunResult, Value, asdict, asdict_with,
    astuple, astuple_with, dataclass, dataclass_with, field, fields, is_dataclass, is_record, replace,
};

fn new(cls: &Rc<ClassObject>, kwargs: &[(&str, Value)]) -> RunResult<Value> {
    Value::Class(Rc::clone(cls)).call(ArgValues::kwargs(kwargs.iter().cloned()))
}

fn record(name: &str, field_names: &[&str]) -> Rc<ClassObject> {
    let mut builder = ClassObject::builder(name);
    for field_name in field_names {
        builder = builder.attr(*field_name, field());
    }
    dataclass(&builder.build().unwrap()).unwrap()
}

// ============================================================================
// is_dataclass / fields
// ============================================================================

#[test]
fn is_dataclass_accepts_classes_and_instances() {
    let cls = record("Point", &["x"]);
    let p = new(&cls, &[("x", Value::Int(1))]).unwrap();
    assert!(is_dataclass(&Value::Class(Rc::clone(&cls))));
    assert!(is_dataclass(&p));
    assert!(is_record(&p));
    assert!(!is_dataclass(&Value::Int(1)));
}

/// Undecorated subclasses of a record are records too.
#[test]
fn subclass_of_record_is_a_record() {
    let cls = record("Point", &["x"]);
    let sub = ClassObject::builder("Sub").base(&cls).build().unwrap();
    assert!(is_dataclass(&Value::Class(sub)));
}

#[test]
fn fields_are_in_declaration_order() {
    let cls = ClassObject::builder("Item")
        .attr("name", field())
        .attr("price", field().default(0))
        .attr("tags", field().default_factory(Value::builtin_list()).compare(false))
        .build()
        .unwrap();
    let cls = dataclass(&cls).unwrap();
    let specs = fields(&Value::Class(cls)).unwrap();
    let names: Vec<&str> = specs.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["name", "price", "tags"]);
    assert_eq!(specs[1].py_repr().unwrap(), "Field('price', 0)");
    assert!(specs[2].has_default_factory());
    assert!(!specs[2].in_compare());
}

#[test]
fn fields_rejects_non_records() {
    let plain = ClassObject::builder("Plain").build().unwrap();
    for value in [Value::Int(1), Value::Class(plain)] {
        let err = fields(&value).unwrap_err();
        assert!(err.is(ExcType::TypeError));
        assert_eq!(err.message(), Some("must be called with a dataclass type or instance"));
    }
}

#[test]
fn registry_is_stored_on_the_class() {
    let cls = record("Point", &["x", "y"]);
    let registry = cls.own_attr("__dataclass_fields__").unwrap();
    assert_eq!(
        registry.py_repr().unwrap(),
        "{'x': Field('x', MISSING), 'y': Field('y', MISSING)}"
    );
}

// ============================================================================
// replace
// ============================================================================

#[test]
fn replace_changes_only_named_fields() {
    let cls = record("Point", &["x", "y"]);
    let p = new(&cls, &[("x", Value::Int(1)), ("y", Value::Int(2))]).unwrap();
    let q = replace(&p, vec![("y".to_owned(), Value::Int(5))]).unwrap();
    assert_eq!(q.py_repr().unwrap(), "Point(x=1, y=5)");
    assert_eq!(p.py_repr().unwrap(), "Point(x=1, y=2)");
    assert!(!p.is(&q));
}

/// `replace` goes through the constructor, so `__post_init__` runs again and
/// factories produce fresh values for `init=False` fields.
#[test]
fn replace_calls_the_constructor() {
    let cls = ClassObject::builder("Stamped")
        .attr("value", field())
        .attr("log", field().init(false).default_factory(Value::builtin_list()))
        .method("__post_init__", |args| {
            let this = args.get_one_arg("__post_init__")?;
            if let Value::List(log) = this.get_attr("log")? {
                log.borrow_mut().push(this.get_attr("value")?);
            }
            Ok(Value::None)
        })
        .build()
        .unwrap();
    let cls = dataclass(&cls).unwrap();
    let a = new(&cls, &[("value", Value::Int(1))]).unwrap();
    let b = replace(&a, vec![("value".to_owned(), Value::Int(2))]).unwrap();
    assert_eq!(a.get_attr("log").unwrap().py_repr().unwrap(), "[1]");
    assert_eq!(b.get_attr("log").unwrap().py_repr().unwrap(), "[2]");
}

#[test]
fn replace_rejects_unknown_field() {
    let cls = record("Point", &["x"]);
    let p = new(&cls, &[("x", Value::Int(1))]).unwrap();
    let err = replace(&p, vec![("c".to_owned(), Value::Int(1))]).unwrap_err();
    assert!(err.is(ExcType::TypeError));
    assert_eq!(err.message(), Some("__init__() got an unexpected keyword argument 'c'"));
}

/// A field named twice is rejected before anything is constructed.
#[test]
fn replace_rejects_duplicate_field() {
    let cls = record("Point", &["x", "y"]);
    let p = new(&cls, &[("x", Value::Int(1)), ("y", Value::Int(2))]).unwrap();
    let err = replace(
        &p,
        vec![("y".to_owned(), Value::Int(5)), ("y".to_owned(), Value::Int(6))],
    )
    .unwrap_err();
    assert!(err.is(ExcType::TypeError));
    assert_eq!(
        err.message(),
        Some("__init__() got multiple values for keyword argument 'y'")
    );
}

/// Naming an `init=False` field is a different, distinguishable error.
#[test]
fn replace_rejects_init_false_field() {
    let cls = ClassObject::builder("Cached")
        .attr("a", field())
        .attr("b", field().init(false).default(0))
        .build()
        .unwrap();
    let cls = dataclass(&cls).unwrap();
    let obj = new(&cls, &[("a", Value::Int(1))]).unwrap();
    let err = replace(&obj, vec![("b".to_owned(), Value::Int(1))]).unwrap_err();
    assert!(err.is(ExcType::ValueError));
    assert_eq!(
        err.message(),
        Some("field b is declared with init=False, it cannot be specified with replace()")
    );
}

#[test]
fn replace_requires_an_instance() {
    let cls = record("Point", &["x"]);
    let err = replace(&Value::Class(cls), Vec::new()).unwrap_err();
    assert_eq!(err.message(), Some("replace() should be called on dataclass instances"));
}

/// Frozen records can still be "modified" through `replace`.
#[test]
fn replace_works_on_frozen_records() {
    let cls = ClassObject::builder("Frozen").attr("a", field()).build().unwrap();
    let cls = dataclass_with(RecordOptions::default().frozen(true)).apply(&cls).unwrap();
    let a = new(&cls, &[("a", Value::Int(1))]).unwrap();
    let b = replace(&a, vec![("a".to_owned(), Value::Int(2))]).unwrap();
    assert_eq!(b.get_attr("a").unwrap().as_int(), Some(2));
}

// ============================================================================
// asdict / astuple
// ============================================================================

/// A record holding a list of two child records converts into a list of two dicts.
#[test]
fn asdict_converts_nested_records() {
    let child = record("Child", &["name"]);
    let parent = record("Parent", &["kids", "pair", "meta"]);
    let kid = |name: &str| new(&child, &[("name", Value::from(name))]).unwrap();
    let p = new(
        &parent,
        &[
            ("kids", Value::list(vec![kid("a"), kid("b")])),
            ("pair", Value::tuple(vec![kid("c"), Value::Int(1)])),
            ("meta", Value::dict([(Value::from("k"), kid("d"))]).unwrap()),
        ],
    )
    .unwrap();

    let converted = asdict(&p).unwrap();
    assert_eq!(
        converted.py_repr().unwrap(),
        "{'kids': [{'name': 'a'}, {'name': 'b'}], 'pair': ({'name': 'c'}, 1), 'meta': {'k': {'name': 'd'}}}"
    );
    assert!(matches!(converted, Value::Dict(_)));
}

/// The converted containers are new objects, not the record's own.
#[test]
fn asdict_copies_containers() {
    let cls = record("Bag", &["items"]);
    let items = Value::list(vec![Value::Int(1)]);
    let bag = new(&cls, &[("items", items.clone())]).unwrap();
    let Value::Dict(converted) = asdict(&bag).unwrap() else {
        panic!("expected a dict");
    };
    let copied = converted.borrow().get(&Value::from("items")).unwrap().unwrap();
    assert!(copied.py_eq(&items).unwrap());
    assert!(!copied.is(&items));
}

#[test]
fn asdict_with_custom_factory() {
    let cls = record("Point", &["x", "y"]);
    let p = new(&cls, &[("x", Value::Int(1)), ("y", Value::Int(2))]).unwrap();
    let pairs = asdict_with(&p, |pairs| {
        Ok(Value::list(
            pairs
                .into_iter()
                .map(|(name, value)| Value::tuple(vec![Value::from(name), value]))
                .collect(),
        ))
    })
    .unwrap();
    assert_eq!(pairs.py_repr().unwrap(), "[('x', 1), ('y', 2)]");
}

#[test]
fn asdict_rejects_non_records_and_unknown_values() {
    let err = asdict(&Value::Int(1)).unwrap_err();
    assert!(err.is(ExcType::TypeError));
    assert_eq!(err.message(), Some("asdict() should be called on dataclass instances"));

    let cls = record("Holder", &["value"]);
    let holder = new(&cls, &[("value", Value::function("f", |_| Ok(Value::None)))]).unwrap();
    let err = asdict(&holder).unwrap_err();
    assert_eq!(err.message(), Some("asdict() cannot convert value of type 'function'"));
}

#[test]
fn asdict_stops_at_recursion_limit() {
    let cls = record("Deep", &["value"]);
    let mut nested = Value::Int(0);
    for _ in 0..=MAX_DATA_RECURSION_DEPTH {
        nested = Value::list(vec![nested]);
    }
    let deep = new(&cls, &[("value", nested)]).unwrap();
    let err = asdict(&deep).unwrap_err();
    assert!(err.is(ExcType::RecursionError));
    assert!(err.is(ExcType::RuntimeError));
    assert_eq!(err.message(), Some("maximum recursion depth exceeded in asdict()"));

    let shallow = new(&cls, &[("value", Value::list(vec![Value::list(Vec::new())]))]).unwrap();
    assert!(asdict(&shallow).is_ok());
}

#[test]
fn astuple_converts_nested_records() {
    let child = record("Child", &["name"]);
    let parent = record("Parent", &["id", "kids"]);
    let kid = new(&child, &[("name", Value::from("a"))]).unwrap();
    let p = new(
        &parent,
        &[("id", Value::Int(7)), ("kids", Value::list(vec![kid]))],
    )
    .unwrap();
    assert_eq!(astuple(&p).unwrap().py_repr().unwrap(), "(7, [('a',)])");
    let err = astuple(&Value::None).unwrap_err();
    assert_eq!(err.message(), Some("astuple() should be called on dataclass instances"));
}

#[test]
fn astuple_with_custom_factory() {
    let cls = record("Point", &["x", "y"]);
    let p = new(&cls, &[("x", Value::Int(1)), ("y", Value::Int(2))]).unwrap();
    let as_list = astuple_with(&p, |values| Ok(Value::list(values))).unwrap();
    assert_eq!(as_list.py_repr().unwrap(), "[1, 2]");
}
