// Use codspeed-criterion-compat when running on CodSpeed (CI), real criterion otherwise (for flamegraphs)
use std::rc::Rc;

#[cfg(codspeed)]
use codspeed_criterion_compat::{Criterion, black_box, criterion_group, criterion_main};
#[cfg(not(codspeed))]
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pyrecord::{ArgValues, ClassObject, RecordOptions, Value, asdict, dataclass_with, field, replace};

/// A frozen, ordered record with four fields, one of them built by a factory.
fn order_class() -> Rc<ClassObject> {
    let cls = ClassObject::builder("Order")
        .attr("id", field())
        .attr("customer", field())
        .attr("total", field().default(0.0))
        .attr("lines", field().default_factory(Value::builtin_list()).compare(false))
        .build()
        .unwrap();
    dataclass_with(RecordOptions::default().frozen(true).order(true))
        .apply(&cls)
        .unwrap()
}

fn order(cls: &Rc<ClassObject>, id: i64) -> Value {
    Value::Class(Rc::clone(cls))
        .call(ArgValues::kwargs([
            ("id", Value::Int(id)),
            ("customer", Value::from("ann")),
        ]))
        .unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("transform_class", |b| {
        b.iter(|| black_box(order_class()));
    });

    let cls = order_class();
    c.bench_function("construct", |b| b.iter(|| black_box(order(&cls, 1))));

    let a = order(&cls, 1);
    let other = order(&cls, 2);
    c.bench_function("eq_lt_hash", |b| {
        b.iter(|| {
            let eq = a.py_eq(&other).unwrap();
            let lt = a.py_lt(&other).unwrap();
            black_box((eq, lt, a.py_hash().unwrap()))
        });
    });
    c.bench_function("repr", |b| b.iter(|| black_box(a.py_repr().unwrap())));
    c.bench_function("replace", |b| {
        b.iter(|| black_box(replace(&a, vec![("total".to_owned(), Value::Float(9.5))]).unwrap()));
    });
    c.bench_function("asdict", |b| b.iter(|| black_box(asdict(&a).unwrap())));
}

// Use pprof flamegraph profiler when running locally (not on CodSpeed)
#[cfg(not(codspeed))]
criterion_group!(benches, criterion_benchmark);

// Use default config when running on CodSpeed
#[cfg(codspeed)]
criterion_group!(benches, criterion_benchmark);

criterion_main!(benches);
