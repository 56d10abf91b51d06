//! Concurrent query tests
//!
//! The registry is populated once and then shared as `Arc<TypeRegistry>`.
//! These tests hammer it from rayon workers: interning new instantiations,
//! relationship queries, member lookup and invoker calls must agree with the
//! single-threaded answers.

use rayon::prelude::*;
use rfx_solver::{
    CallShape, CoreLib, DefKind, InvokerFactory, MemberQuery, TypeDatabase, TypeId, TypeRegistry,
    Value, find_members, parse_type, resolve_inherited_generic_instantiation, static_method,
    static_property_or_field, structurally_inherits,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct World {
    registry: Arc<TypeRegistry>,
    core: CoreLib,
    lookup: rfx_solver::DeclaredType,
    counter: rfx_solver::DeclaredType,
}

fn world() -> World {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let registry = TypeRegistry::new().into_shared();
    let core = CoreLib::install(&registry);
    let r = &*registry;

    // ILookup<T> : IDictionary<String, T>
    let lookup = r.declare(DefKind::Interface, "Concurrent", "ILookup", &["T"]);
    let t = lookup.param(0);
    r.define(lookup.def)
        .implements(r.application(core.i_dictionary, &[TypeId::STRING, t]))
        .finish();

    let counter = r.declare(DefKind::Class, "Concurrent", "Counter", &[]);
    r.define(counter.def)
        .static_field("Hits", TypeId::I32, Value::I32(0))
        .method("Square", |m| {
            m.static_member()
                .param("x", TypeId::I64)
                .returns(TypeId::I64)
                .native(|call| {
                    let x = call.args[0].as_i64().unwrap_or_default();
                    Ok(Value::I64(x * x))
                });
        })
        .finish();

    World {
        registry,
        core,
        lookup,
        counter,
    }
}

#[test]
fn test_concurrent_instantiation_deduplication() {
    let w = world();
    let db: &dyn TypeDatabase = &*w.registry;
    let elements = [TypeId::I32, TypeId::STRING, TypeId::F64, TypeId::OBJECT];

    let ids: Vec<TypeId> = (0..1000)
        .into_par_iter()
        .map(|i| w.core.list_of(db, elements[i % elements.len()]))
        .collect();

    for (i, &id) in ids.iter().enumerate() {
        assert_eq!(id, w.core.list_of(db, elements[i % elements.len()]));
    }
}

#[test]
fn test_concurrent_relationship_queries() {
    let w = world();
    let db: &dyn TypeDatabase = &*w.registry;
    let enumerable_def = db.nominal(w.core.i_enumerable_t);

    let mismatches = AtomicUsize::new(0);
    (0..500).into_par_iter().for_each(|i| {
        let element = if i % 2 == 0 { TypeId::I32 } else { TypeId::STRING };
        let dict = w.core.dictionary_of(db, element, TypeId::OBJECT);
        let pairs = db.application(
            w.core.i_enumerable_t,
            &[w.core.pair_of(db, element, TypeId::OBJECT)],
        );
        if !structurally_inherits(db, dict, pairs) || !structurally_inherits(db, dict, enumerable_def)
        {
            mismatches.fetch_add(1, Ordering::Relaxed);
        }
    });
    assert_eq!(mismatches.load(Ordering::Relaxed), 0);
}

#[test]
fn test_concurrent_inherited_instantiation_resolution() {
    let w = world();
    let db: &dyn TypeDatabase = &*w.registry;
    let values = [TypeId::I32, TypeId::BOOL, TypeId::CHAR, TypeId::U64];

    let resolved: Vec<TypeId> = (0..400)
        .into_par_iter()
        .map(|i| {
            let target = db.application(
                w.core.i_dictionary,
                &[TypeId::STRING, values[i % values.len()]],
            );
            resolve_inherited_generic_instantiation(db, w.lookup.ty, target)
                .expect("ILookup<T> resolves against IDictionary<String, T>")
        })
        .collect();

    for (i, &ty) in resolved.iter().enumerate() {
        assert_eq!(ty, db.application(w.lookup.def, &[values[i % values.len()]]));
    }
}

#[test]
fn test_concurrent_member_lookup_and_parsing() {
    let w = world();
    let db: &dyn TypeDatabase = &*w.registry;

    let counts: Vec<usize> = (0..200)
        .into_par_iter()
        .map(|i| {
            let name = if i % 2 == 0 {
                "Dictionary<string, int>"
            } else {
                "Dictionary<int, string>"
            };
            let dict = parse_type(db, name).expect("dictionary type parses");
            find_members(db, dict, &MemberQuery::new("Add"))
                .expect("valid query")
                .len()
        })
        .collect();
    assert!(counts.iter().all(|&n| n == 2));
}

#[test]
fn test_invokers_are_shared_across_threads() {
    let w = world();
    let db: &dyn TypeDatabase = &*w.registry;
    let factory = InvokerFactory::new(Arc::clone(&w.registry));

    let square = static_method(db, w.counter.ty, "Square", None).unwrap();
    let square = factory
        .method(&square, &CallShape::function(&[TypeId::I32], TypeId::I64))
        .unwrap();

    let total: i64 = (0..1000i32)
        .into_par_iter()
        .map(|i| {
            square
                .invoke(&[Value::I32(i)])
                .ok()
                .and_then(|v| v.as_i64())
                .unwrap_or(-1)
        })
        .sum();
    let expected: i64 = (0..1000i64).map(|i| i * i).sum();
    assert_eq!(total, expected);
}

#[test]
fn test_concurrent_static_field_access() {
    let w = world();
    let db: &dyn TypeDatabase = &*w.registry;
    let factory = InvokerFactory::new(Arc::clone(&w.registry));
    let hits = static_property_or_field(db, w.counter.ty, "Hits").unwrap();
    let get = factory.getter(&hits, &CallShape::function(&[], TypeId::I32)).unwrap();
    let set = factory.setter(&hits, &CallShape::action(&[TypeId::I32])).unwrap();

    (0..64).into_par_iter().for_each(|i| {
        set.invoke(&[Value::I32(i)]).expect("static setter");
        let current = get.invoke(&[]).expect("static getter");
        assert!(matches!(current, Value::I32(v) if (0..64).contains(&v)));
    });
}
