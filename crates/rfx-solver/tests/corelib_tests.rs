use super::*;
use crate::inheritance::structurally_inherits;
use crate::invoke::InvokerFactory;
use crate::lookup::{MemberQuery, find_member, instance_method, instance_property_or_field, static_property_or_field};
use crate::shape::CallShape;
use std::sync::Arc;

fn installed() -> (Arc<TypeRegistry>, CoreLib) {
    let registry = TypeRegistry::new().into_shared();
    let core = CoreLib::install(&registry);
    (registry, core)
}

#[test]
fn test_definitions_are_findable_by_name() {
    let (registry, core) = installed();
    assert_eq!(registry.find_definition("List", 1), Some(core.list));
    assert_eq!(
        registry.find_definition("System.Collections.Generic.Dictionary", 2),
        Some(core.dictionary)
    );
    assert_eq!(registry.find_definition("IEnumerable", 0), Some(core.i_enumerable));
    assert_eq!(registry.find_definition("IEnumerable", 1), Some(core.i_enumerable_t));
    assert_eq!(registry.find_definition("System.IComparable", 1), Some(core.i_comparable));
    assert_eq!(registry.definitions().get_kind(core.key_value_pair), Some(DefKind::Struct));
}

#[test]
fn test_list_implements_collection_interfaces() {
    let (registry, core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let list = core.list_of(db, TypeId::I32);
    for iface in [
        core.i_list,
        core.i_read_only_list,
        core.i_collection,
        core.i_read_only_collection,
        core.i_enumerable_t,
    ] {
        let closed = db.application(iface, &[TypeId::I32]);
        assert!(structurally_inherits(db, list, closed), "{}", format_type(db, closed));
    }
    assert!(structurally_inherits(db, list, db.nominal(core.i_enumerable)));
    assert!(!structurally_inherits(db, list, db.application(core.i_list, &[TypeId::I64])));
}

#[test]
fn test_dictionary_implements_pair_collections() {
    let (registry, core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let dict = core.dictionary_of(db, TypeId::STRING, TypeId::I32);
    let pair = core.pair_of(db, TypeId::STRING, TypeId::I32);
    assert!(structurally_inherits(
        db,
        dict,
        db.application(core.i_dictionary, &[TypeId::STRING, TypeId::I32])
    ));
    assert!(structurally_inherits(
        db,
        dict,
        db.application(core.i_read_only_dictionary, &[TypeId::STRING, TypeId::I32])
    ));
    assert!(structurally_inherits(db, dict, db.application(core.i_collection, &[pair])));
    assert!(structurally_inherits(db, dict, db.application(core.i_read_only_collection, &[pair])));
    assert!(structurally_inherits(db, dict, db.application(core.i_enumerable_t, &[pair])));
}

#[test]
fn test_builtins_compare_with_themselves() {
    let (registry, core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    for kind in PrimitiveKind::ALL {
        let ty = kind.type_id();
        assert!(structurally_inherits(db, ty, db.application(core.i_comparable, &[ty])));
        assert!(structurally_inherits(db, ty, db.application(core.i_equatable, &[ty])));
    }
    let string_comparable = db.application(core.i_comparable, &[TypeId::STRING]);
    assert!(structurally_inherits(db, TypeId::STRING, string_comparable));
    assert!(!structurally_inherits(db, TypeId::I32, string_comparable));
}

#[test]
fn test_explicit_is_read_only_name() {
    let (registry, core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let dict = core.dictionary_of(db, TypeId::STRING, TypeId::I32);
    let member = find_member(db, dict, &MemberQuery::new("IsReadOnly")).unwrap();
    assert_eq!(
        &*db.resolve_atom(member.name),
        "ICollection<KeyValuePair<TKey, TValue>>.IsReadOnly"
    );
    assert!(member.new_slot);
    assert_eq!(member.visibility, Visibility::Private);
}

#[test]
fn test_int32_members() {
    let (registry, _core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let factory = InvokerFactory::new(Arc::clone(&registry));

    let min = static_property_or_field(db, TypeId::I32, "MinValue").unwrap();
    let min = factory.getter(&min, &CallShape::function(&[], TypeId::I32)).unwrap();
    assert_eq!(min.invoke(&[]).unwrap(), Value::I32(i32::MIN));

    let compare = instance_method(db, TypeId::I32, "CompareTo", None).unwrap();
    let compare = factory
        .method(&compare, &CallShape::function(&[TypeId::I32, TypeId::I32], TypeId::I32))
        .unwrap();
    assert_eq!(compare.invoke(&[Value::I32(1), Value::I32(5)]).unwrap(), Value::I32(-1));
    assert_eq!(compare.invoke(&[Value::I32(5), Value::I32(5)]).unwrap(), Value::I32(0));

    let to_string = instance_method(db, TypeId::I32, "ToString", None).unwrap();
    let to_string = factory
        .method(&to_string, &CallShape::function(&[TypeId::OBJECT], TypeId::STRING))
        .unwrap();
    assert_eq!(to_string.invoke(&[Value::I32(-12)]).unwrap(), Value::string("-12"));

    let parse = crate::lookup::static_method(db, TypeId::I32, "Parse", None).unwrap();
    let parse = factory
        .method(&parse, &CallShape::function(&[TypeId::STRING], TypeId::I32))
        .unwrap();
    assert!(matches!(
        parse.invoke(&[Value::Null]).unwrap_err(),
        InvokeError::NullReference(_)
    ));
}

#[test]
fn test_string_length_counts_utf16_units() {
    let (registry, _core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let factory = InvokerFactory::new(Arc::clone(&registry));
    let length = instance_property_or_field(db, TypeId::STRING, "Length").unwrap();
    let length = factory
        .getter(&length, &CallShape::function(&[TypeId::STRING], TypeId::I32))
        .unwrap();
    assert_eq!(length.invoke(&[Value::string("héllo")]).unwrap(), Value::I32(5));
    assert_eq!(length.invoke(&[Value::string("😀")]).unwrap(), Value::I32(2));
    assert!(matches!(
        length.invoke(&[Value::Null]).unwrap_err(),
        InvokeError::NullReference(_)
    ));
}

#[test]
fn test_list_constructor_rejects_negative_capacity() {
    let (registry, core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let list = core.list_of(db, TypeId::STRING);
    let ctor = crate::lookup::constructor(db, list, &[TypeId::I32]).unwrap();
    let make = InvokerFactory::new(Arc::clone(&registry))
        .constructor(&ctor, &CallShape::function(&[TypeId::I32], list))
        .unwrap();
    assert!(matches!(
        make.invoke(&[Value::I32(-1)]).unwrap_err(),
        InvokeError::Native(_)
    ));
    assert!(make.invoke(&[Value::I32(0)]).is_ok());
}

#[test]
fn test_dictionary_accepts_key_value_pairs() {
    let (registry, core) = installed();
    let db: &dyn TypeDatabase = &*registry;
    let factory = InvokerFactory::new(Arc::clone(&registry));
    let dict = core.dictionary_of(db, TypeId::I32, TypeId::STRING);
    let pair_ty = core.pair_of(db, TypeId::I32, TypeId::STRING);

    let instance = factory
        .constructor(
            &crate::lookup::constructor(db, dict, &[]).unwrap(),
            &CallShape::function(&[], dict),
        )
        .unwrap()
        .invoke(&[])
        .unwrap();
    let pair = factory
        .constructor(
            &crate::lookup::constructor(db, pair_ty, &[TypeId::I32, TypeId::STRING]).unwrap(),
            &CallShape::function(&[TypeId::I32, TypeId::STRING], pair_ty),
        )
        .unwrap()
        .invoke(&[Value::I32(7), Value::string("seven")])
        .unwrap();

    let add_pair = instance_method(db, dict, "Add", Some(&[Some(pair_ty), None])).unwrap();
    factory
        .method(&add_pair, &CallShape::action(&[dict, pair_ty]))
        .unwrap()
        .invoke(&[instance.clone(), pair])
        .unwrap();

    let count = instance_property_or_field(db, dict, "Count").unwrap();
    let count = factory.getter(&count, &CallShape::function(&[dict], TypeId::I32)).unwrap();
    assert_eq!(count.invoke(&[instance.clone()]).unwrap(), Value::I32(1));

    let get = instance_method(db, dict, "GetValue", None).unwrap();
    let get = factory
        .method(&get, &CallShape::function(&[dict, TypeId::I32], TypeId::STRING))
        .unwrap();
    assert_eq!(get.invoke(&[instance.clone(), Value::I32(7)]).unwrap(), Value::string("seven"));
    assert!(matches!(
        get.invoke(&[instance, Value::I32(8)]).unwrap_err(),
        InvokeError::Native(_)
    ));
}
