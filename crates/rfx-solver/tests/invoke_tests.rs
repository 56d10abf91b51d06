use super::*;
use crate::fixtures::{Fixture, fixture};
use crate::lookup::{
    MemberQuery, constructor, find_member, instance_method, instance_property_or_field,
    static_method, static_property_or_field,
};
use crate::value::ArrayRef;

fn factory(f: &Fixture) -> InvokerFactory {
    InvokerFactory::new(Arc::clone(&f.registry))
}

fn new_animal(f: &Fixture, name: &str) -> Value {
    let db = f.db();
    let ctor = constructor(db, f.animal.ty, &[TypeId::STRING]).unwrap();
    let shape = CallShape::function(&[TypeId::STRING], f.animal.ty);
    factory(f)
        .constructor(&ctor, &shape)
        .unwrap()
        .invoke(&[Value::string(name)])
        .unwrap()
}

fn new_calculator(f: &Fixture) -> Value {
    let ctor = constructor(f.db(), f.calculator.ty, &[]).unwrap();
    let shape = CallShape::function(&[], f.calculator.ty);
    factory(f).constructor(&ctor, &shape).unwrap().invoke(&[]).unwrap()
}

#[test]
fn test_invoker_is_send_sync_and_clone() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<Invoker>();
    assert_send_sync::<InvokerFactory>();
}

// =============================================================================
// Getters and setters
// =============================================================================

#[test]
fn test_field_getter_and_setter() {
    let f = fixture();
    let db = f.db();
    let animal = new_animal(&f, "Tom");
    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();

    let get = factory(&f)
        .getter(&name, &CallShape::function(&[f.animal.ty], TypeId::STRING))
        .unwrap();
    assert_eq!(get.invoke(&[animal.clone()]).unwrap(), Value::string("Tom"));

    let set = factory(&f)
        .setter(&name, &CallShape::action(&[f.animal.ty, TypeId::STRING]))
        .unwrap();
    assert_eq!(set.invoke(&[animal.clone(), Value::string("Jerry")]).unwrap(), Value::Unit);
    assert_eq!(get.invoke(&[animal]).unwrap(), Value::string("Jerry"));
}

#[test]
fn test_property_getter_converts_result_and_receiver() {
    let f = fixture();
    let db = f.db();
    let legs = instance_property_or_field(db, f.animal.ty, "Legs").unwrap();
    // Receiver typed as Object is downcast at call time; the result is boxed.
    let get = factory(&f)
        .getter(&legs, &CallShape::function(&[TypeId::OBJECT], TypeId::OBJECT))
        .unwrap();
    assert_eq!(get.invoke(&[new_animal(&f, "Tom")]).unwrap(), Value::I32(4));

    let err = get.invoke(&[new_calculator(&f)]).unwrap_err();
    assert!(matches!(err, InvokeError::InvalidCast { .. }));
    let err = get.invoke(&[Value::Null]).unwrap_err();
    assert!(matches!(err, InvokeError::NullReference(_)));

    let widened = factory(&f)
        .getter(&legs, &CallShape::function(&[f.animal.ty], TypeId::I64))
        .unwrap();
    assert_eq!(widened.invoke(&[new_animal(&f, "Tom")]).unwrap(), Value::I64(4));
}

#[test]
fn test_typed_receiver_must_have_the_declared_type() {
    let f = fixture();
    let db = f.db();
    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();
    let calc = new_calculator(&f);

    let get = factory(&f)
        .getter(&name, &CallShape::function(&[f.animal.ty], TypeId::STRING))
        .unwrap();
    assert!(matches!(
        get.invoke(&[calc.clone()]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    let set = factory(&f)
        .setter(&name, &CallShape::action(&[f.animal.ty, TypeId::STRING]))
        .unwrap();
    assert!(matches!(
        set.invoke(&[calc.clone(), Value::string("x")]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));
    let Value::Object(object) = &calc else {
        panic!("a calculator is an object");
    };
    assert_eq!(object.get_field(db.intern_string("Name")), None);

    // A derived receiver is still admitted.
    let dog = factory(&f)
        .constructor(
            &constructor(db, f.dog.ty, &[]).unwrap(),
            &CallShape::function(&[], f.dog.ty),
        )
        .unwrap()
        .invoke(&[])
        .unwrap();
    assert!(get.invoke(&[dog]).is_ok());
}

#[test]
fn test_missing_field_slot_is_an_error() {
    let f = fixture();
    let db = f.db();
    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();
    let hollow = Value::Object(ObjectRef::new(f.animal.ty, FxHashMap::default()));

    let get = factory(&f)
        .getter(&name, &CallShape::function(&[f.animal.ty], TypeId::STRING))
        .unwrap();
    assert_eq!(
        get.invoke(&[hollow.clone()]).unwrap_err(),
        InvokeError::MissingField {
            ty: "Animal".to_string(),
            field: "Name".to_string()
        }
    );

    let set = factory(&f)
        .setter(&name, &CallShape::action(&[f.animal.ty, TypeId::STRING]))
        .unwrap();
    assert!(matches!(
        set.invoke(&[hollow.clone(), Value::string("x")]).unwrap_err(),
        InvokeError::MissingField { .. }
    ));
    assert!(matches!(
        get.invoke(&[hollow]).unwrap_err(),
        InvokeError::MissingField { .. }
    ));
}

#[test]
fn test_property_setter_runs_accessor() {
    let f = fixture();
    let db = f.db();
    let animal = new_animal(&f, "Tom");
    let nickname = instance_property_or_field(db, f.animal.ty, "Nickname").unwrap();
    let set = factory(&f)
        .setter(&nickname, &CallShape::action(&[f.animal.ty, TypeId::STRING]))
        .unwrap();
    set.invoke(&[animal.clone(), Value::string("Tiger")]).unwrap();

    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();
    let get = factory(&f)
        .getter(&name, &CallShape::function(&[f.animal.ty], TypeId::STRING))
        .unwrap();
    assert_eq!(get.invoke(&[animal]).unwrap(), Value::string("Tiger"));
}

#[test]
fn test_getter_and_setter_shape_errors() {
    let f = fixture();
    let db = f.db();
    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();
    let fac = factory(&f);

    let err = fac.getter(&name, &CallShape::action(&[f.animal.ty])).unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
    let err = fac
        .getter(&name, &CallShape::function(&[], TypeId::STRING))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
    let err = fac
        .getter(&name, &CallShape::function(&[f.animal.ty], TypeId::I32))
        .unwrap_err();
    assert!(matches!(err, ReflectError::NotConvertible { .. }));
    let err = fac
        .setter(&name, &CallShape::function(&[f.animal.ty, TypeId::STRING], TypeId::STRING))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));

    let speak = instance_method(db, f.animal.ty, "Speak", None).unwrap();
    let err = fac
        .getter(&speak, &CallShape::function(&[f.animal.ty], TypeId::STRING))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
}

#[test]
fn test_static_field_storage_is_shared() {
    let f = fixture();
    let db = f.db();
    let through_dog = static_property_or_field(db, f.dog.ty, "Population").unwrap();
    let through_animal = static_property_or_field(db, f.animal.ty, "Population").unwrap();

    let get = factory(&f)
        .getter(&through_animal, &CallShape::function(&[], TypeId::I32))
        .unwrap();
    assert_eq!(get.invoke(&[]).unwrap(), Value::I32(0));

    let set = factory(&f)
        .setter(&through_dog, &CallShape::action(&[TypeId::I32]))
        .unwrap();
    set.invoke(&[Value::I32(12)]).unwrap();
    assert_eq!(get.invoke(&[]).unwrap(), Value::I32(12));

    let kingdom = static_property_or_field(db, f.animal.ty, "Kingdom").unwrap();
    let get = factory(&f)
        .getter(&kingdom, &CallShape::function(&[], TypeId::STRING))
        .unwrap();
    assert_eq!(get.invoke(&[]).unwrap(), Value::Null);
}

#[test]
fn test_static_field_with_initial_value() {
    let f = fixture();
    let db = f.db();
    let max = static_property_or_field(db, TypeId::I32, "MaxValue").unwrap();
    let get = factory(&f)
        .getter(&max, &CallShape::function(&[], TypeId::I64))
        .unwrap();
    assert_eq!(get.invoke(&[]).unwrap(), Value::I64(i32::MAX as i64));
}

// =============================================================================
// Methods
// =============================================================================

#[test]
fn test_fixed_method_with_numeric_conversions() {
    let f = fixture();
    let db = f.db();
    let int = Some(TypeId::I32);
    let add = find_member(
        db,
        f.calculator.ty,
        &MemberQuery::new("Add").with_shape(vec![int, int, int]),
    )
    .unwrap();
    let shape = CallShape::function(&[f.calculator.ty, TypeId::I64, TypeId::I64], TypeId::I64);
    let invoker = factory(&f).method(&add, &shape).unwrap();
    let calc = new_calculator(&f);
    assert_eq!(
        invoker.invoke(&[calc.clone(), Value::I64(2), Value::I64(3)]).unwrap(),
        Value::I64(5)
    );

    let err = invoker
        .invoke(&[calc.clone(), Value::I64(i64::MAX), Value::I64(1)])
        .unwrap_err();
    assert!(matches!(err, InvokeError::Overflow { .. }));

    let err = invoker
        .invoke(&[calc.clone(), Value::I64(i32::MAX as i64), Value::I64(1)])
        .unwrap_err();
    assert!(matches!(err, InvokeError::Native(_)));

    let err = invoker.invoke(&[calc, Value::I64(1)]).unwrap_err();
    assert_eq!(
        err,
        InvokeError::WrongArgumentCount {
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn test_typed_arguments_must_have_the_declared_type() {
    let f = fixture();
    let db = f.db();
    let int = Some(TypeId::I32);
    let add = find_member(
        db,
        f.calculator.ty,
        &MemberQuery::new("Add").with_shape(vec![int, int, int]),
    )
    .unwrap();
    let shape = CallShape::function(&[f.calculator.ty, TypeId::I32, TypeId::I32], TypeId::I32);
    let invoker = factory(&f).method(&add, &shape).unwrap();
    let calc = new_calculator(&f);

    assert_eq!(
        invoker.invoke(&[calc.clone(), Value::I32(2), Value::I32(3)]).unwrap(),
        Value::I32(5)
    );
    assert!(matches!(
        invoker
            .invoke(&[calc.clone(), Value::string("two"), Value::I32(3)])
            .unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));
    // Primitive positions take exactly their own type.
    assert!(matches!(
        invoker.invoke(&[calc.clone(), Value::I64(2), Value::I32(3)]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));
    assert!(matches!(
        invoker.invoke(&[calc.clone(), Value::Null, Value::I32(3)]).unwrap_err(),
        InvokeError::NullReference(_)
    ));
    assert!(matches!(
        invoker
            .invoke(&[new_animal(&f, "Tom"), Value::I32(2), Value::I32(3)])
            .unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    // Array elements are admitted against the element type; arrays are not
    // covariant.
    let spread = factory(&f)
        .method_array(&add, &CallShape::array_convention(db, Some(f.calculator.ty), TypeId::I32))
        .unwrap();
    let ints = Value::Array(ArrayRef::new(TypeId::I32, vec![Value::I32(1), Value::I32(2)]));
    assert!(matches!(
        spread.invoke(&[calc.clone(), ints]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    let cast = factory(&f)
        .cast(TypeId::I64, TypeId::I32, &CallShape::function(&[TypeId::I64], TypeId::I32))
        .unwrap();
    assert!(matches!(
        cast.invoke(&[Value::I32(1)]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));
    assert_eq!(cast.invoke(&[Value::I64(1)]).unwrap(), Value::I32(1));
}

#[test]
fn test_method_shape_is_validated_at_synthesis() {
    let f = fixture();
    let db = f.db();
    let fetch = instance_method(db, f.dog.ty, "Fetch", None).unwrap();
    let fac = factory(&f);

    let err = fac
        .method(&fetch, &CallShape::function(&[f.dog.ty], TypeId::STRING))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));

    let err = fac
        .method(&fetch, &CallShape::function(&[f.dog.ty, TypeId::I32], TypeId::STRING))
        .unwrap_err();
    assert!(matches!(err, ReflectError::NotConvertible { .. }));

    let err = fac
        .method(&fetch, &CallShape::function(&[f.calculator.ty, TypeId::STRING], TypeId::STRING))
        .unwrap_err();
    assert!(matches!(err, ReflectError::NotConvertible { .. }));

    // Discarding the result is always allowed.
    let discard = fac
        .method(&fetch, &CallShape::action(&[f.dog.ty, TypeId::STRING]))
        .unwrap();
    let dog = factory(&f)
        .constructor(
            &constructor(db, f.dog.ty, &[]).unwrap(),
            &CallShape::function(&[], f.dog.ty),
        )
        .unwrap()
        .invoke(&[])
        .unwrap();
    assert_eq!(discard.invoke(&[dog, Value::string("ball")]).unwrap(), Value::Unit);
}

#[test]
fn test_inherited_method_on_derived_receiver() {
    let f = fixture();
    let db = f.db();
    let ctor = constructor(db, f.dog.ty, &[]).unwrap();
    let dog = factory(&f)
        .constructor(&ctor, &CallShape::function(&[], f.animal.ty))
        .unwrap()
        .invoke(&[])
        .unwrap();

    let speak = instance_method(db, f.dog.ty, "Speak", None).unwrap();
    let invoker = factory(&f)
        .method(&speak, &CallShape::function(&[f.dog.ty], TypeId::STRING))
        .unwrap();
    assert_eq!(invoker.invoke(&[dog.clone()]).unwrap(), Value::string("Woof"));

    let name = instance_property_or_field(db, f.dog.ty, "Name").unwrap();
    let get = factory(&f)
        .getter(&name, &CallShape::function(&[f.dog.ty], TypeId::STRING))
        .unwrap();
    assert_eq!(get.invoke(&[dog]).unwrap(), Value::string("Rex"));
}

#[test]
fn test_void_method_mutates_instance() {
    let f = fixture();
    let db = f.db();
    let calc = new_calculator(&f);
    let accumulate = instance_method(db, f.calculator.ty, "Accumulate", None).unwrap();
    let invoker = factory(&f)
        .method(&accumulate, &CallShape::action(&[f.calculator.ty, TypeId::I32]))
        .unwrap();
    invoker.invoke(&[calc.clone(), Value::I32(5)]).unwrap();
    invoker.invoke(&[calc.clone(), Value::I32(7)]).unwrap();

    let total = instance_property_or_field(db, f.calculator.ty, "Total").unwrap();
    let get = factory(&f)
        .getter(&total, &CallShape::function(&[f.calculator.ty], TypeId::I32))
        .unwrap();
    assert_eq!(get.invoke(&[calc]).unwrap(), Value::I32(12));
}

#[test]
fn test_static_method() {
    let f = fixture();
    let db = f.db();
    let max = static_method(db, f.calculator.ty, "Max", None).unwrap();
    let invoker = factory(&f)
        .method(&max, &CallShape::function(&[TypeId::I32, TypeId::I32], TypeId::I32))
        .unwrap();
    assert_eq!(invoker.invoke(&[Value::I32(3), Value::I32(9)]).unwrap(), Value::I32(9));

    let parse = static_method(db, TypeId::I32, "Parse", None).unwrap();
    let invoker = factory(&f)
        .method(&parse, &CallShape::function(&[TypeId::STRING], TypeId::I32))
        .unwrap();
    assert_eq!(invoker.invoke(&[Value::string(" 42 ")]).unwrap(), Value::I32(42));
    assert!(matches!(
        invoker.invoke(&[Value::string("forty-two")]).unwrap_err(),
        InvokeError::Native(_)
    ));
}

#[test]
fn test_array_convention_method() {
    let f = fixture();
    let db = f.db();
    let int = Some(TypeId::I32);
    let add = find_member(
        db,
        f.calculator.ty,
        &MemberQuery::new("Add").with_shape(vec![int, int, int]),
    )
    .unwrap();
    let shape = CallShape::array_convention(db, Some(TypeId::OBJECT), TypeId::OBJECT);
    let invoker = factory(&f).method_array(&add, &shape).unwrap();
    let calc = new_calculator(&f);

    let args = Value::Array(ArrayRef::of_objects(vec![Value::I32(4), Value::I32(5)]));
    assert_eq!(invoker.invoke(&[calc.clone(), args]).unwrap(), Value::I32(9));

    let too_many = Value::Array(ArrayRef::of_objects(vec![
        Value::I32(1),
        Value::I32(2),
        Value::I32(3),
    ]));
    assert_eq!(
        invoker.invoke(&[calc.clone(), too_many]).unwrap_err(),
        InvokeError::WrongArgumentCount {
            expected: 2,
            actual: 3
        }
    );

    let wrong_type = Value::Array(ArrayRef::of_objects(vec![Value::string("4"), Value::I32(5)]));
    assert!(matches!(
        invoker.invoke(&[calc.clone(), wrong_type]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    assert!(matches!(
        invoker.invoke(&[calc, Value::Null]).unwrap_err(),
        InvokeError::NullReference(_)
    ));
}

#[test]
fn test_array_convention_requires_array_parameter() {
    let f = fixture();
    let db = f.db();
    let max = static_method(db, f.calculator.ty, "Max", None).unwrap();
    let err = factory(&f)
        .method_array(&max, &CallShape::function(&[TypeId::OBJECT], TypeId::I32))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));

    let ok = factory(&f)
        .method_array(&max, &CallShape::array_convention(db, None, TypeId::I32))
        .unwrap();
    let args = Value::Array(ArrayRef::of_objects(vec![Value::I32(1), Value::I32(2)]));
    assert_eq!(ok.invoke(&[args]).unwrap(), Value::I32(2));
}

#[test]
fn test_generic_methods_must_be_closed() {
    let f = fixture();
    let db = f.db();
    let open = find_member(
        db,
        f.calculator.ty,
        &MemberQuery::new("Identity").with_generic_arity(1),
    )
    .unwrap();
    let shape = CallShape::function(&[f.calculator.ty, TypeId::OBJECT], TypeId::OBJECT);
    let err = factory(&f).method(&open, &shape).unwrap_err();
    assert!(matches!(err, ReflectError::OpenGeneric { .. }));

    let closed = find_member(
        db,
        f.calculator.ty,
        &MemberQuery::new("Identity").with_generic_args(vec![Some(TypeId::STRING)]),
    )
    .unwrap();
    let shape = CallShape::function(&[f.calculator.ty, TypeId::STRING], TypeId::STRING);
    let invoker = factory(&f).method(&closed, &shape).unwrap();
    assert_eq!(
        invoker.invoke(&[new_calculator(&f), Value::string("x")]).unwrap(),
        Value::string("x")
    );
}

// =============================================================================
// Constructors, defaults and casts
// =============================================================================

#[test]
fn test_struct_constructor_and_method() {
    let f = fixture();
    let db = f.db();
    let ctor = constructor(db, f.point.ty, &[TypeId::I32, TypeId::I32]).unwrap();
    let point = factory(&f)
        .constructor(&ctor, &CallShape::function(&[TypeId::I16, TypeId::I16], f.point.ty))
        .unwrap()
        .invoke(&[Value::I16(3), Value::I16(4)])
        .unwrap();

    let sum = instance_method(db, f.point.ty, "Sum", None).unwrap();
    let invoker = factory(&f)
        .method(&sum, &CallShape::function(&[f.point.ty], TypeId::I32))
        .unwrap();
    assert_eq!(invoker.invoke(&[point]).unwrap(), Value::I32(7));
}

#[test]
fn test_constructor_shape_errors() {
    let f = fixture();
    let db = f.db();
    let ctor = constructor(db, f.point.ty, &[TypeId::I32, TypeId::I32]).unwrap();
    let fac = factory(&f);
    let err = fac
        .constructor(&ctor, &CallShape::action(&[TypeId::I32, TypeId::I32]))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
    let err = fac
        .constructor(&ctor, &CallShape::function(&[TypeId::I32], f.point.ty))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
    let err = fac
        .constructor(&ctor, &CallShape::function(&[TypeId::I32, TypeId::I32], f.dog.ty))
        .unwrap_err();
    assert!(matches!(err, ReflectError::NotConvertible { .. }));

    // A method is not a constructor.
    let sum = instance_method(db, f.point.ty, "Sum", None).unwrap();
    let err = fac
        .constructor(&sum, &CallShape::function(&[], f.point.ty))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
}

#[test]
fn test_array_convention_constructor_and_collections() {
    let f = fixture();
    let db = f.db();
    let list = f.core.list_of(db, TypeId::I32);
    let ctor = constructor(db, list, &[TypeId::I32]).unwrap();
    let fac = factory(&f);
    let make = fac
        .constructor_array(&ctor, &CallShape::array_convention(db, None, TypeId::OBJECT))
        .unwrap();
    let instance = make
        .invoke(&[Value::Array(ArrayRef::of_objects(vec![Value::I32(8)]))])
        .unwrap();
    assert_eq!(instance.runtime_type(db), Some(list));

    let err = make
        .invoke(&[Value::Array(ArrayRef::of_objects(Vec::new()))])
        .unwrap_err();
    assert!(matches!(err, InvokeError::WrongArgumentCount { expected: 1, actual: 0 }));

    let add = instance_method(db, list, "Add", None).unwrap();
    let add = fac.method(&add, &CallShape::action(&[list, TypeId::I32])).unwrap();
    add.invoke(&[instance.clone(), Value::I32(10)]).unwrap();
    add.invoke(&[instance.clone(), Value::I32(20)]).unwrap();

    let count = instance_property_or_field(db, list, "Count").unwrap();
    let count = fac.getter(&count, &CallShape::function(&[list], TypeId::I32)).unwrap();
    assert_eq!(count.invoke(&[instance.clone()]).unwrap(), Value::I32(2));

    let get = instance_method(db, list, "Get", None).unwrap();
    let get = fac
        .method(&get, &CallShape::function(&[list, TypeId::I32], TypeId::I32))
        .unwrap();
    assert_eq!(get.invoke(&[instance.clone(), Value::I32(1)]).unwrap(), Value::I32(20));
    assert!(matches!(
        get.invoke(&[instance, Value::I32(5)]).unwrap_err(),
        InvokeError::Native(_)
    ));
}

#[test]
fn test_dictionary_members() {
    let f = fixture();
    let db = f.db();
    let dict = f.core.dictionary_of(db, TypeId::STRING, TypeId::I32);
    let fac = factory(&f);
    let instance = fac
        .constructor(
            &constructor(db, dict, &[]).unwrap(),
            &CallShape::function(&[], dict),
        )
        .unwrap()
        .invoke(&[])
        .unwrap();

    let shape = [Some(TypeId::STRING), Some(TypeId::I32), None];
    let add = instance_method(db, dict, "Add", Some(&shape)).unwrap();
    let add = fac
        .method(&add, &CallShape::action(&[dict, TypeId::STRING, TypeId::I32]))
        .unwrap();
    add.invoke(&[instance.clone(), Value::string("one"), Value::I32(1)]).unwrap();
    assert!(matches!(
        add.invoke(&[instance.clone(), Value::string("one"), Value::I32(2)]).unwrap_err(),
        InvokeError::Native(_)
    ));

    let contains = instance_method(db, dict, "ContainsKey", None).unwrap();
    let contains = fac
        .method(&contains, &CallShape::function(&[dict, TypeId::STRING], TypeId::BOOL))
        .unwrap();
    assert_eq!(contains.invoke(&[instance.clone(), Value::string("one")]).unwrap(), Value::Bool(true));
    assert_eq!(contains.invoke(&[instance.clone(), Value::string("two")]).unwrap(), Value::Bool(false));

    let get = instance_method(db, dict, "GetValue", None).unwrap();
    let get = fac
        .method(&get, &CallShape::function(&[dict, TypeId::STRING], TypeId::I64))
        .unwrap();
    assert_eq!(get.invoke(&[instance.clone(), Value::string("one")]).unwrap(), Value::I64(1));

    let read_only = find_member(db, dict, &MemberQuery::new("IsReadOnly")).unwrap();
    let read_only = fac
        .getter(&read_only, &CallShape::function(&[dict], TypeId::BOOL))
        .unwrap();
    assert_eq!(read_only.invoke(&[instance]).unwrap(), Value::Bool(false));
}

#[test]
fn test_key_value_pair_roundtrip_through_members() {
    let f = fixture();
    let db = f.db();
    let kvp = f.kvp(TypeId::STRING, TypeId::I32);
    let ctor = constructor(db, kvp, &[TypeId::STRING, TypeId::I32]).unwrap();
    let pair = factory(&f)
        .constructor(&ctor, &CallShape::function(&[TypeId::STRING, TypeId::I32], TypeId::OBJECT))
        .unwrap()
        .invoke(&[Value::string("answer"), Value::I32(42)])
        .unwrap();
    let value = instance_property_or_field(db, kvp, "Value").unwrap();
    let get = factory(&f)
        .getter(&value, &CallShape::function(&[TypeId::OBJECT], TypeId::I32))
        .unwrap();
    assert_eq!(get.invoke(&[pair]).unwrap(), Value::I32(42));
}

#[test]
fn test_default_values() {
    let f = fixture();
    let db = f.db();
    let fac = factory(&f);
    let int = fac
        .default_value(TypeId::I32, &CallShape::function(&[], TypeId::I32))
        .unwrap();
    assert_eq!(int.invoke(&[]).unwrap(), Value::I32(0));

    let string = fac
        .default_value(TypeId::STRING, &CallShape::function(&[], TypeId::STRING))
        .unwrap();
    assert_eq!(string.invoke(&[]).unwrap(), Value::Null);

    let point = fac
        .default_value(f.point.ty, &CallShape::function(&[], TypeId::OBJECT))
        .unwrap()
        .invoke(&[])
        .unwrap();
    let object = point.as_object().unwrap();
    assert_eq!(object.ty(), f.point.ty);
    assert_eq!(object.get_field(db.intern_string("X")), Some(Value::I32(0)));

    let err = fac
        .default_value(f.pair.ty, &CallShape::function(&[], TypeId::OBJECT))
        .unwrap_err();
    assert!(matches!(err, ReflectError::OpenGeneric { .. }));
    let err = fac
        .default_value(TypeId::I32, &CallShape::function(&[TypeId::I32], TypeId::I32))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));

    assert_eq!(default_value_of(db, TypeId::VOID), Value::Unit);
    assert_eq!(default_value_of(db, TypeId::F64), Value::F64(0.0));
}

#[test]
fn test_casts() {
    let f = fixture();
    let fac = factory(&f);
    let widen = fac
        .cast(TypeId::I32, TypeId::I64, &CallShape::function(&[TypeId::I32], TypeId::I64))
        .unwrap();
    assert_eq!(widen.invoke(&[Value::I32(-5)]).unwrap(), Value::I64(-5));

    let narrow = fac
        .cast(TypeId::I64, TypeId::U8, &CallShape::function(&[TypeId::I64], TypeId::U8))
        .unwrap();
    assert_eq!(narrow.invoke(&[Value::I64(255)]).unwrap(), Value::U8(255));
    assert!(matches!(
        narrow.invoke(&[Value::I64(256)]).unwrap_err(),
        InvokeError::Overflow { .. }
    ));

    let unbox = fac
        .cast(TypeId::OBJECT, TypeId::STRING, &CallShape::function(&[TypeId::OBJECT], TypeId::OBJECT))
        .unwrap();
    assert_eq!(unbox.invoke(&[Value::string("s")]).unwrap(), Value::string("s"));
    assert!(matches!(
        unbox.invoke(&[Value::I32(1)]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    let err = fac
        .cast(TypeId::STRING, TypeId::I32, &CallShape::function(&[TypeId::STRING], TypeId::I32))
        .unwrap_err();
    assert!(matches!(err, ReflectError::NotConvertible { .. }));
    let err = fac
        .cast(TypeId::I32, TypeId::I64, &CallShape::function(&[], TypeId::I64))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ShapeMismatch { .. }));
}

// =============================================================================
// Natural and erased shapes
// =============================================================================

#[test]
fn test_natural_invokers_use_the_member_signature() {
    let f = fixture();
    let db = f.db();
    let fac = factory(&f);
    let animal = new_animal(&f, "Tom");

    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();
    let get = fac.natural_getter(&name).unwrap();
    assert_eq!(get.shape(), &CallShape::function(&[f.animal.ty], TypeId::STRING));
    fac.natural_setter(&name)
        .unwrap()
        .invoke(&[animal.clone(), Value::string("Jerry")])
        .unwrap();
    assert_eq!(get.invoke(&[animal]).unwrap(), Value::string("Jerry"));

    let accumulate = instance_method(db, f.calculator.ty, "Accumulate", None).unwrap();
    let action = fac.natural_method(&accumulate).unwrap();
    assert!(!action.shape().returns_value());
    let calc = new_calculator(&f);
    assert_eq!(action.invoke(&[calc.clone(), Value::I32(5)]).unwrap(), Value::Unit);

    let max = static_method(db, f.calculator.ty, "Max", None).unwrap();
    let max = fac.natural_method(&max).unwrap();
    assert_eq!(max.invoke(&[Value::I32(3), Value::I32(9)]).unwrap(), Value::I32(9));

    let ctor = constructor(db, f.animal.ty, &[TypeId::STRING]).unwrap();
    let made = fac
        .natural_constructor(&ctor)
        .unwrap()
        .invoke(&[Value::string("Rex")])
        .unwrap();
    assert_eq!(made.runtime_type(db), Some(f.animal.ty));

    let open = find_member(
        db,
        f.calculator.ty,
        &MemberQuery::new("Identity").with_generic_arity(1),
    )
    .unwrap();
    assert!(matches!(
        fac.natural_method(&open).unwrap_err(),
        ReflectError::OpenGeneric { .. }
    ));
}

#[test]
fn test_erased_invokers_check_objects_at_call_time() {
    let f = fixture();
    let db = f.db();
    let fac = factory(&f);
    let animal = new_animal(&f, "Tom");
    let calc = new_calculator(&f);

    let legs = instance_property_or_field(db, f.animal.ty, "Legs").unwrap();
    let get = fac.erased_getter(&legs).unwrap();
    assert_eq!(get.invoke(&[animal.clone()]).unwrap(), Value::I32(4));
    assert!(matches!(
        get.invoke(&[calc.clone()]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    let name = instance_property_or_field(db, f.animal.ty, "Name").unwrap();
    let set = fac.erased_setter(&name).unwrap();
    set.invoke(&[animal.clone(), Value::string("Jerry")]).unwrap();
    assert!(matches!(
        set.invoke(&[animal.clone(), Value::I32(1)]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    let max = static_method(db, f.calculator.ty, "Max", None).unwrap();
    let max = fac.erased_method(&max).unwrap();
    assert_eq!(max.invoke(&[Value::I32(3), Value::I32(9)]).unwrap(), Value::I32(9));
    assert!(matches!(
        max.invoke(&[Value::string("3"), Value::I32(9)]).unwrap_err(),
        InvokeError::InvalidCast { .. }
    ));

    let accumulate = instance_method(db, f.calculator.ty, "Accumulate", None).unwrap();
    let action = fac.erased_method_array(&accumulate).unwrap();
    assert!(!action.shape().returns_value());
    let args = Value::Array(ArrayRef::of_objects(vec![Value::I32(7)]));
    assert_eq!(action.invoke(&[calc.clone(), args]).unwrap(), Value::Unit);
    let total = instance_property_or_field(db, f.calculator.ty, "Total").unwrap();
    assert_eq!(fac.erased_getter(&total).unwrap().invoke(&[calc]).unwrap(), Value::I32(7));

    let ctor = constructor(db, f.animal.ty, &[TypeId::STRING]).unwrap();
    let make = fac.erased_constructor_array(&ctor).unwrap();
    let args = Value::Array(ArrayRef::of_objects(vec![Value::string("Tom")]));
    let made = make.invoke(&[args]).unwrap();
    assert_eq!(made.runtime_type(db), Some(f.animal.ty));
}

#[test]
fn test_invokers_report_their_label_and_shape() {
    let f = fixture();
    let db = f.db();
    let max = static_method(db, f.calculator.ty, "Max", None).unwrap();
    let shape = CallShape::function(&[TypeId::I32, TypeId::I32], TypeId::I32);
    let invoker = factory(&f).method(&max, &shape).unwrap();
    assert!(invoker.label().contains("Max"));
    assert_eq!(invoker.shape(), &shape);
    assert!(format!("{invoker:?}").contains("Invoker"));
}
