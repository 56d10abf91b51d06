//! Standard collection types.
//!
//! Installs the generic collection interfaces and a small set of concrete
//! types (`KeyValuePair`, `List`, `Dictionary`) with native member bodies,
//! plus comparison interfaces and a few members on the builtin primitives.
//! The hierarchy mirrors the familiar base class library:
//!
//! ```text
//! IEnumerable
//! └─ IEnumerable<T>
//!    ├─ ICollection<T> ── IList<T>
//!    │  └─ (IDictionary<K, V> : ICollection<KeyValuePair<K, V>>)
//!    └─ IReadOnlyCollection<T> ── IReadOnlyList<T>
//!       └─ (IReadOnlyDictionary<K, V> : IReadOnlyCollection<KeyValuePair<K, V>>)
//! ```

use crate::db::{TypeDatabase, TypeRegistry};
use crate::def::{DefId, DefKind, NativeCall};
use crate::error::InvokeError;
use crate::format::format_type;
use crate::types::{MemberKind, PrimitiveKind, TypeId, Visibility};
use crate::value::{ArrayRef, ObjectRef, Value};
use rfx_common::Atom;
use tracing::debug;

const COLLECTIONS: &str = "System.Collections";
const GENERIC: &str = "System.Collections.Generic";
const SYSTEM: &str = "System";

/// Definition ids of the installed types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreLib {
    pub i_enumerable: DefId,
    pub i_enumerable_t: DefId,
    pub i_collection: DefId,
    pub i_read_only_collection: DefId,
    pub i_list: DefId,
    pub i_read_only_list: DefId,
    pub i_dictionary: DefId,
    pub i_read_only_dictionary: DefId,
    pub i_comparer: DefId,
    pub i_comparable: DefId,
    pub i_equatable: DefId,
    pub key_value_pair: DefId,
    pub list: DefId,
    pub dictionary: DefId,
}

/// Definition backing a builtin `TypeId`.
fn builtin(ty: TypeId) -> DefId {
    DefId(ty.0)
}

fn this_object<'c>(call: &NativeCall<'c>) -> Result<&'c ObjectRef, InvokeError> {
    call.this
        .and_then(Value::as_object)
        .ok_or_else(|| InvokeError::NullReference("instance member invoked without an instance".into()))
}

fn array_field(object: &ObjectRef, name: Atom) -> Result<ArrayRef, InvokeError> {
    match object.get_field(name) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(InvokeError::NullReference("collection storage is not initialized".into())),
    }
}

fn arg(call: &NativeCall<'_>, index: usize) -> Value {
    call.args.get(index).cloned().unwrap_or(Value::Null)
}

impl CoreLib {
    /// Declare and define every core type in `registry`.
    pub fn install(registry: &TypeRegistry) -> Self {
        let r = registry;
        let object_array = r.array(TypeId::OBJECT);

        // Declarations first: signatures below refer to each other.
        let i_enumerable = r.declare(DefKind::Interface, COLLECTIONS, "IEnumerable", &[]);
        let i_enumerable_t = r.declare(DefKind::Interface, GENERIC, "IEnumerable", &["T"]);
        let i_collection = r.declare(DefKind::Interface, GENERIC, "ICollection", &["T"]);
        let i_read_only_collection =
            r.declare(DefKind::Interface, GENERIC, "IReadOnlyCollection", &["T"]);
        let i_list = r.declare(DefKind::Interface, GENERIC, "IList", &["T"]);
        let i_read_only_list = r.declare(DefKind::Interface, GENERIC, "IReadOnlyList", &["T"]);
        let i_dictionary =
            r.declare(DefKind::Interface, GENERIC, "IDictionary", &["TKey", "TValue"]);
        let i_read_only_dictionary = r.declare(
            DefKind::Interface,
            GENERIC,
            "IReadOnlyDictionary",
            &["TKey", "TValue"],
        );
        let i_comparer = r.declare(DefKind::Interface, GENERIC, "IComparer", &["T"]);
        let i_comparable = r.declare(DefKind::Interface, SYSTEM, "IComparable", &["T"]);
        let i_equatable = r.declare(DefKind::Interface, SYSTEM, "IEquatable", &["T"]);
        let key_value_pair = r.declare(DefKind::Struct, GENERIC, "KeyValuePair", &["TKey", "TValue"]);
        let list = r.declare(DefKind::Class, GENERIC, "List", &["T"]);
        let dictionary = r.declare(DefKind::Class, GENERIC, "Dictionary", &["TKey", "TValue"]);

        // Interfaces.
        r.define(i_enumerable.def).finish();
        r.define(i_enumerable_t.def)
            .implements(i_enumerable.ty)
            .finish();
        let t = i_collection.param(0);
        r.define(i_collection.def)
            .implements(r.application(i_enumerable_t.def, &[t]))
            .property("Count", TypeId::I32, |p| {
                p.getter(Visibility::Public, |_| Ok(Value::I32(0)));
            })
            .property("IsReadOnly", TypeId::BOOL, |p| {
                p.getter(Visibility::Public, |_| Ok(Value::Bool(false)));
            })
            .finish();
        let t = i_read_only_collection.param(0);
        r.define(i_read_only_collection.def)
            .implements(r.application(i_enumerable_t.def, &[t]))
            .property("Count", TypeId::I32, |p| {
                p.getter(Visibility::Public, |_| Ok(Value::I32(0)));
            })
            .finish();
        let t = i_list.param(0);
        r.define(i_list.def)
            .implements(r.application(i_collection.def, &[t]))
            .finish();
        let t = i_read_only_list.param(0);
        r.define(i_read_only_list.def)
            .implements(r.application(i_read_only_collection.def, &[t]))
            .finish();

        let (k, v) = (i_dictionary.param(0), i_dictionary.param(1));
        let kvp = r.application(key_value_pair.def, &[k, v]);
        r.define(i_dictionary.def)
            .implements(r.application(i_collection.def, &[kvp]))
            .finish();
        let (k, v) = (i_read_only_dictionary.param(0), i_read_only_dictionary.param(1));
        let kvp = r.application(key_value_pair.def, &[k, v]);
        r.define(i_read_only_dictionary.def)
            .implements(r.application(i_read_only_collection.def, &[kvp]))
            .finish();

        r.define(i_comparer.def)
            .method("Compare", |m| {
                let t = i_comparer.param(0);
                m.param("x", t).param("y", t).returns(TypeId::I32);
            })
            .finish();
        r.define(i_comparable.def)
            .method("CompareTo", |m| {
                m.param("other", i_comparable.param(0)).returns(TypeId::I32);
            })
            .finish();
        r.define(i_equatable.def)
            .method("Equals", |m| {
                m.param("other", i_equatable.param(0)).returns(TypeId::BOOL);
            })
            .finish();

        // KeyValuePair<TKey, TValue>
        let key_field = r.intern_string("key");
        let value_field = r.intern_string("value");
        let (k, v) = (key_value_pair.param(0), key_value_pair.param(1));
        r.define(key_value_pair.def)
            .member(MemberKind::Field, "key", |f| {
                f.value_type(k).private();
            })
            .member(MemberKind::Field, "value", |f| {
                f.value_type(v).private();
            })
            .constructor(|c| {
                c.param("key", k).param("value", v).native(move |call| {
                    let this = this_object(&call)?;
                    this.set_field(key_field, arg(&call, 0));
                    this.set_field(value_field, arg(&call, 1));
                    Ok(Value::Unit)
                });
            })
            .property("Key", k, |p| {
                p.getter(Visibility::Public, move |call| {
                    Ok(this_object(&call)?.get_field(key_field).unwrap_or(Value::Null))
                });
            })
            .property("Value", v, |p| {
                p.getter(Visibility::Public, move |call| {
                    Ok(this_object(&call)?.get_field(value_field).unwrap_or(Value::Null))
                });
            })
            .finish();

        // List<T>
        let items_field = r.intern_string("_items");
        let t = list.param(0);
        r.define(list.def)
            .implements(r.application(i_list.def, &[t]))
            .implements(r.application(i_read_only_list.def, &[t]))
            .member(MemberKind::Field, "_items", |f| {
                f.value_type(object_array).private();
            })
            .constructor(|c| {
                c.native(move |call| {
                    this_object(&call)?
                        .set_field(items_field, Value::Array(ArrayRef::of_objects(Vec::new())));
                    Ok(Value::Unit)
                });
            })
            .constructor(|c| {
                c.param("capacity", TypeId::I32).native(move |call| {
                    let capacity = arg(&call, 0).as_i32().unwrap_or(0);
                    if capacity < 0 {
                        return Err(InvokeError::Native(format!(
                            "capacity must be non-negative, got {capacity}"
                        )));
                    }
                    let items = Vec::with_capacity(capacity as usize);
                    this_object(&call)?.set_field(items_field, Value::Array(ArrayRef::of_objects(items)));
                    Ok(Value::Unit)
                });
            })
            .method("Add", |m| {
                m.param("item", t).native(move |call| {
                    array_field(this_object(&call)?, items_field)?.push(arg(&call, 0));
                    Ok(Value::Unit)
                });
            })
            .method("Get", |m| {
                m.param("index", TypeId::I32).returns(t).native(move |call| {
                    let items = array_field(this_object(&call)?, items_field)?;
                    let index = arg(&call, 0).as_i32().unwrap_or(-1);
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| items.get(i))
                        .ok_or_else(|| {
                            InvokeError::Native(format!(
                                "index {index} is out of range for {} items",
                                items.len()
                            ))
                        })
                });
            })
            .property("Count", TypeId::I32, |p| {
                p.getter(Visibility::Public, move |call| {
                    let items = array_field(this_object(&call)?, items_field)?;
                    Ok(Value::I32(items.len() as i32))
                });
            })
            .finish();

        // Dictionary<TKey, TValue>
        let keys_field = r.intern_string("_keys");
        let values_field = r.intern_string("_values");
        let (k, v) = (dictionary.param(0), dictionary.param(1));
        let kvp = r.application(key_value_pair.def, &[k, v]);
        let collection_of_kvp = r.application(i_collection.def, &[kvp]);
        let explicit_is_read_only = format!("{}.IsReadOnly", format_type(r, collection_of_kvp));
        let add_entry = move |this: &ObjectRef, key: Value, value: Value| -> Result<Value, InvokeError> {
            let keys = array_field(this, keys_field)?;
            if keys.to_vec().contains(&key) {
                return Err(InvokeError::Native(format!(
                    "an item with the same key has already been added: {key}"
                )));
            }
            keys.push(key);
            array_field(this, values_field)?.push(value);
            Ok(Value::Unit)
        };
        r.define(dictionary.def)
            .implements(r.application(i_dictionary.def, &[k, v]))
            .implements(r.application(i_read_only_dictionary.def, &[k, v]))
            .member(MemberKind::Field, "_keys", |f| {
                f.value_type(object_array).private();
            })
            .member(MemberKind::Field, "_values", |f| {
                f.value_type(object_array).private();
            })
            .constructor(|c| {
                c.native(move |call| {
                    let this = this_object(&call)?;
                    this.set_field(keys_field, Value::Array(ArrayRef::of_objects(Vec::new())));
                    this.set_field(values_field, Value::Array(ArrayRef::of_objects(Vec::new())));
                    Ok(Value::Unit)
                });
            })
            .method("Add", |m| {
                m.param("key", k).param("value", v).native(move |call| {
                    add_entry(this_object(&call)?, arg(&call, 0), arg(&call, 1))
                });
            })
            .method("Add", |m| {
                m.param("item", kvp).native(move |call| {
                    let item = arg(&call, 0);
                    let pair = item.as_object().ok_or_else(|| {
                        InvokeError::NullReference("key/value pair is null".into())
                    })?;
                    let key = pair.get_field(key_field).unwrap_or(Value::Null);
                    let value = pair.get_field(value_field).unwrap_or(Value::Null);
                    add_entry(this_object(&call)?, key, value)
                });
            })
            .method("ContainsKey", |m| {
                m.param("key", k).returns(TypeId::BOOL).native(move |call| {
                    let keys = array_field(this_object(&call)?, keys_field)?;
                    Ok(Value::Bool(keys.to_vec().contains(&arg(&call, 0))))
                });
            })
            .method("GetValue", |m| {
                m.param("key", k).returns(v).native(move |call| {
                    let this = this_object(&call)?;
                    let key = arg(&call, 0);
                    let position = array_field(this, keys_field)?
                        .to_vec()
                        .iter()
                        .position(|candidate| *candidate == key);
                    position
                        .and_then(|i| array_field(this, values_field).ok()?.get(i))
                        .ok_or_else(|| InvokeError::Native(format!("key not found: {key}")))
                });
            })
            .property("Count", TypeId::I32, |p| {
                p.getter(Visibility::Public, move |call| {
                    let keys = array_field(this_object(&call)?, keys_field)?;
                    Ok(Value::I32(keys.len() as i32))
                });
            })
            .property(&explicit_is_read_only, TypeId::BOOL, |p| {
                p.new_slot()
                    .getter(Visibility::Private, |_| Ok(Value::Bool(false)));
            })
            .finish();

        // Builtin primitives compare and equate with themselves.
        let comparable_builtins = PrimitiveKind::ALL
            .into_iter()
            .map(|kind| kind.type_id())
            .chain([TypeId::STRING]);
        for ty in comparable_builtins {
            let def = builtin(ty);
            r.definitions()
                .add_implements(def, r.application(i_comparable.def, &[ty]));
            r.definitions()
                .add_implements(def, r.application(i_equatable.def, &[ty]));
        }

        // Int32 members.
        r.define(builtin(TypeId::I32))
            .static_field("MaxValue", TypeId::I32, Value::I32(i32::MAX))
            .static_field("MinValue", TypeId::I32, Value::I32(i32::MIN))
            .method("Parse", |m| {
                m.static_member()
                    .param("s", TypeId::STRING)
                    .returns(TypeId::I32)
                    .native(|call| {
                        let text = arg(&call, 0);
                        let Some(s) = text.as_str() else {
                            return Err(InvokeError::NullReference("s".into()));
                        };
                        s.trim().parse::<i32>().map(Value::I32).map_err(|e| {
                            InvokeError::Native(format!("input string '{s}' was not in a correct format: {e}"))
                        })
                    });
            })
            .method("CompareTo", |m| {
                m.param("other", TypeId::I32)
                    .returns(TypeId::I32)
                    .native(|call| {
                        let this = call.this.and_then(Value::as_i32).unwrap_or_default();
                        let other = arg(&call, 0).as_i32().unwrap_or_default();
                        Ok(Value::I32(this.cmp(&other) as i32))
                    });
            })
            .method("ToString", |m| {
                m.returns(TypeId::STRING).native(|call| {
                    let this = call.this.cloned().unwrap_or(Value::Null);
                    Ok(Value::string(this.to_string()))
                });
            })
            .finish();

        // String members.
        r.define(builtin(TypeId::STRING))
            .property("Length", TypeId::I32, |p| {
                p.getter(Visibility::Public, |call| {
                    let len = call
                        .this
                        .and_then(Value::as_str)
                        .map(|s| s.encode_utf16().count())
                        .unwrap_or(0);
                    Ok(Value::I32(len as i32))
                });
            })
            .finish();

        let core = Self {
            i_enumerable: i_enumerable.def,
            i_enumerable_t: i_enumerable_t.def,
            i_collection: i_collection.def,
            i_read_only_collection: i_read_only_collection.def,
            i_list: i_list.def,
            i_read_only_list: i_read_only_list.def,
            i_dictionary: i_dictionary.def,
            i_read_only_dictionary: i_read_only_dictionary.def,
            i_comparer: i_comparer.def,
            i_comparable: i_comparable.def,
            i_equatable: i_equatable.def,
            key_value_pair: key_value_pair.def,
            list: list.def,
            dictionary: dictionary.def,
        };
        debug!(definitions = r.definitions().len(), "CoreLib installed");
        core
    }

    /// `List<element>`.
    pub fn list_of(&self, db: &dyn TypeDatabase, element: TypeId) -> TypeId {
        db.application(self.list, &[element])
    }

    /// `Dictionary<key, value>`.
    pub fn dictionary_of(&self, db: &dyn TypeDatabase, key: TypeId, value: TypeId) -> TypeId {
        db.application(self.dictionary, &[key, value])
    }

    /// `KeyValuePair<key, value>`.
    pub fn pair_of(&self, db: &dyn TypeDatabase, key: TypeId, value: TypeId) -> TypeId {
        db.application(self.key_value_pair, &[key, value])
    }
}

#[cfg(test)]
#[path = "../tests/corelib_tests.rs"]
mod tests;
