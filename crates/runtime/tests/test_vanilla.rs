//! Behavioral tests for the vanilla object protocol.

use egg_runtime::{vanilla, CallArguments, Kind, Runtime, Str, Value};

fn get_index(object: &egg_runtime::ObjectRef, runtime: &mut Runtime, index: i64) -> Value {
    object.get_index(runtime, &Value::int(index))
}

fn set_index(object: &egg_runtime::ObjectRef, runtime: &mut Runtime, index: i64, value: Value) {
    let result = object.set_index(runtime, &Value::int(index), value);
    assert_eq!(result, Value::VOID);
}

#[test]
fn test_array_set_index_grows_with_null_fill() {
    let mut runtime = Runtime::new();
    let array = vanilla::array();
    set_index(&array, &mut runtime, 3, Value::int(9));
    // Grown to exactly index + 1; prior new slots are null.
    let length = array.get_property(&mut runtime, &Str::new("length"));
    assert_eq!(length, Value::int(4));
    assert_eq!(get_index(&array, &mut runtime, 0), Value::NULL);
    assert_eq!(get_index(&array, &mut runtime, 2), Value::NULL);
    assert_eq!(get_index(&array, &mut runtime, 3), Value::int(9));
}

#[test]
fn test_array_index_bounds() {
    let mut runtime = Runtime::new();
    let array = vanilla::array();
    set_index(&array, &mut runtime, 0, Value::int(1));

    let negative = array.set_index(&mut runtime, &Value::int(-1), Value::int(0));
    assert!(negative.has(Kind::EXCEPTION));

    // 0x7FFFFFFF is rejected by both get and set.
    let huge = array.set_index(&mut runtime, &Value::int(0x7FFF_FFFF), Value::int(0));
    assert!(huge.has(Kind::EXCEPTION));
    let read = array.get_index(&mut runtime, &Value::int(0x7FFF_FFFF));
    assert!(read.has(Kind::EXCEPTION));

    let past_end = array.get_index(&mut runtime, &Value::int(1));
    assert!(past_end.has(Kind::EXCEPTION));
    assert!(past_end
        .to_display()
        .contains("Invalid array index for an array with 1 element(s): 1"));

    let keyed = array.get_index(&mut runtime, &Value::string("0"));
    assert!(keyed.has(Kind::EXCEPTION));
    assert!(keyed
        .to_display()
        .contains("Array index was expected to be 'int', not 'string'"));
}

#[test]
fn test_array_length_property() {
    let mut runtime = Runtime::new();
    let array = vanilla::array();
    set_index(&array, &mut runtime, 1, Value::int(5));
    assert_eq!(
        array.get_property(&mut runtime, &Str::new("length")),
        Value::int(2)
    );

    // Growing through the length property pads with null.
    let grown = array.set_property(&mut runtime, &Str::new("length"), Value::int(4));
    assert_eq!(grown, Value::VOID);
    assert_eq!(get_index(&array, &mut runtime, 3), Value::NULL);

    let shrunk = array.set_property(&mut runtime, &Str::new("length"), Value::int(0));
    assert_eq!(shrunk, Value::VOID);
    assert_eq!(array.to_display(), "[]");

    let bogus = array.get_property(&mut runtime, &Str::new("size"));
    assert!(bogus.has(Kind::EXCEPTION));
    assert!(bogus
        .to_display()
        .contains("Arrays do not support property '.size'"));
}

#[test]
fn test_array_display() {
    let mut runtime = Runtime::new();
    let array = vanilla::array();
    set_index(&array, &mut runtime, 0, Value::int(1));
    set_index(&array, &mut runtime, 1, Value::string("two"));
    set_index(&array, &mut runtime, 2, Value::NULL);
    assert_eq!(array.to_display(), "[1,two,null]");
}

#[test]
fn test_array_iteration_reads_live() {
    let mut runtime = Runtime::new();
    let array = vanilla::array();
    set_index(&array, &mut runtime, 0, Value::int(10));
    set_index(&array, &mut runtime, 1, Value::int(20));

    let iterator = array.iterate(&mut runtime);
    let iterator = iterator.as_object().expect("iterator object").clone();
    let args = CallArguments::new();
    assert_eq!(iterator.call(&mut runtime, &args), Value::int(10));

    // The iterator observes growth that happens mid-walk.
    set_index(&array, &mut runtime, 2, Value::int(30));
    assert_eq!(iterator.call(&mut runtime, &args), Value::int(20));
    assert_eq!(iterator.call(&mut runtime, &args), Value::int(30));
    // Exhaustion is signalled by void, repeatedly.
    assert_eq!(iterator.call(&mut runtime, &args), Value::VOID);
    assert_eq!(iterator.call(&mut runtime, &args), Value::VOID);
}

#[test]
fn test_arrays_are_not_callable() {
    let mut runtime = Runtime::new();
    let array = vanilla::array();
    let result = array.call(&mut runtime, &CallArguments::new());
    assert!(result.has(Kind::EXCEPTION));
    assert!(result
        .to_display()
        .contains("Arrays do not support calling with '()'"));
}

#[test]
fn test_object_properties_and_string_index() {
    let mut runtime = Runtime::new();
    let object = vanilla::object();
    object.set_property(&mut runtime, &Str::new("name"), Value::string("egg"));
    assert_eq!(
        object.get_property(&mut runtime, &Str::new("name")),
        Value::string("egg")
    );
    // String indexing is property access.
    assert_eq!(
        object.get_index(&mut runtime, &Value::string("name")),
        Value::string("egg")
    );
    let missing = object.get_property(&mut runtime, &Str::new("other"));
    assert!(missing.has(Kind::EXCEPTION));
    assert!(missing
        .to_display()
        .contains("Object does not support property 'other'"));
    let bad_index = object.get_index(&mut runtime, &Value::int(0));
    assert!(bad_index
        .to_display()
        .contains("Object index (property name) was expected to be 'string', not 'int'"));
}

#[test]
fn test_object_display_preserves_insertion_order() {
    let mut runtime = Runtime::new();
    let object = vanilla::object();
    assert_eq!(object.to_display(), "{}");
    object.set_property(&mut runtime, &Str::new("b"), Value::int(2));
    object.set_property(&mut runtime, &Str::new("a"), Value::int(1));
    assert_eq!(object.to_display(), "{b:2,a:1}");
}

#[test]
fn test_dictionary_iteration_snapshots() {
    let mut runtime = Runtime::new();
    let object = vanilla::object();
    object.set_property(&mut runtime, &Str::new("x"), Value::int(1));
    object.set_property(&mut runtime, &Str::new("y"), Value::int(2));

    let iterator = object.iterate(&mut runtime);
    let iterator = iterator.as_object().expect("iterator object").clone();

    // Mutation after creation is invisible to the snapshot.
    object.set_property(&mut runtime, &Str::new("z"), Value::int(3));

    let args = CallArguments::new();
    let first = iterator.call(&mut runtime, &args);
    let first = first.as_object().expect("key-value object");
    assert_eq!(
        first.get_property(&mut runtime, &Str::new("key")),
        Value::string("x")
    );
    assert_eq!(
        first.get_property(&mut runtime, &Str::new("value")),
        Value::int(1)
    );

    let second = iterator.call(&mut runtime, &args);
    let second = second.as_object().expect("key-value object");
    assert_eq!(
        second.get_property(&mut runtime, &Str::new("key")),
        Value::string("y")
    );
    assert_eq!(iterator.call(&mut runtime, &args), Value::VOID);
}

#[test]
fn test_key_value_contract() {
    let mut runtime = Runtime::new();
    let pair = vanilla::key_value(Value::string("k"), Value::int(7));
    assert_eq!(pair.to_display(), "{key:k,value:7}");
    assert_eq!(
        pair.get_property(&mut runtime, &Str::new("key")),
        Value::string("k")
    );
    assert_eq!(
        pair.get_property(&mut runtime, &Str::new("value")),
        Value::int(7)
    );
    let rejected = pair.set_property(&mut runtime, &Str::new("key"), Value::NULL);
    assert!(rejected.has(Kind::EXCEPTION));
    let iterated = pair.iterate(&mut runtime);
    assert!(iterated
        .to_display()
        .contains("Key-values do not support iteration"));
}

#[test]
fn test_exception_display() {
    use egg_runtime::{RuntimeLocation, SourceLocation};
    let location = RuntimeLocation::new("demo.egg", SourceLocation::new(4, 2));
    let raised = Value::raise(&location, "something fell over");
    assert_eq!(raised.to_display(), "demo.egg(4,2): something fell over");

    // Exceptions are dictionaries: the entries are reachable.
    let mut runtime = Runtime::new();
    let object = raised.as_object().expect("exception object");
    assert_eq!(
        object.get_property(&mut runtime, &Str::new("message")),
        Value::string("something fell over")
    );
    assert_eq!(
        object.get_property(&mut runtime, &Str::new("location")),
        Value::string("demo.egg(4,2)")
    );
}
