//! Vanilla runtime objects: array, dictionary/object, key-value,
//! exception and the iterators over them.
//!
//! Every object implements the duck-typed protocol of
//! [`VanillaObject`]; unsupported operations raise through the
//! [`Execution`] surface rather than panicking.

use crate::execution::{Execution, Parameters};
use crate::location::RuntimeLocation;
use crate::string::Str;
use crate::types::Type;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Indices and lengths at or above this are rejected outright.
const MAX_ARRAY_INDEX: i64 = 0x7FFF_FFFF;

/// The behavior protocol shared by all vanilla objects.
///
/// Defaults implement the common contract: calling raises, indexing
/// with a string delegates to the property table, iteration raises.
pub trait VanillaObject {
    /// User-facing noun for diagnostics ("Array", "Key-value", ...).
    fn kind_name(&self) -> &'static str;

    fn runtime_type(&self) -> Type;

    fn to_display(&self) -> String;

    fn call(&mut self, execution: &mut dyn Execution, _parameters: &dyn Parameters) -> Value {
        let message = format!("{}s do not support calling with '()'", self.kind_name());
        execution.raise(message)
    }

    fn get_property(&self, execution: &mut dyn Execution, property: &Str) -> Value {
        let message = format!(
            "{}s do not support properties: '.{}'",
            self.kind_name(),
            property
        );
        execution.raise(message)
    }

    fn set_property(
        &mut self,
        execution: &mut dyn Execution,
        property: &Str,
        _value: Value,
    ) -> Value {
        let message = format!(
            "{}s do not support properties: '.{}'",
            self.kind_name(),
            property
        );
        execution.raise(message)
    }

    fn get_index(&self, execution: &mut dyn Execution, index: &Value) -> Value {
        match index.as_string() {
            Some(property) => self.get_property(execution, &property.clone()),
            None => execution.raise(format!(
                "{} index (property name) was expected to be 'string', not '{}'",
                self.kind_name(),
                index.runtime_type()
            )),
        }
    }

    fn set_index(&mut self, execution: &mut dyn Execution, index: &Value, value: Value) -> Value {
        match index.as_string() {
            Some(property) => self.set_property(execution, &property.clone(), value),
            None => execution.raise(format!(
                "{} index (property name) was expected to be 'string', not '{}'",
                self.kind_name(),
                index.runtime_type()
            )),
        }
    }

    fn iterate(&self, execution: &mut dyn Execution, _this: &ObjectRef) -> Value {
        let message = format!("{}s do not support iteration", self.kind_name());
        execution.raise(message)
    }

    /// Live positional read used by array iterators; `None` for
    /// non-positional objects or past the end.
    fn element(&self, _index: usize) -> Option<Value> {
        None
    }
}

/// A shared, mutable handle to a vanilla object. Equality between
/// handles is identity, never structure.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<dyn VanillaObject>>);

impl ObjectRef {
    pub fn new(object: impl VanillaObject + 'static) -> Self {
        ObjectRef(Rc::new(RefCell::new(object)))
    }

    pub fn same_object(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles, counting this one. The basket uses this
    /// to decide whether it is the last owner.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn kind_name(&self) -> &'static str {
        self.0.borrow().kind_name()
    }

    pub fn runtime_type(&self) -> Type {
        self.0.borrow().runtime_type()
    }

    pub fn to_display(&self) -> String {
        self.0.borrow().to_display()
    }

    pub fn call(&self, execution: &mut dyn Execution, parameters: &dyn Parameters) -> Value {
        self.0.borrow_mut().call(execution, parameters)
    }

    pub fn get_property(&self, execution: &mut dyn Execution, property: &Str) -> Value {
        self.0.borrow().get_property(execution, property)
    }

    pub fn set_property(&self, execution: &mut dyn Execution, property: &Str, value: Value) -> Value {
        self.0.borrow_mut().set_property(execution, property, value)
    }

    pub fn get_index(&self, execution: &mut dyn Execution, index: &Value) -> Value {
        self.0.borrow().get_index(execution, index)
    }

    pub fn set_index(&self, execution: &mut dyn Execution, index: &Value, value: Value) -> Value {
        self.0.borrow_mut().set_index(execution, index, value)
    }

    pub fn iterate(&self, execution: &mut dyn Execution) -> Value {
        self.0.borrow().iterate(execution, self)
    }

    fn element(&self, index: usize) -> Option<Value> {
        self.0.borrow().element(index)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.kind_name())
    }
}

/// Fresh empty vanilla array.
pub fn array() -> ObjectRef {
    ObjectRef::new(Array::default())
}

/// Fresh empty vanilla object (string-keyed dictionary).
pub fn object() -> ObjectRef {
    ObjectRef::new(Dictionary::new(DictionaryKind::Object))
}

/// Key-value pair object.
pub fn key_value(key: Value, value: Value) -> ObjectRef {
    ObjectRef::new(KeyValue { key, value })
}

/// Exception object: a dictionary prepopulated with `message` and
/// `location` entries.
pub fn exception(location: &RuntimeLocation, message: Str) -> ObjectRef {
    let mut dictionary = Dictionary::new(DictionaryKind::Exception);
    dictionary
        .entries
        .insert(Str::new("message"), Value::string(message));
    dictionary.entries.insert(
        Str::new("location"),
        Value::string(location.to_source_string()),
    );
    ObjectRef::new(dictionary)
}

/// An ordered sequence of values indexed `0..length`.
#[derive(Default)]
pub struct Array {
    values: Vec<Value>,
}

impl VanillaObject for Array {
    fn kind_name(&self) -> &'static str {
        "Array"
    }

    fn runtime_type(&self) -> Type {
        Type::Array
    }

    fn to_display(&self) -> String {
        if self.values.is_empty() {
            return "[]".to_string();
        }
        let mut out = String::new();
        let mut between = '[';
        for value in &self.values {
            out.push(between);
            out.push_str(&value.to_display());
            between = ',';
        }
        out.push(']');
        out
    }

    fn get_property(&self, execution: &mut dyn Execution, property: &Str) -> Value {
        if property.as_str() == "length" {
            return Value::int(self.values.len() as i64);
        }
        execution.raise(format!("Arrays do not support property '.{}'", property))
    }

    fn set_property(&mut self, execution: &mut dyn Execution, property: &Str, value: Value) -> Value {
        if property.as_str() == "length" {
            return self.set_length(execution, value);
        }
        execution.raise(format!("Arrays do not support property '.{}'", property))
    }

    fn get_index(&self, execution: &mut dyn Execution, index: &Value) -> Value {
        let i = match index.as_int() {
            Some(i) => i,
            None => {
                return execution.raise(format!(
                    "Array index was expected to be 'int', not '{}'",
                    index.runtime_type()
                ))
            }
        };
        if i < 0 || i as usize >= self.values.len() || i >= MAX_ARRAY_INDEX {
            return execution.raise(format!(
                "Invalid array index for an array with {} element(s): {}",
                self.values.len(),
                i
            ));
        }
        self.values[i as usize].clone()
    }

    fn set_index(&mut self, execution: &mut dyn Execution, index: &Value, value: Value) -> Value {
        let i = match index.as_int() {
            Some(i) => i,
            None => {
                return execution.raise(format!(
                    "Array index was expected to be 'int', not '{}'",
                    index.runtime_type()
                ))
            }
        };
        if i < 0 || i >= MAX_ARRAY_INDEX {
            return execution.raise(format!("Invalid array index: {}", i));
        }
        let i = i as usize;
        if i >= self.values.len() {
            self.values.resize(i + 1, Value::NULL);
        }
        self.values[i] = value;
        Value::VOID
    }

    fn iterate(&self, _execution: &mut dyn Execution, this: &ObjectRef) -> Value {
        Value::object(ObjectRef::new(ArrayIterator {
            array: this.clone(),
            next: 0,
        }))
    }

    fn element(&self, index: usize) -> Option<Value> {
        self.values.get(index).cloned()
    }
}

impl Array {
    fn set_length(&mut self, execution: &mut dyn Execution, value: Value) -> Value {
        let n = match value.as_int() {
            Some(n) => n,
            None => {
                return execution.raise(format!(
                    "Array length was expected to be set to an 'int', not '{}'",
                    value.runtime_type()
                ))
            }
        };
        if n < 0 || n >= MAX_ARRAY_INDEX {
            return execution.raise(format!("Invalid array length: {}", n));
        }
        self.values.resize(n as usize, Value::NULL);
        Value::VOID
    }
}

/// An iterator over an array, reading the live array by index.
///
/// Mutation during iteration is observed: growth extends the walk,
/// truncation ends it early. The language leaves this unspecified.
struct ArrayIterator {
    array: ObjectRef,
    next: usize,
}

impl VanillaObject for ArrayIterator {
    fn kind_name(&self) -> &'static str {
        "Iterator"
    }

    fn runtime_type(&self) -> Type {
        Type::Iterator
    }

    fn to_display(&self) -> String {
        Type::Iterator.to_string()
    }

    fn call(&mut self, _execution: &mut dyn Execution, _parameters: &dyn Parameters) -> Value {
        match self.array.element(self.next) {
            Some(value) => {
                self.next += 1;
                value
            }
            None => Value::VOID,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DictionaryKind {
    Object,
    Exception,
}

/// A string-keyed dictionary preserving insertion order.
pub struct Dictionary {
    kind: DictionaryKind,
    entries: IndexMap<Str, Value>,
}

impl Dictionary {
    fn new(kind: DictionaryKind) -> Self {
        Dictionary {
            kind,
            entries: IndexMap::new(),
        }
    }
}

impl VanillaObject for Dictionary {
    fn kind_name(&self) -> &'static str {
        match self.kind {
            DictionaryKind::Object => "Object",
            DictionaryKind::Exception => "Exception",
        }
    }

    fn runtime_type(&self) -> Type {
        match self.kind {
            DictionaryKind::Object => Type::Map,
            DictionaryKind::Exception => Type::Exception,
        }
    }

    fn to_display(&self) -> String {
        if self.kind == DictionaryKind::Exception {
            let mut out = String::new();
            if let Some(location) = self.entries.get(&Str::new("location")) {
                out.push_str(&location.to_display());
                out.push_str(": ");
            }
            match self.entries.get(&Str::new("message")) {
                Some(message) => out.push_str(&message.to_display()),
                None => out.push_str("Exception (no message)"),
            }
            return out;
        }
        if self.entries.is_empty() {
            return "{}".to_string();
        }
        let mut out = String::new();
        let mut between = '{';
        for (key, value) in &self.entries {
            out.push(between);
            out.push_str(key.as_str());
            out.push(':');
            out.push_str(&value.to_display());
            between = ',';
        }
        out.push('}');
        out
    }

    fn get_property(&self, execution: &mut dyn Execution, property: &Str) -> Value {
        match self.entries.get(property) {
            Some(value) => value.clone(),
            None => execution.raise(format!(
                "{} does not support property '{}'",
                self.kind_name(),
                property
            )),
        }
    }

    fn set_property(&mut self, _execution: &mut dyn Execution, property: &Str, value: Value) -> Value {
        self.entries.insert(property.clone(), value);
        Value::VOID
    }

    fn iterate(&self, _execution: &mut dyn Execution, _this: &ObjectRef) -> Value {
        // Snapshots the current key order; later mutation of the
        // dictionary is not observed by this iterator.
        Value::object(ObjectRef::new(DictionaryIterator {
            entries: self
                .entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            next: 0,
        }))
    }
}

/// An iterator over a dictionary snapshot, yielding key-value objects.
struct DictionaryIterator {
    entries: Vec<(Str, Value)>,
    next: usize,
}

impl VanillaObject for DictionaryIterator {
    fn kind_name(&self) -> &'static str {
        "Iterator"
    }

    fn runtime_type(&self) -> Type {
        Type::Iterator
    }

    fn to_display(&self) -> String {
        Type::Iterator.to_string()
    }

    fn call(&mut self, _execution: &mut dyn Execution, _parameters: &dyn Parameters) -> Value {
        match self.entries.get(self.next) {
            Some((key, value)) => {
                self.next += 1;
                Value::object(key_value(Value::string(key.clone()), value.clone()))
            }
            None => Value::VOID,
        }
    }
}

/// An immutable key-value pair produced by dictionary iteration.
pub struct KeyValue {
    key: Value,
    value: Value,
}

impl VanillaObject for KeyValue {
    fn kind_name(&self) -> &'static str {
        "Key-value"
    }

    fn runtime_type(&self) -> Type {
        Type::KeyValue
    }

    fn to_display(&self) -> String {
        format!(
            "{{key:{},value:{}}}",
            self.key.to_display(),
            self.value.to_display()
        )
    }

    fn get_property(&self, execution: &mut dyn Execution, property: &Str) -> Value {
        match property.as_str() {
            "key" => self.key.clone(),
            "value" => self.value.clone(),
            _ => execution.raise(format!(
                "Key-values do not support property: '.{}'",
                property
            )),
        }
    }

    fn set_property(&mut self, execution: &mut dyn Execution, property: &Str, _value: Value) -> Value {
        execution.raise(format!(
            "Key-values do not support addition or modification of properties: '.{}'",
            property
        ))
    }
}
