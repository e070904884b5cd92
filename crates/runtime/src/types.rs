//! The structural type lattice consumed by preparation and execution.

use crate::kind::Kind;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Whether an assignment can succeed, seen from the target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignability {
    Never,
    Sometimes,
    Always,
}

/// Flags on a callable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterFlags(u8);

impl ParameterFlags {
    pub const NONE: ParameterFlags = ParameterFlags(0);
    /// Not optional.
    pub const REQUIRED: ParameterFlags = ParameterFlags(1 << 0);
    /// Zero or more repetitions; absorbs all remaining positionals.
    pub const VARIADIC: ParameterFlags = ParameterFlags(1 << 1);
    /// The argument is rewritten into a predicate form before
    /// preparation (used by `assert`).
    pub const PREDICATE: ParameterFlags = ParameterFlags(1 << 2);

    pub const fn has(self, flags: ParameterFlags) -> bool {
        self.0 & flags.0 != 0
    }

    pub const fn with(self, flags: ParameterFlags) -> ParameterFlags {
        ParameterFlags(self.0 | flags.0)
    }
}

/// A named, typed callable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
    pub flags: ParameterFlags,
}

impl Parameter {
    pub fn required(name: impl Into<String>, ty: Type) -> Self {
        Parameter {
            name: name.into(),
            ty,
            flags: ParameterFlags::REQUIRED,
        }
    }

    pub fn variadic(name: impl Into<String>, ty: Type) -> Self {
        Parameter {
            name: name.into(),
            ty,
            flags: ParameterFlags::VARIADIC,
        }
    }
}

/// A callable signature: function name, result type and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub result: Type,
    pub params: Vec<Parameter>,
}

impl Signature {
    pub fn new(name: impl Into<String>, result: Type, params: Vec<Parameter>) -> Self {
        Signature {
            name: name.into(),
            result,
            params,
        }
    }

    /// The anonymous rendering used by type display: `int(int, string...)`.
    pub fn type_string(&self) -> String {
        let mut out = format!("{}(", self.result);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&param.ty.to_string());
            if param.flags.has(ParameterFlags::VARIADIC) {
                out.push_str("...");
            }
        }
        out.push(')');
        out
    }
}

/// The index contract of an indexable type.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSignature {
    pub result: Type,
    pub index: Type,
}

/// A type descriptor.
///
/// Simple types are a bit-set of storage tags (`int`, `any?`, `bool|int`);
/// the remaining variants are the composite and object-backed types the
/// front end needs. Capability queries return `None`/`Err` rather than
/// relying on downcasts.
#[derive(Debug, Clone)]
pub enum Type {
    /// Declared with `var`; resolved during preparation.
    Inferred,
    Simple(Kind),
    Pointer(Box<Type>),
    /// A union where at least one side is not simple; simple unions
    /// collapse into `Simple`.
    Union(Box<Type>, Box<Type>),
    Function(Arc<Signature>),
    /// The vanilla array type `any?[]`.
    Array,
    /// The vanilla dictionary/object type `any?{string}`.
    Map,
    /// The vanilla exception type.
    Exception,
    /// The vanilla key-value pair type.
    KeyValue,
    /// The vanilla iterator type.
    Iterator,
}

impl Type {
    pub const VOID: Type = Type::Simple(Kind::VOID);
    pub const NULL: Type = Type::Simple(Kind::NULL);
    pub const BOOL: Type = Type::Simple(Kind::BOOL);
    pub const INT: Type = Type::Simple(Kind::INT);
    pub const FLOAT: Type = Type::Simple(Kind::FLOAT);
    pub const STRING: Type = Type::Simple(Kind::STRING);
    pub const OBJECT: Type = Type::Simple(Kind::OBJECT);
    pub const TYPE: Type = Type::Simple(Kind::TYPE);
    pub const ARITHMETIC: Type = Type::Simple(Kind::ARITHMETIC);
    pub const ANY: Type = Type::Simple(Kind::ANY);
    pub const ANY_Q: Type = Type::Simple(Kind::ANY_Q);

    pub fn simple(bits: Kind) -> Type {
        Type::Simple(bits)
    }

    pub fn function(signature: Signature) -> Type {
        Type::Function(Arc::new(signature))
    }

    /// The storage tags this type admits; empty for composites that do
    /// not reduce to storage tags.
    pub fn simple_bits(&self) -> Kind {
        match self {
            Type::Inferred => Kind::NONE,
            Type::Simple(bits) => *bits,
            Type::Pointer(_) | Type::Union(_, _) => Kind::NONE,
            Type::Function(_)
            | Type::Array
            | Type::Map
            | Type::Exception
            | Type::KeyValue
            | Type::Iterator => Kind::OBJECT,
        }
    }

    /// True when the type admits any of the storage tags in `mask`.
    pub fn has(&self, mask: Kind) -> bool {
        self.simple_bits().has_any(mask)
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self, Type::Inferred)
    }

    /// Assignment compatibility seen from the target (`self`).
    ///
    /// For simple types: subset means `Always`, overlap means
    /// `Sometimes`, and `int` promotes into a `float` target as
    /// `Sometimes` (overflow is a runtime concern). Composite targets
    /// are conservative: identical types always accept, anything else
    /// may.
    pub fn can_be_assigned_from(&self, rhs: &Type) -> Assignability {
        match self {
            Type::Simple(lhs) => {
                let rhs = rhs.simple_bits();
                if rhs.is_empty() {
                    return Assignability::Never;
                }
                let intersection = lhs.mask(rhs);
                if intersection == rhs {
                    Assignability::Always
                } else if !intersection.is_empty() {
                    Assignability::Sometimes
                } else if lhs.has_any(Kind::FLOAT) && rhs.has_any(Kind::INT) {
                    Assignability::Sometimes
                } else {
                    Assignability::Never
                }
            }
            Type::Inferred => Assignability::Never,
            _ => {
                if self == rhs {
                    Assignability::Always
                } else {
                    Assignability::Sometimes
                }
            }
        }
    }

    /// Coerce `rhs` for assignment into a target of this type,
    /// widening `int` to `float` where the target requires it.
    pub fn promote_assignment(&self, rhs: &Value) -> Result<Value, String> {
        let storage = rhs.storage_kind();
        match self {
            Type::Simple(lhs) => {
                if lhs.has_any(storage) {
                    return Ok(rhs.clone());
                }
                if lhs.has_any(Kind::FLOAT) && storage == Kind::INT {
                    if let Some(i) = rhs.as_int() {
                        return Ok(Value::float(i as f64));
                    }
                }
                Err(format!(
                    "Cannot assign a value of type '{}' to a target of type '{}'",
                    rhs.runtime_type(),
                    self
                ))
            }
            _ => {
                if storage == Kind::OBJECT {
                    Ok(rhs.clone())
                } else {
                    Err(format!(
                        "Cannot assign a value of type '{}' to a target of type '{}'",
                        rhs.runtime_type(),
                        self
                    ))
                }
            }
        }
    }

    /// The callable signature, for function-like types.
    pub fn callable(&self) -> Option<&Signature> {
        match self {
            Type::Function(signature) => Some(signature),
            _ => None,
        }
    }

    /// The index contract, for indexable types.
    pub fn indexable(&self) -> Option<IndexSignature> {
        match self {
            Type::Array => Some(IndexSignature {
                result: Type::ANY_Q,
                index: Type::INT,
            }),
            Type::Map | Type::Exception => Some(IndexSignature {
                result: Type::ANY_Q,
                index: Type::STRING,
            }),
            Type::Simple(bits) if bits.has_any(Kind::OBJECT) => Some(IndexSignature {
                result: Type::ANY_Q,
                index: Type::ANY_Q,
            }),
            _ => None,
        }
    }

    /// The type of the named property, or the reason it is rejected.
    pub fn dotable(&self, property: &str) -> Result<Type, String> {
        match self {
            Type::Array => {
                if property == "length" {
                    Ok(Type::INT)
                } else {
                    Err(format!("Arrays do not support property '.{}'", property))
                }
            }
            Type::Map | Type::Exception => Ok(Type::ANY_Q),
            Type::KeyValue => match property {
                "key" | "value" => Ok(Type::ANY_Q),
                _ => Err(format!(
                    "Key-values do not support property: '.{}'",
                    property
                )),
            },
            Type::Iterator => Err(format!(
                "Iterators do not support properties: '.{}'",
                property
            )),
            Type::Simple(bits) if bits.has_any(Kind::OBJECT) => Ok(Type::ANY_Q),
            _ => Err(format!(
                "Values of type '{}' do not support properties",
                self
            )),
        }
    }

    /// The element type produced by `for-each` iteration, if any.
    pub fn iterable(&self) -> Option<Type> {
        match self {
            Type::Array => Some(Type::ANY_Q),
            Type::Map | Type::Exception => Some(Type::KeyValue),
            Type::Iterator => Some(Type::ANY_Q),
            Type::Simple(bits) if bits.has_any(Kind::OBJECT) => Some(Type::ANY_Q),
            Type::Simple(bits) if bits.has_any(Kind::STRING) => Some(Type::STRING),
            _ => None,
        }
    }

    /// The union of the two types; simple unions collapse into one
    /// simple bit-set, so `null | T == T` whenever `T` already admits
    /// `null`.
    pub fn union_with(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Type::Simple(a), Type::Simple(b)) => Type::Simple(a.set(*b)),
            _ => Type::Union(Box::new(self.clone()), Box::new(other.clone())),
        }
    }

    /// Strip `null`; `None` when nothing remains.
    pub fn denulled(&self) -> Option<Type> {
        match self {
            Type::Simple(bits) => {
                let stripped = bits.clear(Kind::NULL);
                if stripped.is_empty() {
                    None
                } else {
                    Some(Type::Simple(stripped))
                }
            }
            _ => Some(self.clone()),
        }
    }

    /// Strip `void`; `None` when nothing remains.
    pub fn devoided(&self) -> Option<Type> {
        match self {
            Type::Simple(bits) => {
                let stripped = bits.clear(Kind::VOID);
                if stripped.is_empty() {
                    None
                } else {
                    Some(Type::Simple(stripped))
                }
            }
            Type::Inferred => None,
            _ => Some(self.clone()),
        }
    }

    /// `denulled(self) ∪ other` — the result type of `??`.
    pub fn coalesced(&self, other: &Type) -> Type {
        match self.denulled() {
            Some(stripped) => stripped.union_with(other),
            None => other.clone(),
        }
    }

    /// The referenced type, for pointer types.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// The address-of type `self*`.
    pub fn pointer(&self) -> Type {
        Type::Pointer(Box::new(self.clone()))
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Inferred, Type::Inferred) => true,
            (Type::Simple(a), Type::Simple(b)) => a == b,
            (Type::Pointer(a), Type::Pointer(b)) => a == b,
            (Type::Union(a1, a2), Type::Union(b1, b2)) => a1 == b1 && a2 == b2,
            (Type::Function(a), Type::Function(b)) => Arc::ptr_eq(a, b) || a == b,
            (Type::Array, Type::Array)
            | (Type::Map, Type::Map)
            | (Type::Exception, Type::Exception)
            | (Type::KeyValue, Type::KeyValue)
            | (Type::Iterator, Type::Iterator) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Inferred => f.write_str("var"),
            Type::Simple(bits) => f.write_str(&bits.tag_string()),
            Type::Pointer(inner) => write!(f, "{}*", inner),
            Type::Union(a, b) => write!(f, "{}|{}", a, b),
            Type::Function(signature) => f.write_str(&signature.type_string()),
            Type::Array => f.write_str("any?[]"),
            Type::Map => f.write_str("any?{string}"),
            Type::Exception => f.write_str("<exception>"),
            Type::KeyValue => f.write_str("<keyvalue>"),
            Type::Iterator => f.write_str("<iterator>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_assignability() {
        assert_eq!(
            Type::INT.can_be_assigned_from(&Type::INT),
            Assignability::Always
        );
        assert_eq!(
            Type::ANY_Q.can_be_assigned_from(&Type::STRING),
            Assignability::Always
        );
        assert_eq!(
            Type::INT.can_be_assigned_from(&Type::ANY_Q),
            Assignability::Sometimes
        );
        assert_eq!(
            Type::FLOAT.can_be_assigned_from(&Type::INT),
            Assignability::Sometimes
        );
        assert_eq!(
            Type::INT.can_be_assigned_from(&Type::STRING),
            Assignability::Never
        );
    }

    #[test]
    fn test_promote_assignment_widens_int() {
        let widened = Type::FLOAT.promote_assignment(&Value::int(42)).unwrap();
        assert_eq!(widened.as_float(), Some(42.0));
        let exact = Type::INT.promote_assignment(&Value::int(7)).unwrap();
        assert_eq!(exact.as_int(), Some(7));
        let err = Type::INT.promote_assignment(&Value::string("x")).unwrap_err();
        assert_eq!(
            err,
            "Cannot assign a value of type 'string' to a target of type 'int'"
        );
    }

    #[test]
    fn test_union_collapses_simple() {
        let both = Type::INT.union_with(&Type::FLOAT);
        assert_eq!(both, Type::ARITHMETIC);
        // null | T is T when T already admits null
        let nullable = Type::ANY_Q.union_with(&Type::NULL);
        assert_eq!(nullable, Type::ANY_Q);
    }

    #[test]
    fn test_denulled_and_devoided() {
        assert_eq!(Type::ANY_Q.denulled(), Some(Type::ANY));
        assert_eq!(Type::NULL.denulled(), None);
        assert_eq!(Type::VOID.devoided(), None);
        assert_eq!(
            Type::Simple(Kind::INT | Kind::VOID).devoided(),
            Some(Type::INT)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::INT.to_string(), "int");
        assert_eq!(Type::ANY_Q.to_string(), "any?");
        assert_eq!(Type::Simple(Kind::INT | Kind::NULL).to_string(), "int?");
        assert_eq!(Type::INT.pointer().to_string(), "int*");
        assert_eq!(Type::Array.to_string(), "any?[]");
        assert_eq!(Type::Inferred.to_string(), "var");
    }

    #[test]
    fn test_capabilities() {
        assert!(Type::Array.indexable().is_some());
        assert!(Type::INT.indexable().is_none());
        assert_eq!(Type::Array.dotable("length"), Ok(Type::INT));
        assert!(Type::Array.dotable("size").is_err());
        assert_eq!(Type::Array.iterable(), Some(Type::ANY_Q));
        assert_eq!(Type::STRING.iterable(), Some(Type::STRING));
        assert_eq!(Type::INT.iterable(), None);
    }

    #[test]
    fn test_always_assignable_promotes() {
        // Every value of a type that is Always-assignable must promote.
        let candidates = [Value::int(1), Value::string("s"), Value::bool(true)];
        for value in &candidates {
            let target = Type::ANY_Q;
            assert_eq!(
                target.can_be_assigned_from(&value.runtime_type()),
                Assignability::Always
            );
            assert!(target.promote_assignment(value).is_ok());
        }
    }
}
