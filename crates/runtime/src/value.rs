//! The tagged value union with flow-control overlays.

use crate::kind::Kind;
use crate::location::RuntimeLocation;
use crate::string::Str;
use crate::types::Type;
use crate::vanilla::{self, ObjectRef};
use std::fmt;

/// The live payload slot; exactly one per value.
#[derive(Debug, Clone)]
enum Repr {
    Void,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Str),
    Object(ObjectRef),
    Type(Type),
}

/// A dynamically-typed value.
///
/// The storage tag is determined by the payload; flow-control bits
/// (`break`, `continue`, `return`, `yield`, `exception`) may be OR-ed
/// on top and must be stripped by whoever handles them.
#[derive(Debug, Clone)]
pub struct Value {
    flow: Kind,
    repr: Repr,
}

impl Value {
    pub const VOID: Value = Value {
        flow: Kind::NONE,
        repr: Repr::Void,
    };
    pub const NULL: Value = Value {
        flow: Kind::NONE,
        repr: Repr::Null,
    };
    pub const TRUE: Value = Value {
        flow: Kind::NONE,
        repr: Repr::Bool(true),
    };
    pub const FALSE: Value = Value {
        flow: Kind::NONE,
        repr: Repr::Bool(false),
    };
    /// The `break` flow marker.
    pub const BREAK: Value = Value {
        flow: Kind::BREAK,
        repr: Repr::Void,
    };
    /// The `continue` flow marker.
    pub const CONTINUE: Value = Value {
        flow: Kind::CONTINUE,
        repr: Repr::Void,
    };
    /// A bare `throw;`: exception flow with no payload.
    pub const RETHROW: Value = Value {
        flow: Kind::EXCEPTION,
        repr: Repr::Void,
    };
    /// A `return;` with no value.
    pub const RETURN_VOID: Value = Value {
        flow: Kind::RETURN,
        repr: Repr::Void,
    };

    pub fn bool(value: bool) -> Value {
        Value {
            flow: Kind::NONE,
            repr: Repr::Bool(value),
        }
    }

    pub fn int(value: i64) -> Value {
        Value {
            flow: Kind::NONE,
            repr: Repr::Int(value),
        }
    }

    pub fn float(value: f64) -> Value {
        Value {
            flow: Kind::NONE,
            repr: Repr::Float(value),
        }
    }

    pub fn string(value: impl Into<Str>) -> Value {
        Value {
            flow: Kind::NONE,
            repr: Repr::String(value.into()),
        }
    }

    pub fn object(value: ObjectRef) -> Value {
        Value {
            flow: Kind::NONE,
            repr: Repr::Object(value),
        }
    }

    pub fn type_handle(value: Type) -> Value {
        Value {
            flow: Kind::NONE,
            repr: Repr::Type(value),
        }
    }

    /// Build an exception-tagged value carrying a fresh vanilla
    /// exception object for `message` at `location`.
    pub fn raise(location: &RuntimeLocation, message: impl Into<Str>) -> Value {
        let mut value = Value::object(vanilla::exception(location, message.into()));
        value.add_flow_control(Kind::EXCEPTION);
        value
    }

    /// The storage tag implied by the live payload.
    pub fn storage_kind(&self) -> Kind {
        match &self.repr {
            Repr::Void => Kind::VOID,
            Repr::Null => Kind::NULL,
            Repr::Bool(_) => Kind::BOOL,
            Repr::Int(_) => Kind::INT,
            Repr::Float(_) => Kind::FLOAT,
            Repr::String(_) => Kind::STRING,
            Repr::Object(_) => Kind::OBJECT,
            Repr::Type(_) => Kind::TYPE,
        }
    }

    /// Storage tag plus any flow-control bits.
    pub fn kind(&self) -> Kind {
        self.storage_kind().set(self.flow)
    }

    /// Exact-tag test against storage plus flow bits.
    pub fn is(&self, kind: Kind) -> bool {
        self.kind() == kind
    }

    /// Any-bit test against storage plus flow bits.
    pub fn has(&self, mask: Kind) -> bool {
        self.kind().has_any(mask)
    }

    pub fn has_flow_control(&self) -> bool {
        !self.flow.is_empty()
    }

    /// OR flow-control bits onto this value. The value must not
    /// already carry flow control.
    pub fn add_flow_control(&mut self, bits: Kind) {
        debug_assert_eq!(bits.mask(Kind::FLOW_CONTROL), bits);
        debug_assert!(self.flow.is_empty());
        self.flow = self.flow.set(bits);
    }

    /// Clear any of `bits` that are set; reports whether any were.
    pub fn strip_flow_control(&mut self, bits: Kind) -> bool {
        debug_assert_eq!(bits.mask(Kind::FLOW_CONTROL), bits);
        if self.flow.has_any(bits) {
            self.flow = self.flow.clear(bits);
            true
        } else {
            false
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.repr {
            Repr::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match &self.repr {
            Repr::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match &self.repr {
            Repr::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&Str> {
        match &self.repr {
            Repr::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match &self.repr {
            Repr::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match &self.repr {
            Repr::Type(t) => Some(t),
            _ => None,
        }
    }

    /// The runtime type of the stored payload.
    pub fn runtime_type(&self) -> Type {
        match &self.repr {
            Repr::Void => Type::VOID,
            Repr::Null => Type::NULL,
            Repr::Bool(_) => Type::BOOL,
            Repr::Int(_) => Type::INT,
            Repr::Float(_) => Type::FLOAT,
            Repr::String(_) => Type::STRING,
            Repr::Object(o) => o.runtime_type(),
            Repr::Type(_) => Type::TYPE,
        }
    }

    /// User-facing rendering; `print` routes through this.
    pub fn to_display(&self) -> String {
        match &self.repr {
            Repr::Void => "[void]".to_string(),
            Repr::Null => "null".to_string(),
            Repr::Bool(b) => b.to_string(),
            Repr::Int(i) => i.to_string(),
            Repr::Float(f) => format!("{:?}", f),
            Repr::String(s) => s.as_str().to_string(),
            Repr::Object(o) => o.to_display(),
            Repr::Type(t) => format!("[{}]", t),
        }
    }
}

/// Pairwise equality: tags must match (including flow bits), then the
/// payloads compare — strings by content, objects by handle identity,
/// floats by IEEE `==` so `NaN != NaN`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match (&self.repr, &other.repr) {
            (Repr::Void, Repr::Void) | (Repr::Null, Repr::Null) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::Int(a), Repr::Int(b)) => a == b,
            (Repr::Float(a), Repr::Float(b)) => a == b,
            (Repr::String(a), Repr::String(b)) => a == b,
            (Repr::Object(a), Repr::Object(b)) => a.same_object(b),
            (Repr::Type(a), Repr::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}
