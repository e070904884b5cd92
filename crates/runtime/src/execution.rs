//! The capability surface the runtime raises, prints and asserts
//! through, plus the parameter protocol handed to callables.

use crate::location::RuntimeLocation;
use crate::string::Str;
use crate::value::Value;

/// What a running program may ask of its host.
pub trait Execution {
    /// The location of the currently-executing construct.
    fn location(&self) -> &RuntimeLocation;

    /// Build an exception-tagged value for `message` at the current
    /// location.
    fn raise(&mut self, message: String) -> Value;

    /// Evaluate an assertion predicate; raises when it is not `true`.
    fn assertion(&mut self, predicate: Value) -> Value;

    /// Emit program output.
    fn print(&mut self, utf8: &str);
}

/// The argument protocol a callable receives: positional values with
/// optional source locations, plus named arguments.
pub trait Parameters {
    fn positional_count(&self) -> usize;
    fn positional(&self, index: usize) -> Option<Value>;
    fn positional_location(&self, index: usize) -> Option<&RuntimeLocation>;
    fn named_count(&self) -> usize;
    fn name(&self, index: usize) -> Option<&Str>;
    fn named(&self, name: &Str) -> Option<Value>;
}

/// A plain bundle of call arguments.
#[derive(Debug, Default)]
pub struct CallArguments {
    positional: Vec<(Value, Option<RuntimeLocation>)>,
    named: Vec<(Str, Value)>,
}

impl CallArguments {
    pub fn new() -> Self {
        CallArguments::default()
    }

    pub fn push(&mut self, value: Value) {
        self.positional.push((value, None));
    }

    pub fn push_located(&mut self, value: Value, location: RuntimeLocation) {
        self.positional.push((value, Some(location)));
    }

    pub fn push_named(&mut self, name: Str, value: Value) {
        self.named.push((name, value));
    }
}

impl Parameters for CallArguments {
    fn positional_count(&self) -> usize {
        self.positional.len()
    }

    fn positional(&self, index: usize) -> Option<Value> {
        self.positional.get(index).map(|(value, _)| value.clone())
    }

    fn positional_location(&self, index: usize) -> Option<&RuntimeLocation> {
        self.positional
            .get(index)
            .and_then(|(_, location)| location.as_ref())
    }

    fn named_count(&self) -> usize {
        self.named.len()
    }

    fn name(&self, index: usize) -> Option<&Str> {
        self.named.get(index).map(|(name, _)| name)
    }

    fn named(&self, name: &Str) -> Option<Value> {
        self.named
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value.clone())
    }
}

/// A concrete execution sink that buffers program output.
///
/// The evaluator and the tests both drive the vanilla objects through
/// this; a future interactive host would swap in its own sink.
#[derive(Debug, Default)]
pub struct Runtime {
    location: RuntimeLocation,
    output: String,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime::default()
    }

    pub fn set_location(&mut self, location: RuntimeLocation) {
        self.location = location;
    }

    /// Everything printed so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl Execution for Runtime {
    fn location(&self) -> &RuntimeLocation {
        &self.location
    }

    fn raise(&mut self, message: String) -> Value {
        Value::raise(&self.location, message)
    }

    fn assertion(&mut self, predicate: Value) -> Value {
        match predicate.as_bool() {
            Some(true) => Value::VOID,
            Some(false) => self.raise("Assertion is untrue".to_string()),
            None => self.raise(format!(
                "Expected assertion predicate to be 'bool', but got '{}' instead",
                predicate.runtime_type()
            )),
        }
    }

    fn print(&mut self, utf8: &str) {
        self.output.push_str(utf8);
        self.output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Kind;

    #[test]
    fn test_print_buffers_lines() {
        let mut runtime = Runtime::new();
        runtime.print("hello");
        runtime.print("world");
        assert_eq!(runtime.output(), "hello\nworld\n");
    }

    #[test]
    fn test_assertion() {
        let mut runtime = Runtime::new();
        assert_eq!(runtime.assertion(Value::TRUE), Value::VOID);
        assert!(runtime.assertion(Value::FALSE).has(Kind::EXCEPTION));
        assert!(runtime.assertion(Value::int(1)).has(Kind::EXCEPTION));
    }

    #[test]
    fn test_call_arguments() {
        let mut args = CallArguments::new();
        args.push(Value::int(1));
        args.push_named(Str::new("flag"), Value::TRUE);
        assert_eq!(args.positional_count(), 1);
        assert_eq!(args.positional(0), Some(Value::int(1)));
        assert_eq!(args.named(&Str::new("flag")), Some(Value::TRUE));
        assert_eq!(args.named(&Str::new("missing")), None);
    }
}
