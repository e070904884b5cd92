//! Preparation pass behavior: severities, inference, reachability and
//! the per-node type rules.

use egg_parser::driver::{compile, Compilation};
use egg_parser::Severity;
use egg_runtime::Type;

fn prepare(source: &str) -> Compilation {
    compile("test", source).expect("source should promote")
}

fn severity(source: &str) -> Severity {
    prepare(source).severity
}

fn first_error(compilation: &Compilation) -> &str {
    compilation
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
        .map(|d| d.message.as_str())
        .expect("expected an error diagnostic")
}

fn first_warning(compilation: &Compilation) -> &str {
    compilation
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Warning)
        .map(|d| d.message.as_str())
        .expect("expected a warning diagnostic")
}

#[test]
fn test_empty_module_is_clean() {
    assert_eq!(severity(""), Severity::None);
}

#[test]
fn test_var_without_initializer_cannot_infer() {
    let compilation = prepare("var foo;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Cannot infer type of 'foo' declared with 'var'"
    );
}

#[test]
fn test_var_infers_from_initializer() {
    let compilation = prepare("var foo = 42;");
    assert_eq!(compilation.severity, Severity::None);
    assert_eq!(compilation.symbols.symbol_type("foo"), Some(Type::INT));
}

#[test]
fn test_nullable_any_accepts_string() {
    let compilation = prepare("any? bar = `hello`;");
    assert_eq!(compilation.severity, Severity::None);
    assert_eq!(compilation.symbols.symbol_type("bar"), Some(Type::ANY_Q));
}

#[test]
fn test_initializer_type_mismatch() {
    let compilation = prepare("int foo = `hello`;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Cannot initialize 'foo' of type 'int' with a value of type 'string'"
    );
}

#[test]
fn test_int_widens_into_float_target() {
    assert_eq!(severity("float f = 42;"), Severity::None);
}

#[test]
fn test_assignment_type_rules() {
    assert_eq!(severity("var a = 1; a = 2;"), Severity::None);
    let compilation = prepare("var a = 1; a = `x`;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Cannot assign a value of type 'string' to a target of type 'int'"
    );
}

#[test]
fn test_compound_assignment_rules() {
    assert_eq!(severity("var a = 1; a += 2;"), Severity::None);
    assert_eq!(severity("var a = 1; a <<= 2;"), Severity::None);
    let compilation = prepare("var s = `x`; s += 1;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expected left-hand target of '+=' assignment operator to be 'int' or 'float', but got 'string' instead"
    );
    let compilation = prepare("var a = 1; a <<= `x`;");
    assert_eq!(
        first_error(&compilation),
        "Expected right-hand side of integer '<<=' assignment operator to be 'int', but got 'string' instead"
    );
}

#[test]
fn test_mutate_requires_int() {
    assert_eq!(severity("var i = 0; ++i;"), Severity::None);
    let compilation = prepare("var s = `x`; ++s;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expected target of integer '++' operator to be 'int', but got 'string' instead"
    );
}

#[test]
fn test_duplicate_symbols_abandon() {
    let compilation = prepare("var a = 1; var a = 2;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(first_error(&compilation), "Duplicate symbol declared: 'a'");
}

#[test]
fn test_unknown_identifier() {
    let compilation = prepare("foo();");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(first_error(&compilation), "Unknown identifier: 'foo'");
}

#[test]
fn test_builtins_are_visible() {
    assert_eq!(severity("print(1, 2, 3);"), Severity::None);
    assert_eq!(severity("print(string(42));"), Severity::None);
    assert_eq!(severity("assert(1 == 2);"), Severity::None);
}

#[test]
fn test_call_requires_callable() {
    let compilation = prepare("var a = 1; a();");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expected function-like expression to be callable, but got 'int' instead"
    );
}

#[test]
fn test_call_arity() {
    let compilation = prepare("int f() { return 1; } f(1, 2);");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expected 0 parameters for 'int()', but got 2 instead"
    );
}

#[test]
fn test_non_void_statement_warns() {
    let compilation = prepare("int f() { return 1; } f();");
    assert_eq!(compilation.severity, Severity::Warning);
    assert_eq!(
        first_warning(&compilation),
        "Expected statement to return 'void', but got 'int' instead"
    );
}

#[test]
fn test_unreachable_code_warns_once() {
    let compilation = prepare("void f() { return; var x = 1; var y = 2; }");
    assert_eq!(compilation.severity, Severity::Warning);
    let unreachable: Vec<_> = compilation
        .diagnostics
        .iter()
        .filter(|d| d.message == "Unreachable code")
        .collect();
    assert_eq!(unreachable.len(), 1);
}

#[test]
fn test_missing_return() {
    let compilation = prepare("int f() { }");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Missing 'return' statement with a value of type 'int' at the end of the function definition: 'f'"
    );
}

#[test]
fn test_return_type_mismatch() {
    let compilation = prepare("int f() { return `s`; }");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expected 'return' statement with a value of type 'int', but got 'string' instead"
    );
}

#[test]
fn test_return_without_value_needs_void() {
    assert_eq!(severity("void f() { return; }"), Severity::None);
    let compilation = prepare("int f() { return; }");
    assert_eq!(
        first_error(&compilation),
        "Expected 'return' statement with a value of type 'int'"
    );
}

#[test]
fn test_return_at_module_scope() {
    let compilation = prepare("return;");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(first_error(&compilation), "Unexpected 'return' statement");
}

#[test]
fn test_function_call_round_trip() {
    let compilation = prepare("int f() { return 1; } var x = f();");
    assert_eq!(compilation.severity, Severity::None);
    assert_eq!(compilation.symbols.symbol_type("x"), Some(Type::INT));
}

#[test]
fn test_generator_definition() {
    assert_eq!(severity("int... seq() { yield 1; }"), Severity::None);
}

#[test]
fn test_generator_yield_type() {
    let compilation = prepare("int... seq() { yield `a`; }");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expected 'yield' statement with a value of type 'int', but got 'string' instead"
    );
}

#[test]
fn test_generator_return_takes_no_value() {
    assert_eq!(severity("int... seq() { return; }"), Severity::None);
    let compilation = prepare("int... seq() { return 1; }");
    assert_eq!(
        first_error(&compilation),
        "Unexpected value in generator 'return' statement"
    );
}

#[test]
fn test_yield_outside_generator() {
    let compilation = prepare("yield 1;");
    assert_eq!(first_error(&compilation), "Unexpected 'yield' statement");
    let compilation = prepare("void f() { yield 1; }");
    assert_eq!(first_error(&compilation), "Unexpected 'yield' statement");
}

#[test]
fn test_guard_refines_nullable() {
    // A guard that can fail is accepted silently.
    assert_eq!(severity("any? a = 1; if (int x = a) { }"), Severity::None);
}

#[test]
fn test_guard_always_succeeds_warns() {
    let compilation = prepare("int a = 1; if (int x = a) { }");
    assert_eq!(compilation.severity, Severity::Warning);
    assert_eq!(
        first_warning(&compilation),
        "Guarded assignment to 'x' of type 'int' will always succeed"
    );
}

#[test]
fn test_guard_inference_strips_null() {
    // var guard over any? infers the denulled element and stays usable
    // inside the guarded block only.
    assert_eq!(
        severity("any? a = 1; if (var x = a) { var y = x; }"),
        Severity::None
    );
    let compilation = prepare("any? a = 1; if (var x = a) { } else { var y = x; }");
    assert_eq!(first_error(&compilation), "Unknown identifier: 'x'");
}

#[test]
fn test_constant_condition_warns() {
    let compilation = prepare("if (true) { }");
    assert_eq!(compilation.severity, Severity::Warning);
    assert_eq!(
        first_warning(&compilation),
        "Condition in 'if' statement is constant"
    );
}

#[test]
fn test_foreach_infers_element_type() {
    assert_eq!(
        severity("string s = `abc`; for (var c : s) { string t = c; }"),
        Severity::None
    );
}

#[test]
fn test_foreach_element_type_mismatch() {
    let compilation = prepare("string s = `abc`; for (int i : s) { }");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Cannot initialize 'i' of type 'int' with a value of type 'string'"
    );
}

#[test]
fn test_foreach_requires_iterable() {
    let compilation = prepare("int a = 1; for (var x : a) { }");
    assert_eq!(compilation.severity, Severity::Error);
    assert_eq!(
        first_error(&compilation),
        "Expression after the ':' in 'for' statement is not iterable: 'int'"
    );
}

#[test]
fn test_array_literal_capabilities() {
    assert_eq!(severity("var a = [1, 2]; var n = a.length;"), Severity::None);
    assert_eq!(severity("var a = [1, 2]; var e = a[0];"), Severity::None);
    assert_eq!(severity("var a = [1, 2]; for (var x : a) { }"), Severity::None);
    let compilation = prepare("var a = [1, 2]; var s = a.size;");
    assert_eq!(
        first_error(&compilation),
        "Arrays do not support property '.size'"
    );
}

#[test]
fn test_object_literal_capabilities() {
    assert_eq!(severity("var o = { a: 1 }; o.b = 2;"), Severity::None);
    assert_eq!(severity("var o = { a: 1 }; var v = o[`a`];"), Severity::None);
}

#[test]
fn test_string_properties() {
    let compilation = prepare("string s = `x`; var n = s.length;");
    assert_eq!(compilation.severity, Severity::None);
    assert_eq!(compilation.symbols.symbol_type("n"), Some(Type::INT));
    assert_eq!(
        severity("string s = `x`; var b = s.startsWith;"),
        Severity::None
    );
    let compilation = prepare("string s = `x`; var v = s.bogus;");
    assert_eq!(
        first_error(&compilation),
        "Unknown property for 'string' value: '.bogus'"
    );
}

#[test]
fn test_dot_requires_string_or_object() {
    let compilation = prepare("int a = 1; var x = a.foo;");
    assert_eq!(
        first_error(&compilation),
        "Expected subject of '.' operator to be 'string' or 'object', but got 'int' instead"
    );
}

#[test]
fn test_string_indexing() {
    assert_eq!(severity("string s = `abc`; var c = s[0];"), Severity::None);
    let compilation = prepare("string s = `abc`; var c = s[`a`];");
    assert_eq!(
        first_error(&compilation),
        "Expected index of 'string' value to be 'int', but got 'string' instead"
    );
    let compilation = prepare("int a = 1; var c = a[0];");
    assert_eq!(
        first_error(&compilation),
        "Expected subject of '[]' operator to be 'string' or 'object', but got 'int' instead"
    );
}

#[test]
fn test_binary_type_rules() {
    assert_eq!(severity("var x = 1 + 2;"), Severity::None);
    assert_eq!(severity("bool b = true && false;"), Severity::None);
    assert_eq!(severity("var x = 1 == `one`;"), Severity::None);
    let compilation = prepare("var x = 1 + `one`;");
    assert_eq!(
        first_error(&compilation),
        "Expected right-hand side of '+' operator to be 'int' or 'float', but got 'string' instead"
    );
    let compilation = prepare("var x = `a` << 1;");
    assert_eq!(
        first_error(&compilation),
        "Expected left-hand side of '<<' operator to be 'int', but got 'string' instead"
    );
}

#[test]
fn test_arithmetic_result_types() {
    let compilation = prepare("var x = 1 + 2;");
    assert_eq!(compilation.symbols.symbol_type("x"), Some(Type::INT));
    let compilation = prepare("var y = 1.5 + 2.5;");
    assert_eq!(compilation.symbols.symbol_type("y"), Some(Type::FLOAT));
    let compilation = prepare("var b = 1 < 2;");
    assert_eq!(compilation.symbols.symbol_type("b"), Some(Type::BOOL));
}

#[test]
fn test_null_coalescing_warns_on_non_nullable() {
    let compilation = prepare("int a = 1; var b = a ?? 2;");
    assert_eq!(compilation.severity, Severity::Warning);
    assert_eq!(
        first_warning(&compilation),
        "Expected left-hand side of '??' operator to be possibly 'null', but got 'int' instead"
    );
    // A genuinely nullable left-hand side is silent.
    assert_eq!(severity("int? a = null; var b = a ?? 2;"), Severity::None);
}

#[test]
fn test_unary_type_rules() {
    assert_eq!(severity("var x = -1;"), Severity::None);
    assert_eq!(severity("bool b = !false;"), Severity::None);
    let compilation = prepare("var x = -`s`;");
    assert_eq!(
        first_error(&compilation),
        "Expected operand of negation '-' operator to be 'int' or 'float', but got 'string' instead"
    );
    let compilation = prepare("var x = ~`s`;");
    assert_eq!(
        first_error(&compilation),
        "Expected operand of bitwise-not '~' operator to be 'int', but got 'string' instead"
    );
    let compilation = prepare("var x = *1;");
    assert_eq!(
        first_error(&compilation),
        "Expected operand of dereference '*' operator to be a pointer, but got 'int' instead"
    );
}

#[test]
fn test_ternary_type_rules() {
    assert_eq!(severity("bool c = true; var x = c ? 1 : 2;"), Severity::None);
    let compilation = prepare("var x = 1 ? 2 : 3;");
    assert_eq!(
        first_error(&compilation),
        "Expected condition of ternary '?:' operator to be 'bool', but got 'int' instead"
    );
}

#[test]
fn test_switch_reachability() {
    assert_eq!(
        severity("int x = 1; switch (x) { case 1: break; default: break; }"),
        Severity::None
    );
}

#[test]
fn test_try_catch_prepares() {
    assert_eq!(
        severity("try { } catch (any? e) { print(e); }"),
        Severity::None
    );
}

#[test]
fn test_abandon_stops_peer_statements() {
    // The first bad statement abandons the block; the second bad
    // statement is never prepared, so only one error is logged.
    let compilation = prepare("var a = `x` + 1; var b = `y` + 2;");
    assert_eq!(compilation.severity, Severity::Error);
    let errors = compilation
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    assert_eq!(errors, 1);
}
