//! Promotion and dump behavior: literal dumps are contractual, and
//! context-sensitive statement legality is enforced during promotion.

use egg_parser::driver::{parse_expression, parse_module};

fn module_dump(source: &str) -> String {
    parse_module("test", source)
        .expect("module should promote")
        .to_dump()
}

fn module_error(source: &str) -> String {
    parse_module("test", source)
        .expect_err("module should fail to promote")
        .to_string()
}

fn expression_dump(source: &str) -> String {
    parse_expression("test", source)
        .expect("expression should promote")
        .to_dump()
}

#[test]
fn test_empty_module() {
    assert_eq!(module_dump(""), "(module)");
}

#[test]
fn test_module_declarations() {
    assert_eq!(
        module_dump("var foo;"),
        "(module (declare 'foo' (type 'var')))"
    );
    assert_eq!(
        module_dump("var foo;\nvar bar;"),
        "(module (declare 'foo' (type 'var')) (declare 'bar' (type 'var')))"
    );
    assert_eq!(
        module_dump("any? bar;"),
        "(module (declare 'bar' (type 'any?')))"
    );
}

#[test]
fn test_module_initializations() {
    assert_eq!(
        module_dump("var foo = 42;"),
        "(module (initialize 'foo' (type 'var') (literal int 42)))"
    );
    assert_eq!(
        module_dump("any? bar = `hello`;"),
        "(module (initialize 'bar' (type 'any?') (literal string 'hello')))"
    );
    assert_eq!(
        module_dump("var f = 1.5;"),
        "(module (initialize 'f' (type 'var') (literal float 1.5)))"
    );
    assert_eq!(
        module_dump("var b = true;"),
        "(module (initialize 'b' (type 'var') (literal bool true)))"
    );
    assert_eq!(
        module_dump("any? n = null;"),
        "(module (initialize 'n' (type 'any?') (literal null)))"
    );
}

#[test]
fn test_assignment_operators() {
    for op in [
        "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", ">>>=",
    ] {
        let source = format!("lhs {} rhs;", op);
        let expected = format!(
            "(module (assign '{}' (identifier 'lhs') (identifier 'rhs')))",
            op
        );
        assert_eq!(module_dump(&source), expected);
    }
}

#[test]
fn test_mutate_statements() {
    assert_eq!(
        module_dump("++counter;"),
        "(module (mutate '++' (identifier 'counter')))"
    );
    assert_eq!(
        module_dump("--counter;"),
        "(module (mutate '--' (identifier 'counter')))"
    );
}

#[test]
fn test_ternary_associativity() {
    assert_eq!(
        expression_dump("a ? b : c"),
        "(ternary (identifier 'a') (identifier 'b') (identifier 'c'))"
    );
    assert_eq!(
        expression_dump("a ? b : c ? d : e"),
        "(ternary (identifier 'a') (identifier 'b') (ternary (identifier 'c') (identifier 'd') (identifier 'e')))"
    );
    assert_eq!(
        expression_dump("a ? b ? c : d : e"),
        "(ternary (identifier 'a') (ternary (identifier 'b') (identifier 'c') (identifier 'd')) (identifier 'e'))"
    );
}

#[test]
fn test_expression_dumps() {
    assert_eq!(
        expression_dump("-a + ~b"),
        "(binary '+' (unary '-' (identifier 'a')) (unary '~' (identifier 'b')))"
    );
    assert_eq!(
        expression_dump("a ?? b"),
        "(binary '??' (identifier 'a') (identifier 'b'))"
    );
    assert_eq!(
        expression_dump("a.b[0](c)"),
        "(call (index (dot (identifier 'a') 'b') (literal int 0)) (identifier 'c'))"
    );
    assert_eq!(
        expression_dump("[1, x]"),
        "(array (literal int 1) (identifier 'x'))"
    );
    assert_eq!(
        expression_dump("{ a: 1 }"),
        "(object (named 'a' (literal int 1)))"
    );
}

#[test]
fn test_control_flow_dumps() {
    assert_eq!(
        module_dump("if (a) { } else { }"),
        "(module (if (identifier 'a') (block) (block)))"
    );
    assert_eq!(
        module_dump("while (a) { }"),
        "(module (while (identifier 'a') (block)))"
    );
    assert_eq!(
        module_dump("do { } while (a);"),
        "(module (do (identifier 'a') (block)))"
    );
    assert_eq!(module_dump("for (;;) { }"), "(module (for - - - (block)))");
    assert_eq!(
        module_dump("for (var i = 0; i < 10; ++i) { }"),
        "(module (for (initialize 'i' (type 'var') (literal int 0)) \
         (binary '<' (identifier 'i') (literal int 10)) \
         (mutate '++' (identifier 'i')) (block)))"
    );
    assert_eq!(
        module_dump("for (var x : xs) { }"),
        "(module (foreach (declare 'x' (type 'var')) (identifier 'xs') (block)))"
    );
}

#[test]
fn test_switch_dump() {
    assert_eq!(
        module_dump("switch (x) { case 1: break; default: break; }"),
        "(module (switch (identifier 'x') \
         (case (literal int 1) (block (break))) \
         (default (block (break)))))"
    );
}

#[test]
fn test_try_dump() {
    assert_eq!(
        module_dump("try { } catch (any? e) { } finally { }"),
        "(module (try (block) (catch 'e' (type 'any?') (block)) (block)))"
    );
}

#[test]
fn test_function_dumps() {
    assert_eq!(
        module_dump("void f(int x) { }"),
        "(module (function 'f' 'void(int)' (block)))"
    );
    assert_eq!(
        module_dump("int add(int a, int b) { return a + b; }"),
        "(module (function 'add' 'int(int, int)' \
         (block (return (binary '+' (identifier 'a') (identifier 'b'))))))"
    );
    assert_eq!(
        module_dump("int... g() { yield 1; }"),
        "(module (function 'g' '<iterator>()' (generator (block (yield (literal int 1))))))"
    );
}

#[test]
fn test_guard_dump() {
    assert_eq!(
        module_dump("if (int x = a) { }"),
        "(module (if (guard 'x' (type 'int') (identifier 'a')) (block)))"
    );
}

#[test]
fn test_promotion_is_stable() {
    let source = "var foo = 42;\nwhile (a) { break; }";
    assert_eq!(module_dump(source), module_dump(source));
}

#[test]
fn test_break_outside_loop() {
    assert!(module_error("break;")
        .contains("The 'break' statement may only be used within loops or switch statements"));
}

#[test]
fn test_continue_outside_loop() {
    assert!(module_error("continue;")
        .contains("The 'continue' statement may only be used within loops or switch statements"));
}

#[test]
fn test_case_and_default_outside_switch() {
    assert!(module_error("case 1:")
        .contains("The 'case' statement may only be used within switch statements"));
    assert!(module_error("default:")
        .contains("The 'default' statement may only be used within switch statements"));
}

#[test]
fn test_finally_outside_try() {
    assert!(module_error("finally { }")
        .contains("The 'finally' statement may only be used as part of a 'try' statement"));
}

#[test]
fn test_bare_throw_outside_catch() {
    assert!(module_error("throw;")
        .contains("The 'throw' statement with no value may only be used within 'catch' clauses"));
    // Inside a catch clause the rethrow is legal.
    assert!(parse_module("test", "try { } catch (any? e) { throw; }").is_ok());
}

#[test]
fn test_empty_statement_contexts() {
    assert!(module_error(";").contains("Empty statements are not permitted in this context"));
    assert!(module_error("while (a) { ; }")
        .contains("Empty statements are not permitted in this context"));
}

#[test]
fn test_loop_bits_do_not_cross_functions() {
    // A nested function body starts a fresh context: the enclosing
    // loop's break permission does not leak inside.
    assert!(module_error("while (a) { void f() { break; } }")
        .contains("The 'break' statement may only be used within loops or switch statements"));
    // Inside the loop body itself it stays legal.
    assert!(parse_module("test", "while (a) { break; }").is_ok());
    assert!(parse_module("test", "do { continue; } while (a);").is_ok());
    assert!(parse_module("test", "for (;;) { break; }").is_ok());
}

#[test]
fn test_break_inside_switch_sections() {
    assert!(parse_module("test", "switch (x) { case 1: break; }").is_ok());
}

#[test]
fn test_using_is_rejected() {
    assert!(module_error("using (var x = 1) { }")
        .contains("The 'using' statement is not yet supported"));
}
