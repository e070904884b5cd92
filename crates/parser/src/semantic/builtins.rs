//! Registries of built-in symbols and string properties.

use super::symbols::{Symbol, SymbolKind, SymbolTable};
use egg_runtime::{Parameter, ParameterFlags, Signature, Type};
use once_cell::sync::Lazy;
use std::collections::HashMap;

fn function(name: &str, result: Type, params: Vec<Parameter>) -> Type {
    Type::function(Signature::new(name, result, params))
}

/// The root-scope built-ins: `print`, `assert`, `string`, `type`.
static ROOT_BUILTINS: Lazy<Vec<(&'static str, Type)>> = Lazy::new(|| {
    let predicate = Parameter {
        name: "predicate".to_string(),
        ty: Type::ANY_Q,
        flags: ParameterFlags::REQUIRED.with(ParameterFlags::PREDICATE),
    };
    vec![
        (
            "print",
            function(
                "print",
                Type::VOID,
                vec![Parameter::variadic("values", Type::ANY_Q)],
            ),
        ),
        ("assert", function("assert", Type::VOID, vec![predicate])),
        (
            "string",
            function(
                "string",
                Type::STRING,
                vec![Parameter::variadic("values", Type::ANY_Q)],
            ),
        ),
        (
            "type",
            function(
                "type",
                Type::TYPE,
                vec![Parameter::required("value", Type::ANY_Q)],
            ),
        ),
    ]
});

/// Register the built-ins into a root symbol table.
pub fn register(table: &mut SymbolTable) {
    for (name, ty) in ROOT_BUILTINS.iter() {
        let _ = table.define(Symbol::new(*name, SymbolKind::Builtin, ty.clone()));
    }
}

/// Known dot-properties of `string` values.
static STRING_PROPERTIES: Lazy<HashMap<&'static str, Type>> = Lazy::new(|| {
    let mut properties = HashMap::new();
    properties.insert("length", Type::INT);

    let one_string_to_int = |name| {
        function(
            name,
            Type::INT,
            vec![Parameter::required("needle", Type::STRING)],
        )
    };
    properties.insert("compareTo", one_string_to_int("compareTo"));
    properties.insert("hash", function("hash", Type::INT, vec![]));
    for name in ["indexOf", "lastIndexOf"] {
        properties.insert(
            name,
            function(
                name,
                Type::Simple(egg_runtime::Kind::INT | egg_runtime::Kind::NULL),
                vec![Parameter::required("needle", Type::STRING)],
            ),
        );
    }

    for name in ["contains", "startsWith", "endsWith"] {
        properties.insert(
            name,
            function(
                name,
                Type::BOOL,
                vec![Parameter::required("needle", Type::STRING)],
            ),
        );
    }

    properties.insert(
        "join",
        function(
            "join",
            Type::STRING,
            vec![Parameter::variadic("values", Type::ANY_Q)],
        ),
    );
    properties.insert(
        "split",
        function(
            "split",
            Type::OBJECT,
            vec![Parameter::required("separator", Type::STRING)],
        ),
    );
    properties.insert(
        "repeat",
        function(
            "repeat",
            Type::STRING,
            vec![Parameter::required("count", Type::INT)],
        ),
    );
    properties.insert(
        "replace",
        function(
            "replace",
            Type::STRING,
            vec![
                Parameter::required("needle", Type::STRING),
                Parameter::required("replacement", Type::STRING),
            ],
        ),
    );
    for name in ["padLeft", "padRight"] {
        properties.insert(
            name,
            function(
                name,
                Type::STRING,
                vec![Parameter::required("target", Type::INT)],
            ),
        );
    }
    properties.insert(
        "slice",
        function(
            "slice",
            Type::STRING,
            vec![
                Parameter::required("begin", Type::INT),
                Parameter::required("end", Type::INT),
            ],
        ),
    );
    properties.insert("toString", function("toString", Type::STRING, vec![]));
    properties
});

/// Look up a known `string` property; `None` for unknown names.
pub fn string_builtin(property: &str) -> Option<Type> {
    STRING_PROPERTIES.get(property).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_builtins() {
        let mut table = SymbolTable::new();
        register(&mut table);
        for name in ["print", "assert", "string", "type"] {
            let symbol = table.find(name, false).expect(name);
            assert_eq!(symbol.kind, SymbolKind::Builtin);
            assert!(symbol.ty().callable().is_some());
        }
    }

    #[test]
    fn test_string_builtins() {
        assert_eq!(string_builtin("length"), Some(Type::INT));
        assert!(string_builtin("startsWith").is_some());
        assert!(string_builtin("bogus").is_none());
    }
}
