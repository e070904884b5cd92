//! Front end for the `egg` language: lexing, concrete syntax,
//! promotion into the program tree, and the preparation pass.
//!
//! The pipeline runs token stream → concrete syntax tree →
//! *promote* (context-sensitive lowering) → program tree →
//! *prepare* (symbol tables, type inference and checking,
//! reachability, generator discrimination) → prepared program tree
//! plus diagnostics.
//!
//! # Example
//!
//! ```no_run
//! use egg_parser::driver;
//!
//! let compilation = driver::compile("demo.egg", "var answer = 42;").unwrap();
//! assert_eq!(compilation.severity, egg_parser::error::Severity::None);
//! println!("{}", compilation.program.to_dump());
//! ```

pub mod driver;
pub mod error;
pub mod lexer;
pub mod program;
pub mod semantic;
pub mod syntax;

pub use driver::{compile, parse_expression, parse_module, Compilation, Preparation};
pub use error::{Diagnostic, DiagnosticCollector, Severity, SyntaxError};
pub use lexer::{Lexer, Token, TokenKind};
pub use program::{Allowed, ProgramNode};
pub use semantic::symbols::SymbolTable;
