//! Wires the pipeline: lexer → concrete syntax → promote → prepare.

use crate::error::{Diagnostic, Severity, SyntaxError};
use crate::program::{promote_expression, promote_module, ProgramNode};
use crate::semantic::prepare::Preparer;
use crate::semantic::symbols::SymbolTable;
use crate::syntax::Parser;

/// The outcome of the preparation pass.
#[derive(Debug)]
pub struct Preparation {
    pub severity: Severity,
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
}

/// The outcome of the full pipeline over one resource.
#[derive(Debug)]
pub struct Compilation {
    pub program: ProgramNode,
    pub severity: Severity,
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
}

/// Lex, parse and promote a module.
pub fn parse_module(resource: &str, source: &str) -> Result<ProgramNode, SyntaxError> {
    let mut parser = Parser::new(resource, source)?;
    let module = parser.parse_module()?;
    promote_module(resource, source, &module)
}

/// Lex, parse and promote a single expression.
pub fn parse_expression(resource: &str, source: &str) -> Result<ProgramNode, SyntaxError> {
    let mut parser = Parser::new(resource, source)?;
    let expr = parser.parse_expression_entry()?;
    promote_expression(resource, source, &expr)
}

/// Run the preparation pass over a promoted program.
///
/// The severity is `Error` when any subtree abandoned, otherwise the
/// worst severity the pass logged.
pub fn prepare(resource: &str, root: &mut ProgramNode) -> Preparation {
    let mut preparer = Preparer::new(resource);
    let flags = preparer.prepare(root);
    let (collector, symbols) = preparer.into_parts();
    let severity = if flags.abandoned() {
        Severity::Error
    } else {
        collector.highest()
    };
    Preparation {
        severity,
        diagnostics: collector.into_diagnostics(),
        symbols,
    }
}

/// The full pipeline: returns the prepared program plus diagnostics,
/// or the syntax error that aborted promotion.
pub fn compile(resource: &str, source: &str) -> Result<Compilation, SyntaxError> {
    let mut program = parse_module(resource, source)?;
    let preparation = prepare(resource, &mut program);
    Ok(Compilation {
        program,
        severity: preparation.severity,
        diagnostics: preparation.diagnostics,
        symbols: preparation.symbols,
    })
}
