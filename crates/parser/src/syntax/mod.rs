//! The concrete syntax tree produced by the recursive-descent parser.
//!
//! These nodes mirror the shape of the source text; context-sensitive
//! legality (where `break` may appear, and so on) is enforced later by
//! promotion, not here.

mod parser;

pub use parser::Parser;

use crate::lexer::TokenKind;
use egg_runtime::Type;
use text_size::TextRange;

/// A parsed module: the statement list of one resource.
#[derive(Debug)]
pub struct Module {
    pub statements: Vec<Stmt>,
    pub span: TextRange,
}

/// A statement with its source span.
#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: TextRange,
}

/// A function or generator parameter.
#[derive(Debug)]
pub struct Param {
    pub ty: Type,
    pub name: String,
    pub span: TextRange,
}

/// One `catch (T name) { ... }` clause.
#[derive(Debug)]
pub struct CatchClause {
    pub name: String,
    pub ty: Type,
    pub block: Stmt,
    pub span: TextRange,
}

/// One labelled section of a `switch` block. Consecutive `case`
/// labels merge into a single section; `default` contributes no value.
#[derive(Debug)]
pub struct SwitchSection {
    pub values: Vec<Expr>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
    pub span: TextRange,
}

/// A condition position: either an expression or a guarded
/// declaration `if (T name = expr)`.
#[derive(Debug)]
pub enum Condition {
    Expr(Expr),
    Guard {
        name: String,
        ty: Type,
        expr: Expr,
        span: TextRange,
    },
}

#[derive(Debug)]
pub enum StmtKind {
    /// A bare `;`.
    Empty,
    Block(Vec<Stmt>),
    Declare {
        name: String,
        ty: Type,
        init: Option<Expr>,
    },
    Function {
        name: String,
        rettype: Type,
        generator: bool,
        params: Vec<Param>,
        block: Box<Stmt>,
    },
    Assign {
        op: TokenKind,
        lhs: Expr,
        rhs: Expr,
    },
    Mutate {
        op: TokenKind,
        lvalue: Expr,
    },
    /// An expression in statement position (a call, in practice).
    Expression(Expr),
    Break,
    Continue,
    /// A stray `case value:` outside a switch block.
    Case { values: Vec<Expr> },
    /// A stray `default:` outside a switch block.
    Default,
    /// A stray `finally { ... }` outside a try statement.
    Finally { block: Box<Stmt> },
    Do {
        block: Box<Stmt>,
        cond: Expr,
    },
    If {
        cond: Condition,
        then_block: Box<Stmt>,
        else_block: Option<Box<Stmt>>,
    },
    While {
        cond: Condition,
        block: Box<Stmt>,
    },
    For {
        pre: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        block: Box<Stmt>,
    },
    Foreach {
        target: Box<Stmt>,
        expr: Expr,
        block: Box<Stmt>,
    },
    Switch {
        value: Condition,
        sections: Vec<SwitchSection>,
    },
    Try {
        block: Box<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Box<Stmt>>,
    },
    Throw {
        value: Option<Expr>,
    },
    Return {
        value: Option<Expr>,
    },
    Yield {
        value: Expr,
    },
    Using {
        init: Box<Stmt>,
        block: Box<Stmt>,
    },
}

/// An expression with its source span.
#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: TextRange,
}

#[derive(Debug)]
pub enum ExprKind {
    Identifier(String),
    Integer(i64),
    Float(f64),
    StringLiteral(String),
    Bool(bool),
    Null,
    Unary {
        op: TokenKind,
        expr: Box<Expr>,
    },
    Binary {
        op: TokenKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        subject: Box<Expr>,
        index: Box<Expr>,
    },
    Dot {
        subject: Box<Expr>,
        property: String,
    },
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
}
