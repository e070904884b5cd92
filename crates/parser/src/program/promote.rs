//! Promotion: lowering concrete syntax into the program tree under
//! context-sensitive legality rules.
//!
//! Each promotion context carries an [`Allowed`] bit-set. Nested
//! constructs inherit a designated subset of their parent's bits and
//! add their own: loop bodies add `Break|Continue` and inherit
//! `Rethrow|Return|Yield`; switch sections also add `Case`; catch
//! blocks allow `Rethrow|Return|Yield`; function bodies start fresh
//! with `Return|Yield` so loop bits never leak across a function
//! boundary.

use super::{Allowed, AssignOp, BinaryOp, MutateOp, ProgramKind, ProgramNode, UnaryOp};
use crate::error::{line_column, SyntaxError};
use crate::lexer::TokenKind;
use crate::syntax::{Condition, Expr, ExprKind, Module, Stmt, StmtKind};
use egg_runtime::{Parameter, Signature, SourceLocation, Str, Type};
use text_size::TextRange;

/// Promote a parsed module into a program tree.
pub fn promote_module(
    resource: &str,
    source: &str,
    module: &Module,
) -> Result<ProgramNode, SyntaxError> {
    let context = Context {
        resource,
        source,
        allowed: Allowed::NONE,
    };
    let mut statements = Vec::new();
    for statement in &module.statements {
        if let Some(node) = context.statement(statement)? {
            statements.push(node);
        }
    }
    Ok(ProgramNode::new(
        context.location(module.span),
        ProgramKind::Module(statements),
    ))
}

/// Promote a single expression (the expression-parser entry point).
pub fn promote_expression(
    resource: &str,
    source: &str,
    expr: &Expr,
) -> Result<ProgramNode, SyntaxError> {
    let context = Context {
        resource,
        source,
        allowed: Allowed::NONE,
    };
    context.expression(expr)
}

struct Context<'a> {
    resource: &'a str,
    source: &'a str,
    allowed: Allowed,
}

impl<'a> Context<'a> {
    fn nested(&self, add: Allowed, inherit: Allowed) -> Context<'a> {
        Context {
            resource: self.resource,
            source: self.source,
            allowed: self.allowed.mask(inherit).with(add),
        }
    }

    fn is_allowed(&self, bit: Allowed) -> bool {
        self.allowed.has(bit)
    }

    fn location(&self, span: TextRange) -> SourceLocation {
        line_column(self.source, usize::from(span.start()))
    }

    fn error(&self, span: TextRange, reason: &str) -> SyntaxError {
        SyntaxError::new(reason, self.resource, self.location(span))
    }

    fn node(&self, span: TextRange, kind: ProgramKind) -> ProgramNode {
        ProgramNode::new(self.location(span), kind)
    }

    fn typed(&self, span: TextRange, ty: Type, kind: ProgramKind) -> ProgramNode {
        ProgramNode::with_type(self.location(span), ty, kind)
    }

    /// Promote a statement. An empty statement in a context that
    /// allows it dissolves to `None`.
    fn statement(&self, stmt: &Stmt) -> Result<Option<ProgramNode>, SyntaxError> {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Empty => {
                if !self.is_allowed(Allowed::EMPTY) {
                    return Err(self.error(
                        span,
                        "Empty statements are not permitted in this context",
                    ));
                }
                Ok(None)
            }
            StmtKind::Block(statements) => {
                Ok(Some(self.block(span, statements)?))
            }
            StmtKind::Declare { name, ty, init } => {
                let init = match init {
                    Some(expr) => Some(Box::new(self.expression(expr)?)),
                    None => None,
                };
                Ok(Some(self.node(
                    span,
                    ProgramKind::Declare {
                        name: name.clone(),
                        declared: ty.clone(),
                        init,
                    },
                )))
            }
            StmtKind::Function {
                name,
                rettype,
                generator,
                params,
                block,
            } => {
                let parameters = params
                    .iter()
                    .map(|p| Parameter::required(p.name.clone(), p.ty.clone()))
                    .collect();
                let result = if *generator {
                    Type::Iterator
                } else {
                    rettype.clone()
                };
                let signature = Type::function(Signature::new(name.clone(), result, parameters));
                // Loop bits never cross a function boundary.
                let body_context = self.nested(Allowed::RETURN | Allowed::YIELD, Allowed::NONE);
                let body = body_context
                    .statement(block)?
                    .expect("function body is a block");
                let body = if *generator {
                    ProgramNode::new(
                        body.location,
                        ProgramKind::Generator {
                            yield_type: rettype.clone(),
                            block: Box::new(body),
                        },
                    )
                } else {
                    body
                };
                Ok(Some(self.node(
                    span,
                    ProgramKind::FunctionDefinition {
                        name: name.clone(),
                        signature,
                        block: Box::new(body),
                    },
                )))
            }
            StmtKind::Assign { op, lhs, rhs } => {
                let op = match AssignOp::from_token(*op) {
                    Some(op) => op,
                    None => {
                        return Err(self.token_error(span, *op, "Unknown assignment operator"))
                    }
                };
                Ok(Some(self.node(
                    span,
                    ProgramKind::Assign {
                        op,
                        lhs: Box::new(self.expression(lhs)?),
                        rhs: Box::new(self.expression(rhs)?),
                    },
                )))
            }
            StmtKind::Mutate { op, lvalue } => {
                let op = match MutateOp::from_token(*op) {
                    Some(op) => op,
                    None => {
                        return Err(self.token_error(
                            span,
                            *op,
                            "Unknown increment/decrement operator",
                        ))
                    }
                };
                Ok(Some(self.node(
                    span,
                    ProgramKind::Mutate {
                        op,
                        lvalue: Box::new(self.expression(lvalue)?),
                    },
                )))
            }
            StmtKind::Expression(expr) => Ok(Some(self.expression(expr)?)),
            StmtKind::Break => {
                if !self.is_allowed(Allowed::BREAK) {
                    return Err(self.error(
                        span,
                        "The 'break' statement may only be used within loops or switch statements",
                    ));
                }
                Ok(Some(self.node(span, ProgramKind::Break)))
            }
            StmtKind::Continue => {
                if !self.is_allowed(Allowed::CONTINUE) {
                    return Err(self.error(
                        span,
                        "The 'continue' statement may only be used within loops or switch statements",
                    ));
                }
                Ok(Some(self.node(span, ProgramKind::Continue)))
            }
            StmtKind::Case { values } => {
                // The real lowering happens inside the switch node;
                // a reachable case here is a stray label.
                if !self.is_allowed(Allowed::CASE) {
                    return Err(self.error(
                        span,
                        "The 'case' statement may only be used within switch statements",
                    ));
                }
                self.expression(&values[0]).map(Some)
            }
            StmtKind::Default => Err(self.error(
                span,
                "The 'default' statement may only be used within switch statements",
            )),
            StmtKind::Finally { .. } => Err(self.error(
                span,
                "The 'finally' statement may only be used as part of a 'try' statement",
            )),
            StmtKind::Do { block, cond } => {
                let cond = self.expression(cond)?;
                let nested = self.loop_body_context();
                let block = nested.statement(block)?.expect("do body is a block");
                Ok(Some(self.node(
                    span,
                    ProgramKind::Do {
                        cond: Box::new(cond),
                        block: Box::new(block),
                    },
                )))
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond = self.condition(cond)?;
                let then_block = self.statement(then_block)?.expect("if body is a block");
                let else_block = match else_block {
                    Some(block) => Some(Box::new(
                        self.statement(block)?.expect("else body is a block"),
                    )),
                    None => None,
                };
                Ok(Some(self.node(
                    span,
                    ProgramKind::If {
                        cond: Box::new(cond),
                        then_block: Box::new(then_block),
                        else_block,
                    },
                )))
            }
            StmtKind::While { cond, block } => {
                let cond = self.condition(cond)?;
                let nested = self.loop_body_context();
                let block = nested.statement(block)?.expect("while body is a block");
                Ok(Some(self.node(
                    span,
                    ProgramKind::While {
                        cond: Box::new(cond),
                        block: Box::new(block),
                    },
                )))
            }
            StmtKind::For {
                pre,
                cond,
                post,
                block,
            } => {
                // Empty statements are allowed in the three header
                // clauses, flow control is not.
                let clauses = self.nested(Allowed::EMPTY, Allowed::NONE);
                let pre = match pre {
                    Some(stmt) => clauses.statement(stmt)?.map(Box::new),
                    None => None,
                };
                let cond = match cond {
                    Some(expr) => Some(Box::new(clauses.expression(expr)?)),
                    None => None,
                };
                let post = match post {
                    Some(stmt) => clauses.statement(stmt)?.map(Box::new),
                    None => None,
                };
                let nested = self.loop_body_context();
                let block = nested.statement(block)?.expect("for body is a block");
                Ok(Some(self.node(
                    span,
                    ProgramKind::For {
                        pre,
                        cond,
                        post,
                        block: Box::new(block),
                    },
                )))
            }
            StmtKind::Foreach {
                target,
                expr,
                block,
            } => {
                let target = self.statement(target)?.expect("foreach target declares");
                let expr = self.expression(expr)?;
                let nested = self.loop_body_context();
                let block = nested.statement(block)?.expect("foreach body is a block");
                Ok(Some(self.node(
                    span,
                    ProgramKind::Foreach {
                        target: Box::new(target),
                        expr: Box::new(expr),
                        block: Box::new(block),
                    },
                )))
            }
            StmtKind::Switch { value, sections } => {
                let value = self.condition(value)?;
                // Loops and switch add both break and continue; the
                // section bodies may also hold further case labels.
                let nested = self.nested(
                    Allowed::BREAK | Allowed::CONTINUE | Allowed::CASE,
                    Allowed::RETHROW | Allowed::RETURN | Allowed::YIELD,
                );
                let mut cases = Vec::new();
                let mut default_index = None;
                for (index, section) in sections.iter().enumerate() {
                    if section.is_default {
                        default_index = Some(index);
                    }
                    let mut values = Vec::new();
                    for value in &section.values {
                        values.push(self.expression(value)?);
                    }
                    let mut body = Vec::new();
                    for stmt in &section.body {
                        if let Some(node) = nested.statement(stmt)? {
                            body.push(node);
                        }
                    }
                    let block = ProgramNode::new(
                        self.location(section.span),
                        ProgramKind::Block(body),
                    );
                    cases.push(ProgramNode::new(
                        self.location(section.span),
                        ProgramKind::Case {
                            values,
                            block: Box::new(block),
                        },
                    ));
                }
                Ok(Some(self.node(
                    span,
                    ProgramKind::Switch {
                        value: Box::new(value),
                        default_index,
                        cases,
                    },
                )))
            }
            StmtKind::Try {
                block,
                catches,
                finally,
            } => {
                let block = self.statement(block)?.expect("try body is a block");
                let mut catch_nodes = Vec::new();
                for clause in catches {
                    let ty_node = self.typed(
                        clause.span,
                        clause.ty.clone(),
                        ProgramKind::TypeLiteral(clause.ty.clone()),
                    );
                    let nested = self.nested(
                        Allowed::RETHROW | Allowed::RETURN | Allowed::YIELD,
                        Allowed::NONE,
                    );
                    let catch_block = nested
                        .statement(&clause.block)?
                        .expect("catch body is a block");
                    catch_nodes.push(ProgramNode::new(
                        self.location(clause.span),
                        ProgramKind::Catch {
                            name: clause.name.clone(),
                            ty: Box::new(ty_node),
                            block: Box::new(catch_block),
                        },
                    ));
                }
                let finally = match finally {
                    Some(block) => Some(Box::new(
                        self.statement(block)?.expect("finally body is a block"),
                    )),
                    None => None,
                };
                Ok(Some(self.node(
                    span,
                    ProgramKind::Try {
                        block: Box::new(block),
                        catches: catch_nodes,
                        finally,
                    },
                )))
            }
            StmtKind::Throw { value } => {
                let value = match value {
                    Some(expr) => Some(Box::new(self.expression(expr)?)),
                    None => {
                        if !self.is_allowed(Allowed::RETHROW) {
                            return Err(self.error(
                                span,
                                "The 'throw' statement with no value may only be used within 'catch' clauses",
                            ));
                        }
                        None
                    }
                };
                Ok(Some(self.node(span, ProgramKind::Throw { value })))
            }
            StmtKind::Return { value } => {
                let value = match value {
                    Some(expr) => Some(Box::new(self.expression(expr)?)),
                    None => None,
                };
                Ok(Some(self.node(span, ProgramKind::Return { value })))
            }
            StmtKind::Yield { value } => Ok(Some(self.node(
                span,
                ProgramKind::Yield {
                    value: Box::new(self.expression(value)?),
                },
            ))),
            StmtKind::Using { .. } => {
                Err(self.error(span, "The 'using' statement is not yet supported"))
            }
        }
    }

    fn block(&self, span: TextRange, statements: &[Stmt]) -> Result<ProgramNode, SyntaxError> {
        let mut nodes = Vec::new();
        for statement in statements {
            if let Some(node) = self.statement(statement)? {
                nodes.push(node);
            }
        }
        Ok(self.node(span, ProgramKind::Block(nodes)))
    }

    fn loop_body_context(&self) -> Context<'a> {
        self.nested(
            Allowed::BREAK | Allowed::CONTINUE,
            Allowed::RETHROW | Allowed::RETURN | Allowed::YIELD,
        )
    }

    fn condition(&self, cond: &Condition) -> Result<ProgramNode, SyntaxError> {
        match cond {
            Condition::Expr(expr) => self.expression(expr),
            Condition::Guard {
                name,
                ty,
                expr,
                span,
            } => Ok(self.node(
                *span,
                ProgramKind::Guard {
                    name: name.clone(),
                    declared: ty.clone(),
                    expr: Box::new(self.expression(expr)?),
                },
            )),
        }
    }

    fn expression(&self, expr: &Expr) -> Result<ProgramNode, SyntaxError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Identifier(name) => {
                Ok(self.node(span, ProgramKind::Identifier(name.clone())))
            }
            ExprKind::Integer(value) => Ok(self.typed(
                span,
                Type::INT,
                ProgramKind::LiteralInt(*value),
            )),
            ExprKind::Float(value) => Ok(self.typed(
                span,
                Type::FLOAT,
                ProgramKind::LiteralFloat(*value),
            )),
            ExprKind::StringLiteral(value) => Ok(self.typed(
                span,
                Type::STRING,
                ProgramKind::LiteralString(Str::new(value.clone())),
            )),
            ExprKind::Bool(value) => Ok(self.typed(
                span,
                Type::BOOL,
                ProgramKind::LiteralBool(*value),
            )),
            ExprKind::Null => Ok(self.typed(span, Type::NULL, ProgramKind::LiteralNull)),
            ExprKind::Unary { op, expr } => {
                let op = match UnaryOp::from_token(*op) {
                    Some(op) => op,
                    None => return Err(self.token_error(span, *op, "Unknown unary operator")),
                };
                Ok(self.node(
                    span,
                    ProgramKind::Unary {
                        op,
                        expr: Box::new(self.expression(expr)?),
                    },
                ))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let op = match BinaryOp::from_token(*op) {
                    Some(op) => op,
                    None => return Err(self.token_error(span, *op, "Unknown binary operator")),
                };
                Ok(self.node(
                    span,
                    ProgramKind::Binary {
                        op,
                        lhs: Box::new(self.expression(lhs)?),
                        rhs: Box::new(self.expression(rhs)?),
                    },
                ))
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => Ok(self.node(
                span,
                ProgramKind::Ternary {
                    cond: Box::new(self.expression(cond)?),
                    then_expr: Box::new(self.expression(then_expr)?),
                    else_expr: Box::new(self.expression(else_expr)?),
                },
            )),
            ExprKind::Call { callee, args } => {
                let callee = self.expression(callee)?;
                let mut arguments = Vec::new();
                for arg in args {
                    arguments.push(self.expression(arg)?);
                }
                Ok(self.node(
                    span,
                    ProgramKind::Call {
                        callee: Box::new(callee),
                        args: arguments,
                    },
                ))
            }
            ExprKind::Index { subject, index } => Ok(self.node(
                span,
                ProgramKind::Index {
                    instance: Box::new(self.expression(subject)?),
                    index: Box::new(self.expression(index)?),
                },
            )),
            ExprKind::Dot { subject, property } => Ok(self.node(
                span,
                ProgramKind::Dot {
                    instance: Box::new(self.expression(subject)?),
                    property: property.clone(),
                },
            )),
            ExprKind::Array(values) => {
                let mut nodes = Vec::new();
                for value in values {
                    nodes.push(self.expression(value)?);
                }
                Ok(self.typed(span, Type::Array, ProgramKind::ArrayLiteral(nodes)))
            }
            ExprKind::Object(entries) => {
                let mut nodes = Vec::new();
                for (key, value) in entries {
                    nodes.push((key.clone(), self.expression(value)?));
                }
                Ok(self.typed(span, Type::Map, ProgramKind::ObjectLiteral(nodes)))
            }
        }
    }

    fn token_error(&self, span: TextRange, token: TokenKind, reason: &str) -> SyntaxError {
        SyntaxError::with_token(
            reason,
            &format!("{:?}", token),
            self.resource,
            self.location(span),
        )
    }
}
