//! The preparation pass: symbol-table construction, type inference and
//! checking, reachability, and generator-vs-function discrimination.
//!
//! Each node's preparation returns a [`PrepareFlags`] set. Fatal type
//! errors log at `Error` severity and return `Abandon`, which
//! short-circuits the enclosing subtree; warnings never abandon.

use super::builtins;
use super::symbols::{Symbol, SymbolTable};
use crate::error::{Diagnostic, DiagnosticCollector, DiagnosticKind};
use crate::program::{AssignOp, BinaryOp, MutateOp, ProgramKind, ProgramNode, UnaryOp};
use egg_runtime::{Assignability, Kind, ParameterFlags, Signature, SourceLocation, Type};
use std::collections::HashSet;

/// Result bits of preparing one node. The empty set means control
/// cannot continue past the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareFlags(u8);

impl PrepareFlags {
    pub const NONE: PrepareFlags = PrepareFlags(0);
    /// Control may continue past this node.
    pub const FALLTHROUGH: PrepareFlags = PrepareFlags(1 << 0);
    /// The node is a compile-time constant.
    pub const CONSTANT: PrepareFlags = PrepareFlags(1 << 1);
    /// A fatal error was reported; the subtree is abandoned.
    pub const ABANDON: PrepareFlags = PrepareFlags(1 << 2);

    pub const fn abandoned(self) -> bool {
        self.0 & PrepareFlags::ABANDON.0 != 0
    }

    pub const fn fallthrough(self) -> bool {
        self.0 & PrepareFlags::FALLTHROUGH.0 != 0
    }

    pub const fn constant(self) -> bool {
        self.0 & PrepareFlags::CONSTANT.0 != 0
    }

    /// Intersection, used to merge sibling expression flags.
    pub const fn mask(self, other: PrepareFlags) -> PrepareFlags {
        PrepareFlags(self.0 & other.0)
    }
}

/// Per-function preparation state: the declared return type and
/// whether a `yield` turned the function into a generator.
#[derive(Debug, Clone)]
pub struct ScopeFunction {
    pub rettype: Type,
    pub generator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithmeticTypes {
    None,
    Int,
    Float,
    Both,
}

fn arithmetic_types(ty: &Type) -> ArithmeticTypes {
    let bits = ty.simple_bits().mask(Kind::ARITHMETIC);
    if bits == Kind::ARITHMETIC {
        ArithmeticTypes::Both
    } else if bits == Kind::INT {
        ArithmeticTypes::Int
    } else if bits == Kind::FLOAT {
        ArithmeticTypes::Float
    } else {
        ArithmeticTypes::None
    }
}

/// The result type of a successfully-checked binary expression.
fn binary_result_type(op: BinaryOp, ltype: &Type, rtype: &Type) -> Type {
    match op {
        BinaryOp::Plus
        | BinaryOp::Minus
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Remainder => {
            let lbits = ltype.simple_bits().mask(Kind::ARITHMETIC);
            let rbits = rtype.simple_bits().mask(Kind::ARITHMETIC);
            if !lbits.has_any(Kind::INT) || !rbits.has_any(Kind::INT) {
                Type::FLOAT
            } else if lbits.has_any(Kind::FLOAT) || rbits.has_any(Kind::FLOAT) {
                Type::ARITHMETIC
            } else {
                Type::INT
            }
        }
        BinaryOp::Less
        | BinaryOp::LessEqual
        | BinaryOp::Greater
        | BinaryOp::GreaterEqual
        | BinaryOp::Equal
        | BinaryOp::Unequal
        | BinaryOp::LogicalAnd
        | BinaryOp::LogicalOr => Type::BOOL,
        BinaryOp::BitwiseAnd | BinaryOp::BitwiseOr | BinaryOp::BitwiseXor => {
            let bits = ltype
                .simple_bits()
                .mask(rtype.simple_bits())
                .mask(Kind::BOOL | Kind::INT);
            if bits.is_empty() {
                Type::INT
            } else {
                Type::Simple(bits)
            }
        }
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::ShiftRightUnsigned => Type::INT,
        BinaryOp::NullCoalescing => ltype.coalesced(rtype),
        BinaryOp::Lambda => Type::VOID,
    }
}

/// Rewrite a comparison argument into its predicate form so assertion
/// failures can report both operands.
fn empredicate(node: &mut ProgramNode) {
    let rewrite = matches!(&node.kind, ProgramKind::Binary { op, .. } if op.is_comparison());
    if rewrite {
        let kind = std::mem::replace(&mut node.kind, ProgramKind::LiteralNull);
        if let ProgramKind::Binary { op, lhs, rhs } = kind {
            node.kind = ProgramKind::Predicate { op, lhs, rhs };
        }
    }
}

/// The preparation walker.
pub struct Preparer<'a> {
    resource: &'a str,
    collector: DiagnosticCollector,
    symbols: SymbolTable,
    functions: Vec<ScopeFunction>,
    /// Ambient declaration type used by for-each element inference.
    ambient: Option<Type>,
}

impl<'a> Preparer<'a> {
    /// A preparer with a fresh root scope holding the built-ins.
    pub fn new(resource: &'a str) -> Self {
        let mut symbols = SymbolTable::new();
        builtins::register(&mut symbols);
        Preparer {
            resource,
            collector: DiagnosticCollector::new(),
            symbols,
            functions: Vec::new(),
            ambient: None,
        }
    }

    pub fn collector(&self) -> &DiagnosticCollector {
        &self.collector
    }

    pub fn into_parts(self) -> (DiagnosticCollector, SymbolTable) {
        (self.collector, self.symbols)
    }

    fn error(&mut self, location: SourceLocation, message: String) -> PrepareFlags {
        self.collector.report(
            Diagnostic::error(self.resource, message)
                .with_kind(DiagnosticKind::Type)
                .with_location(location),
        );
        PrepareFlags::ABANDON
    }

    fn inference_error(&mut self, location: SourceLocation, message: String) -> PrepareFlags {
        self.collector.report(
            Diagnostic::error(self.resource, message)
                .with_kind(DiagnosticKind::Inference)
                .with_location(location),
        );
        PrepareFlags::ABANDON
    }

    fn warning(&mut self, location: SourceLocation, message: String) {
        self.collector.report(
            Diagnostic::warning(self.resource, message).with_location(location),
        );
    }

    /// Prepare one node, annotating its type where preparation
    /// resolves one.
    pub fn prepare(&mut self, node: &mut ProgramNode) -> PrepareFlags {
        let location = node.location;
        let mut annotation: Option<Type> = None;
        let flags = match &mut node.kind {
            ProgramKind::Module(statements) => {
                if self.find_duplicate_symbols(statements) {
                    PrepareFlags::ABANDON
                } else {
                    self.prepare_statements(statements)
                }
            }
            ProgramKind::Block(statements) => {
                if self.find_duplicate_symbols(statements) {
                    PrepareFlags::ABANDON
                } else {
                    self.symbols.push_scope();
                    let flags = self.prepare_statements(statements);
                    self.symbols.pop_scope();
                    flags
                }
            }
            ProgramKind::TypeLiteral(_) => PrepareFlags::NONE,
            ProgramKind::Declare {
                name,
                declared,
                init,
            } => {
                let name = name.clone();
                if let Some(ambient) = self.ambient.clone() {
                    // A prepare call with an inferred element type; the
                    // for-each target never has an initializer.
                    self.type_check(location, declared, &ambient, &name, false)
                } else if let Some(init) = init {
                    if self.prepare(init).abandoned() {
                        PrepareFlags::ABANDON
                    } else {
                        let rtype = init.ty.clone();
                        let init_location = init.location;
                        self.type_check(init_location, declared, &rtype, &name, false)
                    }
                } else if declared.is_inferred() {
                    self.inference_error(
                        location,
                        format!("Cannot infer type of '{}' declared with 'var'", name),
                    )
                } else {
                    PrepareFlags::FALLTHROUGH
                }
            }
            ProgramKind::Guard {
                name,
                declared,
                expr,
            } => {
                let name = name.clone();
                if self.prepare(expr).abandoned() {
                    PrepareFlags::ABANDON
                } else {
                    let rtype = expr.ty.clone();
                    let flags = self.type_check(location, declared, &rtype, &name, true);
                    if !flags.abandoned() {
                        annotation = Some(Type::BOOL);
                    }
                    flags
                }
            }
            ProgramKind::Assign { op, lhs, rhs } => {
                let op = *op;
                self.prepare_assign(location, op, lhs, rhs)
            }
            ProgramKind::Mutate { op, lvalue } => {
                let op = *op;
                self.prepare_mutate(location, op, lvalue)
            }
            // A break or continue transfers control to just after (or
            // back to the top of) the enclosing construct; from the
            // statement list's viewpoint execution continues.
            ProgramKind::Break | ProgramKind::Continue => PrepareFlags::FALLTHROUGH,
            ProgramKind::Do { cond, block } => {
                if self.prepare(cond).abandoned() {
                    PrepareFlags::ABANDON
                } else {
                    self.prepare(block)
                }
            }
            ProgramKind::If {
                cond,
                then_block,
                else_block,
            } => self.prepare_if(cond, then_block, else_block.as_deref_mut()),
            ProgramKind::While { cond, block } => {
                let pushed = self.enter_scope_for(cond);
                let flags = 'scope: {
                    if self.prepare(cond).abandoned() {
                        break 'scope PrepareFlags::ABANDON;
                    }
                    self.prepare(block)
                };
                self.leave_scope(pushed);
                flags
            }
            ProgramKind::For {
                pre,
                cond,
                post,
                block,
            } => {
                let pushed = match pre.as_deref() {
                    Some(pre) => self.enter_scope_for(pre),
                    None => false,
                };
                let flags = 'scope: {
                    for clause in [pre.as_deref_mut(), cond.as_deref_mut(), post.as_deref_mut()]
                        .into_iter()
                        .flatten()
                    {
                        if self.prepare(clause).abandoned() {
                            break 'scope PrepareFlags::ABANDON;
                        }
                    }
                    self.prepare(block)
                };
                self.leave_scope(pushed);
                flags
            }
            ProgramKind::Foreach {
                target,
                expr,
                block,
            } => {
                let pushed = self.enter_scope_for(target);
                let flags = 'scope: {
                    if self.prepare(expr).abandoned() {
                        break 'scope PrepareFlags::ABANDON;
                    }
                    let ty = expr.ty.clone();
                    let element = match ty.iterable() {
                        Some(element) => element,
                        None => {
                            break 'scope self.error(
                                expr.location,
                                format!(
                                    "Expression after the ':' in 'for' statement is not iterable: '{}'",
                                    ty
                                ),
                            );
                        }
                    };
                    if self.prepare_with_type(target, element).abandoned() {
                        break 'scope PrepareFlags::ABANDON;
                    }
                    self.prepare(block)
                };
                self.leave_scope(pushed);
                flags
            }
            ProgramKind::FunctionDefinition {
                name,
                signature,
                block,
            } => {
                let name = name.clone();
                let signature = signature.clone();
                self.prepare_function_definition(location, &name, &signature, block)
            }
            ProgramKind::Generator { yield_type, block } => {
                let yield_type = yield_type.clone();
                self.prepare_generator(location, yield_type, block)
            }
            ProgramKind::Return { value } => {
                self.prepare_return(location, value.as_deref_mut())
            }
            ProgramKind::Yield { value } => self.prepare_yield(location, value),
            ProgramKind::Throw { value } => match value {
                Some(value) => {
                    if self.prepare(value).abandoned() {
                        PrepareFlags::ABANDON
                    } else {
                        PrepareFlags::NONE
                    }
                }
                None => PrepareFlags::NONE,
            },
            ProgramKind::Try {
                block,
                catches,
                finally,
            } => self.prepare_try(block, catches, finally.as_deref_mut()),
            ProgramKind::Catch { name, ty, block } => {
                let name = name.clone();
                if self.prepare(ty).abandoned() {
                    PrepareFlags::ABANDON
                } else {
                    let caught = ty.ty.clone();
                    self.symbols.push_scope();
                    let _ = self.symbols.define(Symbol::read_write(name, caught));
                    let flags = self.prepare(block);
                    self.symbols.pop_scope();
                    flags
                }
            }
            ProgramKind::Switch {
                value,
                default_index,
                cases,
            } => {
                let default_index = *default_index;
                let pushed = self.enter_scope_for(value);
                let flags = 'scope: {
                    if self.prepare(value).abandoned() {
                        break 'scope PrepareFlags::ABANDON;
                    }
                    let mut falls = default_index.is_none();
                    for case in cases.iter_mut() {
                        let flags = self.prepare(case);
                        if flags.abandoned() {
                            break 'scope PrepareFlags::ABANDON;
                        }
                        falls |= flags.fallthrough();
                    }
                    if falls {
                        PrepareFlags::FALLTHROUGH
                    } else {
                        PrepareFlags::NONE
                    }
                };
                self.leave_scope(pushed);
                flags
            }
            ProgramKind::Case { values, block } => {
                let mut abandoned = false;
                for value in values.iter_mut() {
                    if self.prepare(value).abandoned() {
                        abandoned = true;
                        break;
                    }
                }
                if abandoned {
                    PrepareFlags::ABANDON
                } else {
                    self.prepare(block)
                }
            }
            ProgramKind::Call { callee, args } => {
                let flags = self.prepare_call(callee, args);
                if !flags.abandoned() {
                    annotation = callee
                        .ty
                        .callable()
                        .map(|signature| signature.result.clone());
                }
                flags
            }
            ProgramKind::Identifier(name) => {
                let name = name.clone();
                match self.symbols.symbol_type(&name) {
                    Some(ty) => {
                        annotation = Some(ty);
                        PrepareFlags::NONE
                    }
                    None => self.error(location, format!("Unknown identifier: '{}'", name)),
                }
            }
            ProgramKind::LiteralInt(_)
            | ProgramKind::LiteralFloat(_)
            | ProgramKind::LiteralString(_)
            | ProgramKind::LiteralBool(_)
            | ProgramKind::LiteralNull => PrepareFlags::CONSTANT,
            ProgramKind::Unary { op, expr } => {
                let op = *op;
                let flags = self.prepare_unary(location, op, expr);
                if !flags.abandoned() {
                    annotation = match op {
                        UnaryOp::LogicalNot => Some(Type::BOOL),
                        UnaryOp::BitwiseNot => Some(Type::INT),
                        UnaryOp::Negate => Some(Type::Simple(
                            expr.ty.simple_bits().mask(Kind::ARITHMETIC),
                        )),
                        UnaryOp::Deref => expr.ty.pointee().cloned(),
                        UnaryOp::Ref => Some(expr.ty.pointer()),
                        UnaryOp::Ellipsis => None,
                    };
                }
                flags
            }
            ProgramKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let flags = self.prepare_binary(location, op, lhs, rhs);
                if !flags.abandoned() {
                    annotation = Some(binary_result_type(op, &lhs.ty, &rhs.ty));
                }
                flags
            }
            ProgramKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let flags = self.prepare_ternary(location, cond, then_expr, else_expr);
                if !flags.abandoned() {
                    annotation = Some(then_expr.ty.union_with(&else_expr.ty));
                }
                flags
            }
            ProgramKind::Predicate { op, lhs, rhs } => {
                let op = *op;
                let flags = self.prepare_binary(location, op, lhs, rhs);
                if !flags.abandoned() {
                    annotation = Some(Type::BOOL);
                }
                flags
            }
            ProgramKind::Dot { instance, property } => {
                let property = property.clone();
                let (flags, ty) = self.prepare_dot(location, instance, &property);
                annotation = ty;
                flags
            }
            ProgramKind::Index { instance, index } => {
                let (flags, ty) = self.prepare_brackets(location, instance, index);
                annotation = ty;
                flags
            }
            ProgramKind::ArrayLiteral(values) => {
                self.prepare_all(values)
            }
            ProgramKind::ObjectLiteral(entries) => {
                let mut abandoned = false;
                for (_, value) in entries.iter_mut() {
                    if self.prepare(value).abandoned() {
                        abandoned = true;
                        break;
                    }
                }
                if abandoned {
                    PrepareFlags::ABANDON
                } else {
                    PrepareFlags::NONE
                }
            }
        };
        if let Some(ty) = annotation {
            node.ty = ty;
        }
        flags
    }

    // ----- scope plumbing -----

    /// If the node declares a symbol, open a fresh scope holding it.
    fn enter_scope_for(&mut self, node: &ProgramNode) -> bool {
        let symbol = node.symbol().map(|(name, ty)| (name.to_string(), ty));
        match symbol {
            Some((name, ty)) => {
                self.symbols.push_scope();
                let _ = self.symbols.define(Symbol::read_write(name, ty));
                true
            }
            None => false,
        }
    }

    fn leave_scope(&mut self, pushed: bool) {
        if pushed {
            self.symbols.pop_scope();
        }
    }

    /// Run a prepare call with the ambient declaration type set.
    fn prepare_with_type(&mut self, node: &mut ProgramNode, ty: Type) -> PrepareFlags {
        debug_assert!(self.ambient.is_none());
        self.ambient = Some(ty);
        let flags = self.prepare(node);
        self.ambient = None;
        flags
    }

    // ----- statement lists -----

    fn find_duplicate_symbols(&mut self, statements: &[ProgramNode]) -> bool {
        let mut seen: HashSet<String> = HashSet::new();
        let mut duplicated = false;
        for statement in statements {
            if let Some((name, _)) = statement.symbol() {
                if !seen.insert(name.to_string()) {
                    let location = statement.location;
                    let message = format!("Duplicate symbol declared: '{}'", name);
                    self.error(location, message);
                    duplicated = true;
                }
            }
        }
        duplicated
    }

    fn prepare_statements(&mut self, statements: &mut [ProgramNode]) -> PrepareFlags {
        // We fall through if there are no statements at all.
        let mut retval = PrepareFlags::FALLTHROUGH;
        let mut unreachable = false;
        for statement in statements.iter_mut() {
            if !unreachable && !retval.fallthrough() {
                self.warning(statement.location, "Unreachable code".to_string());
                unreachable = true;
            }
            if let Some((name, ty)) = statement.symbol() {
                // Duplicates were discovered before this walk began.
                let name = name.to_string();
                let _ = self.symbols.define(Symbol::read_write(name, ty));
            }
            retval = self.prepare(statement);
            if retval.abandoned() {
                return retval;
            }
            // Only correct after preparation; beforehand the type is
            // still the placeholder 'void'.
            let rettype = statement.ty.clone();
            if rettype.simple_bits() != Kind::VOID {
                self.warning(
                    statement.location,
                    format!(
                        "Expected statement to return 'void', but got '{}' instead",
                        rettype
                    ),
                );
            }
        }
        retval
    }

    fn prepare_all(&mut self, nodes: &mut [ProgramNode]) -> PrepareFlags {
        for node in nodes.iter_mut() {
            if self.prepare(node).abandoned() {
                return PrepareFlags::ABANDON;
            }
        }
        PrepareFlags::NONE
    }

    // ----- declarations and assignment -----

    fn type_check(
        &mut self,
        location: SourceLocation,
        ltype: &mut Type,
        rtype: &Type,
        name: &str,
        guard: bool,
    ) -> PrepareFlags {
        if ltype.is_inferred() {
            let mut inferred = rtype.devoided();
            if guard {
                inferred = inferred.and_then(|ty| ty.denulled());
            }
            match inferred {
                Some(ty) => {
                    *ltype = ty.clone();
                    self.symbols.set_inferred(name, ty);
                }
                None => {
                    return self.inference_error(
                        location,
                        format!(
                            "Cannot infer type of '{}' based on a value of type '{}'",
                            name, rtype
                        ),
                    );
                }
            }
        }
        match ltype.can_be_assigned_from(rtype) {
            Assignability::Never => self.error(
                location,
                format!(
                    "Cannot initialize '{}' of type '{}' with a value of type '{}'",
                    name, ltype, rtype
                ),
            ),
            Assignability::Always if guard => {
                self.warning(
                    location,
                    format!(
                        "Guarded assignment to '{}' of type '{}' will always succeed",
                        name, ltype
                    ),
                );
                PrepareFlags::FALLTHROUGH
            }
            _ => PrepareFlags::FALLTHROUGH,
        }
    }

    fn prepare_assign(
        &mut self,
        location: SourceLocation,
        op: AssignOp,
        lhs: &mut ProgramNode,
        rhs: &mut ProgramNode,
    ) -> PrepareFlags {
        if self.prepare(lhs).abandoned() || self.prepare(rhs).abandoned() {
            return PrepareFlags::ABANDON;
        }
        let ltype = lhs.ty.clone();
        let rtype = rhs.ty.clone();
        match op {
            AssignOp::Assign => {
                if ltype.can_be_assigned_from(&rtype) == Assignability::Never {
                    return self.error(
                        location,
                        format!(
                            "Cannot assign a value of type '{}' to a target of type '{}'",
                            rtype, ltype
                        ),
                    );
                }
            }
            AssignOp::LogicalAnd | AssignOp::LogicalOr => {
                if !ltype.has(Kind::BOOL) {
                    return self.error(
                        location,
                        format!(
                            "Expected left-hand side of '{}' assignment operator to be 'bool', but got '{}' instead",
                            op, ltype
                        ),
                    );
                }
                if !rtype.has(Kind::BOOL) {
                    return self.error(
                        location,
                        format!(
                            "Expected right-hand side of '{}' assignment operator to be 'bool', but got '{}' instead",
                            op, rtype
                        ),
                    );
                }
            }
            AssignOp::BitwiseAnd | AssignOp::BitwiseOr | AssignOp::BitwiseXor => {
                if !ltype.has(Kind::BOOL | Kind::INT) {
                    return self.error(
                        location,
                        format!(
                            "Expected left-hand side of '{}' assignment operator to be 'bool' or 'int', but got '{}' instead",
                            op, ltype
                        ),
                    );
                }
                if rtype.simple_bits() != ltype.simple_bits() {
                    return self.error(
                        location,
                        format!(
                            "Expected right-hand target of '{}' assignment operator to be '{}', but got '{}' instead",
                            op, ltype, rtype
                        ),
                    );
                }
            }
            AssignOp::ShiftLeft | AssignOp::ShiftRight | AssignOp::ShiftRightUnsigned => {
                if !ltype.has(Kind::INT) {
                    return self.error(
                        location,
                        format!(
                            "Expected left-hand target of integer '{}' assignment operator to be 'int', but got '{}' instead",
                            op, ltype
                        ),
                    );
                }
                if !rtype.has(Kind::INT) {
                    return self.error(
                        location,
                        format!(
                            "Expected right-hand side of integer '{}' assignment operator to be 'int', but got '{}' instead",
                            op, rtype
                        ),
                    );
                }
            }
            AssignOp::Remainder
            | AssignOp::Multiply
            | AssignOp::Plus
            | AssignOp::Minus
            | AssignOp::Divide => match arithmetic_types(&rtype) {
                ArithmeticTypes::Float => {
                    if !ltype.has(Kind::FLOAT) {
                        return self.error(
                            location,
                            format!(
                                "Expected left-hand target of floating-point '{}' assignment operator to be 'float', but got '{}' instead",
                                op, ltype
                            ),
                        );
                    }
                }
                ArithmeticTypes::Both | ArithmeticTypes::Int => {
                    if arithmetic_types(&ltype) == ArithmeticTypes::None {
                        return self.error(
                            location,
                            format!(
                                "Expected left-hand target of '{}' assignment operator to be 'int' or 'float', but got '{}' instead",
                                op, ltype
                            ),
                        );
                    }
                }
                ArithmeticTypes::None => {
                    return self.error(
                        location,
                        format!(
                            "Expected right-hand side of '{}' assignment operator to be 'int' or 'float', but got '{}' instead",
                            op, rtype
                        ),
                    );
                }
            },
            AssignOp::NullCoalescing => {
                if ltype.can_be_assigned_from(&rtype) == Assignability::Never {
                    return self.error(
                        location,
                        format!(
                            "Cannot assign a value of type '{}' to a target of type '{}'",
                            rtype, ltype
                        ),
                    );
                }
                if !ltype.has(Kind::NULL) {
                    self.warning(
                        location,
                        format!(
                            "Expected left-hand target of null-coalescing '??=' assignment operator to be possibly 'null', but got '{}' instead",
                            ltype
                        ),
                    );
                }
            }
        }
        PrepareFlags::FALLTHROUGH
    }

    fn prepare_mutate(
        &mut self,
        location: SourceLocation,
        op: MutateOp,
        lvalue: &mut ProgramNode,
    ) -> PrepareFlags {
        if self.prepare(lvalue).abandoned() {
            return PrepareFlags::ABANDON;
        }
        let ltype = lvalue.ty.clone();
        if !ltype.has(Kind::INT) {
            return self.error(
                location,
                format!(
                    "Expected target of integer '{}' operator to be 'int', but got '{}' instead",
                    op, ltype
                ),
            );
        }
        PrepareFlags::FALLTHROUGH
    }

    // ----- control flow -----

    fn prepare_if(
        &mut self,
        cond: &mut ProgramNode,
        then_block: &mut ProgramNode,
        else_block: Option<&mut ProgramNode>,
    ) -> PrepareFlags {
        let pushed = self.enter_scope_for(cond);
        let result = 'scope: {
            let pcond = self.prepare(cond);
            if pcond.abandoned() {
                break 'scope PrepareFlags::ABANDON;
            }
            if pcond.constant() {
                self.warning(
                    cond.location,
                    "Condition in 'if' statement is constant".to_string(),
                );
            }
            self.prepare(then_block)
        };
        // The else branch belongs to the original scope, without the
        // guarded identifier.
        self.leave_scope(pushed);
        if result.abandoned() {
            return result;
        }
        match else_block {
            None => PrepareFlags::FALLTHROUGH,
            Some(else_block) => {
                let pfalse = self.prepare(else_block);
                if pfalse.abandoned() {
                    return PrepareFlags::ABANDON;
                }
                if result.fallthrough() {
                    result
                } else {
                    pfalse
                }
            }
        }
    }

    fn prepare_try(
        &mut self,
        block: &mut ProgramNode,
        catches: &mut [ProgramNode],
        finally: Option<&mut ProgramNode>,
    ) -> PrepareFlags {
        let flags = self.prepare(block);
        if flags.abandoned() {
            return PrepareFlags::ABANDON;
        }
        let mut falls = flags.fallthrough();
        for catch in catches.iter_mut() {
            let flags = self.prepare(catch);
            if flags.abandoned() {
                return PrepareFlags::ABANDON;
            }
            falls |= flags.fallthrough();
        }
        if let Some(finally) = finally {
            let flags = self.prepare(finally);
            if flags.abandoned() {
                return PrepareFlags::ABANDON;
            }
            falls |= flags.fallthrough();
        }
        if falls {
            PrepareFlags::FALLTHROUGH
        } else {
            PrepareFlags::NONE
        }
    }

    // ----- functions, return and yield -----

    fn prepare_function_definition(
        &mut self,
        location: SourceLocation,
        name: &str,
        signature: &Type,
        block: &mut ProgramNode,
    ) -> PrepareFlags {
        let callable = match signature.callable() {
            Some(callable) => callable.clone(),
            None => {
                return self.error(
                    location,
                    format!("Expected function definition '{}' to have a callable type", name),
                );
            }
        };
        self.symbols.push_scope();
        for parameter in &callable.params {
            let _ = self.symbols.define(Symbol::read_write(
                parameter.name.clone(),
                parameter.ty.clone(),
            ));
        }
        // Overwritten later if this turns out to be a generator.
        self.functions.push(ScopeFunction {
            rettype: callable.result.clone(),
            generator: false,
        });
        let flags = self.prepare(block);
        let Some(function) = self.functions.pop() else {
            self.symbols.pop_scope();
            return PrepareFlags::ABANDON;
        };
        self.symbols.pop_scope();
        if flags.abandoned() {
            return flags;
        }
        if flags.fallthrough() && !function.rettype.has(Kind::VOID) {
            // Falling off the end of a non-void function is a missing
            // implicit return.
            return self.error(
                block.location,
                format!(
                    "Missing 'return' statement with a value of type '{}' at the end of the function definition: '{}'",
                    function.rettype, name
                ),
            );
        }
        // We fall through AFTER the function definition itself.
        PrepareFlags::FALLTHROUGH
    }

    fn prepare_generator(
        &mut self,
        location: SourceLocation,
        yield_type: Type,
        block: &mut ProgramNode,
    ) -> PrepareFlags {
        match self.functions.last_mut() {
            Some(function) => {
                function.rettype = yield_type;
                function.generator = true;
            }
            None => {
                return self.error(location, "Unexpected generator definition".to_string());
            }
        }
        let flags = self.prepare(block);
        if flags.abandoned() {
            return flags;
        }
        // The generator definition lowers to a single return of the
        // iterator object; it never falls through.
        PrepareFlags::NONE
    }

    fn prepare_return(
        &mut self,
        location: SourceLocation,
        value: Option<&mut ProgramNode>,
    ) -> PrepareFlags {
        let Some(function) = self.functions.last().cloned() else {
            return self.error(location, "Unexpected 'return' statement".to_string());
        };
        if function.generator {
            return match value {
                None => PrepareFlags::NONE,
                Some(_) => self.error(
                    location,
                    "Unexpected value in generator 'return' statement".to_string(),
                ),
            };
        }
        match value {
            None => {
                if function.rettype.can_be_assigned_from(&Type::VOID) == Assignability::Never {
                    return self.error(
                        location,
                        format!(
                            "Expected 'return' statement with a value of type '{}'",
                            function.rettype
                        ),
                    );
                }
                PrepareFlags::NONE
            }
            Some(value) => {
                if self.prepare(value).abandoned() {
                    return PrepareFlags::ABANDON;
                }
                let rtype = value.ty.clone();
                if function.rettype.can_be_assigned_from(&rtype) == Assignability::Never {
                    return self.error(
                        location,
                        format!(
                            "Expected 'return' statement with a value of type '{}', but got '{}' instead",
                            function.rettype, rtype
                        ),
                    );
                }
                PrepareFlags::NONE
            }
        }
    }

    fn prepare_yield(
        &mut self,
        location: SourceLocation,
        value: &mut ProgramNode,
    ) -> PrepareFlags {
        let generator = self
            .functions
            .last()
            .map(|function| function.generator)
            .unwrap_or(false);
        if !generator {
            return self.error(location, "Unexpected 'yield' statement".to_string());
        }
        if self.prepare(value).abandoned() {
            return PrepareFlags::ABANDON;
        }
        let rtype = value.ty.clone();
        let rettype = self
            .functions
            .last()
            .map(|function| function.rettype.clone())
            .unwrap_or(Type::VOID);
        if rettype.can_be_assigned_from(&rtype) == Assignability::Never {
            return self.error(
                location,
                format!(
                    "Expected 'yield' statement with a value of type '{}', but got '{}' instead",
                    rettype, rtype
                ),
            );
        }
        PrepareFlags::FALLTHROUGH
    }

    // ----- calls and member access -----

    fn prepare_call(
        &mut self,
        callee: &mut ProgramNode,
        args: &mut [ProgramNode],
    ) -> PrepareFlags {
        if self.prepare(callee).abandoned() {
            return PrepareFlags::ABANDON;
        }
        let ctype = callee.ty.clone();
        let signature: Signature = match ctype.callable() {
            Some(signature) => signature.clone(),
            None => {
                return self.error(
                    callee.location,
                    format!(
                        "Expected function-like expression to be callable, but got '{}' instead",
                        ctype
                    ),
                );
            }
        };
        let expected = signature.params.len();
        let total = args.len();
        let mut position = 0usize;
        let mut variadic = false;
        for arg in args.iter_mut() {
            if position >= expected {
                return self.error(
                    arg.location,
                    format!(
                        "Expected {} parameters for '{}', but got {} instead",
                        expected, ctype, total
                    ),
                );
            }
            let parameter = &signature.params[position];
            if parameter.flags.has(ParameterFlags::VARIADIC) {
                variadic = true;
            }
            if parameter.flags.has(ParameterFlags::PREDICATE) {
                empredicate(arg);
            }
            if self.prepare(arg).abandoned() {
                return PrepareFlags::ABANDON;
            }
            if !variadic {
                position += 1;
            }
        }
        PrepareFlags::FALLTHROUGH
    }

    fn prepare_dot(
        &mut self,
        location: SourceLocation,
        instance: &mut ProgramNode,
        property: &str,
    ) -> (PrepareFlags, Option<Type>) {
        if self.prepare(instance).abandoned() {
            return (PrepareFlags::ABANDON, None);
        }
        let ltype = instance.ty.clone();
        if ltype.has(Kind::STRING) {
            if let Some(ty) = builtins::string_builtin(property) {
                return (PrepareFlags::NONE, Some(ty));
            }
        }
        if ltype.has(Kind::OBJECT) {
            return match ltype.dotable(property) {
                Ok(ty) => (PrepareFlags::NONE, Some(ty)),
                Err(reason) => (self.error(location, reason), None),
            };
        }
        if ltype.has(Kind::STRING) {
            return (
                self.error(
                    location,
                    format!("Unknown property for 'string' value: '.{}'", property),
                ),
                None,
            );
        }
        (
            self.error(
                location,
                format!(
                    "Expected subject of '.' operator to be 'string' or 'object', but got '{}' instead",
                    ltype
                ),
            ),
            None,
        )
    }

    fn prepare_brackets(
        &mut self,
        location: SourceLocation,
        instance: &mut ProgramNode,
        index: &mut ProgramNode,
    ) -> (PrepareFlags, Option<Type>) {
        if self.prepare(instance).abandoned() || self.prepare(index).abandoned() {
            return (PrepareFlags::ABANDON, None);
        }
        let ltype = instance.ty.clone();
        if ltype.has(Kind::OBJECT) {
            // Ask the object what indexing it supports.
            return match ltype.indexable() {
                Some(signature) => (PrepareFlags::NONE, Some(signature.result)),
                None => (
                    self.error(
                        location,
                        format!(
                            "Values of type '{}' do not support the indexing '[]' operator",
                            ltype
                        ),
                    ),
                    None,
                ),
            };
        }
        if ltype.has(Kind::STRING) {
            // Strings only accept integer indices.
            let rtype = index.ty.clone();
            if rtype.has(Kind::INT) {
                return (PrepareFlags::NONE, Some(Type::STRING));
            }
            return (
                self.error(
                    location,
                    format!(
                        "Expected index of 'string' value to be 'int', but got '{}' instead",
                        rtype
                    ),
                ),
                None,
            );
        }
        (
            self.error(
                location,
                format!(
                    "Expected subject of '[]' operator to be 'string' or 'object', but got '{}' instead",
                    ltype
                ),
            ),
            None,
        )
    }

    // ----- operators -----

    fn check_binary_side(
        &mut self,
        location: SourceLocation,
        op: BinaryOp,
        side: &str,
        expected: Kind,
        node: &mut ProgramNode,
    ) -> PrepareFlags {
        let prepared = self.prepare(node);
        if !prepared.abandoned() {
            let ty = node.ty.clone();
            if !ty.has(expected) {
                if expected == Kind::NULL {
                    self.warning(
                        location,
                        format!(
                            "Expected {} of '{}' operator to be possibly 'null', but got '{}' instead",
                            side, op, ty
                        ),
                    );
                } else {
                    return self.error(
                        location,
                        format!(
                            "Expected {} of '{}' operator to be '{}', but got '{}' instead",
                            side,
                            op,
                            expected.readable(),
                            ty
                        ),
                    );
                }
            }
        }
        prepared
    }

    fn check_binary(
        &mut self,
        location: SourceLocation,
        op: BinaryOp,
        lexpected: Kind,
        lhs: &mut ProgramNode,
        rexpected: Kind,
        rhs: &mut ProgramNode,
    ) -> PrepareFlags {
        let lflags = self.check_binary_side(location, op, "left-hand side", lexpected, lhs);
        if lflags.abandoned() {
            return lflags;
        }
        let rflags = self.check_binary_side(location, op, "right-hand side", rexpected, rhs);
        if rflags.abandoned() {
            return rflags;
        }
        lflags.mask(rflags)
    }

    fn prepare_binary(
        &mut self,
        location: SourceLocation,
        op: BinaryOp,
        lhs: &mut ProgramNode,
        rhs: &mut ProgramNode,
    ) -> PrepareFlags {
        match op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                self.check_binary(location, op, Kind::BOOL, lhs, Kind::BOOL, rhs)
            }
            BinaryOp::BitwiseAnd | BinaryOp::BitwiseOr | BinaryOp::BitwiseXor => self
                .check_binary(
                    location,
                    op,
                    Kind::BOOL | Kind::INT,
                    lhs,
                    Kind::BOOL | Kind::INT,
                    rhs,
                ),
            BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::ShiftRightUnsigned => {
                self.check_binary(location, op, Kind::INT, lhs, Kind::INT, rhs)
            }
            BinaryOp::Plus
            | BinaryOp::Minus
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Remainder
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => {
                self.check_binary(location, op, Kind::ARITHMETIC, lhs, Kind::ARITHMETIC, rhs)
            }
            BinaryOp::Equal | BinaryOp::Unequal => {
                // Equality imposes no type constraint.
                if self.prepare(lhs).abandoned() || self.prepare(rhs).abandoned() {
                    PrepareFlags::ABANDON
                } else {
                    PrepareFlags::NONE
                }
            }
            BinaryOp::NullCoalescing => {
                // Warn if the left-hand side can never be null.
                self.check_binary(location, op, Kind::NULL, lhs, Kind::ANY_Q, rhs)
            }
            BinaryOp::Lambda => {
                self.error(location, "The '->' operator is not yet supported".to_string())
            }
        }
    }

    fn prepare_unary(
        &mut self,
        location: SourceLocation,
        op: UnaryOp,
        value: &mut ProgramNode,
    ) -> PrepareFlags {
        if self.prepare(value).abandoned() {
            return PrepareFlags::ABANDON;
        }
        let ty = value.ty.clone();
        match op {
            UnaryOp::LogicalNot => {
                if !ty.has(Kind::BOOL) {
                    return self.error(
                        location,
                        format!(
                            "Expected operand of logical-not '!' operator to be 'bool', but got '{}' instead",
                            ty
                        ),
                    );
                }
            }
            UnaryOp::BitwiseNot => {
                if !ty.has(Kind::INT) {
                    return self.error(
                        location,
                        format!(
                            "Expected operand of bitwise-not '~' operator to be 'int', but got '{}' instead",
                            ty
                        ),
                    );
                }
            }
            UnaryOp::Negate => {
                if arithmetic_types(&ty) == ArithmeticTypes::None {
                    return self.error(
                        location,
                        format!(
                            "Expected operand of negation '-' operator to be 'int' or 'float', but got '{}' instead",
                            ty
                        ),
                    );
                }
            }
            UnaryOp::Ref => {
                // '&' asks the child to produce the address of the
                // value; only lvalue-shaped nodes can.
                if !matches!(
                    value.kind,
                    ProgramKind::Identifier(_)
                        | ProgramKind::Dot { .. }
                        | ProgramKind::Index { .. }
                ) {
                    return self.error(
                        location,
                        "Expected operand of reference '&' operator to be addressable".to_string(),
                    );
                }
            }
            UnaryOp::Deref => {
                if ty.pointee().is_none() {
                    return self.error(
                        location,
                        format!(
                            "Expected operand of dereference '*' operator to be a pointer, but got '{}' instead",
                            ty
                        ),
                    );
                }
            }
            UnaryOp::Ellipsis => {
                return self.error(
                    location,
                    "Unary '...' operator not yet supported".to_string(),
                );
            }
        }
        PrepareFlags::NONE
    }

    fn prepare_ternary(
        &mut self,
        location: SourceLocation,
        cond: &mut ProgramNode,
        then_expr: &mut ProgramNode,
        else_expr: &mut ProgramNode,
    ) -> PrepareFlags {
        if self.prepare(cond).abandoned()
            || self.prepare(then_expr).abandoned()
            || self.prepare(else_expr).abandoned()
        {
            return PrepareFlags::ABANDON;
        }
        let ty = cond.ty.clone();
        if !ty.has(Kind::BOOL) {
            return self.error(
                location,
                format!(
                    "Expected condition of ternary '?:' operator to be 'bool', but got '{}' instead",
                    ty
                ),
            );
        }
        let ty = then_expr.ty.clone();
        if ty.simple_bits().is_empty() {
            return self.error(
                then_expr.location,
                format!(
                    "Expected value for second operand of ternary '?:' operator, but got '{}' instead",
                    ty
                ),
            );
        }
        let ty = else_expr.ty.clone();
        if ty.simple_bits().is_empty() {
            return self.error(
                else_expr.location,
                format!(
                    "Expected value for third operand of ternary '?:' operator, but got '{}' instead",
                    ty
                ),
            );
        }
        PrepareFlags::NONE
    }
}
