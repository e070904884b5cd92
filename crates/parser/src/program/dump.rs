//! Parenthesized S-expression dumps of the program tree.
//!
//! The exact format is contractual: `(module (initialize 'foo'
//! (type 'var') (literal int 42)))` and friends are matched verbatim
//! by the test corpus.

use super::{ProgramKind, ProgramNode};
use egg_runtime::Type;

struct SExpr<'a> {
    out: &'a mut String,
}

impl<'a> SExpr<'a> {
    fn new(out: &'a mut String, tag: &str) -> Self {
        out.push('(');
        out.push_str(tag);
        SExpr { out }
    }

    fn text(&mut self, text: &str) -> &mut Self {
        self.out.push(' ');
        self.out.push('\'');
        self.out.push_str(text);
        self.out.push('\'');
        self
    }

    fn raw(&mut self, text: &str) -> &mut Self {
        self.out.push(' ');
        self.out.push_str(text);
        self
    }

    fn child(&mut self, node: &ProgramNode) -> &mut Self {
        self.out.push(' ');
        node.dump_into(self.out);
        self
    }

    fn child_opt(&mut self, node: Option<&ProgramNode>) -> &mut Self {
        match node {
            Some(node) => self.child(node),
            None => self.raw("-"),
        }
    }

    fn children<'n>(&mut self, nodes: impl IntoIterator<Item = &'n ProgramNode>) -> &mut Self {
        for node in nodes {
            self.child(node);
        }
        self
    }

    fn type_child(&mut self, ty: &Type) -> &mut Self {
        self.out.push(' ');
        self.out.push_str("(type '");
        self.out.push_str(&ty.to_string());
        self.out.push_str("')");
        self
    }

    fn finish(self) {
        self.out.push(')');
    }
}

impl ProgramNode {
    /// Render this node as its S-expression dump.
    pub fn to_dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out);
        out
    }

    pub fn dump_into(&self, out: &mut String) {
        match &self.kind {
            ProgramKind::Module(statements) => {
                let mut s = SExpr::new(out, "module");
                s.children(statements);
                s.finish();
            }
            ProgramKind::Block(statements) => {
                let mut s = SExpr::new(out, "block");
                s.children(statements);
                s.finish();
            }
            ProgramKind::TypeLiteral(ty) => {
                let mut s = SExpr::new(out, "type");
                s.text(&ty.to_string());
                s.finish();
            }
            ProgramKind::Declare {
                name,
                declared,
                init,
            } => {
                let tag = if init.is_some() { "initialize" } else { "declare" };
                let mut s = SExpr::new(out, tag);
                s.text(name).type_child(declared);
                if let Some(init) = init {
                    s.child(init);
                }
                s.finish();
            }
            ProgramKind::Guard {
                name,
                declared,
                expr,
            } => {
                let mut s = SExpr::new(out, "guard");
                s.text(name).type_child(declared).child(expr);
                s.finish();
            }
            ProgramKind::Assign { op, lhs, rhs } => {
                let mut s = SExpr::new(out, "assign");
                s.text(op.as_str()).child(lhs).child(rhs);
                s.finish();
            }
            ProgramKind::Mutate { op, lvalue } => {
                let mut s = SExpr::new(out, "mutate");
                s.text(op.as_str()).child(lvalue);
                s.finish();
            }
            ProgramKind::Break => SExpr::new(out, "break").finish(),
            ProgramKind::Continue => SExpr::new(out, "continue").finish(),
            ProgramKind::Do { cond, block } => {
                let mut s = SExpr::new(out, "do");
                s.child(cond).child(block);
                s.finish();
            }
            ProgramKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let mut s = SExpr::new(out, "if");
                s.child(cond).child(then_block);
                if let Some(else_block) = else_block {
                    s.child(else_block);
                }
                s.finish();
            }
            ProgramKind::While { cond, block } => {
                let mut s = SExpr::new(out, "while");
                s.child(cond).child(block);
                s.finish();
            }
            ProgramKind::For {
                pre,
                cond,
                post,
                block,
            } => {
                let mut s = SExpr::new(out, "for");
                s.child_opt(pre.as_deref())
                    .child_opt(cond.as_deref())
                    .child_opt(post.as_deref())
                    .child(block);
                s.finish();
            }
            ProgramKind::Foreach {
                target,
                expr,
                block,
            } => {
                let mut s = SExpr::new(out, "foreach");
                s.child(target).child(expr).child(block);
                s.finish();
            }
            ProgramKind::FunctionDefinition {
                name,
                signature,
                block,
            } => {
                let mut s = SExpr::new(out, "function");
                s.text(name).text(&signature.to_string()).child(block);
                s.finish();
            }
            ProgramKind::Generator { block, .. } => {
                let mut s = SExpr::new(out, "generator");
                s.child(block);
                s.finish();
            }
            ProgramKind::Return { value } => {
                let mut s = SExpr::new(out, "return");
                if let Some(value) = value {
                    s.child(value);
                }
                s.finish();
            }
            ProgramKind::Yield { value } => {
                let mut s = SExpr::new(out, "yield");
                s.child(value);
                s.finish();
            }
            ProgramKind::Throw { value } => {
                let mut s = SExpr::new(out, "throw");
                if let Some(value) = value {
                    s.child(value);
                }
                s.finish();
            }
            ProgramKind::Try {
                block,
                catches,
                finally,
            } => {
                let mut s = SExpr::new(out, "try");
                s.child(block).children(catches);
                if let Some(finally) = finally {
                    s.child(finally);
                }
                s.finish();
            }
            ProgramKind::Catch { name, ty, block } => {
                let mut s = SExpr::new(out, "catch");
                s.text(name).child(ty).child(block);
                s.finish();
            }
            ProgramKind::Switch { value, cases, .. } => {
                let mut s = SExpr::new(out, "switch");
                s.child(value).children(cases);
                s.finish();
            }
            ProgramKind::Case { values, block } => {
                let tag = if values.is_empty() { "default" } else { "case" };
                let mut s = SExpr::new(out, tag);
                s.children(values).child(block);
                s.finish();
            }
            ProgramKind::Call { callee, args } => {
                let mut s = SExpr::new(out, "call");
                s.child(callee).children(args);
                s.finish();
            }
            ProgramKind::Identifier(name) => {
                let mut s = SExpr::new(out, "identifier");
                s.text(name);
                s.finish();
            }
            ProgramKind::LiteralInt(value) => {
                let mut s = SExpr::new(out, "literal int");
                s.raw(&value.to_string());
                s.finish();
            }
            ProgramKind::LiteralFloat(value) => {
                let mut s = SExpr::new(out, "literal float");
                s.raw(&format!("{:?}", value));
                s.finish();
            }
            ProgramKind::LiteralString(value) => {
                let mut s = SExpr::new(out, "literal string");
                s.text(value.as_str());
                s.finish();
            }
            ProgramKind::LiteralBool(value) => {
                let mut s = SExpr::new(out, "literal bool");
                s.raw(if *value { "true" } else { "false" });
                s.finish();
            }
            ProgramKind::LiteralNull => SExpr::new(out, "literal null").finish(),
            ProgramKind::Unary { op, expr } => {
                let mut s = SExpr::new(out, "unary");
                s.text(op.as_str()).child(expr);
                s.finish();
            }
            ProgramKind::Binary { op, lhs, rhs } => {
                let mut s = SExpr::new(out, "binary");
                s.text(op.as_str()).child(lhs).child(rhs);
                s.finish();
            }
            ProgramKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let mut s = SExpr::new(out, "ternary");
                s.child(cond).child(then_expr).child(else_expr);
                s.finish();
            }
            ProgramKind::Predicate { op, lhs, rhs } => {
                let mut s = SExpr::new(out, "predicate");
                s.text(op.as_str()).child(lhs).child(rhs);
                s.finish();
            }
            ProgramKind::Dot { instance, property } => {
                let mut s = SExpr::new(out, "dot");
                s.child(instance).text(property);
                s.finish();
            }
            ProgramKind::Index { instance, index } => {
                let mut s = SExpr::new(out, "index");
                s.child(instance).child(index);
                s.finish();
            }
            ProgramKind::ArrayLiteral(values) => {
                let mut s = SExpr::new(out, "array");
                s.children(values);
                s.finish();
            }
            ProgramKind::ObjectLiteral(entries) => {
                let mut s = SExpr::new(out, "object");
                for (key, value) in entries {
                    s.out.push_str(" (named ");
                    s.out.push('\'');
                    s.out.push_str(key);
                    s.out.push('\'');
                    s.out.push(' ');
                    value.dump_into(s.out);
                    s.out.push(')');
                }
                s.finish();
            }
        }
    }
}
