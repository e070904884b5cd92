//! Recursive-descent parser shaping tokens into the concrete tree.

use super::{CatchClause, Condition, Expr, ExprKind, Module, Param, Stmt, StmtKind, SwitchSection};
use crate::error::{line_column, SyntaxError};
use crate::lexer::{Lexer, Token, TokenKind};
use egg_runtime::{Kind, Type};
use text_size::{TextRange, TextSize};

/// Binary operator precedence levels, loosest first. Ternary `?:`
/// sits above the table; unary operators below it.
const BINARY_LEVELS: &[&[TokenKind]] = &[
    &[TokenKind::QueryQuery],
    &[TokenKind::BarBar],
    &[TokenKind::AmpersandAmpersand],
    &[TokenKind::Bar],
    &[TokenKind::Caret],
    &[TokenKind::Ampersand],
    &[TokenKind::EqualEqual, TokenKind::BangEqual],
    &[
        TokenKind::Less,
        TokenKind::LessEqual,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
    ],
    &[
        TokenKind::ShiftLeft,
        TokenKind::ShiftRight,
        TokenKind::ShiftRightUnsigned,
    ],
    &[TokenKind::Plus, TokenKind::Minus],
    &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
];

const UNARY_OPERATORS: &[TokenKind] = &[
    TokenKind::Bang,
    TokenKind::Minus,
    TokenKind::Tilde,
    TokenKind::Star,
    TokenKind::Ampersand,
    TokenKind::Ellipsis,
];

pub struct Parser<'a> {
    resource: &'a str,
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(resource: &'a str, source: &'a str) -> Result<Self, SyntaxError> {
        let tokens = Lexer::tokenize(resource, source)?;
        Ok(Parser {
            resource,
            source,
            tokens,
            pos: 0,
        })
    }

    /// Parse a whole module.
    pub fn parse_module(&mut self) -> Result<Module, SyntaxError> {
        let start = self.peek().start();
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Module {
            statements,
            span: TextRange::new(start, self.prev_end()),
        })
    }

    /// Parse a single expression covering the whole input.
    pub fn parse_expression_entry(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_expression_checked("Expected expression")?;
        if !self.check(TokenKind::Eof) {
            return Err(self.error_after("Expected end of expression"));
        }
        Ok(expr)
    }

    // ----- token plumbing -----

    fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, reason: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_after(reason))
        }
    }

    fn slice(&self, token: Token) -> &'a str {
        &self.source[usize::from(token.start())..usize::from(token.end())]
    }

    /// End offset of the last consumed token; zero at the start.
    fn prev_end(&self) -> TextSize {
        if self.pos == 0 {
            TextSize::from(0)
        } else {
            self.tokens[self.pos - 1].end()
        }
    }

    /// Report a failure at the position just past the last consumed
    /// token. This matches how the grammar phrases its errors:
    /// "expected X after Y" points where X should have begun.
    fn error_after(&self, reason: &str) -> SyntaxError {
        SyntaxError::new(
            reason,
            self.resource,
            line_column(self.source, usize::from(self.prev_end())),
        )
    }

    fn error_at(&self, offset: TextSize, reason: &str) -> SyntaxError {
        SyntaxError::new(
            reason,
            self.resource,
            line_column(self.source, usize::from(offset)),
        )
    }

    fn span_from(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.prev_end())
    }

    // ----- types -----

    /// Parse a type. Only called when the current token starts one.
    fn parse_type(&mut self) -> Type {
        let token = self.advance();
        let mut ty = match token.kind {
            TokenKind::Var => Type::Inferred,
            TokenKind::Any => Type::ANY,
            TokenKind::Void => Type::VOID,
            TokenKind::Bool => Type::BOOL,
            TokenKind::Int => Type::INT,
            TokenKind::Float => Type::FLOAT,
            TokenKind::String => Type::STRING,
            TokenKind::Object => Type::OBJECT,
            TokenKind::Type => Type::TYPE,
            _ => unreachable!("parse_type called on a non-type token"),
        };
        if !ty.is_inferred() && self.eat(TokenKind::Query) {
            if let Type::Simple(bits) = ty {
                ty = Type::Simple(bits.set(Kind::NULL));
            }
        }
        while self.eat(TokenKind::Star) {
            ty = ty.pointer();
        }
        ty
    }

    // ----- statements -----

    pub fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.stmt(start, StmtKind::Empty))
            }
            TokenKind::CurlyLeft => self.parse_block(),
            TokenKind::Break => {
                self.advance();
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after 'break' statement",
                )?;
                Ok(self.stmt(start, StmtKind::Break))
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after 'continue' statement",
                )?;
                Ok(self.stmt(start, StmtKind::Continue))
            }
            TokenKind::Case => {
                self.advance();
                let value = self.parse_expression_checked("Expected expression after 'case'")?;
                self.expect(TokenKind::Colon, "Expected colon after 'case' value")?;
                Ok(self.stmt(start, StmtKind::Case {
                    values: vec![value],
                }))
            }
            TokenKind::Default => {
                self.advance();
                self.expect(TokenKind::Colon, "Expected colon after 'default'")?;
                Ok(self.stmt(start, StmtKind::Default))
            }
            TokenKind::Finally => {
                self.advance();
                let block = self.parse_block_required("Expected '{' after 'finally'")?;
                Ok(self.stmt(start, StmtKind::Finally {
                    block: Box::new(block),
                }))
            }
            TokenKind::Do => self.parse_do(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression_checked("Expected expression after 'throw'")?)
                };
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after 'throw' statement",
                )?;
                Ok(self.stmt(start, StmtKind::Throw { value }))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression_checked("Expected expression after 'return'")?)
                };
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after 'return' statement",
                )?;
                Ok(self.stmt(start, StmtKind::Return { value }))
            }
            TokenKind::Yield => {
                self.advance();
                let value = self.parse_expression_checked("Expected expression after 'yield'")?;
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after 'yield' statement",
                )?;
                Ok(self.stmt(start, StmtKind::Yield { value }))
            }
            TokenKind::Using => {
                self.advance();
                self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'using'")?;
                let init = self.parse_for_clause()?;
                self.expect(
                    TokenKind::ParenthesisRight,
                    "Expected ')' after 'using' declaration",
                )?;
                let block = self.parse_block_required("Expected '{' after 'using' declaration")?;
                Ok(self.stmt(start, StmtKind::Using {
                    init: Box::new(init),
                    block: Box::new(block),
                }))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = self.advance().kind;
                let lvalue = self.parse_unary()?;
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after mutation statement",
                )?;
                Ok(self.stmt(start, StmtKind::Mutate { op, lvalue }))
            }
            kind if kind.starts_type() => self.parse_declaration_or_function(),
            _ => self.parse_expression_statement(),
        }
    }

    fn stmt(&self, start: TextSize, kind: StmtKind) -> Stmt {
        Stmt {
            kind,
            span: self.span_from(start),
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // '{'
        let mut statements = Vec::new();
        loop {
            if self.eat(TokenKind::CurlyRight) {
                break;
            }
            if self.check(TokenKind::Eof) {
                return Err(self.error_after("Expected '}' at end of block"));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(self.stmt(start, StmtKind::Block(statements)))
    }

    fn parse_block_required(&mut self, reason: &str) -> Result<Stmt, SyntaxError> {
        if !self.check(TokenKind::CurlyLeft) {
            return Err(self.error_after(reason));
        }
        self.parse_block()
    }

    fn parse_declaration_or_function(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        let save = self.pos;
        let ty = self.parse_type();
        let mut generator = false;
        if self.check(TokenKind::Ellipsis) && self.peek_at(1) == TokenKind::Identifier {
            self.advance();
            generator = true;
        }
        if !self.check(TokenKind::Identifier) {
            // `string(...)` and `type(...)` are expressions that begin
            // with a type keyword; fall back to an expression statement.
            if matches!(
                self.tokens[save].kind,
                TokenKind::String | TokenKind::Type
            ) && !generator
            {
                self.pos = save;
                return self.parse_expression_statement();
            }
            return Err(self.error_after("Malformed statement"));
        }
        let token = self.advance();
        let name = self.slice(token).to_string();
        match self.peek_kind() {
            TokenKind::ParenthesisLeft => {
                self.parse_function_definition(start, ty, generator, name)
            }
            TokenKind::Semicolon if !generator => {
                self.advance();
                Ok(self.stmt(start, StmtKind::Declare {
                    name,
                    ty,
                    init: None,
                }))
            }
            TokenKind::Equal if !generator => {
                self.advance();
                let init = self.parse_expression_checked("Expected expression after assignment")?;
                self.expect(
                    TokenKind::Semicolon,
                    "Expected semicolon after variable initialization",
                )?;
                Ok(self.stmt(start, StmtKind::Declare {
                    name,
                    ty,
                    init: Some(init),
                }))
            }
            _ => Err(self.error_after("Malformed variable declaration or initialization")),
        }
    }

    fn parse_function_definition(
        &mut self,
        start: TextSize,
        rettype: Type,
        generator: bool,
        name: String,
    ) -> Result<Stmt, SyntaxError> {
        self.advance(); // '('
        let mut params = Vec::new();
        if !self.check(TokenKind::ParenthesisRight) {
            loop {
                if !self.peek_kind().starts_type() {
                    return Err(self.error_after("Expected parameter type in function definition"));
                }
                let param_start = self.peek().start();
                let ty = self.parse_type();
                let token =
                    self.expect(TokenKind::Identifier, "Expected parameter name in function definition")?;
                params.push(Param {
                    ty,
                    name: self.slice(token).to_string(),
                    span: self.span_from(param_start),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(
            TokenKind::ParenthesisRight,
            "Expected ')' after function parameters",
        )?;
        let block = self.parse_block_required("Expected '{' after function definition")?;
        Ok(self.stmt(start, StmtKind::Function {
            name,
            rettype,
            generator,
            params,
            block: Box::new(block),
        }))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        if !self.peek_kind().starts_expression() {
            return Err(self.error_after("Malformed statement"));
        }
        let lhs = self.parse_expression()?;
        if self.peek_kind().is_assign_operator() {
            let op_token = self.advance();
            let op = op_token.kind;
            let reason = format!(
                "Expected expression after assignment '{}' operator",
                self.slice(op_token)
            );
            let rhs = self.parse_expression_checked(&reason)?;
            self.expect(
                TokenKind::Semicolon,
                "Expected semicolon after assignment statement",
            )?;
            return Ok(self.stmt(start, StmtKind::Assign { op, lhs, rhs }));
        }
        self.expect(
            TokenKind::Semicolon,
            "Expected semicolon after expression statement",
        )?;
        Ok(self.stmt(start, StmtKind::Expression(lhs)))
    }

    fn parse_condition(&mut self) -> Result<Condition, SyntaxError> {
        if self.peek_kind().starts_type() {
            let start = self.peek().start();
            let save = self.pos;
            let ty = self.parse_type();
            if self.check(TokenKind::Identifier) && self.peek_at(1) == TokenKind::Equal {
                let token = self.advance();
                let name = self.slice(token).to_string();
                self.advance(); // '='
                let expr =
                    self.parse_expression_checked("Expected expression after guarded declaration")?;
                return Ok(Condition::Guard {
                    name,
                    ty,
                    expr,
                    span: self.span_from(start),
                });
            }
            self.pos = save;
        }
        Ok(Condition::Expr(
            self.parse_expression_checked("Expected condition expression")?,
        ))
    }

    fn parse_do(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // 'do'
        let block = self.parse_block_required("Expected '{' after 'do'")?;
        self.expect(TokenKind::While, "Expected 'while' after 'do' block")?;
        self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'while'")?;
        let cond = self.parse_expression_checked("Expected condition expression")?;
        self.expect(
            TokenKind::ParenthesisRight,
            "Expected ')' after 'while' condition",
        )?;
        self.expect(
            TokenKind::Semicolon,
            "Expected semicolon after 'do' statement",
        )?;
        Ok(self.stmt(start, StmtKind::Do {
            block: Box::new(block),
            cond,
        }))
    }

    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // 'if'
        self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'if'")?;
        let cond = self.parse_condition()?;
        self.expect(
            TokenKind::ParenthesisRight,
            "Expected ')' after 'if' condition",
        )?;
        let then_block = self.parse_block_required("Expected '{' after 'if' condition")?;
        let else_block = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(
                    self.parse_block_required("Expected '{' after 'else'")?,
                ))
            }
        } else {
            None
        };
        Ok(self.stmt(start, StmtKind::If {
            cond,
            then_block: Box::new(then_block),
            else_block,
        }))
    }

    fn parse_while(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // 'while'
        self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'while'")?;
        let cond = self.parse_condition()?;
        self.expect(
            TokenKind::ParenthesisRight,
            "Expected ')' after 'while' condition",
        )?;
        let block = self.parse_block_required("Expected '{' after 'while' condition")?;
        Ok(self.stmt(start, StmtKind::While {
            cond,
            block: Box::new(block),
        }))
    }

    /// A statement legal in a `for` clause or `using` header: a
    /// declaration, assignment, mutation or call, with no trailing
    /// semicolon.
    fn parse_for_clause(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        if self.peek_kind().starts_type() {
            let save = self.pos;
            let ty = self.parse_type();
            if self.check(TokenKind::Identifier) {
                let token = self.advance();
                let name = self.slice(token).to_string();
                let init = if self.eat(TokenKind::Equal) {
                    Some(self.parse_expression_checked("Expected expression after assignment")?)
                } else {
                    None
                };
                return Ok(self.stmt(start, StmtKind::Declare { name, ty, init }));
            }
            self.pos = save;
        }
        if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let op = self.advance().kind;
            let lvalue = self.parse_unary()?;
            return Ok(self.stmt(start, StmtKind::Mutate { op, lvalue }));
        }
        if !self.peek_kind().starts_expression() {
            return Err(self.error_after("Malformed statement"));
        }
        let lhs = self.parse_expression()?;
        if self.peek_kind().is_assign_operator() {
            let op_token = self.advance();
            let op = op_token.kind;
            let reason = format!(
                "Expected expression after assignment '{}' operator",
                self.slice(op_token)
            );
            let rhs = self.parse_expression_checked(&reason)?;
            return Ok(self.stmt(start, StmtKind::Assign { op, lhs, rhs }));
        }
        Ok(self.stmt(start, StmtKind::Expression(lhs)))
    }

    fn parse_for(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // 'for'
        self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'for'")?;

        // A type followed by a name and ':' is the for-each form.
        if self.peek_kind().starts_type() {
            let save = self.pos;
            let target_start = self.peek().start();
            let ty = self.parse_type();
            if self.check(TokenKind::Identifier) && self.peek_at(1) == TokenKind::Colon {
                let token = self.advance();
                let name = self.slice(token).to_string();
                let target = self.stmt(target_start, StmtKind::Declare {
                    name,
                    ty,
                    init: None,
                });
                self.advance(); // ':'
                let expr =
                    self.parse_expression_checked("Expected expression after ':' in 'for' statement")?;
                self.expect(
                    TokenKind::ParenthesisRight,
                    "Expected ')' after 'for' statement iterand",
                )?;
                let block = self.parse_block_required("Expected '{' after 'for' statement")?;
                return Ok(self.stmt(start, StmtKind::Foreach {
                    target: Box::new(target),
                    expr,
                    block: Box::new(block),
                }));
            }
            self.pos = save;
        }

        let pre = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_for_clause()?))
        };
        self.expect(
            TokenKind::Semicolon,
            "Expected semicolon after 'for' statement initialization",
        )?;
        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression_checked("Expected condition in 'for' statement")?)
        };
        self.expect(
            TokenKind::Semicolon,
            "Expected semicolon after 'for' statement condition",
        )?;
        let post = if self.check(TokenKind::ParenthesisRight) {
            None
        } else {
            Some(Box::new(self.parse_for_clause()?))
        };
        self.expect(
            TokenKind::ParenthesisRight,
            "Expected ')' after 'for' statement",
        )?;
        let block = self.parse_block_required("Expected '{' after 'for' statement")?;
        Ok(self.stmt(start, StmtKind::For {
            pre,
            cond,
            post,
            block: Box::new(block),
        }))
    }

    fn parse_switch(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // 'switch'
        self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'switch'")?;
        let value = self.parse_condition()?;
        self.expect(
            TokenKind::ParenthesisRight,
            "Expected ')' after 'switch' value",
        )?;
        self.expect(TokenKind::CurlyLeft, "Expected '{' after 'switch' value")?;

        let mut sections: Vec<SwitchSection> = Vec::new();
        let mut seen_default = false;
        while !self.eat(TokenKind::CurlyRight) {
            if self.check(TokenKind::Eof) {
                return Err(self.error_after("Expected '}' at end of switch statement"));
            }
            if !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default) {
                return Err(
                    self.error_after("Expected 'case' or 'default' clause in switch statement")
                );
            }
            let section_start = self.peek().start();
            let mut values = Vec::new();
            let mut is_default = false;
            while matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default) {
                if self.advance().kind == TokenKind::Case {
                    values.push(self.parse_expression_checked("Expected expression after 'case'")?);
                    self.expect(TokenKind::Colon, "Expected colon after 'case' value")?;
                } else {
                    if seen_default {
                        return Err(self.error_after(
                            "More than one 'default' clause in switch statement",
                        ));
                    }
                    seen_default = true;
                    is_default = true;
                    self.expect(TokenKind::Colon, "Expected colon after 'default'")?;
                }
            }
            let mut body = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::CurlyRight | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            sections.push(SwitchSection {
                values,
                is_default,
                body,
                span: self.span_from(section_start),
            });
        }
        Ok(self.stmt(start, StmtKind::Switch { value, sections }))
    }

    fn parse_try(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start();
        self.advance(); // 'try'
        let block = self.parse_block_required("Expected '{' after 'try'")?;
        let mut catches = Vec::new();
        while self.check(TokenKind::Catch) {
            let clause_start = self.peek().start();
            self.advance();
            self.expect(TokenKind::ParenthesisLeft, "Expected '(' after 'catch'")?;
            if !self.peek_kind().starts_type() {
                return Err(self.error_after("Expected type in 'catch' clause"));
            }
            let ty = self.parse_type();
            let token = self.expect(TokenKind::Identifier, "Expected identifier in 'catch' clause")?;
            let name = self.slice(token).to_string();
            self.expect(
                TokenKind::ParenthesisRight,
                "Expected ')' after 'catch' clause",
            )?;
            let catch_block = self.parse_block_required("Expected '{' after 'catch' clause")?;
            catches.push(CatchClause {
                name,
                ty,
                block: catch_block,
                span: self.span_from(clause_start),
            });
        }
        let finally = if self.check(TokenKind::Finally) {
            self.advance();
            Some(Box::new(
                self.parse_block_required("Expected '{' after 'finally'")?,
            ))
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            return Err(self.error_after("Expected 'catch' or 'finally' after 'try' block"));
        }
        Ok(self.stmt(start, StmtKind::Try {
            block: Box::new(block),
            catches,
            finally,
        }))
    }

    // ----- expressions -----

    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.peek().start();
        let cond = self.parse_binary(0)?;
        if !self.eat(TokenKind::Query) {
            return Ok(cond);
        }
        if !self.peek_kind().starts_expression() {
            return Err(self.error_after("Expected expression after '?' of ternary operator"));
        }
        let then_expr = self.parse_expression()?;
        self.expect(TokenKind::Colon, "Expected ':' of ternary operator")?;
        if !self.peek_kind().starts_expression() {
            return Err(self.error_after("Expected expression after ':' of ternary operator"));
        }
        let else_expr = self.parse_expression()?;
        Ok(Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span: self.span_from(start),
        })
    }

    fn parse_expression_checked(&mut self, reason: &str) -> Result<Expr, SyntaxError> {
        if !self.peek_kind().starts_expression() {
            return Err(self.error_after(reason));
        }
        self.parse_expression()
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, SyntaxError> {
        if level == BINARY_LEVELS.len() {
            return self.parse_unary();
        }
        let start = self.peek().start();
        let mut lhs = self.parse_binary(level + 1)?;
        while BINARY_LEVELS[level].contains(&self.peek_kind()) {
            let op_token = self.advance();
            if !self.peek_kind().starts_expression() {
                let reason = format!(
                    "Expected expression after '{}' operator",
                    self.slice(op_token)
                );
                return Err(self.error_after(&reason));
            }
            let rhs = self.parse_binary(level + 1)?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op: op_token.kind,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span: self.span_from(start),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if UNARY_OPERATORS.contains(&self.peek_kind()) {
            let start = self.peek().start();
            let op_token = self.advance();
            if !self.peek_kind().starts_expression() {
                let reason = format!(
                    "Expected expression after unary '{}' operator",
                    self.slice(op_token)
                );
                return Err(self.error_after(&reason));
            }
            let expr = self.parse_unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: op_token.kind,
                    expr: Box::new(expr),
                },
                span: self.span_from(start),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.peek().start();
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::ParenthesisLeft => {
                    self.advance();
                    let mut args: Vec<Expr> = Vec::new();
                    if !self.check(TokenKind::ParenthesisRight) {
                        loop {
                            args.push(self.parse_expression_checked(
                                "Expected expression in function call argument",
                            )?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(
                        TokenKind::ParenthesisRight,
                        "Expected ')' after function call arguments",
                    )?;
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span: self.span_from(start),
                    };
                }
                TokenKind::BracketLeft => {
                    self.advance();
                    let index = self.parse_expression_checked("Expected index expression after '['")?;
                    self.expect(TokenKind::BracketRight, "Expected ']' after index")?;
                    expr = Expr {
                        kind: ExprKind::Index {
                            subject: Box::new(expr),
                            index: Box::new(index),
                        },
                        span: self.span_from(start),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let token = self.expect(
                        TokenKind::Identifier,
                        "Expected property name after '.' operator",
                    )?;
                    expr = Expr {
                        kind: ExprKind::Dot {
                            subject: Box::new(expr),
                            property: self.slice(token).to_string(),
                        },
                        span: self.span_from(start),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.peek();
        let start = token.start();
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                let text = self.slice(token);
                let value = if let Some(hex) = text.strip_prefix("0x") {
                    i64::from_str_radix(hex, 16).ok()
                } else {
                    text.parse::<i64>().ok()
                };
                match value {
                    Some(value) => Ok(self.expr(start, ExprKind::Integer(value))),
                    None => Err(self.error_at(
                        start,
                        &format!("Invalid integer literal: '{}'", text),
                    )),
                }
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let text = self.slice(token);
                match text.parse::<f64>() {
                    Ok(value) => Ok(self.expr(start, ExprKind::Float(value))),
                    Err(_) => Err(self.error_at(
                        start,
                        &format!("Invalid float literal: '{}'", text),
                    )),
                }
            }
            TokenKind::StringLiteral => {
                self.advance();
                let text = self.slice(token);
                let value = self.unescape(&text[1..text.len() - 1], start)?;
                Ok(self.expr(start, ExprKind::StringLiteral(value)))
            }
            TokenKind::BacktickLiteral => {
                self.advance();
                let text = self.slice(token);
                Ok(self.expr(
                    start,
                    ExprKind::StringLiteral(text[1..text.len() - 1].to_string()),
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(self.expr(start, ExprKind::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(self.expr(start, ExprKind::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self.expr(start, ExprKind::Null))
            }
            TokenKind::Identifier | TokenKind::String | TokenKind::Type => {
                self.advance();
                Ok(self.expr(
                    start,
                    ExprKind::Identifier(self.slice(token).to_string()),
                ))
            }
            TokenKind::ParenthesisLeft => {
                self.advance();
                let inner = self.parse_expression_checked("Expected expression after '('")?;
                self.expect(TokenKind::ParenthesisRight, "Expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::BracketLeft => {
                self.advance();
                let mut values = Vec::new();
                if !self.check(TokenKind::BracketRight) {
                    loop {
                        values.push(
                            self.parse_expression_checked("Expected expression in array literal")?,
                        );
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::BracketRight, "Expected ']' after array literal")?;
                Ok(self.expr(start, ExprKind::Array(values)))
            }
            TokenKind::CurlyLeft => {
                self.advance();
                let mut entries = Vec::new();
                if !self.check(TokenKind::CurlyRight) {
                    loop {
                        let key_token = self.expect(
                            TokenKind::Identifier,
                            "Expected key name in object literal",
                        )?;
                        let key = self.slice(key_token).to_string();
                        self.expect(TokenKind::Colon, "Expected ':' after object literal key")?;
                        let value =
                            self.parse_expression_checked("Expected expression in object literal")?;
                        entries.push((key, value));
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::CurlyRight, "Expected '}' after object literal")?;
                Ok(self.expr(start, ExprKind::Object(entries)))
            }
            _ => Err(self.error_after("Expected expression")),
        }
    }

    fn expr(&self, start: TextSize, kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: self.span_from(start),
        }
    }

    fn unescape(&self, text: &str, start: TextSize) -> Result<String, SyntaxError> {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('`') => out.push('`'),
                other => {
                    let shown = other.map(|c| c.to_string()).unwrap_or_default();
                    return Err(self.error_at(
                        start,
                        &format!("Invalid escape sequence in string literal: '\\{}'", shown),
                    ));
                }
            }
        }
        Ok(out)
    }
}
