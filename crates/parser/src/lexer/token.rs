//! Token definition and kinds.

use logos::{Logos, Skip};
use text_size::{TextRange, TextSize};

/// A positioned token. Literal payloads are sliced from the source by
/// the parser; tokens themselves stay `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Token { kind, span }
    }

    pub fn start(&self) -> TextSize {
        self.span.start()
    }

    pub fn end(&self) -> TextSize {
        self.span.end()
    }
}

fn block_comment(lexer: &mut logos::Lexer<TokenKind>) -> Skip {
    let remainder = lexer.remainder();
    match remainder.find("*/") {
        Some(end) => lexer.bump(end + 2),
        None => lexer.bump(remainder.len()),
    }
    Skip
}

/// Lexical token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords.
    #[token("any")]
    Any,
    #[token("bool")]
    Bool,
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("finally")]
    Finally,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("int")]
    Int,
    #[token("null")]
    Null,
    #[token("object")]
    Object,
    #[token("return")]
    Return,
    #[token("string")]
    String,
    #[token("switch")]
    Switch,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("try")]
    Try,
    #[token("type")]
    Type,
    #[token("using")]
    Using,
    #[token("var")]
    Var,
    #[token("void")]
    Void,
    #[token("while")]
    While,
    #[token("yield")]
    Yield,

    // Literals and names.
    #[regex("[0-9]+")]
    #[regex("0x[0-9a-fA-F]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLiteral,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,
    #[regex(r"`[^`]*`")]
    BacktickLiteral,
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    // Operators, in the tokenizer's exact inventory.
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("%")]
    Percent,
    #[token("%=")]
    PercentEqual,
    #[token("&")]
    Ampersand,
    #[token("&&")]
    AmpersandAmpersand,
    #[token("&=")]
    AmpersandEqual,
    #[token("(")]
    ParenthesisLeft,
    #[token(")")]
    ParenthesisRight,
    #[token("*")]
    Star,
    #[token("*=")]
    StarEqual,
    #[token("+")]
    Plus,
    #[token("++")]
    PlusPlus,
    #[token("+=")]
    PlusEqual,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token("--")]
    MinusMinus,
    #[token("-=")]
    MinusEqual,
    #[token("->")]
    Lambda,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("/")]
    Slash,
    #[token("/=")]
    SlashEqual,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("<")]
    Less,
    #[token("<<")]
    ShiftLeft,
    #[token("<<=")]
    ShiftLeftEqual,
    #[token("<=")]
    LessEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token(">>")]
    ShiftRight,
    #[token(">>=")]
    ShiftRightEqual,
    #[token(">>>")]
    ShiftRightUnsigned,
    #[token(">>>=")]
    ShiftRightUnsignedEqual,
    #[token("?")]
    Query,
    #[token("??")]
    QueryQuery,
    #[token("[")]
    BracketLeft,
    #[token("]")]
    BracketRight,
    #[token("^")]
    Caret,
    #[token("^=")]
    CaretEqual,
    #[token("{")]
    CurlyLeft,
    #[token("|")]
    Bar,
    #[token("|=")]
    BarEqual,
    #[token("||")]
    BarBar,
    #[token("}")]
    CurlyRight,
    #[token("~")]
    Tilde,

    #[token("/*", block_comment)]
    BlockComment,

    /// Synthesized at the end of the stream; never produced by a
    /// source pattern in practice.
    #[token("\0")]
    Eof,
}

impl TokenKind {
    /// Keywords that can open a type.
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Any
                | TokenKind::Void
                | TokenKind::Bool
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Object
                | TokenKind::Type
        )
    }

    /// Tokens that can open an expression.
    pub fn starts_expression(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::BacktickLiteral
                | TokenKind::Identifier
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::ParenthesisLeft
                | TokenKind::BracketLeft
                | TokenKind::CurlyLeft
                | TokenKind::Bang
                | TokenKind::Minus
                | TokenKind::Tilde
                | TokenKind::Star
                | TokenKind::Ampersand
                | TokenKind::Ellipsis
                // `string` and `type` double as built-in function names.
                | TokenKind::String
                | TokenKind::Type
        )
    }

    /// Assignment operators, including compound forms.
    pub fn is_assign_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::PlusEqual
                | TokenKind::MinusEqual
                | TokenKind::StarEqual
                | TokenKind::SlashEqual
                | TokenKind::PercentEqual
                | TokenKind::AmpersandEqual
                | TokenKind::BarEqual
                | TokenKind::CaretEqual
                | TokenKind::ShiftLeftEqual
                | TokenKind::ShiftRightEqual
                | TokenKind::ShiftRightUnsignedEqual
        )
    }
}
