//! Tokenization of egg source text.

mod token;

pub use token::{Token, TokenKind};

use crate::error::{line_column, SyntaxError};
use logos::Logos;
use text_size::{TextRange, TextSize};

/// Tokenizes a whole resource up front; the parser works over the
/// resulting vector with cheap lookahead and backtracking.
pub struct Lexer;

impl Lexer {
    /// Tokenize `source`, appending a synthetic end-of-stream token
    /// whose span sits at the end of the text.
    pub fn tokenize(resource: &str, source: &str) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        for (result, span) in TokenKind::lexer(source).spanned() {
            let range = TextRange::new(
                TextSize::from(span.start as u32),
                TextSize::from(span.end as u32),
            );
            match result {
                Ok(TokenKind::BlockComment) => {}
                Ok(kind) => tokens.push(Token::new(kind, range)),
                Err(()) => {
                    return Err(SyntaxError::with_token(
                        "Unexpected character in source",
                        &source[span.start..span.end],
                        resource,
                        line_column(source, span.start),
                    ))
                }
            }
        }
        let end = TextSize::from(source.len() as u32);
        tokens.push(Token::new(TokenKind::Eof, TextRange::new(end, end)));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize("test", source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            kinds(">>>= >>> >>= >> >"),
            vec![
                TokenKind::ShiftRightUnsignedEqual,
                TokenKind::ShiftRightUnsigned,
                TokenKind::ShiftRightEqual,
                TokenKind::ShiftRight,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("... . ?? ?"),
            vec![
                TokenKind::Ellipsis,
                TokenKind::Dot,
                TokenKind::QueryQuery,
                TokenKind::Query,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("var variable"),
            vec![TokenKind::Var, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("42 0xFF 1.5 2e10 `raw` \"esc\\n\""),
            vec![
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::BacktickLiteral,
                TokenKind::StringLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // line\n/* block\nstill */ 2"),
            vec![TokenKind::Integer, TokenKind::Integer, TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::tokenize("test", "ab = 1").unwrap();
        assert_eq!(u32::from(tokens[0].start()), 0);
        assert_eq!(u32::from(tokens[0].end()), 2);
        assert_eq!(u32::from(tokens[1].start()), 3);
        assert_eq!(u32::from(tokens[2].start()), 5);
    }

    #[test]
    fn test_unexpected_character() {
        let error = Lexer::tokenize("test", "a # b").unwrap_err();
        assert!(error.to_string().contains("Unexpected character"));
        assert!(error.to_string().contains("(1,3)"));
    }
}
