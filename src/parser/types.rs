//! Type annotation parsing
//!
//! A type annotation is a `Type` token followed by any run of modifiers:
//! `?` (inferred, at most once), `*`-runs (one pointer level per star) and
//! `[]` pairs (slice). Modifiers are kept in the order they appear.

use super::Parser;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;
use crate::types::TypeAnnotation;

/// True for operator lexemes made only of `*`
fn is_pointer_run(op: &str) -> bool {
    !op.is_empty() && op.chars().all(|c| c == '*')
}

impl Parser {
    /// Parses a type annotation starting at the current token
    pub fn parse_type(&mut self) -> Result<TypeAnnotation> {
        let name = match &self.peek().kind {
            TokenKind::Type(name) => name.clone(),
            other => {
                let message = format!("Expected type name, found {}", other);
                return Err(self.syntax_error(message));
            }
        };
        self.advance();

        let mut ty = TypeAnnotation::named(name);
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Question => {
                    if ty.unknown {
                        return Err(Error::DuplicateUnknownModifier {
                            name: ty.name,
                            line: token.line,
                            col: token.column,
                        });
                    }
                    ty = ty.inferred();
                    self.advance();
                }
                TokenKind::Oper(op) if is_pointer_run(op) => {
                    for _ in op.chars() {
                        ty = ty.pointer();
                    }
                    self.advance();
                }
                TokenKind::LeftBracket if self.peek_at(1).is(&TokenKind::RightBracket) => {
                    ty = ty.slice();
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(ty)
    }

    /// Lookahead: does a type annotation followed by a name start here?
    ///
    /// Consumes nothing. Used to tell `int* p = ...` (a declaration) apart
    /// from expressions such as `int(x)` or `a * b`.
    pub fn at_type(&self) -> bool {
        if !self.peek().is(&TokenKind::Type(String::new())) {
            return false;
        }

        let mut offset = 1;
        loop {
            match &self.peek_at(offset).kind {
                TokenKind::Question => offset += 1,
                TokenKind::Oper(op) if is_pointer_run(op) => offset += 1,
                TokenKind::LeftBracket
                    if self.peek_at(offset + 1).is(&TokenKind::RightBracket) =>
                {
                    offset += 2
                }
                TokenKind::Identifier(_) => return true,
                _ => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::types::TypeModifier;

    fn parser(source: &str) -> Parser {
        Parser::new(Scanner::new(source).scan_tokens().unwrap())
    }

    #[test]
    fn test_plain_type() {
        let ty = parser("int x").parse_type().unwrap();
        assert_eq!(ty, TypeAnnotation::named("int"));
    }

    #[test]
    fn test_star_run_counts_each_star() {
        let mut p = parser("byte*** p");
        let ty = p.parse_type().unwrap();
        assert_eq!(ty.pointer_level, 3);
        assert!(!ty.unknown);
        assert!(p.peek().is(&TokenKind::Identifier(String::new())));
    }

    #[test]
    fn test_separate_star_tokens() {
        // `int * * p` scans as two operator tokens
        let ty = parser("int * * p").parse_type().unwrap();
        assert_eq!(ty.pointer_level, 2);
    }

    #[test]
    fn test_inferred_marker() {
        let ty = parser("int? x").parse_type().unwrap();
        assert!(ty.unknown);
        assert_eq!(ty.modifiers, vec![TypeModifier::Unknown]);
    }

    #[test]
    fn test_duplicate_inferred_marker_is_rejected() {
        let err = parser("int?? x").parse_type().unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateUnknownModifier {
                name: "int".to_string(),
                line: 1,
                col: 5
            }
        );
    }

    #[test]
    fn test_modifiers_keep_encounter_order() {
        let ty = parser("int*[]? xs").parse_type().unwrap();
        assert_eq!(
            ty.modifiers,
            vec![
                TypeModifier::Pointer,
                TypeModifier::Slice,
                TypeModifier::Unknown
            ]
        );
    }

    #[test]
    fn test_lone_bracket_ends_the_type() {
        let mut p = parser("int [3]");
        let ty = p.parse_type().unwrap();
        assert!(ty.modifiers.is_empty());
        assert!(p.peek().is(&TokenKind::LeftBracket));
    }

    #[test]
    fn test_requires_type_token() {
        let err = parser("x").parse_type().unwrap_err();
        assert!(matches!(err, Error::SyntaxError { .. }));
    }

    #[test]
    fn test_at_type() {
        assert!(parser("int x").at_type());
        assert!(parser("int** x").at_type());
        assert!(parser("int[] x").at_type());
        assert!(parser("int? x").at_type());
        assert!(!parser("int(x)").at_type());
        assert!(!parser("x * y").at_type());
        assert!(!parser("int").at_type());
    }

    #[test]
    fn test_at_type_consumes_nothing() {
        let p = parser("int* x");
        assert!(p.at_type());
        assert!(p.peek().is(&TokenKind::Type(String::new())));
    }
}
