//! Expression parsing by precedence climbing

use super::ast::{BinaryOp, Expression, UnaryOp};
use super::Parser;
use crate::error::Result;
use crate::lexer::TokenKind;

/// Precedence of the assignment operator, which associates to the right
const ASSIGN_PRECEDENCE: i32 = 2;

fn binary_precedence(op: &str) -> Option<i32> {
    Some(match op {
        "||" => 4,
        "&&" => 5,
        "==" | "!=" => 9,
        "<" | "<=" | ">" | ">=" => 10,
        "+" | "-" => 20,
        "*" | "/" | "%" => 40,
        _ => return None,
    })
}

impl Parser {
    /// Parses a full expression
    pub fn parse_expression(&mut self) -> Result<Expression> {
        let lhs = self.parse_unary()?;
        self.parse_binary_rhs(0, lhs)
    }

    /// Precedence of the current token if it is a binary operator
    fn current_precedence(&self) -> Option<i32> {
        match &self.peek().kind {
            TokenKind::Assign => Some(ASSIGN_PRECEDENCE),
            TokenKind::Oper(op) => binary_precedence(op),
            _ => None,
        }
    }

    fn parse_binary_rhs(&mut self, min_precedence: i32, mut lhs: Expression) -> Result<Expression> {
        loop {
            let precedence = match self.current_precedence() {
                Some(p) if p >= min_precedence => p,
                _ => return Ok(lhs),
            };
            let token = self.advance();
            let mut rhs = self.parse_unary()?;

            if precedence == ASSIGN_PRECEDENCE {
                rhs = self.parse_binary_rhs(ASSIGN_PRECEDENCE, rhs)?;
                lhs = Expression::Assign {
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                    token,
                };
                continue;
            }

            while let Some(next) = self.current_precedence() {
                if next <= precedence {
                    break;
                }
                rhs = self.parse_binary_rhs(precedence + 1, rhs)?;
            }

            let op = match BinaryOp::from_lexeme(&token.lexeme) {
                Some(op) => op,
                None => {
                    let message = format!("Unknown binary operator `{}`", token.lexeme);
                    return Err(self.syntax_error(message));
                }
            };
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                token,
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match &self.peek().kind {
            TokenKind::Oper(op) if op == "-" => Some(UnaryOp::Neg),
            TokenKind::Oper(op) if op == "!" => Some(UnaryOp::Not),
            _ => None,
        };

        match op {
            Some(op) => {
                let token = self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::Unary {
                    op,
                    operand: Box::new(operand),
                    token,
                })
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;
        while self.check(&TokenKind::LeftBracket) {
            let token = self.advance();
            let index = self.parse_expression()?;
            self.consume(TokenKind::RightBracket, "index expression")?;
            expr = Expression::Index {
                target: Box::new(expr),
                index: Box::new(index),
                token,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Expression::IntLiteral {
                    value: *value,
                    token,
                })
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expression::FloatLiteral {
                    value: *value,
                    token,
                })
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Expression::StringLiteral {
                    value: value.clone(),
                    token,
                })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expression::BoolLiteral {
                    value: matches!(token.kind, TokenKind::True),
                    token,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    let args = self.parse_arguments(name)?;
                    Ok(Expression::Call {
                        callee: name.clone(),
                        args,
                        token,
                    })
                } else {
                    Ok(Expression::Identifier {
                        name: name.clone(),
                        token,
                    })
                }
            }
            TokenKind::Type(_) => {
                let ty = self.parse_type()?;
                self.consume(TokenKind::LeftParen, &format!("cast to {}", ty))?;
                let value = self.parse_expression()?;
                self.consume(TokenKind::RightParen, &format!("cast to {}", ty))?;
                Ok(Expression::Cast {
                    ty,
                    value: Box::new(value),
                    token,
                })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "parenthesized expression")?;
                Ok(expr)
            }
            other => {
                let message = format!("Unexpected {} in expression", other);
                Err(self.syntax_error(message))
            }
        }
    }

    fn parse_arguments(&mut self, callee: &str) -> Result<Vec<Expression>> {
        let context = format!("call to {}", callee);
        self.consume(TokenKind::LeftParen, &context)?;
        let mut args = Vec::new();
        if self.check(&TokenKind::RightParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.consume(TokenKind::RightParen, &context)?;
            return Ok(args);
        }
    }
}
