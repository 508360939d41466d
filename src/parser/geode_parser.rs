use super::ast::{Declaration, ExternNode, ForNode, FunctionNode, IfNode, Param, Program, Statement};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use tracing::{debug, trace};

/// Recursive-descent parser for Geode declarations
///
/// Declarations can be pulled one at a time with [`Parser::next_declaration`],
/// which is what the compile pipeline does, or all at once with
/// [`Parser::parse`]. Parsing stops at the first structural error.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Next index handed to a loop or conditional
    next_construct: usize,
}

impl Parser {
    /// Creates a parser over a token stream. A missing `Eof` is supplied.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().map_or(false, |t| t.is(&TokenKind::Eof)) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        Parser {
            tokens,
            current: 0,
            next_construct: 0,
        }
    }

    /// Parses every remaining declaration
    pub fn parse(&mut self) -> Result<Program> {
        let mut declarations = Vec::new();
        while let Some(decl) = self.next_declaration()? {
            declarations.push(decl);
        }
        Ok(Program { declarations })
    }

    /// Parses the next top-level declaration, `None` at end of input
    pub fn next_declaration(&mut self) -> Result<Option<Declaration>> {
        match &self.peek().kind {
            TokenKind::Eof => Ok(None),
            TokenKind::Func => self.parse_function().map(|f| Some(Declaration::Function(f))),
            TokenKind::Extern => self.parse_extern().map(|e| Some(Declaration::Extern(e))),
            other => {
                let message = format!("Expected `func` or `extern` at top level, found {}", other);
                Err(self.syntax_error(message))
            }
        }
    }

    // Declarations

    fn parse_function(&mut self) -> Result<FunctionNode> {
        self.consume(TokenKind::Func, "function declaration")?;
        let token = self.consume_identifier("function declaration")?;
        let name = token.lexeme.clone();
        trace!(function = %name, line = token.line, "parsing function");

        let (params, _) = self.parse_params(&name, false)?;
        let ret = self.parse_return_type(&name)?;
        let body = self.parse_block(&format!("function {}", name))?;

        debug!(function = %name, statements = body.len(), "parsed function");
        Ok(FunctionNode {
            name,
            params,
            ret,
            body,
            token,
        })
    }

    fn parse_extern(&mut self) -> Result<ExternNode> {
        self.consume(TokenKind::Extern, "extern declaration")?;
        self.consume(TokenKind::Func, "extern declaration")?;
        let token = self.consume_identifier("extern declaration")?;
        let name = token.lexeme.clone();

        let (params, is_variadic) = self.parse_params(&name, true)?;
        let ret = self.parse_return_type(&name)?;
        self.consume(TokenKind::Semicolon, &format!("extern function {}", name))?;

        debug!(function = %name, is_variadic, "parsed extern");
        Ok(ExternNode {
            name,
            params,
            ret,
            is_variadic,
            token,
        })
    }

    /// `( [T name {, T name}] [, ...] )`, returning the parameters and whether
    /// the list ends in `...`
    ///
    /// Only externs may leave out parameter names or end in `...`.
    fn parse_params(&mut self, function: &str, is_extern: bool) -> Result<(Vec<Param>, bool)> {
        self.consume(TokenKind::LeftParen, &format!("function {}", function))?;

        let mut params = Vec::new();
        if self.check(&TokenKind::RightParen) {
            self.advance();
            return Ok((params, false));
        }

        loop {
            let token = self.peek().clone();
            if is_extern && token.is(&TokenKind::Ellipsis) {
                self.advance();
                if !self.check(&TokenKind::RightParen) {
                    return Err(self.invalid_params(function));
                }
                self.advance();
                return Ok((params, true));
            }
            if !token.is(&TokenKind::Type(String::new())) {
                return Err(self.invalid_params(function));
            }
            let ty = self.parse_type()?;

            let name = match &self.peek().kind {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.advance();
                    Some(name)
                }
                _ if is_extern => None,
                _ => return Err(self.invalid_params(function)),
            };
            params.push(Param { ty, name, token });

            match self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RightParen => {
                    self.advance();
                    return Ok((params, false));
                }
                _ => return Err(self.invalid_params(function)),
            }
        }
    }

    fn parse_return_type(&mut self, function: &str) -> Result<crate::types::TypeAnnotation> {
        if !self.check(&TokenKind::Arrow) {
            let message = format!(
                "function {} missing '->', found {}",
                function,
                self.peek().kind
            );
            return Err(self.syntax_error(message));
        }
        self.advance();
        self.parse_type()
    }

    // Statements

    /// `{ statements }`; the braces are consumed
    pub(crate) fn parse_block(&mut self, context: &str) -> Result<Vec<Statement>> {
        self.consume(TokenKind::LeftBrace, context)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                let message = format!("Unterminated block in {}", context);
                return Err(self.syntax_error(message));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance();
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek().kind {
            TokenKind::LeftBrace => {
                let token = self.peek().clone();
                let statements = self.parse_block("block")?;
                Ok(Statement::Block { statements, token })
            }
            TokenKind::For => self.parse_for().map(Statement::For),
            TokenKind::If => self.parse_if().map(Statement::If),
            TokenKind::Return => {
                let token = self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon, "return statement")?;
                Ok(Statement::Return { value, token })
            }
            _ => {
                let stmt = self.parse_simple_statement()?;
                self.consume(TokenKind::Semicolon, "statement")?;
                Ok(stmt)
            }
        }
    }

    /// Variable declaration or expression, without the trailing `;`
    fn parse_simple_statement(&mut self) -> Result<Statement> {
        if !self.at_type() {
            return Ok(Statement::Expression(self.parse_expression()?));
        }

        let ty = self.parse_type()?;
        let token = self.consume_identifier("variable declaration")?;
        let init = if self.check(&TokenKind::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Statement::VarDecl {
            ty,
            name: token.lexeme.clone(),
            init,
            token,
        })
    }

    fn parse_for(&mut self) -> Result<ForNode> {
        let token = self.consume(TokenKind::For, "for loop")?;
        let index = self.next_index();

        let init = self.parse_simple_statement()?;
        self.consume(TokenKind::Semicolon, "for loop initializer")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "for loop condition")?;
        let step = self.parse_expression()?;
        let body = self.parse_block("for loop body")?;

        Ok(ForNode {
            index,
            init: Box::new(init),
            cond,
            step,
            body,
            token,
        })
    }

    fn parse_if(&mut self) -> Result<IfNode> {
        let token = self.consume(TokenKind::If, "if statement")?;
        let index = self.next_index();

        let cond = self.parse_expression()?;
        let then_body = self.parse_block("if body")?;

        let else_body = if self.check(&TokenKind::Else) {
            self.advance();
            if self.check(&TokenKind::If) {
                Some(vec![Statement::If(self.parse_if()?)])
            } else {
                Some(self.parse_block("else body")?)
            }
        } else {
            None
        };

        Ok(IfNode {
            index,
            cond,
            then_body,
            else_body,
            token,
        })
    }

    fn next_index(&mut self) -> usize {
        let index = self.next_construct;
        self.next_construct += 1;
        index
    }

    // Helper methods

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Current token
    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Token `offset` positions ahead, clamped to the final `Eof`
    pub fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek().is(kind)
    }

    pub(crate) fn consume(&mut self, kind: TokenKind, context: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let message = format!("Expected {} in {}, found {}", kind, context, self.peek().kind);
            Err(self.syntax_error(message))
        }
    }

    fn consume_identifier(&mut self, context: &str) -> Result<Token> {
        self.consume(TokenKind::Identifier(String::new()), context)
    }

    fn invalid_params(&self, function: &str) -> Error {
        let message = format!(
            "invalid parameters to function {}, found {}",
            function,
            self.peek().kind
        );
        self.syntax_error(message)
    }

    pub(crate) fn syntax_error(&self, message: String) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Expression;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(Scanner::new(source).scan_tokens()?).parse()
    }

    #[test]
    fn test_function_declaration() {
        let program = parse("func add(int a, int b) -> int { return a + b; }").unwrap();
        assert_eq!(program.declarations.len(), 1);
        match &program.declarations[0] {
            Declaration::Function(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.params[1].name.as_deref(), Some("b"));
                assert_eq!(f.ret.name, "int");
                assert!(matches!(f.body[0], Statement::Return { .. }));
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_extern_without_param_names() {
        let program = parse("extern func puts(byte*) -> i32;").unwrap();
        match &program.declarations[0] {
            Declaration::Extern(e) => {
                assert_eq!(e.params[0].name, None);
                assert_eq!(e.params[0].ty.pointer_level, 1);
            }
            other => panic!("expected extern, got {:?}", other),
        }
    }

    #[test]
    fn test_variadic_extern() {
        let program = parse("extern func printf(byte* fmt, ...) -> i32;").unwrap();
        match &program.declarations[0] {
            Declaration::Extern(e) => {
                assert!(e.is_variadic);
                assert_eq!(e.params.len(), 1);
                assert_eq!(e.params[0].name.as_deref(), Some("fmt"));
            }
            other => panic!("expected extern, got {:?}", other),
        }

        match &parse("extern func puts(byte*) -> i32;").unwrap().declarations[0] {
            Declaration::Extern(e) => assert!(!e.is_variadic),
            other => panic!("expected extern, got {:?}", other),
        }
    }

    #[test]
    fn test_ellipsis_must_end_extern_params() {
        for source in [
            "extern func f(..., int) -> int;",
            "func f(int a, ...) -> int { return a; }",
        ] {
            match parse(source) {
                Err(Error::SyntaxError { message, .. }) => {
                    assert!(message.contains("invalid parameters to function f"), "{}", message)
                }
                other => panic!("expected syntax error for {}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_missing_arrow_names_function() {
        let err = parse("func main() int { }").unwrap_err();
        match err {
            Error::SyntaxError { message, .. } => {
                assert!(message.contains("function main missing '->'"), "{}", message)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_params_names_function() {
        let err = parse("func f(int) -> int { }").unwrap_err();
        match err {
            Error::SyntaxError { message, .. } => {
                assert!(message.contains("invalid parameters to function f"))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_parameter_list() {
        let err = parse("func f(int a -> int { }").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_for_loop_shape() {
        let program =
            parse("func f() -> void { for int i = 0; i < 10; i = i + 1 { g(i); } }").unwrap();
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!("expected function");
        };
        let Statement::For(node) = &f.body[0] else {
            panic!("expected for loop");
        };
        assert_eq!(node.index, 0);
        assert!(matches!(*node.init, Statement::VarDecl { .. }));
        assert!(matches!(node.step, Expression::Assign { .. }));
        assert_eq!(node.body.len(), 1);
    }

    #[test]
    fn test_construct_indices_are_unique() {
        let program = parse(
            "func f() -> void {
                for int i = 0; i < 3; i = i + 1 {
                    if i == 1 { } else if i == 2 { }
                }
                for int j = 0; j < 3; j = j + 1 { }
            }",
        )
        .unwrap();
        let Declaration::Function(f) = &program.declarations[0] else {
            panic!("expected function");
        };
        let Statement::For(outer) = &f.body[0] else {
            panic!("expected for loop");
        };
        let Statement::If(first_if) = &outer.body[0] else {
            panic!("expected if");
        };
        let Some(else_body) = &first_if.else_body else {
            panic!("expected else");
        };
        let Statement::If(second_if) = &else_body[0] else {
            panic!("expected else if");
        };
        let Statement::For(second) = &f.body[1] else {
            panic!("expected for loop");
        };
        assert_eq!(
            vec![outer.index, first_if.index, second_if.index, second.index],
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_next_declaration_streams() {
        let tokens = Scanner::new("extern func a() -> void; func b() -> void { }")
            .scan_tokens()
            .unwrap();
        let mut parser = Parser::new(tokens);
        assert_eq!(parser.next_declaration().unwrap().unwrap().name(), "a");
        assert_eq!(parser.next_declaration().unwrap().unwrap().name(), "b");
        assert!(parser.next_declaration().unwrap().is_none());
        assert!(parser.next_declaration().unwrap().is_none());
    }

    #[test]
    fn test_missing_eof_is_supplied() {
        let mut tokens = Scanner::new("func f() -> void { }").scan_tokens().unwrap();
        tokens.pop();
        assert_eq!(Parser::new(tokens).parse().unwrap().declarations.len(), 1);
    }

    #[test]
    fn test_unterminated_block() {
        let err = parse("func f() -> void { return;").unwrap_err();
        assert!(matches!(err, Error::SyntaxError { .. }));
    }
}
