use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// Synthetic token used to tag frames and nodes that have no source position
    pub fn synthetic(lexeme: &str) -> Self {
        Token::new(TokenKind::Identifier(lexeme.to_string()), lexeme.to_string(), 0, 0)
    }

    /// Checks the token's kind, ignoring any payload
    pub fn is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
    }
}

/// All possible token types in Geode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal (escapes already resolved)
    String(String),
    /// Boolean true literal
    True,
    /// Boolean false literal
    False,

    // Names
    /// Name of a known type (`int`, `byte`, user-registered names)
    Type(String),
    /// Any other name
    Identifier(String),

    // Keywords
    /// FUNC keyword
    Func,
    /// EXTERN keyword
    Extern,
    /// RETURN keyword
    Return,
    /// FOR keyword
    For,
    /// IF keyword
    If,
    /// ELSE keyword
    Else,

    // Operators
    /// Operator run (`+`, `<=`, `*`, `**`, ...)
    Oper(String),
    /// Assignment operator (=)
    Assign,
    /// Inference marker (?)
    Question,
    /// Arrow (->)
    Arrow,
    /// Variadic marker (...)
    Ellipsis,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Comma delimiter
    Comma,
    /// Semicolon delimiter
    Semicolon,

    // Special
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Func
                | TokenKind::Extern
                | TokenKind::Return
                | TokenKind::For
                | TokenKind::If
                | TokenKind::Else
        )
    }

    /// Get keyword from string
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "func" => Some(TokenKind::Func),
            "extern" => Some(TokenKind::Extern),
            "return" => Some(TokenKind::Return),
            "for" => Some(TokenKind::For),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(fl) => write!(f, "{}", fl),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Type(name) => write!(f, "type `{}`", name),
            TokenKind::Identifier(id) => write!(f, "identifier `{}`", id),
            TokenKind::Oper(op) => write!(f, "`{}`", op),
            TokenKind::Assign => write!(f, "`=`"),
            TokenKind::Question => write!(f, "`?`"),
            TokenKind::Arrow => write!(f, "`->`"),
            TokenKind::Ellipsis => write!(f, "`...`"),
            TokenKind::LeftParen => write!(f, "`(`"),
            TokenKind::RightParen => write!(f, "`)`"),
            TokenKind::LeftBrace => write!(f, "`{{`"),
            TokenKind::RightBrace => write!(f, "`}}`"),
            TokenKind::LeftBracket => write!(f, "`[`"),
            TokenKind::RightBracket => write!(f, "`]`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Semicolon => write!(f, "`;`"),
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "{:?}", self),
        }
    }
}
