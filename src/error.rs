//! Error types for the Geode compiler core

use thiserror::Error;

/// Geode compiler errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Parse errors
    /// Syntax error encountered during parsing
    ///
    /// **Triggered by:** A structurally malformed declaration (missing separator,
    /// unterminated parameter list, unexpected token)
    /// **Example:** `func add(int a, int b) int { ... }` (missing `->`)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description, naming the offending token and enclosing construct
        message: String,
    },

    /// Error raised while turning source text into tokens
    #[error("Lex error at line {line}, column {col}: {message}")]
    LexError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// More than one inference marker on a single type annotation
    ///
    /// **Example:** `int?? x = 1;`
    #[error("Multiple Unknown Type operators for {name:?} used (line {line}, column {col})")]
    DuplicateUnknownModifier {
        /// Base name of the offending type annotation
        name: String,
        /// Line of the second marker
        line: usize,
        /// Column of the second marker
        col: usize,
    },

    // Lowering errors
    /// Attempt to pop the base frame of the scope stack
    #[error("Scope stack underflow: cannot pop the base scope")]
    ScopeUnderflow,

    /// Identifier not bound in any active scope frame
    ///
    /// **Triggered by:** Using a variable outside the block that declared it
    #[error("Unbound identifier {name:?} at line {line}, column {col}")]
    UnboundIdentifier {
        /// Identifier name
        name: String,
        /// Line of the use
        line: usize,
        /// Column of the use
        col: usize,
    },

    /// A value cannot be coerced to the required type
    ///
    /// **Example:** using a slice as a loop condition
    #[error("Cannot cast {from} to {to} in {context}")]
    TypeCast {
        /// Source IR type
        from: String,
        /// Target IR type
        to: String,
        /// Expression or construct being lowered
        context: String,
    },

    /// Type annotation names no known type
    #[error("Unknown type: {name}")]
    UnknownType {
        /// Type name
        name: String,
    },

    /// Call to a function that was never declared
    #[error("Unknown function: {name}")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// Call with the wrong number of arguments
    #[error("Function {name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Function defined twice in one unit
    #[error("Duplicate function definition: {name}")]
    DuplicateFunction {
        /// Function name
        name: String,
    },

    /// General compiler error
    #[error("Compiler error: {0}")]
    CompilerError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Terminates the compilation unit
    Fatal,
    /// Aborts the current declaration only
    Recoverable,
    /// Reported but does not stop lowering
    Warning,
}

impl Error {
    /// Create a compiler error with a message
    pub fn compiler(msg: impl Into<String>) -> Self {
        Error::CompilerError(msg.into())
    }

    /// Create a cast error
    pub fn cast(from: impl ToString, to: impl ToString, context: impl Into<String>) -> Self {
        Error::TypeCast {
            from: from.to_string(),
            to: to.to_string(),
            context: context.into(),
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::SyntaxError { .. } => ErrorSeverity::Fatal,
            Error::LexError { .. } => ErrorSeverity::Fatal,
            Error::DuplicateUnknownModifier { .. } => ErrorSeverity::Fatal,

            Error::DuplicateFunction { .. } => ErrorSeverity::Warning,

            _ => ErrorSeverity::Recoverable,
        }
    }

    /// True for errors that end the compilation unit
    pub fn is_fatal(&self) -> bool {
        self.classify() == ErrorSeverity::Fatal
    }
}

/// Result type for Geode operations
pub type Result<T> = std::result::Result<T, Error>;
