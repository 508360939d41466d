use crate::lexer::Token;
use crate::types::TypeAnnotation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Program {
    /// Top-level declarations in source order
    pub declarations: Vec<Declaration>,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    /// `func name(...) -> T { ... }`
    Function(FunctionNode),
    /// `extern func name(...) -> T;`
    Extern(ExternNode),
}

impl Declaration {
    /// Declared symbol name
    pub fn name(&self) -> &str {
        match self {
            Declaration::Function(f) => &f.name,
            Declaration::Extern(e) => &e.name,
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Declared type
    pub ty: TypeAnnotation,
    /// Parameter name (externs may omit it)
    pub name: Option<String>,
    /// Type token of the parameter
    pub token: Token,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    /// Function name
    pub name: String,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Declared return type
    pub ret: TypeAnnotation,
    /// Body statements
    pub body: Vec<Statement>,
    /// Name token
    pub token: Token,
}

/// External function declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternNode {
    /// Symbol name
    pub name: String,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Declared return type
    pub ret: TypeAnnotation,
    /// Trailing `...`: extra arguments of any type may follow the fixed ones
    #[serde(default)]
    pub is_variadic: bool,
    /// Name token
    pub token: Token,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `T name [= init];`
    VarDecl {
        /// Declared type, possibly inferred
        ty: TypeAnnotation,
        /// Variable name
        name: String,
        /// Optional initializer
        init: Option<Expression>,
        /// Name token
        token: Token,
    },

    /// Expression evaluated for its side effects
    Expression(Expression),

    /// `return [value];`
    Return {
        /// Returned value
        value: Option<Expression>,
        /// `return` keyword token
        token: Token,
    },

    /// `for init; cond; step { body }`
    For(ForNode),

    /// `if cond { ... } [else { ... }]`
    If(IfNode),

    /// Nested `{ ... }` block with its own scope
    Block {
        /// Statements in the block
        statements: Vec<Statement>,
        /// Opening brace token
        token: Token,
    },
}

/// Counted loop
///
/// `index` is unique among the control-flow constructs of a compilation unit
/// and names the loop's blocks (`F{index:X}_cond`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForNode {
    /// Unique construct index
    pub index: usize,
    /// Initializer, lowered into the block active before the loop
    pub init: Box<Statement>,
    /// Loop condition
    pub cond: Expression,
    /// Step expression, run after every iteration
    pub step: Expression,
    /// Loop body
    pub body: Vec<Statement>,
    /// `for` keyword token
    pub token: Token,
}

/// Conditional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfNode {
    /// Unique construct index, shared with loops
    pub index: usize,
    /// Branch condition
    pub cond: Expression,
    /// Statements run when the condition holds
    pub then_body: Vec<Statement>,
    /// Statements run otherwise; `else if` nests an `If` here
    pub else_body: Option<Vec<Statement>>,
    /// `if` keyword token
    pub token: Token,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal
    IntLiteral {
        /// Value
        value: i64,
        /// Literal token
        token: Token,
    },
    /// Floating-point literal
    FloatLiteral {
        /// Value
        value: f64,
        /// Literal token
        token: Token,
    },
    /// String literal
    StringLiteral {
        /// Contents, escapes resolved
        value: String,
        /// Literal token
        token: Token,
    },
    /// `true` / `false`
    BoolLiteral {
        /// Value
        value: bool,
        /// Literal token
        token: Token,
    },
    /// Variable reference
    Identifier {
        /// Variable name
        name: String,
        /// Name token
        token: Token,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expression>,
        /// Right operand
        rhs: Box<Expression>,
        /// Operator token
        token: Token,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expression>,
        /// Operator token
        token: Token,
    },
    /// `target = value`
    Assign {
        /// Assigned place (identifier or index)
        target: Box<Expression>,
        /// New value
        value: Box<Expression>,
        /// `=` token
        token: Token,
    },
    /// `callee(args)`
    Call {
        /// Function name
        callee: String,
        /// Arguments
        args: Vec<Expression>,
        /// Name token
        token: Token,
    },
    /// `T(value)`
    Cast {
        /// Target type
        ty: TypeAnnotation,
        /// Converted value
        value: Box<Expression>,
        /// Type token
        token: Token,
    },
    /// `target[index]` over a slice or pointer
    Index {
        /// Indexed value
        target: Box<Expression>,
        /// Element index
        index: Box<Expression>,
        /// `[` token
        token: Token,
    },
}

impl Expression {
    /// Token the expression is reported at
    pub fn token(&self) -> &Token {
        match self {
            Expression::IntLiteral { token, .. }
            | Expression::FloatLiteral { token, .. }
            | Expression::StringLiteral { token, .. }
            | Expression::BoolLiteral { token, .. }
            | Expression::Identifier { token, .. }
            | Expression::Binary { token, .. }
            | Expression::Unary { token, .. }
            | Expression::Assign { token, .. }
            | Expression::Call { token, .. }
            | Expression::Cast { token, .. }
            | Expression::Index { token, .. } => token,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,

    // Comparison
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Greater than (>)
    Gt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than or equal (>=)
    GtEq,

    // Logical
    /// Logical AND (&&)
    And,
    /// Logical OR (||)
    Or,
}

impl BinaryOp {
    /// Operator for an operator lexeme
    pub fn from_lexeme(op: &str) -> Option<Self> {
        Some(match op {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::LtEq,
            ">=" => BinaryOp::GtEq,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    /// True for operators producing a boolean from two comparable operands
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT (!)
    Not,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
