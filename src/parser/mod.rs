//! Geode Parser Module
//!
//! Parses token streams into declaration trees. Type annotations have their
//! own small grammar (see [`Parser::parse_type`]); expressions use precedence
//! climbing.

mod ast;
mod expr;
mod geode_parser;
mod types;

pub use ast::{
    BinaryOp, Declaration, Expression, ExternNode, ForNode, FunctionNode, IfNode, Param, Program,
    Statement, UnaryOp,
};
pub use geode_parser::Parser;
