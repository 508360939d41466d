//! Lexical analysis for Geode
//!
//! The token model is the input contract of the compiler core. [`Scanner`] is a
//! reference tokenizer used by the driver and the tests.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
