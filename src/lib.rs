//! # Geode - compiler core
//!
//! The middle and back end of the Geode language compiler: it takes a token
//! stream, builds a typed declaration tree and lowers it to textual
//! LLVM-style IR for an external assembler and linker.
//!
//! ## Features
//!
//! - **Type annotations** with pointer runs, inferred (`?`) types and slices
//! - **Lexical scopes** with shadowing and guaranteed balanced push/pop
//! - **Structured control flow** lowered to basic blocks with idempotent terminators
//! - **IR values and metadata** serialized to LLVM assembly text
//! - **Pipelined parsing** through a bounded queue, one lowering thread per unit
//!
//! ## Quick Start
//!
//! ```rust
//! use geode::{CompileOptions, Compiler};
//!
//! # fn main() -> geode::Result<()> {
//! let source = r#"
//!     func sum(int n) -> int {
//!         int total = 0;
//!         for int i = 0; i < n; i = i + 1 {
//!             total = total + i;
//!         }
//!         return total;
//!     }
//! "#;
//!
//! let unit = Compiler::new(CompileOptions::default()).compile_source(source)?;
//! let ir = unit.ir();
//! assert!(ir.contains("F0_cond:"));
//! assert!(ir.contains("br i1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Working with the pieces
//!
//! Type annotations can be parsed on their own:
//!
//! ```rust
//! use geode::{Parser, Scanner};
//!
//! let tokens = Scanner::new("byte** p").scan_tokens().unwrap();
//! let ty = Parser::new(tokens).parse_type().unwrap();
//! assert_eq!(ty.pointer_level, 2);
//! ```
//!
//! and metadata renders itself:
//!
//! ```rust
//! use geode::compiler::ir::{MetadataString, MetadataTuple};
//!
//! let mut md = MetadataTuple::with_id("3");
//! md.add(MetadataString::new("hi"));
//! assert_eq!(md.ident(), "!3");
//! assert_eq!(md.def(), "!{!\"hi\"}");
//! ```
//!
//! ## Error Handling
//!
//! Parse errors are fatal for a compilation unit and are returned as `Err`.
//! Lowering errors only abort the declaration they occur in and are collected
//! in [`CompiledUnit::diagnostics`]:
//!
//! ```rust
//! use geode::{CompileOptions, Compiler};
//!
//! let unit = Compiler::new(CompileOptions::default())
//!     .compile_source("func f() -> int { return y; } func g() -> int { return 1; }")
//!     .unwrap();
//! assert_eq!(unit.diagnostics.len(), 1);
//! assert!(unit.module.function("g").is_some());
//! ```

#![allow(clippy::new_without_default)]

/// Version of the Geode compiler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod types;

// Re-export main types
pub use compiler::{CompileOptions, CompiledUnit, Compiler, Diagnostic};
pub use error::{Error, ErrorSeverity, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{Declaration, Expression, ForNode, Parser, Program, Statement};
pub use types::{TypeAnnotation, TypeModifier, TypeTable};
