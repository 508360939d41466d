//! # Geode Compiler - Geode to textual IR
//!
//! This module lowers Geode declarations to LLVM-style textual IR, which an
//! external toolchain assembles and links.
//!
//! ## Architecture
//!
//! ```text
//! Source → Scanner → Parser ─(bounded queue)─▶ ModuleLowerer → Module → .ll text
//! ```
//!
//! ## Usage
//!
//! ```
//! use geode::compiler::{CompileOptions, Compiler};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let unit = compiler.compile_source("func main() -> int { return 0; }")?;
//! assert!(unit.diagnostics.is_empty());
//! assert!(unit.ir().contains("define i64 @main()"));
//! # Ok::<(), geode::Error>(())
//! ```

pub mod ir;
pub mod lower;
pub mod parallel;
pub mod pipeline;
pub mod scope;

pub use lower::{FunctionLowerer, Local, LoweringGuard, ModuleLowerer, Signature};
pub use parallel::{compile_units, ParallelConfig, SourceUnit};
pub use pipeline::{compile_unit, BoundedQueue};
pub use scope::{Frame, ScopeStack};

use crate::error::{Error, Result};
use crate::lexer::{Scanner, Token};
use crate::parser::Program;
use ir::Module;
use std::fmt;
use tracing::info;

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// File name recorded as the module's `source_filename`
    pub source_filename: String,
    /// Target triple written into the module, if any
    pub target_triple: Option<String>,
    /// Declarations buffered between parser and lowerer
    pub queue_capacity: usize,
    /// Attach `!llvm.loop` metadata to loop back edges
    pub loop_metadata: bool,
    /// Emit `!llvm.ident` naming the compiler
    pub emit_ident: bool,
    /// Parse on a separate thread, feeding the lowerer through a bounded queue
    pub pipelined: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            source_filename: "main.g".to_string(),
            target_triple: None,
            queue_capacity: 64,
            loop_metadata: false,
            emit_ident: true,
            pipelined: true,
        }
    }
}

/// A lowering error attributed to one declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the declaration that failed
    pub declaration: String,
    /// What went wrong
    pub error: Error,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}: {}", self.declaration, self.error)
    }
}

/// Result of compiling one unit
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// The lowered module; functions that failed to lower are absent
    pub module: Module,
    /// Lowering errors, one per failed declaration
    pub diagnostics: Vec<Diagnostic>,
    /// Parsed declarations
    pub program: Program,
}

impl CompiledUnit {
    /// Textual IR of the module
    pub fn ir(&self) -> String {
        self.module.to_string()
    }

    /// True if any declaration failed to lower
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Geode to IR compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options this compiler was created with
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Scans, parses and lowers a source string
    pub fn compile_source(&self, source: &str) -> Result<CompiledUnit> {
        let tokens = Scanner::new(source).scan_tokens()?;
        self.compile_tokens(tokens)
    }

    /// Parses and lowers an already scanned token stream
    pub fn compile_tokens(&self, tokens: Vec<Token>) -> Result<CompiledUnit> {
        let unit = compile_unit(tokens, &self.options)?;
        info!(
            file = %self.options.source_filename,
            functions = unit.module.functions.len(),
            diagnostics = unit.diagnostics.len(),
            "compiled unit"
        );
        Ok(unit)
    }
}
