//! Parallel compilation of independent units
//!
//! Each unit gets its own pipeline, lowerer and scope stack; nothing is shared
//! between units, so rayon's work stealing can schedule them freely.

use super::{CompileOptions, CompiledUnit, Compiler};
use crate::error::{Error, Result};
use rayon::prelude::*;

/// Configuration for parallel compilation
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Maximum number of units compiled at once (default: num_cpus)
    pub max_parallelism: usize,
    /// Stop at the first failed unit instead of compiling all of them
    pub fail_fast: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_parallelism: num_cpus::get(),
            fail_fast: false,
        }
    }
}

/// One source file to compile
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// File name recorded in the module
    pub name: String,
    /// Source text
    pub source: String,
}

/// Compiles every unit, returning results in input order
///
/// With `fail_fast` the first fatal error is returned as `Err`; otherwise
/// every unit is compiled and each carries its own result.
pub fn compile_units(
    units: &[SourceUnit],
    options: &CompileOptions,
    config: &ParallelConfig,
) -> Result<Vec<Result<CompiledUnit>>> {
    let compile = |unit: &SourceUnit| {
        let options = CompileOptions {
            source_filename: unit.name.clone(),
            ..options.clone()
        };
        Compiler::new(options).compile_source(&unit.source)
    };

    // Single unit - no parallelism needed
    if units.len() <= 1 {
        return Ok(units.iter().map(compile).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallelism.clamp(1, units.len()))
        .build()
        .map_err(|e| Error::compiler(format!("Failed to create thread pool: {}", e)))?;

    pool.install(|| {
        if config.fail_fast {
            units
                .par_iter()
                .map(|unit| compile(unit).map(Ok))
                .collect::<Result<Vec<_>>>()
        } else {
            Ok(units.par_iter().map(compile).collect())
        }
    })
}
