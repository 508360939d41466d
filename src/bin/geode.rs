//! Geode command line driver
//!
//! ```bash
//! # Compile to main.ll next to the input
//! geode build main.g
//!
//! # Print IR for several units instead of writing files
//! geode build a.g b.g -S
//!
//! # Parse and lower only, dumping the declaration tree as JSON
//! geode build main.g --disable-emission --dump-ast
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use geode::compiler::{compile_units, CompileOptions, ParallelConfig, SourceUnit};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "geode",
    version = env!("CARGO_PKG_VERSION"),
    about = "Geode compiler: lowers Geode sources to LLVM IR text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile source files to `.ll` IR
    Build(BuildArgs),

    /// Print the compiler version
    Version,
}

#[derive(Args)]
struct BuildArgs {
    /// Source files to compile
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file for a single input, output directory for several
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print IR to stdout instead of writing files
    #[arg(short = 'S')]
    stdout: bool,

    /// Parse and lower without writing any IR
    #[arg(long)]
    disable_emission: bool,

    /// Print each unit's declarations as JSON
    #[arg(long)]
    dump_ast: bool,

    /// Target triple recorded in every module
    #[arg(long)]
    target: Option<String>,

    /// Attach `!llvm.loop` metadata to loop back edges
    #[arg(long)]
    loop_metadata: bool,

    /// Parse before lowering instead of streaming declarations
    #[arg(long)]
    no_pipeline: bool,

    /// Stop at the first unit that fails to parse
    #[arg(long)]
    fail_fast: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build(args) => build(args),
        Commands::Version => {
            println!("geode {}", geode::VERSION);
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build(args: BuildArgs) -> Result<()> {
    let units = args
        .inputs
        .iter()
        .map(|path| {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SourceUnit {
                name: path.display().to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let options = CompileOptions {
        target_triple: args.target.clone(),
        loop_metadata: args.loop_metadata,
        pipelined: !args.no_pipeline,
        ..Default::default()
    };
    let config = ParallelConfig {
        fail_fast: args.fail_fast,
        ..Default::default()
    };

    let results = compile_units(&units, &options, &config)?;

    let mut failed = 0;
    for (path, result) in args.inputs.iter().zip(results) {
        let unit = match result {
            Ok(unit) => unit,
            Err(e) => {
                error!(file = %path.display(), "{}", e);
                failed += 1;
                continue;
            }
        };

        for diagnostic in &unit.diagnostics {
            if diagnostic.error.classify() == geode::ErrorSeverity::Warning {
                warn!(file = %path.display(), "{}", diagnostic);
            } else {
                error!(file = %path.display(), "{}", diagnostic);
            }
        }
        if unit.has_errors() {
            failed += 1;
        }

        if args.dump_ast {
            let json = serde_json::to_string_pretty(&unit.program)
                .context("failed to serialize declarations")?;
            println!("{}", json);
        }

        if args.disable_emission {
            continue;
        }

        let ir = unit.ir();
        if args.stdout {
            print!("{}", ir);
            continue;
        }

        let out = output_path(path, args.output.as_deref(), args.inputs.len());
        std::fs::write(&out, ir).with_context(|| format!("failed to write {}", out.display()))?;
        info!(output = %out.display(), "wrote IR");
    }

    if failed > 0 {
        bail!("{} of {} units failed", failed, args.inputs.len());
    }
    Ok(())
}

/// `<stem>.ll` next to the input, or under `output`
fn output_path(input: &Path, output: Option<&Path>, inputs: usize) -> PathBuf {
    let local = input.with_extension("ll");
    match output {
        Some(out) if inputs == 1 => out.to_path_buf(),
        Some(dir) => dir.join(local.file_name().unwrap_or(local.as_os_str())),
        None => local,
    }
}
