use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quill_ast::ast::Program;
use quill_cli::builtins::{self, Output};
use quill_cli::eval::{Interpreter, Limits, MAX_CALL_DEPTH};
use quill_types::ErrorList;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Maximum source file size in bytes (1MB)
const MAX_SOURCE_SIZE: usize = 1_000_000;

/// Exit status when evaluation stopped on a broken internal invariant.
const EXIT_DEFECT: u8 = 70;

/// Native stack reserved per allowed call level. One Quill call nests
/// roughly a dozen evaluator frames, and debug builds keep them large.
const STACK_PER_CALL: usize = 512 * 1024;

/// Native stack for everything that is not a nested call.
const BASE_STACK: usize = 8 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Quill: check and run programs over a nominal type system")]
struct Cli {
    /// Maximum depth of nested function calls
    #[arg(long, global = true, default_value_t = MAX_CALL_DEPTH)]
    max_call_depth: u32,

    /// Maximum program file size in bytes
    #[arg(long, global = true, default_value_t = MAX_SOURCE_SIZE)]
    max_source_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepare a program and report every error without running it
    Check {
        /// Path to a program tree in JSON form
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Prepare and execute a program
    Run {
        /// Path to a program tree in JSON form
        file: String,
    },

    /// Load a program tree and print it back
    Dump {
        /// Path to a program tree in JSON form
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Pretty,
    Json,
}

/// One diagnostic in `--format json` output.
#[derive(Serialize)]
struct DiagnosticReport {
    line: u32,
    column: u32,
    code: &'static str,
    category: String,
    message: String,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let limits = Limits {
        max_call_depth: cli.max_call_depth,
    };

    let max_source_size = cli.max_source_size;

    match cli.command {
        Commands::Check { file, format } => on_evaluation_stack(limits, move || {
            cmd_check(&file, format, limits, max_source_size)
        }),
        Commands::Run { file } => {
            on_evaluation_stack(limits, move || cmd_run(&file, limits, max_source_size))
        }
        Commands::Dump { file, format } => cmd_dump(&file, format, max_source_size),
    }
}

/// Run `task` on a thread whose stack fits `limits.max_call_depth` nested
/// calls, so running out of depth is reported as CALL_DEPTH_EXCEEDED.
fn on_evaluation_stack<F>(limits: Limits, task: F) -> Result<ExitCode>
where
    F: FnOnce() -> Result<ExitCode> + Send + 'static,
{
    let stack_size = usize::try_from(limits.max_call_depth)
        .unwrap_or(usize::MAX)
        .saturating_mul(STACK_PER_CALL)
        .saturating_add(BASE_STACK);
    tracing::debug!(stack_size, "spawning evaluation thread");

    std::thread::Builder::new()
        .name("quill-eval".to_string())
        .stack_size(stack_size)
        .spawn(task)
        .context("failed to spawn the evaluation thread")?
        .join()
        .map_err(|_| anyhow::anyhow!("the evaluation thread panicked"))?
}

/// Diagnostics go to stderr; `QUILL_LOG` takes an `EnvFilter` directive.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_program(path: &str, max_source_size: usize) -> Result<Program> {
    let src =
        std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path))?;

    if src.len() > max_source_size {
        bail!(
            "source file exceeds the {} byte limit ({} bytes)",
            max_source_size,
            src.len()
        );
    }

    serde_json::from_str(&src).with_context(|| format!("'{}' is not a valid program tree", path))
}

fn interpreter(limits: Limits) -> Result<Interpreter> {
    let interpreter = Interpreter::with_limits(limits);
    builtins::install(&interpreter, Output::Stdout)
        .map_err(|kind| anyhow::anyhow!("failed to install builtins: {}", kind))?;
    Ok(interpreter)
}

fn cmd_check(file: &str, format: Format, limits: Limits, max_source_size: usize) -> Result<ExitCode> {
    let program = load_program(file, max_source_size)?;
    let errors = interpreter(limits)?.check(&program);

    match format {
        Format::Pretty => {
            if errors.is_empty() {
                println!("No errors found.");
            } else {
                eprintln!("{}", errors);
            }
        }
        Format::Json => {
            let reports: Vec<DiagnosticReport> = errors
                .iter()
                .map(|d| DiagnosticReport {
                    line: d.span.line,
                    column: d.span.column,
                    code: d.code(),
                    category: d.kind.category().to_string(),
                    message: d.kind.to_string(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }
    Ok(exit_code(&errors))
}

fn cmd_run(file: &str, limits: Limits, max_source_size: usize) -> Result<ExitCode> {
    let program = load_program(file, max_source_size)?;
    let interpreter = interpreter(limits)?;

    match interpreter.run(&program) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(errors) => {
            eprintln!("{}", errors);
            Ok(exit_code(&errors))
        }
    }
}

fn cmd_dump(file: &str, format: Format, max_source_size: usize) -> Result<ExitCode> {
    let program = load_program(file, max_source_size)?;

    match format {
        Format::Pretty => println!("{:#?}", program),
        Format::Json => println!("{}", serde_json::to_string_pretty(&program)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn exit_code(errors: &ErrorList) -> ExitCode {
    if errors.is_empty() {
        ExitCode::SUCCESS
    } else if errors.has_defect() {
        ExitCode::from(EXIT_DEFECT)
    } else {
        ExitCode::FAILURE
    }
}
