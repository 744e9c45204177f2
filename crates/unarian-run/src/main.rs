//! Unarian interpreter command line.
//!
//! Parses a source file and an entry expression, optimizes, compiles to
//! bytecode and evaluates. Program output (final counters, or `-` for ⊥)
//! goes to stdout; diagnostics and logs go to stderr.
//!
//! Exit codes: 0 success, 1 file open failure, 2 file parse errors,
//! 3 expression parse errors.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use num_bigint::BigUint;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unarian_parser::ParseError;
use unarian_runtime::{compile, disassemble, BytecodeModule, Counter, Vm};

#[derive(Parser, Debug)]
#[command(name = "unarian")]
#[command(about = "An interpreter for the Unarian programming language")]
struct Cli {
    /// The Unarian file to interpret
    file: Option<PathBuf>,

    /// The expression to evaluate
    #[arg(short, long, default_value = "main")]
    expr: String,

    /// Read initial counters from stdin, one integer per line
    #[arg(short, long)]
    input: bool,

    /// Enable debug printing with the ! command
    #[arg(short = 'g', long)]
    debug: bool,

    /// Use 64-bit arithmetic instead of arbitrary precision
    #[arg(short, long)]
    fixed: bool,

    /// Dump the generated bytecode and exit
    #[arg(short, long)]
    bytecode: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let source = match &cli.file {
        Some(path) => match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                eprintln!("Unable to open {}: {err}", path.display());
                return ExitCode::from(1);
            }
        },
        None => String::new(),
    };

    let mut programs = match unarian_parser::parse_file(&source, cli.debug) {
        Ok(programs) => programs,
        Err(errors) => {
            report(&errors);
            return ExitCode::from(2);
        }
    };

    let entry = match unarian_parser::parse_expression(&cli.expr, &mut programs) {
        Ok(entry) => entry,
        Err(errors) => {
            report(&errors);
            return ExitCode::from(3);
        }
    };

    let programs = unarian_ir::optimize_programs(programs, &entry);
    debug!(functions = programs.len(), "optimized program map");

    let module = match compile(&programs, &entry) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    if cli.bytecode {
        print!("{}", disassemble(&module));
        return ExitCode::SUCCESS;
    }

    if cli.fixed {
        run_all::<u64>(&module, &cli)
    } else {
        run_all::<BigUint>(&module, &cli)
    }
}

fn report(errors: &[ParseError]) {
    for error in errors {
        eprintln!("{error}");
    }
}

fn run_all<C: Counter>(module: &BytecodeModule, cli: &Cli) -> ExitCode {
    let vm: Vm<C> = match Vm::new(module) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let mut stdout = io::stdout().lock();

    if cli.input {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            // Like the original's stream extraction, input stops at the
            // first line that is not a counter for the chosen precision.
            let Some(initial) = C::from_decimal(text) else {
                break;
            };
            if let Err(code) = evaluate(&vm, initial, &mut stdout) {
                return code;
            }
        }
    } else if let Err(code) = evaluate(&vm, C::zero(), &mut stdout) {
        return code;
    }

    ExitCode::SUCCESS
}

/// Run one evaluation, printing the final counter or `-` for ⊥.
fn evaluate<C: Counter, W: Write>(vm: &Vm<C>, initial: C, out: &mut W) -> Result<(), ExitCode> {
    match vm.run(initial, out) {
        Ok(Some(value)) => writeln!(out, "{value}").map_err(|_| ExitCode::from(1)),
        Ok(None) => writeln!(out, "-").map_err(|_| ExitCode::from(1)),
        Err(err) => {
            eprintln!("{err}");
            Err(ExitCode::from(2))
        }
    }
}
