//! rlc - checker for a small Rust-like language

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use rlc::feedback::{dump_symbols, CheckReport, Diagnostic, Stats};
use rlc::frontend::ast::Crate;
use rlc::frontend::parser::parse_source;
use rlc::semantic::Checker;

/// Semantic checker for a Rust-like language
#[derive(Parser, Debug)]
#[command(name = "rlc")]
#[command(version)]
#[command(about = "Type-check a Rust-like source file")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file, `-` or absent for stdin
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct OutputArgs {
    /// Print a JSON report instead of plain messages
    #[arg(long, global = true)]
    json: bool,

    /// Print the symbol tables after a successful check
    #[arg(long, global = true)]
    emit_symbols: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a source file for errors
    Check {
        /// Input source file, `-` or absent for stdin
        input: Option<PathBuf>,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let input = match &cli.command {
        Some(Commands::Version) => {
            println!("rlc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Some(Commands::Check { input }) => input.clone(),
        None => cli.input.clone(),
    };

    match run(input.as_deref(), cli.output) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error[io]: {:#}", e);
            process::exit(1);
        }
    }
}

fn read_source(input: Option<&Path>) -> Result<(String, String)> {
    match input {
        None => read_stdin(),
        Some(path) if path.as_os_str() == "-" => read_stdin(),
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((path.display().to_string(), source))
        }
    }
}

fn read_stdin() -> Result<(String, String)> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("failed to read standard input")?;
    Ok(("<stdin>".to_string(), source))
}

/// Returns whether the source checked cleanly
fn run(input: Option<&Path>, args: OutputArgs) -> Result<bool> {
    let (file_name, source) = read_source(input)?;
    log::debug!("checking {} ({} bytes)", file_name, source.len());

    let mut checker = Checker::new();
    let mut krate = Crate::default();
    let outcome = parse_source(&source).and_then(|parsed| {
        krate = parsed;
        checker.check(&mut krate)
    });
    let stats = Stats::collect(&krate, &checker);

    match outcome {
        Ok(()) => {
            if args.json {
                println!("{}", CheckReport::success(file_name, stats).to_json());
            }
            if args.emit_symbols {
                print!("{}", dump_symbols(&checker));
            }
            Ok(true)
        }
        Err(e) => {
            let diagnostic = Diagnostic::from_error(&e, &source);
            if args.json {
                println!("{}", CheckReport::failure(file_name, diagnostic, stats).to_json());
            } else {
                eprintln!("{}", diagnostic.render(&file_name));
            }
            Ok(false)
        }
    }
}
