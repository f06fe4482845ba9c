mod ast;
mod env;
mod error;
mod interpreter;
mod parser;
mod printer;
mod scanner;
mod token;
mod value;

use clap::Parser as ClapParser;
use error::{ParseError, RuntimeError};
use interpreter::Interpreter;
use parser::Parser;
use scanner::Scanner;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: u8 = 1;
const EXIT_DATA_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

/// A tree-walking interpreter for a small dynamically-typed scripting language.
#[derive(ClapParser, Debug)]
#[command(name = "loxrs")]
#[command(version)]
#[command(about = "Scan, parse, or evaluate a script")]
struct Cli {
    /// One of: tokenize, parse, evaluate, run
    command: String,

    /// Path to the source file
    path: PathBuf,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                print!("{err}");
                return ExitCode::SUCCESS;
            }
            eprint!("{err}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    init_logging(cli.verbose);

    match cli.command.as_str() {
        "tokenize" | "parse" | "evaluate" | "run" => {}
        other => {
            eprintln!("Unknown command: {other}");
            return ExitCode::from(EXIT_USAGE);
        }
    }

    let source = match std::fs::read_to_string(&cli.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Failed to read file {}: {err}", cli.path.display());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let code = run_command(&cli.command, &source);
    ExitCode::from(code)
}

fn run_command(command: &str, source: &str) -> u8 {
    match command {
        "tokenize" => run_tokenize(source),
        "parse" => run_parse(source),
        "evaluate" => run_evaluate(source),
        "run" => run_program(source),
        _ => unreachable!("command already validated"),
    }
}

fn run_tokenize(source: &str) -> u8 {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    for err in &errors {
        tracing::debug!(%err, "lexical error");
        eprintln!("{err}");
    }
    for token in &tokens {
        println!("{token}");
    }
    if errors.is_empty() {
        0
    } else {
        EXIT_DATA_ERROR
    }
}

fn run_parse(source: &str) -> u8 {
    let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
    if !scan_errors.is_empty() {
        for err in &scan_errors {
            eprintln!("{err}");
        }
        return EXIT_DATA_ERROR;
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) => {
            println!("{}", printer::print_expr(&expr));
            0
        }
        Err(errors) => {
            report_parse_errors(&errors);
            EXIT_DATA_ERROR
        }
    }
}

fn run_evaluate(source: &str) -> u8 {
    let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
    if !scan_errors.is_empty() {
        for err in &scan_errors {
            eprintln!("{err}");
        }
        return EXIT_DATA_ERROR;
    }

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) => expr,
        Err(errors) => {
            report_parse_errors(&errors);
            return EXIT_DATA_ERROR;
        }
    };

    match Interpreter::new().evaluate_expression(&expr) {
        Ok(value) => {
            println!("{value}");
            0
        }
        Err(err) => {
            report_runtime_error(&err);
            EXIT_RUNTIME_ERROR
        }
    }
}

fn run_program(source: &str) -> u8 {
    let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
    let (statements, parse_errors) = Parser::new(tokens).parse_program();

    if !scan_errors.is_empty() || !parse_errors.is_empty() {
        for err in &scan_errors {
            eprintln!("{err}");
        }
        report_parse_errors(&parse_errors);
        return EXIT_DATA_ERROR;
    }

    match Interpreter::new().interpret(&statements) {
        Ok(()) => 0,
        Err(err) => {
            report_runtime_error(&err);
            EXIT_RUNTIME_ERROR
        }
    }
}

fn report_parse_errors(errors: &[ParseError]) {
    for err in errors {
        let where_ = if err.at_end {
            " at end".to_string()
        } else {
            format!(" at '{}'", err.lexeme)
        };
        eprintln!("[line {}] Error{}: {}", err.line, where_, err.kind);
    }
}

fn report_runtime_error(err: &RuntimeError) {
    tracing::debug!(%err, "runtime error");
    eprintln!("{err}");
}
