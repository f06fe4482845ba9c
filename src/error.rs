// ABOUTME: Error types for the scanner, parser, and evaluator stages.

use thiserror::Error;

/// A lexical error produced while scanning a single character or span.
/// Carried separately from its line so the scanner can collect many of
/// these in one pass without aborting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanErrorKind {
    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),

    #[error("Unterminated string.")]
    UnterminatedString,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub line: usize,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, line: usize) -> Self {
        ScanError { kind, line }
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.kind)
    }
}

impl std::error::Error for ScanError {}

/// A syntax error produced by the parser. One variant per distinct
/// production failure, the same shape as `ScanErrorKind`/`RuntimeErrorKind`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("Expect expression.")]
    ExpectExpression,

    #[error("Expect {0}.")]
    ExpectToken(String),

    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,

    #[error("Can't have more than {0} parameters.")]
    TooManyParameters(usize),

    #[error("Can't have more than {0} arguments.")]
    TooManyArguments(usize),
}

/// A parse error, with enough location context to reproduce the
/// `[line N] Error at 'X': msg` / `[line N] Error at end: msg` wire format.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub at_end: bool,
    pub lexeme: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, at_end: bool, lexeme: impl Into<String>) -> Self {
        ParseError {
            kind,
            line,
            at_end,
            lexeme: lexeme.into(),
        }
    }
}

/// A runtime error raised during evaluation. Carries its own `line` because
/// evaluation can fail deep inside nested expressions, far from where the
/// enclosing statement started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,

    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,

    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,

    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    #[error("Can only call functions and classes.")]
    NotCallable,

    #[error("Expected {expected} arguments but got {actual}.")]
    ArityMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: usize) -> Self {
        RuntimeError { kind, line }
    }

    pub fn undefined_variable(name: &str, line: usize) -> Self {
        RuntimeError::new(RuntimeErrorKind::UndefinedVariable(name.to_string()), line)
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n[line {}]", self.kind, self.line)
    }
}

impl std::error::Error for RuntimeError {}
