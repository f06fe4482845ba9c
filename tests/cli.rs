//! CLI end-to-end tests exercising the `tokenize`, `parse`, `evaluate`, and
//! `run` commands against the compiled binary, including the exact exit
//! codes and diagnostic formats the commands are expected to produce.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;
use std::io::Write;

fn bin() -> Command {
    Command::cargo_bin("loxrs").expect("binary should build")
}

fn script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    write!(file, "{contents}").expect("failed to write temp file");
    file
}

#[test]
fn unknown_command_exits_one() {
    let file = script("1;");
    bin()
        .arg("frobnicate")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown command: frobnicate"));
}

#[test]
fn missing_arguments_exits_one() {
    bin().assert().code(1);
}

#[test]
fn tokenize_emits_tokens_and_eof() {
    let file = script("(()");
    bin()
        .arg("tokenize")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("LEFT_PAREN ( null"))
        .stdout(predicate::str::contains("RIGHT_PAREN ) null"))
        .stdout(predicate::str::ends_with("EOF  null\n"));
}

#[test]
fn tokenize_reports_unexpected_character() {
    let file = script("@");
    bin()
        .arg("tokenize")
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("[line 1] Error: Unexpected character: @"));
}

#[test]
fn parse_prints_parenthesized_expression() {
    let file = script("1 + 2 * 3");
    bin()
        .arg("parse")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::eq("(+ 1.0 (* 2.0 3.0))\n"));
}

#[test]
fn evaluate_concatenates_strings() {
    let file = script("\"foo\" + \"bar\"");
    bin()
        .arg("evaluate")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::eq("foobar\n"));
}

#[test]
fn evaluate_reports_type_mismatch_as_runtime_error() {
    let file = script("\"foo\" + 1");
    bin()
        .arg("evaluate")
        .arg(file.path())
        .assert()
        .code(70)
        .stderr(predicate::str::contains("Operands must be two numbers or two strings."))
        .stderr(predicate::str::contains("[line 1]"));
}

#[test]
fn run_executes_block_scoping() {
    let file = script("var a = 1; { var a = 2; print a; } print a;");
    bin()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::eq("2\n1\n"));
}

#[test]
fn run_supports_closures_over_enclosing_scope() {
    let file = script(
        "fun makeCounter() { var i = 0; fun c() { i = i + 1; return i; } return c; } \
         var c = makeCounter(); print c(); print c();",
    );
    bin()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::eq("1\n2\n"));
}

#[test]
fn run_reports_parse_error_with_synchronize_recovery() {
    let file = script("print 1 + ; print 2;");
    bin()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(65);
}
