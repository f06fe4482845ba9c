//! Tree-walking evaluator. Statement execution returns `Result<(), Unwind>`
//! so that both runtime errors and non-local `return` propagate through the
//! same unwinding mechanism without Rust exceptions — only the function-call
//! site distinguishes `Unwind::Return` from `Unwind::Error` and converts the
//! former into an ordinary `Value`. The environment is threaded explicitly
//! through every call rather than mutated via a global current-scope
//! pointer, so there is no hidden singleton and no re-entrancy hazard.

use crate::ast::{Expr, Literal, Stmt};
use crate::env::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::token::{Token, TokenKind};
use crate::value::{values_equal, Callable, LoxFunction, Value};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Internal control-flow signal used by statement execution. `Return`
/// carries the value of a `return` statement up to the enclosing call;
/// `Error` carries an ordinary runtime failure.
pub enum Unwind {
    Error(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

type ExecResult = Result<(), Unwind>;
type EvalResult = Result<Value, RuntimeError>;

pub struct Interpreter {
    globals: Rc<Environment>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        globals.define(
            "clock",
            Value::Callable(Callable::Native {
                name: "clock",
                arity: 0,
                func: native_clock,
            }),
        );
        Interpreter { globals }
    }

    /// Executes a full program against the global environment. Returns the
    /// first runtime error encountered, if any; a `return` that escapes the
    /// top level is treated as the program simply finishing.
    pub fn interpret(&self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        let env = self.globals.clone();
        for stmt in statements {
            match self.execute(stmt, &env) {
                Ok(()) => {}
                Err(Unwind::Return(_)) => return Ok(()),
                Err(Unwind::Error(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Evaluates a single expression against the global environment, for
    /// the `evaluate` CLI command.
    pub fn evaluate_expression(&self, expr: &Expr) -> EvalResult {
        self.evaluate(expr, &self.globals)
    }

    fn execute(&self, stmt: &Stmt, env: &Rc<Environment>) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                println!("{value}");
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                env.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let block_env = Environment::with_parent(env.clone());
                self.execute_block(statements, &block_env)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    self.execute(body, env)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = LoxFunction {
                    declaration: decl.clone(),
                    closure: env.clone(),
                };
                env.define(decl.name.lexeme.clone(), Value::Callable(Callable::Function(Rc::new(function))));
                Ok(())
            }
            Stmt::Return { value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
        }
    }

    fn execute_block(&self, statements: &[Stmt], env: &Rc<Environment>) -> ExecResult {
        for stmt in statements {
            self.execute(stmt, env)?;
        }
        Ok(())
    }

    fn evaluate(&self, expr: &Expr, env: &Rc<Environment>) -> EvalResult {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Grouping(inner) => self.evaluate(inner, env),
            Expr::Variable(name) => env
                .get(&name.lexeme)
                .ok_or_else(|| RuntimeError::undefined_variable(&name.lexeme, name.line)),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                if env.assign(&name.lexeme, value.clone()) {
                    Ok(value)
                } else {
                    Err(RuntimeError::undefined_variable(&name.lexeme, name.line))
                }
            }
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right, env),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right, env),
            Expr::Logical { left, operator, right } => self.evaluate_logical(left, operator, right, env),
            Expr::Call { callee, paren, arguments } => self.evaluate_call(callee, paren, arguments, env),
        }
    }

    fn evaluate_unary(&self, operator: &Token, right: &Expr, env: &Rc<Environment>) -> EvalResult {
        let right = self.evaluate(right, env)?;
        match operator.kind {
            TokenKind::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(RuntimeErrorKind::OperandMustBeNumber, operator.line)),
            },
            TokenKind::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("unary operator must be '!' or '-'"),
        }
    }

    fn evaluate_binary(&self, left: &Expr, operator: &Token, right: &Expr, env: &Rc<Environment>) -> EvalResult {
        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;
        let line = operator.line;

        match operator.kind {
            TokenKind::MINUS => numeric_op(left, right, line, |a, b| a - b),
            TokenKind::SLASH => numeric_op(left, right, line, |a, b| a / b),
            TokenKind::STAR => numeric_op(left, right, line, |a, b| a * b),
            TokenKind::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::new(RuntimeErrorKind::OperandsMustBeNumbersOrStrings, line)),
            },
            TokenKind::GREATER => numeric_cmp(left, right, line, |a, b| a > b),
            TokenKind::GREATER_EQUAL => numeric_cmp(left, right, line, |a, b| a >= b),
            TokenKind::LESS => numeric_cmp(left, right, line, |a, b| a < b),
            TokenKind::LESS_EQUAL => numeric_cmp(left, right, line, |a, b| a <= b),
            TokenKind::EQUAL_EQUAL => Ok(Value::Bool(values_equal(&left, &right))),
            TokenKind::BANG_EQUAL => Ok(Value::Bool(!values_equal(&left, &right))),
            _ => unreachable!("unexpected binary operator {:?}", operator.kind),
        }
    }

    fn evaluate_logical(&self, left: &Expr, operator: &Token, right: &Expr, env: &Rc<Environment>) -> EvalResult {
        let left = self.evaluate(left, env)?;
        match operator.kind {
            TokenKind::OR if left.is_truthy() => Ok(left),
            TokenKind::AND if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right, env),
        }
    }

    fn evaluate_call(&self, callee: &Expr, paren: &Token, arguments: &[Expr], env: &Rc<Environment>) -> EvalResult {
        let callee = self.evaluate(callee, env)?;
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg, env)?);
        }

        let callable = match callee {
            Value::Callable(c) => c,
            _ => return Err(RuntimeError::new(RuntimeErrorKind::NotCallable, paren.line)),
        };

        if args.len() != callable.arity() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::ArityMismatch {
                    expected: callable.arity(),
                    actual: args.len(),
                },
                paren.line,
            ));
        }

        self.call(&callable, args)
    }

    fn call(&self, callable: &Callable, args: Vec<Value>) -> EvalResult {
        match callable {
            Callable::Native { func, .. } => func(&args),
            Callable::Function(function) => self.call_function(function, args),
        }
    }

    fn call_function(&self, function: &Rc<LoxFunction>, args: Vec<Value>) -> EvalResult {
        let call_env = Environment::with_parent(function.closure.clone());
        for (param, arg) in function.declaration.params.iter().zip(args) {
            call_env.define(param.lexeme.clone(), arg);
        }

        match self.execute_block(&function.declaration.body, &call_env) {
            Ok(()) => Ok(Value::Nil),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(err)) => Err(err),
        }
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

fn numeric_op(left: Value, right: Value, line: usize, op: impl Fn(f64, f64) -> f64) -> EvalResult {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op(a, b))),
        _ => Err(RuntimeError::new(RuntimeErrorKind::OperandsMustBeNumbers, line)),
    }
}

fn numeric_cmp(left: Value, right: Value, line: usize, op: impl Fn(f64, f64) -> bool) -> EvalResult {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(op(a, b))),
        _ => Err(RuntimeError::new(RuntimeErrorKind::OperandsMustBeNumbers, line)),
    }
}

fn native_clock(_args: &[Value]) -> EvalResult {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64();
    Ok(Value::Number(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn run(src: &str) -> Result<(), RuntimeError> {
        let (tokens, scan_errors) = Scanner::new(src).scan_tokens();
        assert!(scan_errors.is_empty(), "unexpected scan errors: {scan_errors:?}");
        let (statements, parse_errors) = Parser::new(tokens).parse_program();
        assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
        Interpreter::new().interpret(&statements)
    }

    fn eval_expr(src: &str) -> Value {
        let (tokens, _) = Scanner::new(src).scan_tokens();
        let expr = Parser::new(tokens).parse_expression().expect("parse failed");
        Interpreter::new().evaluate_expression(&expr).expect("eval failed")
    }

    #[test]
    fn evaluates_arithmetic() {
        match eval_expr("1 + 2 * 3") {
            Value::Number(n) => assert_eq!(n, 7.0),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn string_concatenation() {
        match eval_expr("\"foo\" + \"bar\"") {
            Value::String(s) => assert_eq!(s, "foobar"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_plus_operands_is_runtime_error() {
        let (tokens, _) = Scanner::new("\"foo\" + 1").scan_tokens();
        let expr = Parser::new(tokens).parse_expression().expect("parse failed");
        let err = Interpreter::new().evaluate_expression(&expr).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::OperandsMustBeNumbersOrStrings);
    }

    #[test]
    fn block_scoping_shadows_outer_variable() {
        assert!(run("var a = 1; { var a = 2; } ").is_ok());
    }

    #[test]
    fn closures_capture_declaration_environment() {
        let result = run(
            "fun makeCounter() { var i = 0; fun count() { i = i + 1; return i; } return count; } \
             var counter = makeCounter(); \
             if (counter() != 1) { print \"fail1\"; } \
             if (counter() != 2) { print \"fail2\"; }",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn undefined_variable_is_runtime_error() {
        let err = run("print missing;").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::UndefinedVariable("missing".to_string()));
    }

    #[test]
    fn calling_non_callable_is_runtime_error() {
        let err = run("var x = 1; x();").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::NotCallable);
    }

    #[test]
    fn arity_mismatch_is_runtime_error() {
        let err = run("fun f(a) { return a; } f(1, 2);").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::ArityMismatch { expected: 1, actual: 2 });
    }

    #[test]
    fn logical_or_short_circuits_and_returns_operand() {
        match eval_expr("nil or \"fallback\"") {
            Value::String(s) => assert_eq!(s, "fallback"),
            other => panic!("expected string, got {other:?}"),
        }
    }
}
