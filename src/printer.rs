//! Parenthesized-prefix pretty printer used by the `parse` CLI command.

use crate::ast::{Expr, Literal};
use crate::token::format_number_verbose;

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => print_literal(lit),
        Expr::Grouping(inner) => parenthesize("group", &[inner.as_ref()]),
        Expr::Unary { operator, right } => parenthesize(&operator.lexeme, &[right.as_ref()]),
        Expr::Binary { left, operator, right } => {
            parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()])
        }
        Expr::Logical { left, operator, right } => {
            parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()])
        }
        Expr::Variable(name) => name.lexeme.clone(),
        Expr::Assign { name, value } => parenthesize(&format!("= {}", name.lexeme), &[value.as_ref()]),
        Expr::Call { callee, arguments, .. } => {
            let mut parts = vec![callee.as_ref()];
            parts.extend(arguments.iter());
            parenthesize("call", &parts)
        }
    }
}

fn print_literal(lit: &Literal) -> String {
    match lit {
        Literal::Number(n) => format_number_verbose(*n),
        Literal::String(s) => s.clone(),
        Literal::Bool(b) => b.to_string(),
        Literal::Nil => "nil".to_string(),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut out = String::from("(");
    out.push_str(name);
    for expr in exprs {
        out.push(' ');
        out.push_str(&print_expr(expr));
    }
    out.push(')');
    out
}
