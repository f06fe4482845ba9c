//! Recursive-descent parser with Pratt-style precedence climbing for binary
//! operators. Replaces the teacher's `nom`-based s-expression reader: the
//! grammar here is hand-written, not combinator-based, matching the scanner
//! rather than reaching for a parser-combinator crate on a grammar this
//! small and this sensitive to error recovery.

use crate::ast::{Expr, FunctionDecl, Literal as AstLiteral, Stmt};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Literal, Token, TokenKind};
use std::rc::Rc;

const MAX_ARGS: usize = 255;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

type ExprResult = Result<Expr, ParseError>;
type StmtResult = Result<Stmt, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses a full program: zero or more top-level declarations.
    pub fn parse_program(mut self) -> (Vec<Stmt>, Vec<ParseError>) {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        (statements, self.errors)
    }

    /// Parses a single expression (used by `parse` and `evaluate` modes).
    pub fn parse_expression(mut self) -> Result<Expr, Vec<ParseError>> {
        match self.expression() {
            Ok(expr) => {
                if self.errors.is_empty() {
                    Ok(expr)
                } else {
                    Err(self.errors)
                }
            }
            Err(err) => {
                self.errors.push(err);
                Err(self.errors)
            }
        }
    }

    // ---- declarations ----

    fn declaration(&mut self) -> StmtResult {
        if self.match_kind(&[TokenKind::FUN]) {
            return self.function_decl("function");
        }
        if self.match_kind(&[TokenKind::VAR]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn function_decl(&mut self, kind: &str) -> StmtResult {
        let name = self.consume(TokenKind::IDENTIFIER, ParseErrorKind::ExpectToken(format!("{kind} name")))?;
        self.consume(
            TokenKind::LEFT_PAREN,
            ParseErrorKind::ExpectToken(format!("'(' after {kind} name")),
        )?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.errors.push(self.error_at_current(ParseErrorKind::TooManyParameters(MAX_ARGS)));
                }
                params.push(
                    self.consume(TokenKind::IDENTIFIER, ParseErrorKind::ExpectToken("parameter name".to_string()))?,
                );
                if !self.match_kind(&[TokenKind::COMMA]) {
                    break;
                }
            }
        }
        self.consume(
            TokenKind::RIGHT_PAREN,
            ParseErrorKind::ExpectToken("')' after parameters".to_string()),
        )?;

        self.consume(
            TokenKind::LEFT_BRACE,
            ParseErrorKind::ExpectToken(format!("'{{' before {kind} body")),
        )?;
        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body: Rc::new(body),
        })))
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self.consume(TokenKind::IDENTIFIER, ParseErrorKind::ExpectToken("variable name".to_string()))?;

        let initializer = if self.match_kind(&[TokenKind::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenKind::SEMICOLON,
            ParseErrorKind::ExpectToken("';' after variable declaration".to_string()),
        )?;
        Ok(Stmt::Var { name, initializer })
    }

    // ---- statements ----

    fn statement(&mut self) -> StmtResult {
        if self.match_kind(&[TokenKind::PRINT]) {
            return self.print_statement();
        }
        if self.match_kind(&[TokenKind::RETURN]) {
            return self.return_statement();
        }
        if self.match_kind(&[TokenKind::WHILE]) {
            return self.while_statement();
        }
        if self.match_kind(&[TokenKind::FOR]) {
            return self.for_statement();
        }
        if self.match_kind(&[TokenKind::IF]) {
            return self.if_statement();
        }
        if self.match_kind(&[TokenKind::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    fn print_statement(&mut self) -> StmtResult {
        let value = self.expression()?;
        self.consume(TokenKind::SEMICOLON, ParseErrorKind::ExpectToken("';' after value".to_string()))?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> StmtResult {
        let value = if !self.check(TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenKind::SEMICOLON,
            ParseErrorKind::ExpectToken("';' after return value".to_string()),
        )?;
        Ok(Stmt::Return { value })
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LEFT_PAREN, ParseErrorKind::ExpectToken("'(' after 'while'".to_string()))?;
        let condition = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, ParseErrorKind::ExpectToken("')' after condition".to_string()))?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn for_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LEFT_PAREN, ParseErrorKind::ExpectToken("'(' after 'for'".to_string()))?;

        let initializer = if self.match_kind(&[TokenKind::SEMICOLON]) {
            None
        } else if self.match_kind(&[TokenKind::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::SEMICOLON) {
            self.expression()?
        } else {
            Expr::Literal(AstLiteral::Bool(true))
        };
        self.consume(
            TokenKind::SEMICOLON,
            ParseErrorKind::ExpectToken("';' after loop condition".to_string()),
        )?;

        let increment = if !self.check(TokenKind::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenKind::RIGHT_PAREN,
            ParseErrorKind::ExpectToken("')' after for clauses".to_string()),
        )?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LEFT_PAREN, ParseErrorKind::ExpectToken("'(' after 'if'".to_string()))?;
        let condition = self.expression()?;
        self.consume(
            TokenKind::RIGHT_PAREN,
            ParseErrorKind::ExpectToken("')' after if condition".to_string()),
        )?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(&[TokenKind::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        self.consume(TokenKind::RIGHT_BRACE, ParseErrorKind::ExpectToken("'}' after block".to_string()))?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(
            TokenKind::SEMICOLON,
            ParseErrorKind::ExpectToken("';' after expression".to_string()),
        )?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions ----

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or()?;

        if self.match_kind(&[TokenKind::EQUAL]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }

            self.errors.push(ParseError::new(
                ParseErrorKind::InvalidAssignmentTarget,
                equals.line,
                false,
                equals.lexeme.clone(),
            ));
            return Ok(value);
        }

        Ok(expr)
    }

    fn or(&mut self) -> ExprResult {
        let mut expr = self.and()?;
        while self.match_kind(&[TokenKind::OR]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_kind(&[TokenKind::AND]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.match_kind(&[TokenKind::BANG_EQUAL, TokenKind::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.match_kind(&[
            TokenKind::GREATER,
            TokenKind::GREATER_EQUAL,
            TokenKind::LESS,
            TokenKind::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.match_kind(&[TokenKind::MINUS, TokenKind::PLUS]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.match_kind(&[TokenKind::SLASH, TokenKind::STAR]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_kind(&[TokenKind::BANG, TokenKind::MINUS]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(&[TokenKind::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    self.errors.push(self.error_at_current(ParseErrorKind::TooManyArguments(MAX_ARGS)));
                }
                arguments.push(self.expression()?);
                if !self.match_kind(&[TokenKind::COMMA]) {
                    break;
                }
            }
        }

        let paren = self.consume(
            TokenKind::RIGHT_PAREN,
            ParseErrorKind::ExpectToken("')' after arguments".to_string()),
        )?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ExprResult {
        if self.match_kind(&[TokenKind::FALSE]) {
            return Ok(Expr::Literal(AstLiteral::Bool(false)));
        }
        if self.match_kind(&[TokenKind::TRUE]) {
            return Ok(Expr::Literal(AstLiteral::Bool(true)));
        }
        if self.match_kind(&[TokenKind::NIL]) {
            return Ok(Expr::Literal(AstLiteral::Nil));
        }
        if self.match_kind(&[TokenKind::NUMBER]) {
            return match self.previous().literal.clone() {
                Literal::Number(n) => Ok(Expr::Literal(AstLiteral::Number(n))),
                _ => unreachable!("NUMBER token without numeric literal"),
            };
        }
        if self.match_kind(&[TokenKind::STRING]) {
            return match self.previous().literal.clone() {
                Literal::String(s) => Ok(Expr::Literal(AstLiteral::String(s))),
                _ => unreachable!("STRING token without string literal"),
            };
        }
        if self.match_kind(&[TokenKind::IDENTIFIER]) {
            return Ok(Expr::Variable(self.previous().clone()));
        }
        if self.match_kind(&[TokenKind::LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(
                TokenKind::RIGHT_PAREN,
                ParseErrorKind::ExpectToken("')' after expression".to_string()),
            )?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error_at_current(ParseErrorKind::ExpectExpression))
    }

    // ---- token-stream plumbing ----

    fn match_kind(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, kind: TokenKind, err_kind: ParseErrorKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        Err(self.error_at_current(err_kind))
    }

    fn error_at_current(&self, kind: ParseErrorKind) -> ParseError {
        let token = self.peek();
        let at_end = token.kind == TokenKind::EOF;
        ParseError::new(kind, token.line, at_end, token.lexeme.clone())
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::SEMICOLON {
                return;
            }

            match self.peek().kind {
                TokenKind::CLASS
                | TokenKind::FUN
                | TokenKind::VAR
                | TokenKind::FOR
                | TokenKind::IF
                | TokenKind::WHILE
                | TokenKind::PRINT
                | TokenKind::RETURN => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_expr;
    use crate::scanner::Scanner;

    fn parse_expr(src: &str) -> Expr {
        let (tokens, errors) = Scanner::new(src).scan_tokens();
        assert!(errors.is_empty(), "unexpected scan errors: {errors:?}");
        Parser::new(tokens).parse_expression().expect("expected successful parse")
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let expr = parse_expr("1 + 2 * 3");
        assert_eq!(print_expr(&expr), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn parses_grouping() {
        let expr = parse_expr("(1 + 2) * 3");
        assert_eq!(print_expr(&expr), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn parses_unary_and_comparison() {
        let expr = parse_expr("!true == (-1 < 2)");
        assert_eq!(print_expr(&expr), "(== (! true) (group (< (- 1.0) 2.0)))");
    }

    #[test]
    fn reports_missing_closing_paren() {
        let (tokens, _) = Scanner::new("(1 + 2").scan_tokens();
        let result = Parser::new(tokens).parse_expression();
        assert!(result.is_err());
    }

    #[test]
    fn for_loop_desugars_into_while_block() {
        let (tokens, _) = Scanner::new("for (var i = 0; i < 3; i = i + 1) print i;").scan_tokens();
        let (stmts, errors) = Parser::new(tokens).parse_program();
        assert!(errors.is_empty());
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Block(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[0], Stmt::Var { .. }));
                assert!(matches!(inner[1], Stmt::While { .. }));
            }
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn function_call_parses_arguments() {
        let expr = parse_expr("clock()");
        match expr {
            Expr::Call { arguments, .. } => assert!(arguments.is_empty()),
            other => panic!("expected call expr, got {other:?}"),
        }
    }
}
