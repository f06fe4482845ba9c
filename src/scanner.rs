//! Hand-written lexical scanner: turns a source string into a flat sequence
//! of tokens terminated by exactly one `EOF`. Scanning never aborts on a bad
//! character or an unterminated string — it records the error and continues
//! so a single pass can surface every lexical problem in the source.

use crate::error::{ScanError, ScanErrorKind};
use crate::token::{keyword, Literal, Token, TokenKind};

pub struct Scanner<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Scans the whole source, returning the tokens and any lexical errors
    /// encountered along the way. Always ends with one `EOF` token.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<ScanError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token::eof(self.line));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_literal(kind, Literal::None);
    }

    fn add_token_literal(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn error(&mut self, kind: ScanErrorKind) {
        self.errors.push(ScanError::new(kind, self.line));
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            b'(' => self.add_token(TokenKind::LEFT_PAREN),
            b')' => self.add_token(TokenKind::RIGHT_PAREN),
            b'{' => self.add_token(TokenKind::LEFT_BRACE),
            b'}' => self.add_token(TokenKind::RIGHT_BRACE),
            b',' => self.add_token(TokenKind::COMMA),
            b'.' => self.add_token(TokenKind::DOT),
            b'-' => self.add_token(TokenKind::MINUS),
            b'+' => self.add_token(TokenKind::PLUS),
            b';' => self.add_token(TokenKind::SEMICOLON),
            b'*' => self.add_token(TokenKind::STAR),
            b'!' => {
                let kind = if self.match_char(b'=') {
                    TokenKind::BANG_EQUAL
                } else {
                    TokenKind::BANG
                };
                self.add_token(kind);
            }
            b'=' => {
                let kind = if self.match_char(b'=') {
                    TokenKind::EQUAL_EQUAL
                } else {
                    TokenKind::EQUAL
                };
                self.add_token(kind);
            }
            b'<' => {
                let kind = if self.match_char(b'=') {
                    TokenKind::LESS_EQUAL
                } else {
                    TokenKind::LESS
                };
                self.add_token(kind);
            }
            b'>' => {
                let kind = if self.match_char(b'=') {
                    TokenKind::GREATER_EQUAL
                } else {
                    TokenKind::GREATER
                };
                self.add_token(kind);
            }
            b'/' => {
                if self.match_char(b'/') {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::SLASH);
                }
            }
            b' ' | b'\r' | b'\t' => {}
            b'\n' => self.line += 1,
            b'"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == b'_' => self.identifier(),
            c => self.error(ScanErrorKind::UnexpectedCharacter(c as char)),
        }
    }

    fn string(&mut self) {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error(ScanErrorKind::UnterminatedString);
            return;
        }

        self.advance(); // closing quote
        let value = String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1]).into_owned();
        self.add_token_literal(TokenKind::STRING, Literal::String(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume the '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();
        let value: f64 = text.parse().expect("scanned number lexeme must parse as f64");
        self.add_token_literal(TokenKind::NUMBER, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = keyword(&text).unwrap_or(TokenKind::IDENTIFIER);
        self.add_token(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, _) = Scanner::new(src).scan_tokens();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_single_char_tokens() {
        assert_eq!(
            kinds("(()"),
            vec![
                TokenKind::LEFT_PAREN,
                TokenKind::LEFT_PAREN,
                TokenKind::RIGHT_PAREN,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn scans_two_char_operators() {
        assert_eq!(
            kinds("!= == <= >="),
            vec![
                TokenKind::BANG_EQUAL,
                TokenKind::EQUAL_EQUAL,
                TokenKind::LESS_EQUAL,
                TokenKind::GREATER_EQUAL,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn reports_unexpected_character() {
        let (tokens, errors) = Scanner::new("@").scan_tokens();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EOF);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ScanErrorKind::UnexpectedCharacter('@'));
        assert_eq!(errors[0].line, 1);
    }

    #[test]
    fn reports_unterminated_string() {
        let (_, errors) = Scanner::new("\"abc").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ScanErrorKind::UnterminatedString);
    }

    #[test]
    fn identifier_is_not_split_at_keyword_prefix() {
        assert_eq!(kinds("orchid"), vec![TokenKind::IDENTIFIER, TokenKind::EOF]);
        assert_eq!(kinds("or"), vec![TokenKind::OR, TokenKind::EOF]);
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let (tokens, _) = Scanner::new("1\n2\n3").scan_tokens();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }

    #[test]
    fn number_literal_supports_fraction() {
        let (tokens, _) = Scanner::new("3.14").scan_tokens();
        match &tokens[0].literal {
            Literal::Number(n) => assert_eq!(*n, 3.14),
            other => panic!("expected number literal, got {other:?}"),
        }
    }
}
