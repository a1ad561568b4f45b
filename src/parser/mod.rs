//! Recursive-descent parser: fused token stream to AST.
//!
//! The expression grammar (`expr.rs`) and the `SELECT`/`CREATE TABLE`/`USE`
//! grammars (`stmt.rs`) are each implemented as distinct methods mirroring
//! the grammar's own nesting, rather than a generic precedence-climbing
//! loop — the tree shape falls directly out of which method calls which.

mod expr;
mod stmt;

use crate::ast::{Identifier, Statement};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    /// Parse every statement in the script.
    pub fn parse(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            while matches!(self.peek().kind, TokenKind::Semicolon) {
                self.advance();
            }
            if matches!(self.peek().kind, TokenKind::Eof) {
                break;
            }
            let stmt = self.parse_statement()?;
            log::debug!("parser: parsed statement {:?}", std::mem::discriminant(&stmt));
            statements.push(stmt);
            if matches!(self.peek().kind, TokenKind::Semicolon) {
                self.advance();
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Select) => Ok(Statement::Select(self.parse_select()?)),
            TokenKind::CreateTable => Ok(Statement::CreateTable(self.parse_create_table()?)),
            TokenKind::Keyword(Keyword::Use) => Ok(Statement::Use(self.parse_use()?)),
            _ => {
                let tok = self.peek().clone();
                Err(
                    Error::with_span(ErrorKind::UnknownSql, tok.span)
                        .with_context(format!("unexpected token `{}`", tok.kind)),
                )
            }
        }
    }

    // ------------------------------------------------------------------
    // Token-cursor utilities
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// The source position just past the most recently consumed token.
    fn current_pos(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> Option<Token> {
        if &self.peek().kind == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Option<Token> {
        if self.peek().is_keyword(keyword) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(Error::with_span(ErrorKind::UnknownSql, tok.span)
                .with_context(format!("expected `{}`, found `{}`", kind, tok.kind)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token> {
        if self.peek().is_keyword(keyword) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(Error::with_span(ErrorKind::UnknownSql, tok.span).with_context(format!(
                "expected `{}`, found `{}`",
                keyword.as_str(),
                tok.kind
            )))
        }
    }

    /// Parse a table-or-column identifier: `Source` or `Qualifier Source`.
    fn parse_identifier(&mut self) -> Result<Identifier> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Qualifier(q) => {
                let next = self.advance();
                match next.kind {
                    TokenKind::Source(s) => Ok(Identifier::qualified(q, s)),
                    _ => Err(Error::with_span(ErrorKind::InvalidJoinIdentity, next.span)),
                }
            }
            TokenKind::Source(s) => Ok(Identifier::unqualified(s)),
            _ => Err(Error::with_span(ErrorKind::InvalidJoinIdentity, tok.span)),
        }
    }

    fn expect_string_lit(&mut self) -> Result<String> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::StringLit(s) => Ok(s),
            _ => Err(Error::with_span(ErrorKind::UnknownSql, tok.span)
                .with_context("expected a string literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let mut p = Parser::new("").unwrap();
        assert!(p.parse().unwrap().is_empty());
    }

    #[test]
    fn test_semicolons_only() {
        let mut p = Parser::new(";;;").unwrap();
        assert!(p.parse().unwrap().is_empty());
    }

    #[test]
    fn test_multiple_statements() {
        let mut p = Parser::new("SELECT a FROM t; SELECT b FROM u;").unwrap();
        assert_eq!(p.parse().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_sql() {
        let mut p = Parser::new("BOGUS 1").unwrap();
        let err = p.parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownSql);
    }
}
