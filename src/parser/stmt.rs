//! `SELECT` / `CREATE TABLE` / `USE` grammars.

use super::Parser;
use crate::ast::{
    CreateTableStatement, Direction, Join, JoinKind, OrderItem, SelectExpr, SelectItem,
    SelectStatement, TableRef, UseStatement,
};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::lexer::{Keyword, TokenKind};

impl Parser {
    pub(super) fn parse_select(&mut self) -> Result<SelectStatement> {
        let start = self.peek().span.start;
        self.expect_keyword(Keyword::Select)?;
        let distinct = self.consume_keyword(Keyword::Distinct).is_some();

        let columns = self.parse_select_list()?;

        let from = if self.consume_keyword(Keyword::From).is_some() {
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        let mut joins = Vec::new();
        while let Some(kind) = self.peek_join_kind() {
            joins.push(self.parse_join(kind)?);
        }

        let where_clause = if self.consume_keyword(Keyword::Where).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let group_by = if matches!(self.peek().kind, TokenKind::GroupBy) {
            self.advance();
            self.parse_identifier_list()?
        } else {
            Vec::new()
        };

        let order_by = if matches!(self.peek().kind, TokenKind::OrderBy) {
            self.advance();
            self.parse_order_list()?
        } else {
            Vec::new()
        };

        let (limit_start, limit_length) = self.parse_limit_clause()?;

        let end = self.current_pos();
        Ok(SelectStatement {
            distinct,
            columns,
            from,
            joins,
            where_clause,
            group_by,
            order_by,
            limit_start,
            limit_length,
            span: Span::new(start, end),
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = vec![self.parse_select_item()?];
        while self.consume(&TokenKind::Comma).is_some() {
            items.push(self.parse_select_item()?);
        }
        Ok(items)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let start = self.peek().span.start;
        let expr = match &self.peek().kind {
            TokenKind::Null => {
                self.advance();
                SelectExpr::Literal(crate::ast::Literal::Null)
            }
            TokenKind::StringLit(_)
            | TokenKind::Numeric(_)
            | TokenKind::Real(_)
            | TokenKind::Hex(_)
            | TokenKind::Binary(_) => {
                let tok = self.advance();
                SelectExpr::Literal(match tok.kind {
                    TokenKind::StringLit(s) => crate::ast::Literal::Str(s),
                    TokenKind::Numeric(n) => crate::ast::Literal::Int(n),
                    TokenKind::Real(n) => crate::ast::Literal::Real(n),
                    TokenKind::Hex(n) => crate::ast::Literal::Hex(n),
                    TokenKind::Binary(n) => crate::ast::Literal::Binary(n),
                    _ => unreachable!(),
                })
            }
            TokenKind::Qualifier(_) | TokenKind::Source(_) => {
                SelectExpr::Identifier(self.parse_identifier()?)
            }
            _ => {
                let tok = self.peek().clone();
                return Err(Error::with_span(ErrorKind::MissingColumns, tok.span)
                    .with_context(format!("expected a select expression, found `{}`", tok.kind)));
            }
        };

        // Only an explicit `AS alias` is recognized here; the lexer's own
        // fixup pass only ever produces an `Alias` token when it actually
        // consumed a preceding `AS`, so a stray `AS` that wasn't fused means
        // whatever followed it wasn't a bare identifier.
        let alias = match &self.peek().kind {
            TokenKind::Alias(_) => {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Alias(a) => Some(a),
                    _ => unreachable!(),
                }
            }
            _ => {
                if self.peek().is_keyword(Keyword::As) {
                    let tok = self.advance();
                    return Err(Error::with_span(ErrorKind::InvalidSelectExprAlias, tok.span));
                }
                None
            }
        };

        let end = self.current_pos();
        Ok(SelectItem {
            expr,
            alias,
            span: Span::new(start, end),
        })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let start = self.peek().span.start;
        let identifier = self.parse_identifier()?;
        let alias = self.parse_table_alias()?;
        let end = self.current_pos();
        Ok(TableRef {
            identifier,
            alias,
            span: Span::new(start, end),
        })
    }

    /// Table/join aliases accept either `AS alias` or a bare trailing
    /// identifier (no `AS` required) — unlike select-item aliases.
    fn parse_table_alias(&mut self) -> Result<Option<String>> {
        match &self.peek().kind {
            TokenKind::Alias(_) => {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Alias(a) => Ok(Some(a)),
                    _ => unreachable!(),
                }
            }
            TokenKind::Source(_) => {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Source(s) => Ok(Some(s)),
                    _ => unreachable!(),
                }
            }
            _ => {
                if self.peek().is_keyword(Keyword::As) {
                    let tok = self.advance();
                    return Err(Error::with_span(ErrorKind::InvalidJoinAlias, tok.span));
                }
                Ok(None)
            }
        }
    }

    fn peek_join_kind(&self) -> Option<JoinKind> {
        match &self.peek().kind {
            TokenKind::InnerJoin => Some(JoinKind::Inner),
            TokenKind::LeftJoin => Some(JoinKind::Left),
            TokenKind::RightJoin => Some(JoinKind::Right),
            TokenKind::FullOuterJoin => Some(JoinKind::FullOuter),
            TokenKind::Keyword(Keyword::Join) => Some(JoinKind::Inner),
            _ => None,
        }
    }

    fn parse_join(&mut self, kind: JoinKind) -> Result<Join> {
        let start = self.peek().span.start;
        self.advance();

        let identifier = self.parse_identifier()?;
        let alias = self.parse_table_alias()?;

        let on = if self.consume_keyword(Keyword::On).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let end = self.current_pos();
        Ok(Join {
            kind,
            identifier,
            alias,
            on,
            span: Span::new(start, end),
        })
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<crate::ast::Identifier>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&TokenKind::Comma).is_some() {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    fn parse_order_list(&mut self) -> Result<Vec<OrderItem>> {
        let mut items = vec![self.parse_order_item()?];
        while self.consume(&TokenKind::Comma).is_some() {
            items.push(self.parse_order_item()?);
        }
        Ok(items)
    }

    fn parse_order_item(&mut self) -> Result<OrderItem> {
        let identifier = self.parse_identifier()?;
        let direction = if self.consume_keyword(Keyword::Desc).is_some() {
            Direction::Desc
        } else {
            self.consume_keyword(Keyword::Asc);
            Direction::Asc
        };
        Ok(OrderItem {
            identifier,
            direction,
        })
    }

    /// `LIMIT_START`/`LIMIT_LENGTH` are produced by the lexer's own fixup of
    /// `LIMIT n[,m]`; negative values are left to the validator to reject
    /// unconditionally.
    fn parse_limit_clause(&mut self) -> Result<(Option<i64>, Option<i64>)> {
        let mut start = None;
        let mut length = None;
        if let TokenKind::LimitStart(n) = self.peek().kind {
            self.advance();
            start = Some(n);
        }
        if let TokenKind::LimitLength(n) = self.peek().kind {
            self.advance();
            length = Some(n);
        }
        Ok((start, length))
    }

    pub(super) fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        let start = self.peek().span.start;
        self.expect(&TokenKind::CreateTable)?;

        let identifier = self.parse_identifier()?;

        self.expect(&TokenKind::LParen)?;
        let mut columns = vec![self.parse_column_literal()?];
        while self.consume(&TokenKind::Comma).is_some() {
            columns.push(self.parse_column_literal()?);
        }
        self.expect(&TokenKind::RParen)?;

        self.expect_keyword(Keyword::File)?;
        let file_path = self.expect_string_lit()?;

        let column_delimiter = if self.consume_keyword(Keyword::Column).is_some() {
            let s = self.expect_string_lit()?;
            let mut chars = s.chars();
            let c = chars.next().ok_or_else(|| {
                Error::with_span(ErrorKind::UnknownSql, self.peek().span)
                    .with_context("COLUMN delimiter must be a single character")
            })?;
            if chars.next().is_some() {
                return Err(Error::with_span(ErrorKind::UnknownSql, self.peek().span)
                    .with_context("COLUMN delimiter must be a single character"));
            }
            Some(c)
        } else {
            None
        };

        let strict = if self.consume_keyword(Keyword::Strict).is_some() {
            if self.consume_keyword(Keyword::True).is_some() {
                Some(true)
            } else if self.consume_keyword(Keyword::False).is_some() {
                Some(false)
            } else {
                let tok = self.peek().clone();
                return Err(Error::with_span(ErrorKind::UnknownSql, tok.span)
                    .with_context("STRICT expects TRUE or FALSE"));
            }
        } else {
            None
        };

        let end = self.current_pos();
        Ok(CreateTableStatement {
            identifier,
            columns,
            file_path,
            column_delimiter,
            strict,
            span: Span::new(start, end),
        })
    }

    fn parse_column_literal(&mut self) -> Result<String> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::StringLit(s) => Ok(s),
            _ => Err(Error::with_span(ErrorKind::InvalidColumnName, tok.span)
                .with_context(format!("expected a column name string, found `{}`", tok.kind))),
        }
    }

    pub(super) fn parse_use(&mut self) -> Result<UseStatement> {
        let start = self.peek().span.start;
        self.expect_keyword(Keyword::Use)?;
        let tok = self.advance();
        let database = match tok.kind {
            TokenKind::Source(s) => s,
            TokenKind::Alpha(s) => s,
            _ => {
                return Err(Error::with_span(ErrorKind::InvalidDatabase, tok.span)
                    .with_context(format!("expected a database name, found `{}`", tok.kind)))
            }
        };
        let end = self.current_pos();
        Ok(UseStatement {
            database,
            span: Span::new(start, end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    #[test]
    fn test_simple_select() {
        let mut p = Parser::new("SELECT a, b FROM t;").unwrap();
        let stmts = p.parse().unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Statement::Select(s) => {
                assert_eq!(s.columns.len(), 2);
                assert!(s.from.is_some());
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_select_with_alias() {
        let mut p = Parser::new("SELECT a AS x FROM t;").unwrap();
        let stmts = p.parse().unwrap();
        match &stmts[0] {
            Statement::Select(s) => assert_eq!(s.columns[0].alias.as_deref(), Some("x")),
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_select_stray_as_errors() {
        let mut p = Parser::new("SELECT a AS 1 FROM t;").unwrap();
        let err = p.parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSelectExprAlias);
    }

    #[test]
    fn test_join_with_implicit_alias() {
        let mut p = Parser::new("SELECT a FROM t LEFT JOIN u v ON t.id = v.id;").unwrap();
        let stmts = p.parse().unwrap();
        match &stmts[0] {
            Statement::Select(s) => {
                assert_eq!(s.joins.len(), 1);
                assert_eq!(s.joins[0].kind, JoinKind::Left);
                assert_eq!(s.joins[0].alias.as_deref(), Some("v"));
                assert!(s.joins[0].on.is_some());
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_full_outer_join() {
        let mut p = Parser::new("SELECT a FROM t FULL OUTER JOIN u ON t.id = u.id;").unwrap();
        let stmts = p.parse().unwrap();
        match &stmts[0] {
            Statement::Select(s) => assert_eq!(s.joins[0].kind, JoinKind::FullOuter),
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_group_by_order_by_limit() {
        let mut p =
            Parser::new("SELECT a FROM t GROUP BY a ORDER BY a DESC LIMIT 5,10;").unwrap();
        let stmts = p.parse().unwrap();
        match &stmts[0] {
            Statement::Select(s) => {
                assert_eq!(s.group_by.len(), 1);
                assert_eq!(s.order_by[0].direction, Direction::Desc);
                assert_eq!(s.limit_start, Some(5));
                assert_eq!(s.limit_length, Some(10));
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_create_table_full() {
        let mut p = Parser::new(
            "CREATE TABLE t (\"a\", \"b\") FILE \"data.csv\" COLUMN \",\" STRICT TRUE;",
        )
        .unwrap();
        let stmts = p.parse().unwrap();
        match &stmts[0] {
            Statement::CreateTable(c) => {
                assert_eq!(c.columns, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(c.file_path, "data.csv");
                assert_eq!(c.column_delimiter, Some(','));
                assert_eq!(c.strict, Some(true));
            }
            _ => panic!("expected create table"),
        }
    }

    #[test]
    fn test_create_table_invalid_column_name() {
        let mut p = Parser::new("CREATE TABLE t (1) FILE \"d.csv\";").unwrap();
        let err = p.parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidColumnName);
    }

    #[test]
    fn test_use_statement() {
        let mut p = Parser::new("USE mydb;").unwrap();
        let stmts = p.parse().unwrap();
        match &stmts[0] {
            Statement::Use(u) => assert_eq!(u.database, "mydb"),
            _ => panic!("expected use"),
        }
    }
}
