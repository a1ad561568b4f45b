//! Expression grammar: `expression ⊃ boolean_primary ⊃ predicate ⊃ bit_expr ⊃ simple_expr`.
//!
//! Each level is its own method; the call chain is the precedence table.

use super::Parser;
use crate::ast::{ArithOp, CmpOp, Expr, Literal, LogicalOp, UnaryOp};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::lexer::{Keyword, TokenKind};

impl Parser {
    /// `[NOT] boolean_primary ( (AND|OR|&&|\|\|) boolean_primary )*`
    pub(super) fn parse_expression(&mut self) -> Result<Expr> {
        let start = self.peek().span.start;
        let negate_first = self.consume_keyword(Keyword::Not).is_some();

        let mut lhs = self.parse_boolean_primary()?;
        if negate_first {
            let span = Span::new(start, lhs.span().end);
            lhs = Expr::Not(Box::new(lhs), span);
        }

        loop {
            let op = match &self.peek().kind {
                TokenKind::Keyword(Keyword::And) | TokenKind::AmpAmp => LogicalOp::And,
                TokenKind::Keyword(Keyword::Or) | TokenKind::PipePipe => LogicalOp::Or,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_boolean_primary()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Logical {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }

        Ok(lhs)
    }

    /// `predicate [ comparison_op predicate | IS_NULL | IS_NOT_NULL ]`
    fn parse_boolean_primary(&mut self) -> Result<Expr> {
        let lhs = self.parse_predicate()?;

        match &self.peek().kind {
            TokenKind::IsNull => {
                let tok = self.advance();
                let span = lhs.span().merge(tok.span);
                Ok(Expr::IsNull {
                    expr: Box::new(lhs),
                    negated: false,
                    span,
                })
            }
            TokenKind::IsNotNull => {
                let tok = self.advance();
                let span = lhs.span().merge(tok.span);
                Ok(Expr::IsNull {
                    expr: Box::new(lhs),
                    negated: true,
                    span,
                })
            }
            _ => {
                if let Some(op) = comparison_op(&self.peek().kind) {
                    self.advance();
                    let rhs = self.parse_predicate()?;
                    let span = lhs.span().merge(rhs.span());
                    Ok(Expr::Comparison {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    })
                } else {
                    Ok(lhs)
                }
            }
        }
    }

    /// `bit_expr` — IN/NOT IN lists are a reserved, disabled extension.
    fn parse_predicate(&mut self) -> Result<Expr> {
        self.parse_bit_expr()
    }

    /// `simple_expr ( (+|-|*|/|%|<<|>>|\||&) simple_expr )*`
    fn parse_bit_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_simple_expr()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                TokenKind::Percent => ArithOp::Mod,
                TokenKind::ShiftLeft => ArithOp::ShiftLeft,
                TokenKind::ShiftRight => ArithOp::ShiftRight,
                TokenKind::Pipe => ArithOp::BitOr,
                TokenKind::Amp => ArithOp::BitAnd,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_simple_expr()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    /// `[ +|- ] ( literal | identifier )`
    ///
    /// Whether the unary sign is actually legal (numeric operand only) is a
    /// property of the evaluated value, not the syntax — an identifier
    /// might resolve to a number or a string depending on the row — so the
    /// check happens in the evaluator, not here.
    fn parse_simple_expr(&mut self) -> Result<Expr> {
        let start = self.peek().span.start;
        let unary = match &self.peek().kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if unary.is_some() {
            self.advance();
        }

        let primary = self.parse_primary_expr()?;

        Ok(match unary {
            Some(op) => {
                let span = Span::new(start, primary.span().end);
                Expr::Unary {
                    op,
                    expr: Box::new(primary),
                    span,
                }
            }
            None => primary,
        })
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        let start = self.peek().span.start;
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null, tok.span))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s), tok.span))
            }
            TokenKind::Numeric(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Int(n), tok.span))
            }
            TokenKind::Real(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Real(n), tok.span))
            }
            TokenKind::Hex(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Hex(n), tok.span))
            }
            TokenKind::Binary(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Binary(n), tok.span))
            }
            TokenKind::Qualifier(_) | TokenKind::Source(_) => {
                let id = self.parse_identifier()?;
                let end = self.current_pos();
                Ok(Expr::Identifier(id, Span::new(start, end)))
            }
            _ => Err(Error::with_span(ErrorKind::ExpressionMalformed, tok.span)
                .with_context(format!("unexpected token `{}` in expression", tok.kind))),
        }
    }
}

fn comparison_op(kind: &TokenKind) -> Option<CmpOp> {
    Some(match kind {
        TokenKind::Eq => CmpOp::Eq,
        TokenKind::NotEq => CmpOp::NotEq,
        TokenKind::Lt => CmpOp::Lt,
        TokenKind::LtEq => CmpOp::LtEq,
        TokenKind::Gt => CmpOp::Gt,
        TokenKind::GtEq => CmpOp::GtEq,
        TokenKind::NullSafeEq => CmpOp::NullSafeEq,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(sql: &str) -> Expr {
        let full = format!("SELECT 1 FROM t WHERE {};", sql);
        let mut p = Parser::new(&full).unwrap();
        let stmts = p.parse().unwrap();
        match stmts.into_iter().next().unwrap() {
            crate::ast::Statement::Select(s) => s.where_clause.unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_arithmetic_precedence_over_comparison() {
        let e = parse_expr("a + 1 = 2");
        match e {
            Expr::Comparison { op, lhs, .. } => {
                assert_eq!(op, CmpOp::Eq);
                assert!(matches!(*lhs, Expr::Arithmetic { .. }));
            }
            _ => panic!("expected comparison"),
        }
    }

    #[test]
    fn test_and_or_left_to_right() {
        let e = parse_expr("a = 1 AND b = 2 OR c = 3");
        // (a=1 AND b=2) OR c=3, left-associative fold
        match e {
            Expr::Logical { op: LogicalOp::Or, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Logical { op: LogicalOp::And, .. }));
            }
            _ => panic!("expected top-level OR"),
        }
    }

    #[test]
    fn test_is_not_null() {
        let e = parse_expr("a IS NOT NULL");
        assert!(matches!(e, Expr::IsNull { negated: true, .. }));
    }

    #[test]
    fn test_leading_not() {
        let e = parse_expr("NOT a = 1");
        assert!(matches!(e, Expr::Not(..)));
    }

    #[test]
    fn test_unary_minus_on_identifier_parses() {
        let e = parse_expr("-a = 1");
        match e {
            Expr::Comparison { lhs, .. } => assert!(matches!(*lhs, Expr::Unary { .. })),
            _ => panic!("expected comparison"),
        }
    }
}
