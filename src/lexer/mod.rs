//! Lexer: raw SQL text to a fused token stream.
//!
//! Scanning happens in one upfront pass over the whole script (mirroring the
//! source's single lex-then-consolidate shape), followed by the multi-token
//! fusion and fixup passes described in the component design.

mod token;

pub use token::{Keyword, Token, TokenKind};

use crate::error::{Error, ErrorKind, Result, Span};

/// Scans a complete SQL script into a fully-fused token stream.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
        }
    }

    /// Scan, fuse, and fix up the whole input, returning the final token
    /// stream (terminated by a single `Eof` token).
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = self.scan_all()?;
        log::trace!("lexer: raw scan produced {} tokens", tokens.len());
        fuse_multi_token(&mut tokens);
        fixup_as_alias(&mut tokens);
        fixup_qualifier_source(&mut tokens);
        fixup_limit(&mut tokens);
        fixup_equals_deletion(&mut tokens);
        fixup_semicolon_collapse(&mut tokens);
        let eof_pos = self.bytes.len();
        tokens.push(Token::new(TokenKind::Eof, Span::point(eof_pos)));
        log::trace!("lexer: {} tokens after fusion", tokens.len());
        Ok(tokens)
    }

    fn scan_all(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut pos = 0usize;
        let len = self.bytes.len();

        while pos < len {
            let c = self.bytes[pos];

            if c <= b' ' {
                pos += 1;
                continue;
            }

            // Three- and two-character operators, checked before single-char.
            if let Some((kind, width)) = match_multi_char_op(&self.bytes[pos..]) {
                match kind {
                    MultiOp::LineComment => {
                        let start = pos;
                        pos += width;
                        loop {
                            if pos >= len {
                                return Err(Error::with_span(
                                    ErrorKind::UnterminatedLineComment,
                                    Span::new(start, pos),
                                ));
                            }
                            if self.bytes[pos] == b'\n' {
                                pos += 1;
                                break;
                            }
                            pos += 1;
                        }
                        continue;
                    }
                    MultiOp::BlockComment => {
                        let start = pos;
                        pos += width;
                        let mut closed = false;
                        while pos + 1 < len {
                            if self.bytes[pos] == b'*' && self.bytes[pos + 1] == b'/' {
                                pos += 2;
                                closed = true;
                                break;
                            }
                            pos += 1;
                        }
                        if !closed {
                            return Err(Error::with_span(
                                ErrorKind::UnterminatedBlockComment,
                                Span::new(start, len),
                            ));
                        }
                        continue;
                    }
                    MultiOp::Token(tk) => {
                        tokens.push(Token::new(tk, Span::new(pos, pos + width)));
                        pos += width;
                        continue;
                    }
                }
            }

            if c == b'\'' || c == b'"' {
                let start = pos;
                let quote = c;
                pos += 1;
                let content_start = pos;
                loop {
                    if pos >= len {
                        return Err(Error::with_span(
                            ErrorKind::UnterminatedString,
                            Span::new(start, len),
                        ));
                    }
                    if self.bytes[pos] == quote {
                        break;
                    }
                    pos += 1;
                }
                let text = self.input[content_start..pos].to_string();
                pos += 1; // closing quote
                tokens.push(Token::new(TokenKind::StringLit(text), Span::new(start, pos)));
                continue;
            }

            if c.is_ascii_digit() {
                let (tok, next) = self.scan_number(pos)?;
                tokens.push(tok);
                pos = next;
                continue;
            }

            if c.is_ascii_alphabetic() {
                let start = pos;
                pos += 1;
                while pos < len
                    && (self.bytes[pos].is_ascii_alphanumeric() || self.bytes[pos] == b'_')
                {
                    pos += 1;
                }
                let word = &self.input[start..pos];
                let span = Span::new(start, pos);
                let tok_kind = match Keyword::lookup(word) {
                    Some(Keyword::Null) => TokenKind::Null,
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Alpha(word.to_string()),
                };
                tokens.push(Token::new(tok_kind, span));
                continue;
            }

            if let Some(kind) = match_single_char_op(c) {
                tokens.push(Token::new(kind, Span::new(pos, pos + 1)));
                pos += 1;
                continue;
            }

            return Err(Error::with_span(
                ErrorKind::UnknownCharacter,
                Span::new(pos, pos + 1),
            ));
        }

        Ok(tokens)
    }

    fn scan_number(&self, start: usize) -> Result<(Token, usize)> {
        let bytes = self.bytes;
        let len = bytes.len();

        if start + 1 < len && bytes[start] == b'0' && (bytes[start + 1] | 0x20) == b'x' {
            let digits_start = start + 2;
            let mut pos = digits_start;
            while pos < len && bytes[pos].is_ascii_alphanumeric() {
                pos += 1;
            }
            let run = &self.input[digits_start..pos];
            if run.is_empty() || !run.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::with_span(
                    ErrorKind::MalformedHexToken,
                    Span::new(start, pos),
                ));
            }
            let value = i64::from_str_radix(run, 16).unwrap_or(i64::MAX);
            return Ok((
                Token::new(TokenKind::Hex(value), Span::new(start, pos)),
                pos,
            ));
        }

        if start + 1 < len && bytes[start] == b'0' && (bytes[start + 1] | 0x20) == b'b' {
            let digits_start = start + 2;
            let mut pos = digits_start;
            while pos < len && bytes[pos].is_ascii_alphanumeric() {
                pos += 1;
            }
            let run = &self.input[digits_start..pos];
            if run.is_empty() || !run.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(Error::with_span(
                    ErrorKind::MalformedBinaryToken,
                    Span::new(start, pos),
                ));
            }
            let value = i64::from_str_radix(run, 2).unwrap_or(i64::MAX);
            return Ok((
                Token::new(TokenKind::Binary(value), Span::new(start, pos)),
                pos,
            ));
        }

        let mut pos = start;
        while pos < len && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let text = &self.input[start..pos];
        let value: i64 = text.parse().unwrap_or(i64::MAX);
        Ok((
            Token::new(TokenKind::Numeric(value), Span::new(start, pos)),
            pos,
        ))
    }
}

enum MultiOp {
    Token(TokenKind),
    LineComment,
    BlockComment,
}

fn match_multi_char_op(rest: &[u8]) -> Option<(MultiOp, usize)> {
    if rest.len() >= 3 && &rest[0..3] == b"<=>" {
        return Some((MultiOp::Token(TokenKind::NullSafeEq), 3));
    }
    if rest.len() >= 2 {
        let two = &rest[0..2];
        let kind = match two {
            b"<<" => Some(TokenKind::ShiftLeft),
            b">>" => Some(TokenKind::ShiftRight),
            b"||" => Some(TokenKind::PipePipe),
            b"&&" => Some(TokenKind::AmpAmp),
            b"<=" => Some(TokenKind::LtEq),
            b">=" => Some(TokenKind::GtEq),
            b"!=" => Some(TokenKind::NotEq),
            b"<>" => Some(TokenKind::NotEq),
            _ => None,
        };
        if let Some(kind) = kind {
            return Some((MultiOp::Token(kind), 2));
        }
        if two == b"--" {
            return Some((MultiOp::LineComment, 2));
        }
        if two == b"/*" {
            return Some((MultiOp::BlockComment, 2));
        }
    }
    None
}

fn match_single_char_op(c: u8) -> Option<TokenKind> {
    Some(match c {
        b'<' => TokenKind::Lt,
        b'>' => TokenKind::Gt,
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'/' => TokenKind::Slash,
        b'*' => TokenKind::Star,
        b'%' => TokenKind::Percent,
        b'=' => TokenKind::Eq,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b',' => TokenKind::Comma,
        b'.' => TokenKind::Dot,
        b';' => TokenKind::Semicolon,
        b'|' => TokenKind::Pipe,
        b'&' => TokenKind::Amp,
        _ => return None,
    })
}

/// Replace fixed three- and two-token windows with a single synthetic token.
fn fuse_multi_token(tokens: &mut Vec<Token>) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Some(span) = kw3(tokens, i, Keyword::Full, Keyword::Outer, Keyword::Join) {
            out.push(Token::new(TokenKind::FullOuterJoin, span));
            i += 3;
            continue;
        }
        if tokens[i].is_keyword(Keyword::Is)
            && i + 2 < tokens.len()
            && tokens[i + 1].is_keyword(Keyword::Not)
            && matches!(tokens[i + 2].kind, TokenKind::Null)
        {
            let span = tokens[i].span.merge(tokens[i + 2].span);
            out.push(Token::new(TokenKind::IsNotNull, span));
            i += 3;
            continue;
        }
        if let (TokenKind::Numeric(a), TokenKind::Dot, TokenKind::Numeric(b)) = peek3(tokens, i) {
            if i + 2 < tokens.len() {
                let text = format!("{}.{}", a, b);
                let value: f64 = text.parse().unwrap_or(0.0);
                let span = tokens[i].span.merge(tokens[i + 2].span);
                out.push(Token::new(TokenKind::Real(value), span));
                i += 3;
                continue;
            }
        }
        if tokens[i].is_keyword(Keyword::Is)
            && i + 1 < tokens.len()
            && matches!(tokens[i + 1].kind, TokenKind::Null)
        {
            let span = tokens[i].span.merge(tokens[i + 1].span);
            out.push(Token::new(TokenKind::IsNull, span));
            i += 2;
            continue;
        }
        if tokens[i].is_keyword(Keyword::Not)
            && i + 1 < tokens.len()
            && tokens[i + 1].is_keyword(Keyword::In)
        {
            let span = tokens[i].span.merge(tokens[i + 1].span);
            out.push(Token::new(TokenKind::NotIn, span));
            i += 2;
            continue;
        }
        if let Some(span) = kw2(tokens, i, Keyword::Left, Keyword::Join) {
            out.push(Token::new(TokenKind::LeftJoin, span));
            i += 2;
            continue;
        }
        if let Some(span) = kw2(tokens, i, Keyword::Right, Keyword::Join) {
            out.push(Token::new(TokenKind::RightJoin, span));
            i += 2;
            continue;
        }
        if let Some(span) = kw2(tokens, i, Keyword::Inner, Keyword::Join) {
            out.push(Token::new(TokenKind::InnerJoin, span));
            i += 2;
            continue;
        }
        if let Some(span) = kw2(tokens, i, Keyword::Group, Keyword::By) {
            out.push(Token::new(TokenKind::GroupBy, span));
            i += 2;
            continue;
        }
        if let Some(span) = kw2(tokens, i, Keyword::Order, Keyword::By) {
            out.push(Token::new(TokenKind::OrderBy, span));
            i += 2;
            continue;
        }
        if let Some(span) = kw2(tokens, i, Keyword::Create, Keyword::Table) {
            out.push(Token::new(TokenKind::CreateTable, span));
            i += 2;
            continue;
        }
        if matches!(tokens[i].kind, TokenKind::Dot)
            && i + 1 < tokens.len()
            && matches!(tokens[i + 1].kind, TokenKind::Numeric(_))
        {
            if let TokenKind::Numeric(b) = tokens[i + 1].kind {
                let text = format!("0.{}", b);
                let value: f64 = text.parse().unwrap_or(0.0);
                let span = tokens[i].span.merge(tokens[i + 1].span);
                out.push(Token::new(TokenKind::Real(value), span));
                i += 2;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    *tokens = out;
}

fn kw2(tokens: &[Token], i: usize, a: Keyword, b: Keyword) -> Option<Span> {
    if i + 1 < tokens.len() && tokens[i].is_keyword(a) && tokens[i + 1].is_keyword(b) {
        Some(tokens[i].span.merge(tokens[i + 1].span))
    } else {
        None
    }
}

fn kw3(tokens: &[Token], i: usize, a: Keyword, b: Keyword, c: Keyword) -> Option<Span> {
    if i + 2 < tokens.len()
        && tokens[i].is_keyword(a)
        && tokens[i + 1].is_keyword(b)
        && tokens[i + 2].is_keyword(c)
    {
        Some(tokens[i].span.merge(tokens[i + 2].span))
    } else {
        None
    }
}

fn peek3(tokens: &[Token], i: usize) -> (TokenKind, TokenKind, TokenKind) {
    let a = tokens.get(i).map(|t| t.kind.clone()).unwrap_or(TokenKind::Eof);
    let b = tokens
        .get(i + 1)
        .map(|t| t.kind.clone())
        .unwrap_or(TokenKind::Eof);
    let c = tokens
        .get(i + 2)
        .map(|t| t.kind.clone())
        .unwrap_or(TokenKind::Eof);
    (a, b, c)
}

/// `AS` is consumed; the following alpha token is retagged `Alias`.
fn fixup_as_alias(tokens: &mut Vec<Token>) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_keyword(Keyword::As) && i + 1 < tokens.len() {
            if let TokenKind::Alpha(name) = &tokens[i + 1].kind {
                let span = tokens[i + 1].span;
                out.push(Token::new(TokenKind::Alias(name.clone()), span));
                i += 2;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    *tokens = out;
}

/// `Alpha . Alpha` becomes `Qualifier` + `Source` (the dot is deleted);
/// a standalone `Alpha` becomes `Source`.
fn fixup_qualifier_source(tokens: &mut Vec<Token>) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let TokenKind::Alpha(a) = &tokens[i].kind {
            if i + 2 < tokens.len()
                && matches!(tokens[i + 1].kind, TokenKind::Dot)
                && matches!(tokens[i + 2].kind, TokenKind::Alpha(_))
            {
                let qualifier_span = tokens[i].span;
                let source_span = tokens[i + 2].span;
                let b = if let TokenKind::Alpha(b) = &tokens[i + 2].kind {
                    b.clone()
                } else {
                    unreachable!()
                };
                out.push(Token::new(TokenKind::Qualifier(a.clone()), qualifier_span));
                out.push(Token::new(TokenKind::Source(b), source_span));
                i += 3;
                continue;
            } else {
                let span = tokens[i].span;
                out.push(Token::new(TokenKind::Source(a.clone()), span));
                i += 1;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    *tokens = out;
}

/// `LIMIT n[, m]` becomes `LimitStart n` + `LimitLength m`, or a lone
/// `LimitLength n` when only one argument is given.
fn fixup_limit(tokens: &mut Vec<Token>) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_keyword(Keyword::Limit) && i + 1 < tokens.len() {
            if let TokenKind::Numeric(first) = tokens[i + 1].kind {
                if i + 3 < tokens.len()
                    && matches!(tokens[i + 2].kind, TokenKind::Comma)
                    && matches!(tokens[i + 3].kind, TokenKind::Numeric(_))
                {
                    if let TokenKind::Numeric(second) = tokens[i + 3].kind {
                        let span1 = tokens[i].span.merge(tokens[i + 1].span);
                        let span2 = tokens[i + 2].span.merge(tokens[i + 3].span);
                        out.push(Token::new(TokenKind::LimitStart(first), span1));
                        out.push(Token::new(TokenKind::LimitLength(second), span2));
                        i += 4;
                        continue;
                    }
                }
                let span = tokens[i].span.merge(tokens[i + 1].span);
                out.push(Token::new(TokenKind::LimitLength(first), span));
                i += 2;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    *tokens = out;
}

/// `FILE =`, `COLUMN =`, `STRICT =` delete the `=` sign.
fn fixup_equals_deletion(tokens: &mut Vec<Token>) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let is_trigger = tokens[i].is_keyword(Keyword::File)
            || tokens[i].is_keyword(Keyword::Column)
            || tokens[i].is_keyword(Keyword::Strict);
        out.push(tokens[i].clone());
        if is_trigger && i + 1 < tokens.len() && matches!(tokens[i + 1].kind, TokenKind::Eq) {
            i += 2;
            continue;
        }
        i += 1;
    }
    *tokens = out;
}

/// Runs of `;` collapse to a single `;`.
fn fixup_semicolon_collapse(tokens: &mut Vec<Token>) {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens.drain(..) {
        if matches!(tok.kind, TokenKind::Semicolon) {
            if let Some(last) = out.last() {
                if matches!(last.kind, TokenKind::Semicolon) {
                    continue;
                }
            }
        }
        out.push(tok);
    }
    *tokens = out;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(sql);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_basic_select() {
        let ks = kinds("SELECT a FROM t;");
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Source("a".into()),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Source("t".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_qualifier_source_fixup() {
        let ks = kinds("SELECT this.a;");
        assert_eq!(ks[1], TokenKind::Qualifier("this".into()));
        assert_eq!(ks[2], TokenKind::Source("a".into()));
    }

    #[test]
    fn test_alias_fixup() {
        let ks = kinds("SELECT a AS b;");
        assert!(ks.contains(&TokenKind::Alias("b".into())));
    }

    #[test]
    fn test_full_outer_join_fusion() {
        let ks = kinds("SELECT a FROM t FULL OUTER JOIN u ON t.a=u.a;");
        assert!(ks.contains(&TokenKind::FullOuterJoin));
    }

    #[test]
    fn test_is_not_null_fusion() {
        let ks = kinds("SELECT a FROM t WHERE a IS NOT NULL;");
        assert!(ks.contains(&TokenKind::IsNotNull));
    }

    #[test]
    fn test_limit_two_args() {
        let ks = kinds("SELECT a FROM t LIMIT 2, 5;");
        assert!(ks.contains(&TokenKind::LimitStart(2)));
        assert!(ks.contains(&TokenKind::LimitLength(5)));
    }

    #[test]
    fn test_limit_one_arg() {
        let ks = kinds("SELECT a FROM t LIMIT 5;");
        assert!(ks.contains(&TokenKind::LimitLength(5)));
        assert!(!ks.iter().any(|k| matches!(k, TokenKind::LimitStart(_))));
    }

    #[test]
    fn test_file_equals_deletion() {
        let ks = kinds("CREATE TABLE t ('a') FILE = '/tmp/t.csv';");
        // no bare Eq token should remain after FILE
        let file_idx = ks.iter().position(|k| k.to_string() == "FILE").unwrap();
        assert!(!matches!(ks[file_idx + 1], TokenKind::Eq));
    }

    #[test]
    fn test_semicolon_collapse() {
        let ks = kinds(";;; SELECT 1;;");
        let semis = ks.iter().filter(|k| matches!(k, TokenKind::Semicolon)).count();
        assert_eq!(semis, 2);
    }

    #[test]
    fn test_real_fusion() {
        let ks = kinds("SELECT 3.14;");
        assert!(ks.contains(&TokenKind::Real(3.14)));
    }

    #[test]
    fn test_malformed_hex() {
        let mut lexer = Lexer::new("SELECT 0xZZ;");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedHexToken);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("SELECT 'abc;");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new("/* open");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedBlockComment);
    }

    #[test]
    fn test_hex_and_binary_literals() {
        let ks = kinds("SELECT 0x1A, 0b101;");
        assert!(ks.contains(&TokenKind::Hex(26)));
        assert!(ks.contains(&TokenKind::Binary(5)));
    }
}
