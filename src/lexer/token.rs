//! Token kinds produced by the lexer, before and after fusion.

use crate::error::Span;
use std::fmt;

/// Reserved words recognized during the alpha-run keyword lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    Distinct,
    From,
    Where,
    Group,
    Order,
    By,
    Limit,
    Join,
    Left,
    Right,
    Inner,
    Outer,
    Full,
    On,
    As,
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    True,
    False,
    Asc,
    Desc,
    Like,
    Create,
    Table,
    Use,
    Strict,
    File,
    Column,
    Delimiter,
    Array,
    Quoted,
    Unknown,
    Password,
    Account,
    Commit,
    Fifo,
    Repo,
    Base,
    Path,
    Push,
    Pull,
    Read,
    Url,
}

impl Keyword {
    /// Look up a keyword by its case-insensitive spelling.
    pub fn lookup(word: &str) -> Option<Keyword> {
        let kw = match_ascii_lower(word);
        kw
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::Distinct => "DISTINCT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Group => "GROUP",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Limit => "LIMIT",
            Keyword::Join => "JOIN",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Inner => "INNER",
            Keyword::Outer => "OUTER",
            Keyword::Full => "FULL",
            Keyword::On => "ON",
            Keyword::As => "AS",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Like => "LIKE",
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Use => "USE",
            Keyword::Strict => "STRICT",
            Keyword::File => "FILE",
            Keyword::Column => "COLUMN",
            Keyword::Delimiter => "DELIMITER",
            Keyword::Array => "ARRAY",
            Keyword::Quoted => "QUOTED",
            Keyword::Unknown => "UNKNOWN",
            Keyword::Password => "PASSWORD",
            Keyword::Account => "ACCOUNT",
            Keyword::Commit => "COMMIT",
            Keyword::Fifo => "FIFO",
            Keyword::Repo => "REPO",
            Keyword::Base => "BASE",
            Keyword::Path => "PATH",
            Keyword::Push => "PUSH",
            Keyword::Pull => "PULL",
            Keyword::Read => "READ",
            Keyword::Url => "URL",
        }
    }
}

fn match_ascii_lower(word: &str) -> Option<Keyword> {
    // Length-bucketed, case-insensitive match mirroring the source lexer's
    // strncasecmp chain ordered by keyword length.
    let upper: String = word.chars().map(|c| c.to_ascii_uppercase()).collect();
    use Keyword::*;
    Some(match upper.as_str() {
        "SELECT" => Select,
        "DISTINCT" => Distinct,
        "FROM" => From,
        "WHERE" => Where,
        "GROUP" => Group,
        "ORDER" => Order,
        "BY" => By,
        "LIMIT" => Limit,
        "JOIN" => Join,
        "LEFT" => Left,
        "RIGHT" => Right,
        "INNER" => Inner,
        "OUTER" => Outer,
        "FULL" => Full,
        "ON" => On,
        "AS" => As,
        "AND" => And,
        "OR" => Or,
        "NOT" => Not,
        "IN" => In,
        "IS" => Is,
        "NULL" => Null,
        "TRUE" => True,
        "FALSE" => False,
        "ASC" => Asc,
        "DESC" => Desc,
        "LIKE" => Like,
        "CREATE" => Create,
        "TABLE" => Table,
        "USE" => Use,
        "STRICT" => Strict,
        "FILE" => File,
        "COLUMN" => Column,
        "DELIMITER" => Delimiter,
        "ARRAY" => Array,
        "QUOTED" => Quoted,
        "UNKNOWN" => Unknown,
        "PASSWORD" => Password,
        "ACCOUNT" => Account,
        "COMMIT" => Commit,
        "FIFO" => Fifo,
        "REPO" => Repo,
        "BASE" => Base,
        "PATH" => Path,
        "PUSH" => Push,
        "PULL" => Pull,
        "READ" => Read,
        "URL" => Url,
        _ => return None,
    })
}

/// The kind of a single token. Identifier-ish tokens start life as `Alpha`
/// and are retagged to `Alias`/`Qualifier`/`Source` by the lexer's
/// post-fusion fixup pass (see `lexer::consolidate`).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Null,
    StringLit(String),
    Numeric(i64),
    Real(f64),
    Hex(i64),
    Binary(i64),

    // Identifier-ish, pre- and post-fixup
    Alpha(String),
    Alias(String),
    Qualifier(String),
    Source(String),

    Keyword(Keyword),

    // Synthetic tokens produced by fusion
    FullOuterJoin,
    LeftJoin,
    RightJoin,
    InnerJoin,
    GroupBy,
    OrderBy,
    CreateTable,
    IsNull,
    IsNotNull,
    NotIn,
    LimitStart(i64),
    LimitLength(i64),

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    NotEq,
    NullSafeEq,
    ShiftLeft,
    ShiftRight,
    Pipe,
    Amp,
    PipePipe,
    AmpAmp,
    LParen,
    RParen,
    Comma,
    Dot,
    Semicolon,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Null => write!(f, "NULL"),
            TokenKind::StringLit(s) => write!(f, "'{}'", s),
            TokenKind::Numeric(n) => write!(f, "{}", n),
            TokenKind::Real(n) => write!(f, "{}", n),
            TokenKind::Hex(n) => write!(f, "{:#x}", n),
            TokenKind::Binary(n) => write!(f, "{:#b}", n),
            TokenKind::Alpha(s) | TokenKind::Alias(s) | TokenKind::Qualifier(s) => {
                write!(f, "{}", s)
            }
            TokenKind::Source(s) => write!(f, "{}", s),
            TokenKind::Keyword(kw) => write!(f, "{}", kw.as_str()),
            TokenKind::FullOuterJoin => write!(f, "FULL OUTER JOIN"),
            TokenKind::LeftJoin => write!(f, "LEFT JOIN"),
            TokenKind::RightJoin => write!(f, "RIGHT JOIN"),
            TokenKind::InnerJoin => write!(f, "INNER JOIN"),
            TokenKind::GroupBy => write!(f, "GROUP BY"),
            TokenKind::OrderBy => write!(f, "ORDER BY"),
            TokenKind::CreateTable => write!(f, "CREATE TABLE"),
            TokenKind::IsNull => write!(f, "IS NULL"),
            TokenKind::IsNotNull => write!(f, "IS NOT NULL"),
            TokenKind::NotIn => write!(f, "NOT IN"),
            TokenKind::LimitStart(n) => write!(f, "LIMIT_START {}", n),
            TokenKind::LimitLength(n) => write!(f, "LIMIT_LENGTH {}", n),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::NullSafeEq => write!(f, "<=>"),
            TokenKind::ShiftLeft => write!(f, "<<"),
            TokenKind::ShiftRight => write!(f, ">>"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

/// A single lexical token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }
}
