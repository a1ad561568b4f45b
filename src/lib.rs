//! # vibedb
//!
//! A small SQL query engine that runs a handful of `SELECT`/`CREATE
//! TABLE`/`USE` statements directly over delimited text files, no server or
//! persistent storage engine involved.
//!
//! ## Pipeline
//!
//! ```text
//! source text -> Lexer -> Parser -> validator -> executor -> ResultSet
//! ```
//!
//! [`session::Cursor`] drives a whole script through that pipeline
//! statement-by-statement, so a `CREATE TABLE` earlier in a script is
//! visible to a `SELECT` later in the same script.
//!
//! ## Quick start
//!
//! ```rust
//! use vibedb::session::{Cursor, EngineConfig};
//!
//! let mut cursor = Cursor::new(EngineConfig::default());
//! let (_, err) = cursor.run_script("SELECT 1;");
//! assert!(err.is_none());
//! ```

pub mod ast;
pub mod catalog;
pub mod csv;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod session;
pub mod validator;

pub use error::{Error, ErrorKind, Result, Span};
pub use executor::{ResultSet, Value};
pub use lexer::{Keyword, Lexer, Token, TokenKind};
pub use parser::Parser;
pub use session::{Cursor, EngineConfig, StatementOutcome};
