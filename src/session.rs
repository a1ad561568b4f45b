//! The session driver: runs a script of statements against one catalog,
//! validating and executing each in turn so that an earlier `CREATE TABLE`
//! is visible to a later `SELECT` in the same script.

use crate::ast::Statement;
use crate::catalog::Catalog;
use crate::csv;
use crate::error::{Error, Result};
use crate::executor::{self, ResultSet};
use crate::parser::Parser;
use crate::validator;

/// Session-wide settings threaded through validation and execution.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_delimiter: char,
    pub active_database: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_delimiter: ',',
            active_database: "this".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum StatementOutcome {
    Select(ResultSet),
    Ack,
}

/// A running session: its configuration and the catalog it has built up.
pub struct Cursor {
    pub config: EngineConfig,
    pub catalog: Catalog,
}

impl Cursor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
        }
    }

    /// Run every statement in `script` against this session's catalog.
    ///
    /// Validation and execution are interleaved statement-by-statement
    /// rather than run as two full passes over the whole script, so a
    /// `CREATE TABLE` earlier in the script is visible to a `SELECT` later
    /// in the same script. On the first failing statement, that statement's
    /// own catalog effect (if any) is rolled back and the remaining
    /// statements are not run; everything committed by prior statements in
    /// the script stays.
    pub fn run_script(&mut self, script: &str) -> (Vec<StatementOutcome>, Option<Error>) {
        let mut outcomes = Vec::new();

        let statements = match Parser::new(script).and_then(|mut p| p.parse()) {
            Ok(s) => s,
            Err(e) => return (outcomes, Some(e)),
        };

        for mut stmt in statements {
            let checkpoint = self.catalog.len();
            match self.run_statement(&mut stmt) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    self.catalog.truncate(checkpoint);
                    log::warn!("session: statement failed, rolled back to {} table(s): {}", checkpoint, e);
                    return (outcomes, Some(e));
                }
            }
        }

        (outcomes, None)
    }

    fn run_statement(&mut self, stmt: &mut Statement) -> Result<StatementOutcome> {
        match stmt {
            Statement::Use(s) => {
                validator::validate_use(s, &self.catalog)?;
                self.config.active_database = s.database.clone();
                log::info!("session: USE {}", s.database);
                Ok(StatementOutcome::Ack)
            }
            Statement::CreateTable(s) => {
                let table = validator::validate_create_table(s, &self.catalog, &self.config)?;
                csv::lock_file(&table.file_path)?;
                log::info!("session: created table {}", s.identifier);
                self.catalog.insert(table);
                Ok(StatementOutcome::Ack)
            }
            Statement::Select(s) => {
                let validated = validator::validate_select(s, &self.catalog, &self.config)?;
                let result = executor::execute_select(s, &validated)?;
                log::info!("session: select returned {} row(s)", result.rows.len());
                Ok(StatementOutcome::Select(result))
            }
        }
    }
}
