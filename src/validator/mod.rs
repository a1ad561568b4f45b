//! Semantic validation: qualifier/alias filling, identifier resolution, and
//! the checks that the grammar itself cannot express.

use crate::ast::{
    CreateTableStatement, Identifier, SelectExpr, SelectStatement, UseStatement,
};
use crate::catalog::{Catalog, ColumnDef, TableDef};
use crate::error::{Error, ErrorKind, Result};
use crate::session::EngineConfig;
use std::collections::HashMap;
use std::fs;

/// One resolved `FROM`/`JOIN` source: its effective alias (explicit or the
/// bare table name) paired with the catalog definition it names.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub alias: String,
    pub table: TableDef,
}

/// Everything the executor needs beyond the AST itself: which table backs
/// each `FROM`/`JOIN` clause, and where every identifier in the statement
/// resolves to.
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub sources: Vec<ResolvedSource>,
    pub lookup: HashMap<Identifier, (usize, usize)>,
}

pub fn validate_use(stmt: &UseStatement, catalog: &Catalog) -> Result<()> {
    let exists = catalog
        .iter()
        .any(|t| t.identifier.qualifier.as_deref() == Some(stmt.database.as_str()));
    if !exists {
        return Err(Error::with_span(ErrorKind::InvalidDatabase, stmt.span)
            .with_context(stmt.database.clone()));
    }
    Ok(())
}

pub fn validate_create_table(
    stmt: &mut CreateTableStatement,
    catalog: &Catalog,
    config: &EngineConfig,
) -> Result<TableDef> {
    if stmt.identifier.qualifier.is_none() {
        stmt.identifier.qualifier = Some(config.active_database.clone());
    }

    if catalog.contains(&stmt.identifier) {
        return Err(Error::with_span(ErrorKind::TableAlreadyExists, stmt.span)
            .with_context(stmt.identifier.to_string()));
    }

    if stmt.columns.is_empty() {
        // Unreachable through this grammar (CREATE TABLE requires at least
        // one column literal between the parens), kept for defensiveness.
        return Err(Error::with_span(ErrorKind::TableHasNoColumns, stmt.span));
    }

    check_file_access(&stmt.file_path)?;

    let delimiter = stmt.column_delimiter.unwrap_or(config.default_delimiter);
    let strict = stmt.strict.unwrap_or(false);

    Ok(TableDef {
        identifier: stmt.identifier.clone(),
        columns: stmt
            .columns
            .iter()
            .map(|name| ColumnDef { name: name.clone() })
            .collect(),
        file_path: stmt.file_path.clone(),
        column_delimiter: delimiter,
        strict,
    })
}

fn check_file_access(path: &str) -> Result<()> {
    let meta = fs::metadata(path).map_err(|e| {
        let kind = match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::FileReadPermission,
            _ => ErrorKind::FileOpenError,
        };
        Error::new(kind).with_context(format!("{}: {}", path, e))
    })?;

    if fs::File::open(path).is_err() {
        return Err(Error::new(ErrorKind::FileReadPermission).with_context(path.to_string()));
    }
    if meta.permissions().readonly() {
        return Err(Error::new(ErrorKind::FileWritePermission).with_context(path.to_string()));
    }
    Ok(())
}

pub fn validate_select(
    stmt: &mut SelectStatement,
    catalog: &Catalog,
    config: &EngineConfig,
) -> Result<Validated> {
    if stmt.columns.is_empty() {
        return Err(Error::with_span(ErrorKind::MissingColumns, stmt.span));
    }

    let mut sources = Vec::new();
    if let Some(from) = &mut stmt.from {
        if from.identifier.qualifier.is_none() {
            from.identifier.qualifier = Some(config.active_database.clone());
        }
        let table = catalog.lookup(&from.identifier).ok_or_else(|| {
            Error::with_span(ErrorKind::InvalidFromTable, from.span)
                .with_context(from.identifier.to_string())
        })?;
        let alias = from
            .alias
            .clone()
            .unwrap_or_else(|| from.identifier.source.clone());
        sources.push(ResolvedSource {
            alias,
            table: table.clone(),
        });
    }

    for join in &mut stmt.joins {
        if join.identifier.qualifier.is_none() {
            join.identifier.qualifier = Some(config.active_database.clone());
        }
        let table = catalog.lookup(&join.identifier).ok_or_else(|| {
            Error::with_span(ErrorKind::InvalidJoinTable, join.span)
                .with_context(join.identifier.to_string())
        })?;
        let alias = join
            .alias
            .clone()
            .unwrap_or_else(|| join.identifier.source.clone());
        sources.push(ResolvedSource {
            alias,
            table: table.clone(),
        });
        if join.on.is_none() {
            return Err(Error::with_span(ErrorKind::JoinWithoutOn, join.span)
                .with_context(join.identifier.to_string()));
        }
    }

    if has_duplicate(sources.iter().map(|s| s.alias.as_str())) {
        return Err(Error::with_span(ErrorKind::AmbiguousJoin, stmt.span));
    }

    let mut lookup: HashMap<Identifier, (usize, usize)> = HashMap::new();

    for item in &mut stmt.columns {
        if let SelectExpr::Identifier(id) = &mut item.expr {
            let resolved = resolve(id, &sources, ErrorKind::AmbiguousColumnInSelectList)?;
            backfill(id, &sources, resolved);
            lookup.insert(id.clone(), resolved);
            if item.alias.is_none() {
                item.alias = Some(id.source.clone());
            }
        }
    }

    if let Some(expr) = &mut stmt.where_clause {
        resolve_expr(expr, &sources, &mut lookup)?;
    }
    for join in &mut stmt.joins {
        if let Some(expr) = &mut join.on {
            resolve_expr(expr, &sources, &mut lookup)?;
        }
    }

    if has_duplicate(stmt.group_by.iter().map(|id| id.to_string())) {
        return Err(Error::with_span(ErrorKind::DuplicateGroupByColumn, stmt.span));
    }
    for id in &mut stmt.group_by {
        let resolved = resolve(id, &sources, ErrorKind::AmbiguousColumnName)?;
        backfill(id, &sources, resolved);
        lookup.insert(id.clone(), resolved);
    }

    if has_duplicate(stmt.order_by.iter().map(|o| o.identifier.to_string())) {
        return Err(Error::with_span(ErrorKind::DuplicateOrderByColumn, stmt.span));
    }
    for item in &mut stmt.order_by {
        let resolved = resolve(&item.identifier, &sources, ErrorKind::AmbiguousColumnName)?;
        backfill(&mut item.identifier, &sources, resolved);
        lookup.insert(item.identifier.clone(), resolved);
    }

    if let Some(n) = stmt.limit_start {
        if n < 0 {
            return Err(Error::with_span(ErrorKind::LimitStartNegative, stmt.span));
        }
    }
    if let Some(n) = stmt.limit_length {
        if n < 0 {
            return Err(Error::with_span(ErrorKind::LimitLengthNegative, stmt.span));
        }
    }

    log::debug!(
        "validator: resolved select against {} source(s), {} identifier(s)",
        sources.len(),
        lookup.len()
    );

    Ok(Validated { sources, lookup })
}

fn resolve_expr(
    expr: &mut crate::ast::Expr,
    sources: &[ResolvedSource],
    lookup: &mut HashMap<Identifier, (usize, usize)>,
) -> Result<()> {
    let mut err = None;
    expr.for_each_identifier_mut(&mut |id| {
        if err.is_some() {
            return;
        }
        match resolve(id, sources, ErrorKind::AmbiguousColumnName) {
            Ok(resolved) => {
                backfill(id, sources, resolved);
                lookup.insert(id.clone(), resolved);
            }
            Err(e) => err = Some(e),
        }
    });
    match err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn backfill(id: &mut Identifier, sources: &[ResolvedSource], resolved: (usize, usize)) {
    id.qualifier = Some(sources[resolved.0].alias.clone());
}

fn resolve(
    id: &Identifier,
    sources: &[ResolvedSource],
    ambiguous_kind: ErrorKind,
) -> Result<(usize, usize)> {
    if let Some(q) = &id.qualifier {
        let src_idx = sources
            .iter()
            .position(|s| &s.alias == q)
            .ok_or_else(|| Error::new(ErrorKind::InvalidQualifier).with_context(q.clone()))?;
        let col_idx = sources[src_idx]
            .table
            .column_index(&id.source)
            .ok_or_else(|| Error::new(ErrorKind::ColumnNotFound).with_context(id.to_string()))?;
        Ok((src_idx, col_idx))
    } else {
        let matches: Vec<(usize, usize)> = sources
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.table.column_index(&id.source).map(|j| (i, j)))
            .collect();
        match matches.len() {
            0 => Err(Error::new(ErrorKind::ColumnNotFound).with_context(id.to_string())),
            1 => Ok(matches[0]),
            _ => Err(Error::new(ambiguous_kind).with_context(id.to_string())),
        }
    }
}

fn has_duplicate<I, T>(items: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Eq + std::hash::Hash,
{
    let mut seen = std::collections::HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Identifier;
    use crate::parser::Parser;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn table(name: &str, cols: &[&str]) -> TableDef {
        TableDef {
            identifier: Identifier::unqualified(name),
            columns: cols
                .iter()
                .map(|c| ColumnDef { name: c.to_string() })
                .collect(),
            file_path: format!("{name}.csv"),
            column_delimiter: ',',
            strict: false,
        }
    }

    fn select(sql: &str) -> crate::ast::SelectStatement {
        let mut p = Parser::new(sql).unwrap();
        match p.parse().unwrap().into_iter().next().unwrap() {
            crate::ast::Statement::Select(s) => s,
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_unqualified_resolution() {
        let mut cat = Catalog::new();
        cat.insert(table("t", &["a", "b"]));
        let mut stmt = select("SELECT a FROM t WHERE b = 1;");
        let v = validate_select(&mut stmt, &cat, &config()).unwrap();
        assert_eq!(v.sources.len(), 1);
        assert_eq!(v.sources[0].alias, "t");
    }

    #[test]
    fn test_ambiguous_column() {
        let mut cat = Catalog::new();
        cat.insert(table("t", &["a"]));
        cat.insert(table("u", &["a"]));
        let mut stmt = select("SELECT a FROM t JOIN u ON t.a = u.a;");
        let err = validate_select(&mut stmt, &cat, &config()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AmbiguousColumnInSelectList);
    }

    #[test]
    fn test_join_without_on_rejected() {
        let mut cat = Catalog::new();
        cat.insert(table("t", &["a"]));
        cat.insert(table("u", &["a"]));
        let mut stmt = select("SELECT t.a FROM t JOIN u;");
        let err = validate_select(&mut stmt, &cat, &config()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::JoinWithoutOn);
    }

    #[test]
    fn test_unknown_from_table() {
        let cat = Catalog::new();
        let mut stmt = select("SELECT a FROM missing;");
        let err = validate_select(&mut stmt, &cat, &config()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFromTable);
    }

    #[test]
    fn test_negative_limit_rejected_even_when_zero_start() {
        // The grammar's lexer never fuses a negative numeral into
        // LIMIT_START/LIMIT_LENGTH, so this exercises the validator's check
        // directly rather than through parsing; the check stays
        // unconditional even when limit_start is exactly zero.
        let mut cat = Catalog::new();
        cat.insert(table("t", &["a"]));
        let mut stmt = select("SELECT a FROM t LIMIT 0,1;");
        stmt.limit_length = Some(-1);
        let err = validate_select(&mut stmt, &cat, &config()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::LimitLengthNegative);
    }

    #[test]
    fn test_duplicate_group_by() {
        let mut cat = Catalog::new();
        cat.insert(table("t", &["a"]));
        let mut stmt = select("SELECT a FROM t GROUP BY a, a;");
        let err = validate_select(&mut stmt, &cat, &config()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateGroupByColumn);
    }

    fn use_stmt(sql: &str) -> crate::ast::UseStatement {
        let mut p = Parser::new(sql).unwrap();
        match p.parse().unwrap().into_iter().next().unwrap() {
            crate::ast::Statement::Use(s) => s,
            _ => panic!("expected use"),
        }
    }

    #[test]
    fn test_use_succeeds_when_a_table_has_that_qualifier() {
        let mut cat = Catalog::new();
        cat.insert(TableDef {
            identifier: Identifier::qualified("db2", "t"),
            columns: vec![ColumnDef { name: "a".into() }],
            file_path: "t.csv".into(),
            column_delimiter: ',',
            strict: false,
        });
        let stmt = use_stmt("USE db2;");
        assert!(validate_use(&stmt, &cat).is_ok());
    }

    #[test]
    fn test_use_rejected_when_no_table_has_that_qualifier() {
        let cat = Catalog::new();
        let stmt = use_stmt("USE missing;");
        let err = validate_use(&stmt, &cat).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDatabase);
    }
}
