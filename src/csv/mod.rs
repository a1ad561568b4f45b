//! CSV ingestion: quote-aware splitting of a table's backing file into rows.

use crate::catalog::TableDef;
use crate::error::{Error, ErrorKind, Result};
use std::fs;
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

/// Split a single CSV line on `delimiter`, honoring both `'` and `"` quoting
/// (a quote suppresses delimiter and line-ending significance until its
/// matching close quote). An empty field is `Some(String::new())`, not
/// `None` — `None` is reserved for a SQL NULL, which plain CSV has no way to
/// express, so every loaded field starts non-null.
fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                } else if c == delimiter {
                    fields.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
        }
    }
    fields.push(current);
    fields
}

/// Advisory file locking is part of the wire-level file contract but this
/// engine only ever does single-shot reads, so there is nothing to hold a
/// lock across; kept as an explicit no-op rather than silently absent.
pub fn lock_file(_path: &str) -> Result<()> {
    Ok(())
}

fn default_column_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("col_{i}")).collect()
}

/// Load a table's backing CSV file into a row matrix.
///
/// In strict mode every row must have exactly as many fields as the table
/// declares columns for, or the whole load fails with `DataFetchError`. In
/// permissive mode a short row is padded with `None`, and a long row keeps
/// its extra fields under synthesized `col_N` names.
pub fn load_table(table: &TableDef) -> Result<DataSet> {
    let contents = fs::read_to_string(&table.file_path).map_err(|e| {
        let kind = match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::FileReadPermission,
            _ => ErrorKind::FileOpenError,
        };
        Error::new(kind).with_context(format!("{}: {}", table.file_path, e))
    })?;

    let declared: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
    let mut column_names = declared.clone();
    let mut rows = Vec::new();

    for (lineno, line) in contents.lines().enumerate() {
        if line.is_empty() {
            rows.push(Row { columns: Vec::new() });
            continue;
        }
        let fields = split_line(line, table.column_delimiter);

        if table.strict && fields.len() != declared.len() {
            return Err(Error::new(ErrorKind::DataFetchError).with_context(format!(
                "{}: line {} has {} fields, expected {}",
                table.file_path,
                lineno + 1,
                fields.len(),
                declared.len()
            )));
        }

        if fields.len() > column_names.len() {
            column_names.extend(default_column_names(fields.len())[column_names.len()..].to_vec());
        }

        let mut columns: Vec<Option<String>> = fields.into_iter().map(Some).collect();
        while columns.len() < column_names.len() {
            columns.push(None);
        }
        rows.push(Row { columns });
    }

    log::debug!(
        "csv: loaded {} rows, {} columns from {}",
        rows.len(),
        column_names.len(),
        table.file_path
    );

    Ok(DataSet {
        column_names,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnDef;
    use crate::ast::Identifier;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", contents).unwrap();
        f
    }

    fn table_for(path: &str, cols: &[&str], delim: char, strict: bool) -> TableDef {
        TableDef {
            identifier: Identifier::unqualified("t"),
            columns: cols
                .iter()
                .map(|c| ColumnDef { name: c.to_string() })
                .collect(),
            file_path: path.to_string(),
            column_delimiter: delim,
            strict,
        }
    }

    #[test]
    fn test_basic_load() {
        let f = write_temp("1,2\n3,4\n");
        let t = table_for(f.path().to_str().unwrap(), &["a", "b"], ',', false);
        let ds = load_table(&t).unwrap();
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[0].columns, vec![Some("1".into()), Some("2".into())]);
    }

    #[test]
    fn test_quoted_field_with_embedded_delimiter() {
        let f = write_temp("\"a,b\",c\n");
        let t = table_for(f.path().to_str().unwrap(), &["x", "y"], ',', false);
        let ds = load_table(&t).unwrap();
        assert_eq!(ds.rows[0].columns[0], Some("a,b".into()));
    }

    #[test]
    fn test_short_row_padded_with_null() {
        let f = write_temp("1\n");
        let t = table_for(f.path().to_str().unwrap(), &["a", "b"], ',', false);
        let ds = load_table(&t).unwrap();
        assert_eq!(ds.rows[0].columns, vec![Some("1".into()), None]);
    }

    #[test]
    fn test_strict_mode_rejects_mismatched_width() {
        let f = write_temp("1,2,3\n");
        let t = table_for(f.path().to_str().unwrap(), &["a", "b"], ',', true);
        let err = load_table(&t).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DataFetchError);
    }

    #[test]
    fn test_empty_line_produces_zero_column_row() {
        let f = write_temp("1,2\n\n3,4\n");
        let t = table_for(f.path().to_str().unwrap(), &["a", "b"], ',', false);
        let ds = load_table(&t).unwrap();
        assert_eq!(ds.rows.len(), 3);
        assert_eq!(ds.rows[1].columns, Vec::new());
    }

    #[test]
    fn test_missing_file() {
        let t = table_for("/nonexistent/path/zzz.csv", &["a"], ',', false);
        let err = load_table(&t).unwrap_err();
        assert_eq!(err.kind, ErrorKind::FileNotFound);
    }
}
