//! Black-box, crate-level integration tests: whole scripts run end-to-end
//! against real temp CSV files through the public `vibedb` API.

use std::io::Write;
use vibedb::session::{Cursor, EngineConfig};
use vibedb::{ErrorKind, StatementOutcome, Value};

fn temp_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{}", contents).unwrap();
    f
}

#[test]
fn scenario_create_then_select_in_one_script() {
    let f = temp_csv("1,2,3\n4,5,6\n");
    let script = format!(
        "CREATE TABLE this.t ('a','b','c') FILE '{}'; SELECT a FROM this.t;",
        f.path().to_str().unwrap()
    );
    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script(&script);
    assert!(err.is_none());
    assert_eq!(outcomes.len(), 2);
    match &outcomes[1] {
        StatementOutcome::Select(rs) => {
            assert_eq!(rs.columns, vec!["a"]);
            assert_eq!(rs.rows, vec![vec![Value::Int(1)], vec![Value::Int(4)]]);
        }
        _ => panic!("expected a select result"),
    }
}

#[test]
fn scenario_select_from_unknown_table_is_rejected() {
    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script("SELECT a FROM t;");
    assert!(outcomes.is_empty());
    let err = err.unwrap();
    assert_eq!(err.kind, ErrorKind::InvalidFromTable);
}

#[test]
fn scenario_duplicate_create_table_rolls_back_second_statement_only() {
    let f = temp_csv("1,2,3\n");
    let script = format!(
        "CREATE TABLE this.t ('a','b','c') FILE '{0}'; CREATE TABLE this.t ('a','b','c') FILE '{0}';",
        f.path().to_str().unwrap()
    );
    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script(&script);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(err.unwrap().kind, ErrorKind::TableAlreadyExists);
    assert_eq!(cursor.catalog.len(), 1);
}

#[test]
fn scenario_ambiguous_bare_column_rejected_qualified_column_resolves() {
    let left = temp_csv("1,2\n");
    let right = temp_csv("1,3\n");
    let script = format!(
        "CREATE TABLE this.t ('a','b') FILE '{}'; CREATE TABLE this.u ('b','c') FILE '{}'; \
         SELECT b FROM t JOIN u ON t.b=u.b;",
        left.path().to_str().unwrap(),
        right.path().to_str().unwrap()
    );
    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script(&script);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(err.unwrap().kind, ErrorKind::AmbiguousColumnInSelectList);

    let script2 = format!(
        "CREATE TABLE this.t ('a','b') FILE '{}'; CREATE TABLE this.u ('b','c') FILE '{}'; \
         SELECT t.b FROM t JOIN u ON t.b=u.b;",
        left.path().to_str().unwrap(),
        right.path().to_str().unwrap()
    );
    let mut cursor2 = Cursor::new(EngineConfig::default());
    let (outcomes2, err2) = cursor2.run_script(&script2);
    assert!(err2.is_none());
    match &outcomes2[2] {
        StatementOutcome::Select(rs) => assert_eq!(rs.rows.len(), 1),
        _ => panic!("expected a select result"),
    }
}

#[test]
fn scenario_left_join_pads_unmatched_side_with_null() {
    let left = temp_csv("1,x\n2,y\n");
    let right = temp_csv("1,z\n");
    let script = format!(
        "CREATE TABLE this.t ('k','name') FILE '{}'; CREATE TABLE this.u ('k','tag') FILE '{}'; \
         SELECT t.name, u.tag FROM t LEFT JOIN u ON t.k=u.k ORDER BY t.k ASC;",
        left.path().to_str().unwrap(),
        right.path().to_str().unwrap()
    );
    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script(&script);
    assert!(err.is_none());
    match &outcomes[2] {
        StatementOutcome::Select(rs) => {
            assert_eq!(rs.rows.len(), 2);
            assert_eq!(rs.rows[1][0], Value::Str("y".into()));
            assert_eq!(rs.rows[1][1], Value::Null);
        }
        _ => panic!("expected a select result"),
    }
}

#[test]
fn scenario_lexer_failure_modes() {
    let mut cursor = Cursor::new(EngineConfig::default());
    let (_, err) = cursor.run_script("SELECT 0xZZ;");
    assert_eq!(err.unwrap().kind, ErrorKind::MalformedHexToken);

    let mut cursor = Cursor::new(EngineConfig::default());
    let (_, err) = cursor.run_script("SELECT 'abc;");
    assert_eq!(err.unwrap().kind, ErrorKind::UnterminatedString);

    let mut cursor = Cursor::new(EngineConfig::default());
    let (_, err) = cursor.run_script("/* open");
    assert_eq!(err.unwrap().kind, ErrorKind::UnterminatedBlockComment);
}

#[test]
fn scenario_right_join_emits_unmatched_right_rows() {
    let left = temp_csv("1\n2\n");
    let right = temp_csv("2\n3\n");
    let script = format!(
        "CREATE TABLE this.t ('k') FILE '{}'; CREATE TABLE this.u ('k') FILE '{}'; \
         SELECT t.k, u.k FROM t RIGHT JOIN u ON t.k=u.k;",
        left.path().to_str().unwrap(),
        right.path().to_str().unwrap()
    );
    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script(&script);
    assert!(err.is_none());
    match &outcomes[2] {
        StatementOutcome::Select(rs) => {
            assert_eq!(rs.rows.len(), 2);
            let has_matched = rs
                .rows
                .iter()
                .any(|r| r[0] == Value::Int(2) && r[1] == Value::Int(2));
            let has_right_only = rs
                .rows
                .iter()
                .any(|r| r[0] == Value::Null && r[1] == Value::Int(3));
            assert!(has_matched);
            assert!(has_right_only);
        }
        _ => panic!("expected a select result"),
    }
}
