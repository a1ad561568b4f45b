//! vibedb CLI: reads a SQL script from a file argument or stdin, runs it
//! against a fresh session, and prints each statement's result.

use std::io::{self, IsTerminal, Read, Write};
use std::process::ExitCode;
use vibedb::session::{Cursor, EngineConfig};
use vibedb::{StatementOutcome, Value};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let script = if let Some(path) = args.get(1) {
        match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("vibedb: could not read {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    } else if io::stdin().is_terminal() {
        print_usage();
        return ExitCode::SUCCESS;
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("vibedb: could not read stdin: {}", e);
            return ExitCode::FAILURE;
        }
        buf
    };

    let mut cursor = Cursor::new(EngineConfig::default());
    let (outcomes, err) = cursor.run_script(&script);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for outcome in &outcomes {
        print_outcome(&mut out, outcome);
    }

    if let Some(e) = err {
        // A logical SQL error is reported but doesn't fail the process —
        // the script ran as far as it could and the session reflects that.
        eprintln!("vibedb: {}", e);
    }

    ExitCode::SUCCESS
}

fn print_usage() {
    println!("vibedb {}", env!("CARGO_PKG_VERSION"));
    println!("Usage: vibedb <script.sql>");
    println!("       vibedb < script.sql");
}

fn print_outcome(out: &mut impl Write, outcome: &StatementOutcome) {
    match outcome {
        StatementOutcome::Ack => {
            let _ = writeln!(out, "OK");
        }
        StatementOutcome::Select(rs) => {
            let _ = writeln!(out, "{}", rs.columns.join("\t"));
            for row in &rs.rows {
                let rendered: Vec<String> = row.iter().map(render_value).collect();
                let _ = writeln!(out, "{}", rendered.join("\t"));
            }
        }
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Null => "NULL".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Long(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
    }
}
