//! Row-matrix evaluation: cartesian join walk, predicate/projection
//! evaluation, and the `ORDER BY`/`DISTINCT`/`LIMIT` finishing passes.

use crate::ast::{
    ArithOp, CmpOp, Direction, Expr, Identifier, Join, JoinKind, Literal, LogicalOp, OrderItem,
    SelectExpr, SelectItem, SelectStatement, UnaryOp,
};
use crate::csv::{self, DataSet};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::validator::Validated;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A runtime SQL value. `Int`/`Long` are kept as distinct widths so that
/// arithmetic widening (`Int -> Long -> Float`) has somewhere to widen
/// from; `Str` and `Null` round out the set of things a CSV field or a
/// literal can be.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i32),
    Long(i64),
    Float(f64),
    Str(String),
}

impl Value {
    fn from_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Null => Value::Null,
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Int(n) | Literal::Hex(n) | Literal::Binary(n) => widen_int(*n),
            Literal::Real(f) => Value::Float(*f),
        }
    }

    fn from_field(field: Option<&str>) -> Value {
        match field {
            None => Value::Null,
            Some(s) => {
                if let Ok(n) = s.parse::<i64>() {
                    widen_int(n)
                } else if let Ok(f) = s.parse::<f64>() {
                    Value::Float(f)
                } else {
                    Value::Str(s.to_string())
                }
            }
        }
    }
}

fn widen_int(n: i64) -> Value {
    match i32::try_from(n) {
        Ok(n32) => Value::Int(n32),
        Err(_) => Value::Long(n),
    }
}

/// Whether a joined row combination came from a real match, was padded with
/// nulls to stand in for an unmatched outer-join side, or was dropped by a
/// later `WHERE` filter. Only used for bookkeeping/logging — the row matrix
/// itself just omits `Filtered` frames from the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Matched,
    NullRow,
    Filtered,
}

fn frame_status(frame: &[Option<usize>]) -> FrameStatus {
    if frame.iter().any(Option::is_none) {
        FrameStatus::NullRow
    } else {
        FrameStatus::Matched
    }
}

pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

struct FrameView<'a> {
    frame: &'a [Option<usize>],
    datasets: &'a [DataSet],
}

impl<'a> FrameView<'a> {
    fn new(frame: &'a [Option<usize>], datasets: &'a [DataSet]) -> Self {
        Self { frame, datasets }
    }

    fn get(&self, src: usize, col: usize) -> Value {
        match self.frame.get(src).copied().flatten() {
            Some(row_idx) => Value::from_field(
                self.datasets[src].rows[row_idx]
                    .columns
                    .get(col)
                    .and_then(|o| o.as_deref()),
            ),
            None => Value::Null,
        }
    }
}

pub fn execute_select(stmt: &SelectStatement, validated: &Validated) -> Result<ResultSet> {
    let datasets: Vec<DataSet> = validated
        .sources
        .iter()
        .map(|s| csv::load_table(&s.table))
        .collect::<Result<_>>()?;

    let mut frames: Vec<Vec<Option<usize>>> = if datasets.is_empty() {
        vec![Vec::new()]
    } else {
        (0..datasets[0].rows.len()).map(|i| vec![Some(i)]).collect()
    };

    for (idx, join) in stmt.joins.iter().enumerate() {
        let join_idx = idx + 1;
        frames = join_step(frames, join, join_idx, &datasets, &validated.lookup)?;
    }

    let mut filtered_out = 0usize;
    if let Some(where_clause) = &stmt.where_clause {
        let mut kept = Vec::with_capacity(frames.len());
        for frame in frames {
            let view = FrameView::new(&frame, &datasets);
            if truthy(&eval(where_clause, &view, &validated.lookup)?) {
                kept.push(frame);
            } else {
                filtered_out += 1;
            }
        }
        frames = kept;
    }
    log::debug!(
        "executor: {} frame(s) survived filtering, {} dropped",
        frames.len(),
        filtered_out
    );

    if !stmt.order_by.is_empty() {
        sort_frames(&mut frames, &stmt.order_by, &datasets, &validated.lookup)?;
    }

    let mut matched = 0usize;
    let mut null_rows = 0usize;
    let mut rows = Vec::with_capacity(frames.len());
    for frame in &frames {
        match frame_status(frame) {
            FrameStatus::Matched => matched += 1,
            FrameStatus::NullRow => null_rows += 1,
            FrameStatus::Filtered => {}
        }
        let view = FrameView::new(frame, &datasets);
        let mut row = Vec::with_capacity(stmt.columns.len());
        for item in &stmt.columns {
            row.push(eval_select_expr(&item.expr, &view, &validated.lookup)?);
        }
        rows.push(row);
    }
    log::debug!(
        "executor: projected {} row(s) ({} matched, {} null-padded)",
        rows.len(),
        matched,
        null_rows
    );

    if stmt.distinct {
        let mut seen: Vec<Vec<Value>> = Vec::new();
        rows.retain(|row| {
            if seen.iter().any(|s| s == row) {
                false
            } else {
                seen.push(row.clone());
                true
            }
        });
    }

    let start = stmt.limit_start.unwrap_or(0).max(0) as usize;
    let length = stmt.limit_length.map(|n| n.max(0) as usize);
    let end = match length {
        Some(len) => (start + len).min(rows.len()),
        None => rows.len(),
    };
    let rows = if start < rows.len() {
        rows[start..end.max(start)].to_vec()
    } else {
        Vec::new()
    };

    let columns = stmt.columns.iter().map(column_header).collect();
    Ok(ResultSet { columns, rows })
}

fn column_header(item: &SelectItem) -> String {
    if let Some(alias) = &item.alias {
        return alias.clone();
    }
    match &item.expr {
        SelectExpr::Identifier(id) => id.source.clone(),
        SelectExpr::Literal(_) => String::new(),
    }
}

fn eval_select_expr(
    expr: &SelectExpr,
    view: &FrameView,
    lookup: &HashMap<Identifier, (usize, usize)>,
) -> Result<Value> {
    match expr {
        SelectExpr::Literal(lit) => Ok(Value::from_literal(lit)),
        SelectExpr::Identifier(id) => {
            let (s, c) = lookup
                .get(id)
                .copied()
                .ok_or_else(|| Error::new(ErrorKind::ColumnNotFound).with_context(id.to_string()))?;
            Ok(view.get(s, c))
        }
    }
}

fn join_step(
    existing: Vec<Vec<Option<usize>>>,
    join: &Join,
    join_idx: usize,
    datasets: &[DataSet],
    lookup: &HashMap<Identifier, (usize, usize)>,
) -> Result<Vec<Vec<Option<usize>>>> {
    let right_rows = datasets[join_idx].rows.len();
    let mut output = Vec::new();
    let mut right_matched = vec![false; right_rows];

    for left_frame in &existing {
        let mut any_match = false;
        for r in 0..right_rows {
            let mut candidate = left_frame.clone();
            candidate.push(Some(r));
            let is_match = match &join.on {
                Some(expr) => {
                    let view = FrameView::new(&candidate, datasets);
                    truthy(&eval(expr, &view, lookup)?)
                }
                None => true,
            };
            if is_match {
                any_match = true;
                right_matched[r] = true;
                output.push(candidate);
            }
        }
        if !any_match && matches!(join.kind, JoinKind::Left | JoinKind::FullOuter) {
            let mut candidate = left_frame.clone();
            candidate.push(None);
            output.push(candidate);
        }
    }

    if matches!(join.kind, JoinKind::Right | JoinKind::FullOuter) {
        for (r, matched) in right_matched.iter().enumerate() {
            if !matched {
                let mut candidate = vec![None; join_idx];
                candidate.push(Some(r));
                output.push(candidate);
            }
        }
    }

    Ok(output)
}

fn sort_frames(
    frames: &mut [Vec<Option<usize>>],
    order_by: &[OrderItem],
    datasets: &[DataSet],
    lookup: &HashMap<Identifier, (usize, usize)>,
) -> Result<()> {
    let mut keyed: Vec<(Vec<Value>, Vec<Option<usize>>)> = Vec::with_capacity(frames.len());
    for frame in frames.iter() {
        let view = FrameView::new(frame, datasets);
        let mut key = Vec::with_capacity(order_by.len());
        for item in order_by {
            let (s, c) = lookup.get(&item.identifier).copied().ok_or_else(|| {
                Error::new(ErrorKind::ColumnNotFound).with_context(item.identifier.to_string())
            })?;
            key.push(view.get(s, c));
        }
        keyed.push((key, frame.clone()));
    }

    keyed.sort_by(|a, b| {
        for (i, item) in order_by.iter().enumerate() {
            let ord = value_ordering(&a.0[i], &b.0[i]).unwrap_or(Ordering::Equal);
            let ord = match item.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    for (slot, (_, frame)) in frames.iter_mut().zip(keyed.into_iter()) {
        *slot = frame;
    }
    Ok(())
}

fn eval(expr: &Expr, view: &FrameView, lookup: &HashMap<Identifier, (usize, usize)>) -> Result<Value> {
    match expr {
        Expr::Literal(lit, _) => Ok(Value::from_literal(lit)),
        Expr::Identifier(id, span) => {
            let (s, c) = lookup
                .get(id)
                .copied()
                .ok_or_else(|| Error::with_span(ErrorKind::ColumnNotFound, *span).with_context(id.to_string()))?;
            Ok(view.get(s, c))
        }
        Expr::Unary { op, expr, span } => {
            let v = eval(expr, view, lookup)?;
            apply_unary(*op, v, *span)
        }
        Expr::Arithmetic { op, lhs, rhs, span } => {
            let l = eval(lhs, view, lookup)?;
            let r = eval(rhs, view, lookup)?;
            apply_arith(*op, l, r, *span)
        }
        Expr::Comparison { op, lhs, rhs, .. } => {
            let l = eval(lhs, view, lookup)?;
            let r = eval(rhs, view, lookup)?;
            Ok(bool_value(apply_cmp(*op, &l, &r)))
        }
        Expr::Logical { op, lhs, rhs, .. } => {
            let l = truthy(&eval(lhs, view, lookup)?);
            let r = truthy(&eval(rhs, view, lookup)?);
            let result = match op {
                LogicalOp::And => l && r,
                LogicalOp::Or => l || r,
            };
            Ok(bool_value(result))
        }
        Expr::IsNull { expr, negated, .. } => {
            let v = eval(expr, view, lookup)?;
            let is_null = matches!(v, Value::Null);
            Ok(bool_value(is_null != *negated))
        }
        Expr::Not(inner, _) => {
            let v = eval(inner, view, lookup)?;
            Ok(bool_value(!truthy(&v)))
        }
    }
}

fn bool_value(b: bool) -> Value {
    Value::Int(b as i32)
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Int(n) => *n != 0,
        Value::Long(n) => *n != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
    }
}

fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Int(n) => Some(*n as i64),
        Value::Long(n) => Some(*n),
        _ => None,
    }
}

fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Long(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn apply_unary(op: UnaryOp, v: Value, span: Span) -> Result<Value> {
    match v {
        Value::Int(n) => Ok(Value::Int(if op == UnaryOp::Minus { -n } else { n })),
        Value::Long(n) => Ok(Value::Long(if op == UnaryOp::Minus { -n } else { n })),
        Value::Float(f) => Ok(Value::Float(if op == UnaryOp::Minus { -f } else { f })),
        _ => Err(Error::with_span(ErrorKind::ExpressionMalformed, span)
            .with_context("unary +/- requires a numeric operand")),
    }
}

fn apply_arith(op: ArithOp, l: Value, r: Value, span: Span) -> Result<Value> {
    match op {
        ArithOp::BitOr | ArithOp::BitAnd | ArithOp::ShiftLeft | ArithOp::ShiftRight => {
            let (Some(a), Some(b)) = (as_int(&l), as_int(&r)) else {
                return Err(Error::with_span(ErrorKind::ExpressionMalformed, span)
                    .with_context("bitwise operators require integer operands"));
            };
            let result = match op {
                ArithOp::BitOr => a | b,
                ArithOp::BitAnd => a & b,
                ArithOp::ShiftLeft => a << b,
                ArithOp::ShiftRight => a >> b,
                _ => unreachable!(),
            };
            Ok(widen_int(result))
        }
        ArithOp::Add | ArithOp::Sub | ArithOp::Mul | ArithOp::Div | ArithOp::Mod => {
            if matches!(l, Value::Float(_)) || matches!(r, Value::Float(_)) {
                let (Some(a), Some(b)) = (as_float(&l), as_float(&r)) else {
                    return Err(Error::with_span(ErrorKind::ExpressionMalformed, span)
                        .with_context("arithmetic requires numeric operands"));
                };
                if matches!(op, ArithOp::Div | ArithOp::Mod) && b == 0.0 {
                    return Err(Error::with_span(ErrorKind::ExpressionMalformed, span)
                        .with_context("division by zero"));
                }
                Ok(Value::Float(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Mod => a % b,
                    _ => unreachable!(),
                }))
            } else {
                let (Some(a), Some(b)) = (as_int(&l), as_int(&r)) else {
                    return Err(Error::with_span(ErrorKind::ExpressionMalformed, span)
                        .with_context("arithmetic requires numeric operands"));
                };
                if matches!(op, ArithOp::Div | ArithOp::Mod) && b == 0 {
                    return Err(Error::with_span(ErrorKind::ExpressionMalformed, span)
                        .with_context("division by zero"));
                }
                Ok(widen_int(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Mod => a % b,
                    _ => unreachable!(),
                }))
            }
        }
    }
}

fn values_eq(l: &Value, r: &Value) -> bool {
    match (as_float(l), as_float(r)) {
        (Some(a), Some(b)) => a == b,
        _ => match (l, r) {
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        },
    }
}

fn value_ordering(l: &Value, r: &Value) -> Option<Ordering> {
    match (as_float(l), as_float(r)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (l, r) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        },
    }
}

fn apply_cmp(op: CmpOp, l: &Value, r: &Value) -> bool {
    if op == CmpOp::NullSafeEq {
        return match (l, r) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => values_eq(l, r),
        };
    }
    if matches!(l, Value::Null) || matches!(r, Value::Null) {
        return false;
    }
    match op {
        CmpOp::Eq => values_eq(l, r),
        CmpOp::NotEq => !values_eq(l, r),
        CmpOp::Lt => value_ordering(l, r) == Some(Ordering::Less),
        CmpOp::LtEq => matches!(value_ordering(l, r), Some(Ordering::Less) | Some(Ordering::Equal)),
        CmpOp::Gt => value_ordering(l, r) == Some(Ordering::Greater),
        CmpOp::GtEq => matches!(value_ordering(l, r), Some(Ordering::Greater) | Some(Ordering::Equal)),
        CmpOp::NullSafeEq => unreachable!(),
    }
}
