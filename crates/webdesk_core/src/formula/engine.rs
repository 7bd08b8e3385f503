//! Cell store and formula evaluator.
//!
//! # Responsibility
//! - Hold cell contents keyed by coordinate and the per-cell dependency sets.
//! - Evaluate cells on demand and recalculate every formula cell in
//!   dependency order.
//!
//! # Invariants
//! - A single visited set guards every evaluation path; any revisit of an
//!   in-flight cell yields the circular-reference sentinel instead of
//!   recursing further.
//! - Parse failures are stored with the cell and surface as error values on
//!   read; `set_cell` itself never fails.

use crate::formula::coord::CellCoord;
use crate::formula::functions::{apply, Arg};
use crate::formula::parser::{parse_formula, BinaryOp, Expr, ParseError, UnaryOp};
use crate::formula::value::{EvalErrorKind, Value};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// What a cell holds: a literal or a formula with its parse outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Literal(Value),
    Formula {
        /// Original text as entered, leading `=` included.
        source: String,
        parsed: Result<Expr, EvalErrorKind>,
    },
}

/// One spreadsheet of cells with on-demand evaluation.
#[derive(Debug, Default)]
pub struct SheetEngine {
    cells: BTreeMap<CellCoord, CellContent>,
    /// For each formula cell, the set of coordinates it reads.
    deps: BTreeMap<CellCoord, BTreeSet<CellCoord>>,
}

impl SheetEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw cell input.
    ///
    /// Input starting with `=` is parsed as a formula; a parse failure is
    /// kept with the cell and read back as an error value. Other input is
    /// stored as a number when it parses as one, text otherwise, and blank
    /// when empty.
    pub fn set_cell(&mut self, coord: CellCoord, raw: &str) {
        let trimmed = raw.trim();

        if let Some(body) = trimmed.strip_prefix('=') {
            let parsed = parse_formula(body).map_err(parse_error_kind);
            match &parsed {
                Ok(expr) => {
                    let mut refs = BTreeSet::new();
                    expr.collect_refs(&mut refs);
                    self.deps.insert(coord, refs);
                }
                Err(kind) => {
                    debug!(
                        "event=cell_parse_failed module=formula cell={coord} sentinel={}",
                        kind.sentinel()
                    );
                    self.deps.remove(&coord);
                }
            }
            self.cells.insert(
                coord,
                CellContent::Formula {
                    source: trimmed.to_string(),
                    parsed,
                },
            );
            return;
        }

        self.deps.remove(&coord);
        let literal = if trimmed.is_empty() {
            Value::Blank
        } else if let Ok(n) = trimmed.parse::<f64>() {
            Value::Number(n)
        } else {
            Value::Text(trimmed.to_string())
        };
        self.cells.insert(coord, CellContent::Literal(literal));
    }

    /// Removes a cell entirely; unknown coordinates are a no-op.
    pub fn remove_cell(&mut self, coord: CellCoord) {
        self.cells.remove(&coord);
        self.deps.remove(&coord);
    }

    pub fn content(&self, coord: CellCoord) -> Option<&CellContent> {
        self.cells.get(&coord)
    }

    /// Raw text as entered for a formula cell, display text otherwise.
    pub fn raw_text(&self, coord: CellCoord) -> String {
        match self.cells.get(&coord) {
            Some(CellContent::Formula { source, .. }) => source.clone(),
            Some(CellContent::Literal(value)) => value.display_text(),
            None => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Evaluates one cell; absent cells are blank.
    pub fn get_value(&self, coord: CellCoord) -> Value {
        let mut visited = BTreeSet::new();
        self.eval_cell(coord, &mut visited)
    }

    /// Coordinates this cell reads, ranges expanded. Empty for literals.
    pub fn dependencies(&self, coord: CellCoord) -> Vec<CellCoord> {
        self.deps
            .get(&coord)
            .map(|refs| refs.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Formula cells that read the given coordinate.
    pub fn dependents(&self, coord: CellCoord) -> Vec<CellCoord> {
        self.deps
            .iter()
            .filter(|(_, refs)| refs.contains(&coord))
            .map(|(cell, _)| *cell)
            .collect()
    }

    /// Evaluates every formula cell, dependencies first.
    ///
    /// Cells on a cycle evaluate to the circular-reference sentinel; the
    /// rest of the sheet still recalculates.
    pub fn recalculate_all(&self) -> Vec<(CellCoord, Value)> {
        let mut order = Vec::new();
        let mut done = BTreeSet::new();
        for coord in self.deps.keys() {
            self.visit_in_order(*coord, &mut done, &mut order);
        }
        debug!(
            "event=recalculate module=formula status=ok cells={}",
            order.len()
        );
        order
            .into_iter()
            .map(|coord| (coord, self.get_value(coord)))
            .collect()
    }

    fn visit_in_order(
        &self,
        coord: CellCoord,
        done: &mut BTreeSet<CellCoord>,
        order: &mut Vec<CellCoord>,
    ) {
        if done.contains(&coord) {
            return;
        }
        done.insert(coord);
        if let Some(refs) = self.deps.get(&coord) {
            for dep in refs {
                self.visit_in_order(*dep, done, order);
            }
            order.push(coord);
        }
    }

    fn eval_cell(&self, coord: CellCoord, visited: &mut BTreeSet<CellCoord>) -> Value {
        if visited.contains(&coord) {
            return Value::Error(EvalErrorKind::CircularReference);
        }
        let result = match self.cells.get(&coord) {
            None => Value::Blank,
            Some(CellContent::Literal(value)) => value.clone(),
            Some(CellContent::Formula { parsed, .. }) => match parsed {
                Ok(expr) => {
                    visited.insert(coord);
                    let value = self.eval_expr(expr, visited);
                    visited.remove(&coord);
                    value
                }
                Err(kind) => Value::Error(kind.clone()),
            },
        };
        result
    }

    fn eval_expr(&self, expr: &Expr, visited: &mut BTreeSet<CellCoord>) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(text) => Value::Text(text.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Ref(coord) => self.eval_cell(*coord, visited),
            Expr::Range(range) => Value::Error(EvalErrorKind::InvalidValue(format!(
                "range {range} used outside a function argument"
            ))),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match self.eval_expr(operand, visited).as_number() {
                Ok(n) => Value::Number(-n),
                Err(kind) => Value::Error(kind),
            },
            Expr::Binary { op, lhs, rhs } => {
                let left = self.eval_expr(lhs, visited);
                let right = self.eval_expr(rhs, visited);
                eval_binary(*op, &left, &right)
            }
            Expr::Call { name, args } => {
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(match arg {
                        Expr::Range(range) => Arg::Many(
                            range
                                .cells()
                                .map(|cell| self.eval_cell(cell, visited))
                                .collect(),
                        ),
                        other => Arg::Scalar(self.eval_expr(other, visited)),
                    });
                }
                apply(*name, &evaluated)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            let lhs = match left.as_number() {
                Ok(n) => n,
                Err(kind) => return Value::Error(kind),
            };
            let rhs = match right.as_number() {
                Ok(n) => n,
                Err(kind) => return Value::Error(kind),
            };
            match op {
                BinaryOp::Add => Value::Number(lhs + rhs),
                BinaryOp::Sub => Value::Number(lhs - rhs),
                BinaryOp::Mul => Value::Number(lhs * rhs),
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        Value::Error(EvalErrorKind::DivideByZero)
                    } else {
                        Value::Number(lhs / rhs)
                    }
                }
                BinaryOp::Pow => Value::Number(lhs.powf(rhs)),
                _ => unreachable!(),
            }
        }
        BinaryOp::Concat => {
            if let Value::Error(kind) = left {
                return Value::Error(kind.clone());
            }
            if let Value::Error(kind) = right {
                return Value::Error(kind.clone());
            }
            Value::Text(format!("{}{}", left.display_text(), right.display_text()))
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            if let Value::Error(kind) = left {
                return Value::Error(kind.clone());
            }
            if let Value::Error(kind) = right {
                return Value::Error(kind.clone());
            }
            let ordering = compare_values(left, right);
            let outcome = match op {
                BinaryOp::Eq => ordering == std::cmp::Ordering::Equal,
                BinaryOp::Ne => ordering != std::cmp::Ordering::Equal,
                BinaryOp::Lt => ordering == std::cmp::Ordering::Less,
                BinaryOp::Le => ordering != std::cmp::Ordering::Greater,
                BinaryOp::Gt => ordering == std::cmp::Ordering::Greater,
                BinaryOp::Ge => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Value::Bool(outcome)
        }
    }
}

/// Compares numerically when both sides coerce to numbers, otherwise by
/// case-insensitive display text.
fn compare_values(left: &Value, right: &Value) -> std::cmp::Ordering {
    if let (Ok(lhs), Ok(rhs)) = (left.as_number(), right.as_number()) {
        return lhs.partial_cmp(&rhs).unwrap_or(std::cmp::Ordering::Equal);
    }
    left.display_text()
        .to_lowercase()
        .cmp(&right.display_text().to_lowercase())
}

fn parse_error_kind(err: ParseError) -> EvalErrorKind {
    match err {
        ParseError::UnknownFunction(name) => EvalErrorKind::UnknownFunction(name),
        // Oversized ranges render as a value error, not a parse error: the
        // formula is well-formed, the reference is just unusable.
        ParseError::RangeTooLarge(_) => EvalErrorKind::InvalidValue(err.to_string()),
        other => EvalErrorKind::Parse(other.to_string()),
    }
}
