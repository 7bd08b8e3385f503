//! Typed cell values and evaluation error sentinels.
//!
//! # Responsibility
//! - Define the value domain produced by formula evaluation.
//! - Provide the coercions shared by operators and functions.
//!
//! # Invariants
//! - Evaluation failures are carried as `Value::Error`, rendered as sentinel
//!   display strings; no error type crosses the engine boundary as `Err`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Evaluation failure kinds, rendered as spreadsheet-style sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum EvalErrorKind {
    /// A cell participates in a reference cycle.
    CircularReference,
    /// Division by zero, including division by a blank cell.
    DivideByZero,
    /// A formula names a function outside the supported set.
    UnknownFunction(String),
    /// Operand or argument has an unusable type or arity.
    InvalidValue(String),
    /// The formula text could not be parsed.
    Parse(String),
}

impl EvalErrorKind {
    /// Sentinel display marker for this error kind.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::CircularReference => "#CYCLE!",
            Self::DivideByZero => "#DIV/0!",
            Self::UnknownFunction(_) => "#NAME?",
            Self::InvalidValue(_) => "#VALUE!",
            Self::Parse(_) => "#PARSE!",
        }
    }
}

impl Display for EvalErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sentinel())
    }
}

/// One evaluated cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Blank,
    Error(EvalErrorKind),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Coerces to a number for arithmetic.
    ///
    /// Blank is 0, booleans are 0/1, numeric text parses; other text fails.
    pub fn as_number(&self) -> Result<f64, EvalErrorKind> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Blank => Ok(0.0),
            Self::Bool(true) => Ok(1.0),
            Self::Bool(false) => Ok(0.0),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| EvalErrorKind::InvalidValue(format!("`{text}` is not numeric"))),
            Self::Error(kind) => Err(kind.clone()),
        }
    }

    /// Coerces to a condition for logical functions.
    ///
    /// Numbers are truthy when non-zero; blank is false; text never coerces.
    pub fn as_bool(&self) -> Result<bool, EvalErrorKind> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Number(n) => Ok(*n != 0.0),
            Self::Blank => Ok(false),
            Self::Text(text) => Err(EvalErrorKind::InvalidValue(format!(
                "`{text}` is not a condition"
            ))),
            Self::Error(kind) => Err(kind.clone()),
        }
    }

    /// Renders the value the way a cell displays it.
    pub fn display_text(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::Text(text) => text.clone(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Blank => String::new(),
            Self::Error(kind) => kind.sentinel().to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
