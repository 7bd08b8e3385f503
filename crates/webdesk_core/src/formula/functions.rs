//! Built-in formula function implementations.
//!
//! # Responsibility
//! - Evaluate every supported function over already-evaluated arguments.
//!
//! # Invariants
//! - Functions never panic; every failure becomes a `Value::Error`.
//! - Error arguments propagate, except where a function exists to absorb
//!   them (`IFERROR`) or merely tally occupancy (`COUNT`).

use crate::formula::parser::FunctionName;
use crate::formula::value::{EvalErrorKind, Value};
use chrono::{Datelike, Local, NaiveDate};

/// One evaluated argument: a scalar value or a flattened range.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Scalar(Value),
    Many(Vec<Value>),
}

impl Arg {
    fn values(&self) -> &[Value] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    fn scalar(&self, name: FunctionName) -> Result<&Value, EvalErrorKind> {
        match self {
            Self::Scalar(value) => Ok(value),
            Self::Many(_) => Err(EvalErrorKind::InvalidValue(format!(
                "{} does not accept a range argument here",
                name.as_str()
            ))),
        }
    }
}

/// Applies a function to evaluated arguments.
pub fn apply(name: FunctionName, args: &[Arg]) -> Value {
    match apply_inner(name, args) {
        Ok(value) => value,
        Err(kind) => Value::Error(kind),
    }
}

fn apply_inner(name: FunctionName, args: &[Arg]) -> Result<Value, EvalErrorKind> {
    match name {
        FunctionName::Sum => {
            let numbers = numeric_values(args)?;
            Ok(Value::Number(numbers.iter().sum()))
        }
        FunctionName::Average => {
            let numbers = numeric_values(args)?;
            if numbers.is_empty() {
                return Err(EvalErrorKind::DivideByZero);
            }
            Ok(Value::Number(
                numbers.iter().sum::<f64>() / numbers.len() as f64,
            ))
        }
        FunctionName::Min => {
            let numbers = numeric_values(args)?;
            Ok(Value::Number(
                numbers.iter().copied().fold(f64::INFINITY, f64::min).min_finite(),
            ))
        }
        FunctionName::Max => {
            let numbers = numeric_values(args)?;
            Ok(Value::Number(
                numbers
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max)
                    .max_finite(),
            ))
        }
        FunctionName::Count => {
            // COUNT measures occupancy: every non-blank value counts,
            // text and error values included.
            let count = args
                .iter()
                .flat_map(|arg| arg.values())
                .filter(|value| !value.is_blank())
                .count();
            Ok(Value::Number(count as f64))
        }
        FunctionName::Abs => {
            arity(name, args, 1, 1)?;
            let n = args[0].scalar(name)?.as_number()?;
            Ok(Value::Number(n.abs()))
        }
        FunctionName::Round => {
            arity(name, args, 1, 2)?;
            let n = args[0].scalar(name)?.as_number()?;
            let digits = match args.get(1) {
                Some(arg) => arg.scalar(name)?.as_number()?.trunc() as i32,
                None => 0,
            };
            let factor = 10f64.powi(digits);
            Ok(Value::Number((n * factor).round() / factor))
        }
        FunctionName::Power => {
            arity(name, args, 2, 2)?;
            let base = args[0].scalar(name)?.as_number()?;
            let exponent = args[1].scalar(name)?.as_number()?;
            Ok(Value::Number(base.powf(exponent)))
        }
        FunctionName::Sqrt => {
            arity(name, args, 1, 1)?;
            let n = args[0].scalar(name)?.as_number()?;
            if n < 0.0 {
                return Err(EvalErrorKind::InvalidValue(
                    "SQRT of a negative number".to_string(),
                ));
            }
            Ok(Value::Number(n.sqrt()))
        }
        FunctionName::Concatenate => {
            let mut out = String::new();
            for value in args.iter().flat_map(|arg| arg.values()) {
                if let Value::Error(kind) = value {
                    return Err(kind.clone());
                }
                out.push_str(&value.display_text());
            }
            Ok(Value::Text(out))
        }
        FunctionName::Upper => {
            arity(name, args, 1, 1)?;
            Ok(Value::Text(text_of(args[0].scalar(name)?)?.to_uppercase()))
        }
        FunctionName::Lower => {
            arity(name, args, 1, 1)?;
            Ok(Value::Text(text_of(args[0].scalar(name)?)?.to_lowercase()))
        }
        FunctionName::Left => {
            arity(name, args, 1, 2)?;
            let text = text_of(args[0].scalar(name)?)?;
            let take = char_count(name, args.get(1))?;
            Ok(Value::Text(text.chars().take(take).collect()))
        }
        FunctionName::Right => {
            arity(name, args, 1, 2)?;
            let text = text_of(args[0].scalar(name)?)?;
            let take = char_count(name, args.get(1))?;
            let total = text.chars().count();
            Ok(Value::Text(
                text.chars().skip(total.saturating_sub(take)).collect(),
            ))
        }
        FunctionName::Substitute => {
            arity(name, args, 3, 3)?;
            let text = text_of(args[0].scalar(name)?)?;
            let from = text_of(args[1].scalar(name)?)?;
            let to = text_of(args[2].scalar(name)?)?;
            if from.is_empty() {
                return Ok(Value::Text(text));
            }
            Ok(Value::Text(text.replace(&from, &to)))
        }
        FunctionName::Len => {
            arity(name, args, 1, 1)?;
            let text = text_of(args[0].scalar(name)?)?;
            Ok(Value::Number(text.chars().count() as f64))
        }
        FunctionName::Today => {
            arity(name, args, 0, 0)?;
            Ok(Value::Text(Local::now().format("%Y-%m-%d").to_string()))
        }
        FunctionName::Now => {
            arity(name, args, 0, 0)?;
            Ok(Value::Text(
                Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ))
        }
        FunctionName::Day => {
            arity(name, args, 1, 1)?;
            Ok(Value::Number(f64::from(
                date_of(args[0].scalar(name)?)?.day(),
            )))
        }
        FunctionName::Month => {
            arity(name, args, 1, 1)?;
            Ok(Value::Number(f64::from(
                date_of(args[0].scalar(name)?)?.month(),
            )))
        }
        FunctionName::Year => {
            arity(name, args, 1, 1)?;
            Ok(Value::Number(f64::from(
                date_of(args[0].scalar(name)?)?.year(),
            )))
        }
        FunctionName::If => {
            arity(name, args, 2, 3)?;
            let condition = args[0].scalar(name)?.as_bool()?;
            if condition {
                Ok(args[1].scalar(name)?.clone())
            } else {
                match args.get(2) {
                    Some(arg) => Ok(arg.scalar(name)?.clone()),
                    None => Ok(Value::Bool(false)),
                }
            }
        }
        FunctionName::And => {
            arity(name, args, 1, usize::MAX)?;
            for value in args.iter().flat_map(|arg| arg.values()) {
                if !value.as_bool()? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        FunctionName::Or => {
            arity(name, args, 1, usize::MAX)?;
            for value in args.iter().flat_map(|arg| arg.values()) {
                if value.as_bool()? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        FunctionName::Not => {
            arity(name, args, 1, 1)?;
            Ok(Value::Bool(!args[0].scalar(name)?.as_bool()?))
        }
        FunctionName::IfError => {
            arity(name, args, 2, 2)?;
            let value = args[0].scalar(name)?;
            if value.is_error() {
                Ok(args[1].scalar(name)?.clone())
            } else {
                Ok(value.clone())
            }
        }
    }
}

fn arity(
    name: FunctionName,
    args: &[Arg],
    min: usize,
    max: usize,
) -> Result<(), EvalErrorKind> {
    if args.len() < min || args.len() > max {
        return Err(EvalErrorKind::InvalidValue(format!(
            "{} called with {} argument(s)",
            name.as_str(),
            args.len()
        )));
    }
    Ok(())
}

/// Collects numeric inputs for aggregates.
///
/// Errors propagate; text, booleans and blanks are skipped.
fn numeric_values(args: &[Arg]) -> Result<Vec<f64>, EvalErrorKind> {
    let mut numbers = Vec::new();
    for value in args.iter().flat_map(|arg| arg.values()) {
        match value {
            Value::Number(n) => numbers.push(*n),
            Value::Error(kind) => return Err(kind.clone()),
            Value::Text(_) | Value::Bool(_) | Value::Blank => {}
        }
    }
    Ok(numbers)
}

fn text_of(value: &Value) -> Result<String, EvalErrorKind> {
    if let Value::Error(kind) = value {
        return Err(kind.clone());
    }
    Ok(value.display_text())
}

fn char_count(name: FunctionName, arg: Option<&Arg>) -> Result<usize, EvalErrorKind> {
    let Some(arg) = arg else {
        return Ok(1);
    };
    let n = arg.scalar(name)?.as_number()?;
    if n < 0.0 {
        return Err(EvalErrorKind::InvalidValue(format!(
            "{} count must not be negative",
            name.as_str()
        )));
    }
    Ok(n.trunc() as usize)
}

/// Parses a date out of a value, accepting a `YYYY-MM-DD` prefix so both
/// TODAY() and NOW() output feed the date accessors.
fn date_of(value: &Value) -> Result<NaiveDate, EvalErrorKind> {
    let text = text_of(value)?;
    let prefix: String = text.chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, "%Y-%m-%d")
        .map_err(|_| EvalErrorKind::InvalidValue(format!("`{text}` is not a date")))
}

trait FiniteDefault {
    fn min_finite(self) -> f64;
    fn max_finite(self) -> f64;
}

impl FiniteDefault for f64 {
    /// Empty MIN folds to +inf; report 0 instead.
    fn min_finite(self) -> f64 {
        if self == f64::INFINITY {
            0.0
        } else {
            self
        }
    }

    /// Empty MAX folds to -inf; report 0 instead.
    fn max_finite(self) -> f64 {
        if self == f64::NEG_INFINITY {
            0.0
        } else {
            self
        }
    }
}
