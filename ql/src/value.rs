//! Literal values and how they compare against JSON record members.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Number, Value as Json};

/// A literal from query text.
///
/// Lists only appear on the right-hand side of `IN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Convert to the JSON value a setter writes into a record.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number(Number::from(*i)),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /// Loose equality used by `=` and `!=`.
    ///
    /// Numbers and numeric strings compare by numeric value; otherwise both
    /// sides must have the same type.
    pub(crate) fn loose_eq(&self, left: &Json) -> bool {
        match (left, self) {
            (Json::Number(n), Value::String(s)) => {
                match (n.as_f64(), parse_number(s)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Json::String(s), Value::Int(i)) => parse_number(s) == Some(*i as f64),
            _ => self.strict_eq(left),
        }
    }

    /// Same-type equality used for `IN` and `CONTAINS` membership.
    pub(crate) fn strict_eq(&self, left: &Json) -> bool {
        match (left, self) {
            (Json::Bool(a), Value::Bool(b)) => a == b,
            (Json::Number(n), Value::Int(i)) => compare_number(n, *i) == Some(Ordering::Equal),
            (Json::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// Natural ordering of a record member relative to this literal.
    ///
    /// Returns `None` for mismatched types, which every ordering operator
    /// treats as a non-match.
    pub(crate) fn ordering(&self, left: &Json) -> Option<Ordering> {
        match (left, self) {
            (Json::Number(n), Value::Int(i)) => compare_number(n, *i),
            (Json::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
            (Json::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Single quotes only when double quotes would not survive a reparse
            Value::String(s) if s.contains('"') && !s.contains('\'') => write!(f, "'{}'", s),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Int(i) => write!(f, "{}", i),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Render a record member as text for `LIKE` matching.
///
/// Missing members, `null` and objects have no text form and never match.
pub(crate) fn stringify(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(number_text(n)),
        Json::Bool(b) => Some(b.to_string()),
        Json::Array(items) => Some(
            items
                .iter()
                .map(|item| stringify(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Json::Null | Json::Object(_) => None,
    }
}

/// Integral floats print without a fraction, so `12.0` reads as `12`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            // Also folds -0 into 0
            format!("{}", f + 0.0)
        }
        _ => n.to_string(),
    }
}

fn compare_number(n: &Number, other: i64) -> Option<Ordering> {
    if let Some(a) = n.as_i64() {
        Some(a.cmp(&other))
    } else if n.is_u64() {
        // Only values above i64::MAX fail as_i64
        Some(Ordering::Greater)
    } else {
        n.as_f64()?.partial_cmp(&(other as f64))
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| !f.is_nan())
}
