//! Filter expression tree and its evaluation against JSON records.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value as Json;

use crate::pattern::LikePattern;
use crate::value::{stringify, Value};

/// Operators allowed in a comparison leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `=` loose equality
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `LIKE` pattern match
    Like,
    /// `IN` list membership
    In,
    /// `CONTAINS` array membership
    Contains,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Equal => write!(f, "="),
            ComparisonOperator::NotEqual => write!(f, "!="),
            ComparisonOperator::Less => write!(f, "<"),
            ComparisonOperator::LessOrEqual => write!(f, "<="),
            ComparisonOperator::Greater => write!(f, ">"),
            ComparisonOperator::GreaterOrEqual => write!(f, ">="),
            ComparisonOperator::Like => write!(f, "LIKE"),
            ComparisonOperator::In => write!(f, "IN"),
            ComparisonOperator::Contains => write!(f, "CONTAINS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

/// A leaf comparing one record attribute with a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    operator: ComparisonOperator,
    attribute: Vec<String>,
    value: Value,
    /// Compiled form of `value` for LIKE
    pattern: Option<LikePattern>,
}

impl Comparison {
    pub(crate) fn new(operator: ComparisonOperator, attribute: Vec<String>, value: Value) -> Self {
        Self {
            operator,
            attribute,
            value,
            pattern: None,
        }
    }

    pub(crate) fn like(attribute: Vec<String>, text: String, pattern: LikePattern) -> Self {
        Self {
            operator: ComparisonOperator::Like,
            attribute,
            value: Value::String(text),
            pattern: Some(pattern),
        }
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    /// Attribute path, one entry per dotted segment.
    pub fn attribute(&self) -> &[String] {
        &self.attribute
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn evaluate(&self, target: &Json, ctx: &mut EvalContext) -> bool {
        match resolve(target, &self.attribute) {
            Some(left) => self.test(left),
            None if ctx.lenient => {
                ctx.partial_match = true;
                true
            }
            // Nothing equals a missing attribute
            None => self.operator == ComparisonOperator::NotEqual,
        }
    }

    fn test(&self, left: &Json) -> bool {
        match self.operator {
            ComparisonOperator::Equal => self.value.loose_eq(left),
            ComparisonOperator::NotEqual => !self.value.loose_eq(left),
            ComparisonOperator::Less => self.value.ordering(left) == Some(Ordering::Less),
            ComparisonOperator::LessOrEqual => matches!(
                self.value.ordering(left),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ComparisonOperator::Greater => self.value.ordering(left) == Some(Ordering::Greater),
            ComparisonOperator::GreaterOrEqual => matches!(
                self.value.ordering(left),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ComparisonOperator::Like => match (&self.pattern, stringify(left)) {
                (Some(pattern), Some(text)) => pattern.is_match(&text),
                _ => false,
            },
            ComparisonOperator::In => match &self.value {
                Value::List(items) => items.iter().any(|item| item.strict_eq(left)),
                single => single.strict_eq(left),
            },
            ComparisonOperator::Contains => match left {
                Json::Array(items) => items.iter().any(|item| self.value.strict_eq(item)),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.attribute.join("."),
            self.operator,
            self.value
        )
    }
}

/// A filter expression.
///
/// A freshly parsed tree has no `Logical` node with a direct child using the
/// same operator; the builder flattens such chains. [`Query::merge`] appends
/// without re-flattening.
///
/// [`Query::merge`]: super::Query::merge
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison(Comparison),
    Logical {
        operator: LogicalOperator,
        children: Vec<Expression>,
    },
}

/// Evaluation state threaded through one walk of the tree.
#[derive(Debug, Default)]
pub(crate) struct EvalContext {
    /// Missing attributes pass instead of failing
    pub lenient: bool,
    /// Set when a lenient leaf passed on a missing attribute
    pub partial_match: bool,
}

impl Expression {
    /// The empty AND, which matches every record.
    pub fn match_all() -> Self {
        Expression::Logical {
            operator: LogicalOperator::And,
            children: Vec::new(),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(
            self,
            Expression::Logical { operator: LogicalOperator::And, children } if children.is_empty()
        )
    }

    /// Evaluate against a record.
    ///
    /// An empty AND is true and an empty OR is false.
    pub fn eval(&self, target: &Json) -> bool {
        self.evaluate(target, &mut EvalContext::default())
    }

    pub(crate) fn evaluate(&self, target: &Json, ctx: &mut EvalContext) -> bool {
        match self {
            Expression::Comparison(c) => c.evaluate(target, ctx),
            Expression::Logical {
                operator: LogicalOperator::And,
                children,
            } => children.iter().all(|child| child.evaluate(target, ctx)),
            Expression::Logical {
                operator: LogicalOperator::Or,
                children,
            } => children.iter().any(|child| child.evaluate(target, ctx)),
        }
    }

    /// Render as query text. Nested logical nodes are parenthesized.
    pub fn serialize(&self, depth: usize) -> String {
        match self {
            Expression::Comparison(c) => c.to_string(),
            Expression::Logical { operator, children } => {
                let separator = format!(" {} ", operator);
                let joined = children
                    .iter()
                    .map(|child| child.serialize(depth + 1))
                    .collect::<Vec<_>>()
                    .join(&separator);
                if depth == 0 {
                    joined
                } else {
                    format!("( {} )", joined)
                }
            }
        }
    }

    /// Dotted attribute paths referenced by the expression, in order of
    /// appearance and without duplicates.
    pub fn attributes(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes(&self, out: &mut Vec<String>) {
        match self {
            Expression::Comparison(c) => {
                let path = c.attribute.join(".");
                if !out.contains(&path) {
                    out.push(path);
                }
            }
            Expression::Logical { children, .. } => {
                for child in children {
                    child.collect_attributes(out);
                }
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serialize(0))
    }
}

/// Follow an attribute path through nested objects (and array indices).
///
/// Returns `None` as soon as a segment is absent.
fn resolve<'a>(target: &'a Json, path: &[String]) -> Option<&'a Json> {
    path.iter().try_fold(target, |current, segment| match current {
        Json::Object(map) => map.get(segment),
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
