//! The parsed query: filter, ordering and pagination.

use std::fmt;
use std::str::FromStr;

use serde_json::Value as Json;

use super::builder;
use super::expression::{Expression, LogicalOperator};
use super::parser;
use crate::value::Value;
use crate::{Config, Error, Result};

/// Sort direction of an ORDER BY field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// One ORDER BY field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// A parsed query.
///
/// Only [`Query::merge`] changes a query after it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(crate) filter: Expression,
    pub(crate) limit: Option<i64>,
    /// Opaque pagination cursor from `OFFSET "..."`
    pub(crate) continuation_token: Option<String>,
    pub(crate) order_by: Option<Vec<OrderBy>>,
}

impl Query {
    /// Parse query text with the default configuration.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, &Config::default())
    }

    /// Parse query text.
    pub fn parse_with(input: &str, config: &Config) -> Result<Self> {
        let statement = parser::parse(input, config)?;
        let query = builder::build(statement, input)?;
        log::debug!("parsed query {:?} as {:?}", input, query.to_string());
        Ok(query)
    }

    /// The empty query: no condition, no ordering, no pagination.
    pub fn match_all() -> Self {
        Self::from_filter(Expression::match_all())
    }

    pub(crate) fn from_filter(filter: Expression) -> Self {
        Self {
            filter,
            limit: None,
            continuation_token: None,
            order_by: None,
        }
    }

    /// Parse a user query and AND a mandatory condition onto it.
    ///
    /// LIMIT, OFFSET and ORDER BY in `condition` take precedence over the
    /// user's.
    pub fn prepend(user_query: &str, condition: &str) -> Result<Self> {
        let mut query = Self::parse(user_query)?;
        query.merge(Self::parse(condition)?, LogicalOperator::And);
        Ok(query)
    }

    pub fn filter(&self) -> &Expression {
        &self.filter
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    pub fn order_by(&self) -> Option<&[OrderBy]> {
        self.order_by.as_deref()
    }

    /// Evaluate the filter against a record.
    pub fn eval(&self, target: &Json) -> bool {
        self.filter.eval(target)
    }

    /// False only for the empty AND.
    ///
    /// An empty OR still counts as a condition: it matches nothing.
    pub fn has_condition(&self) -> bool {
        !self.filter.is_match_all()
    }

    /// Merge another query into this one.
    ///
    /// The filters are combined with `combinator`. `other` overrides the
    /// limit and continuation token when it sets them, and its ORDER BY
    /// fields go first.
    pub fn merge(&mut self, other: Query, combinator: LogicalOperator) {
        log::debug!(
            "merging {:?} into {:?} with {}",
            other.to_string(),
            self.to_string(),
            combinator
        );

        if other.has_condition() {
            let appendable = matches!(
                &self.filter,
                Expression::Logical { operator, .. } if *operator == combinator
            );
            if appendable {
                if let Expression::Logical { children, .. } = &mut self.filter {
                    children.push(other.filter);
                }
            } else {
                let current = std::mem::replace(&mut self.filter, Expression::match_all());
                self.filter = Expression::Logical {
                    operator: combinator,
                    children: vec![current, other.filter],
                };
            }
        }

        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.continuation_token.is_some() {
            self.continuation_token = other.continuation_token;
        }

        if let Some(theirs) = other.order_by {
            self.order_by = Some(match self.order_by.take() {
                Some(mine) => {
                    let kept: Vec<OrderBy> = mine
                        .into_iter()
                        .filter(|o| !theirs.iter().any(|t| t.field == o.field))
                        .collect();
                    let mut merged = theirs;
                    merged.extend(kept);
                    merged
                }
                None => theirs,
            });
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::match_all()
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Canonical query text.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.filter.serialize(0);

        if let Some(order_by) = &self.order_by {
            let fields = order_by
                .iter()
                .map(OrderBy::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(" ORDER BY {}", fields));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            out.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(token) = &self.continuation_token {
            out.push_str(&format!(" OFFSET {}", Value::String(token.clone())));
        }

        write!(f, "{}", out.trim())
    }
}

/// Parse `user_query` and AND `condition` onto it. See [`Query::prepend`].
pub fn prepend_condition(user_query: &str, condition: &str) -> Result<Query> {
    Query::prepend(user_query, condition)
}

/// Undo the HTML escaping of `<` and `>` some clients apply to query text.
pub fn unsanitize(input: &str) -> String {
    input.replace("&lt;", "<").replace("&gt;", ">")
}
