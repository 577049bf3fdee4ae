//! Assignment patches written in query syntax.
//!
//! `status = 'done' AND meta.retries = 0` sets two attributes. Only `=`
//! leaves joined by AND are accepted.

use serde_json::{Map, Value as Json};

use super::expression::{ComparisonOperator, Expression, LogicalOperator};
use super::facade::Query;
use crate::{Config, Error, Result};

const ASSIGNMENT_ONLY: &str = "Set Expression can only contain And and assignment expression '='";

/// A validated assignment patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SetterQuery {
    query: Query,
    config: Config,
}

impl SetterQuery {
    /// Parse and validate a patch with the default configuration.
    pub fn new(input: &str) -> Result<Self> {
        Self::with_config(input, &Config::default())
    }

    /// Parse and validate a patch.
    ///
    /// Fails with a syntax error when the text contains OR or any operator
    /// other than `=`.
    pub fn with_config(input: &str, config: &Config) -> Result<Self> {
        let query = Query::parse_with(input, config)?;
        if !is_assignment_only(query.filter()) {
            return Err(Error::syntax(input, ASSIGNMENT_ONLY));
        }
        Ok(Self {
            query,
            config: config.clone(),
        })
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Apply every assignment to `target`, creating nested objects as needed.
    ///
    /// Paths through a reserved segment are skipped, as are paths whose
    /// intermediate member holds a scalar or an array.
    pub fn apply(&self, target: &mut Json) {
        self.apply_expression(self.query.filter(), target);
    }

    /// Same as [`SetterQuery::apply`].
    pub fn eval(&self, target: &mut Json) {
        self.apply(target);
    }

    fn apply_expression(&self, expression: &Expression, target: &mut Json) {
        match expression {
            Expression::Comparison(c) => self.assign(target, c.attribute(), c.value().to_json()),
            Expression::Logical { children, .. } => {
                for child in children {
                    self.apply_expression(child, target);
                }
            }
        }
    }

    fn assign(&self, target: &mut Json, attribute: &[String], value: Json) {
        if let Some(segment) = attribute
            .iter()
            .find(|s| self.config.is_reserved(s))
        {
            log::debug!(
                "skipping assignment to {}: reserved segment {:?}",
                attribute.join("."),
                segment
            );
            return;
        }

        let Some((last, parents)) = attribute.split_last() else {
            return;
        };

        let mut current = target;
        for segment in parents {
            if current.is_null() {
                *current = Json::Object(Map::new());
            }
            current = match current {
                Json::Object(map) => map.entry(segment.clone()).or_insert(Json::Null),
                _ => {
                    log::debug!(
                        "skipping assignment to {}: parent of {} is not an object",
                        attribute.join("."),
                        segment
                    );
                    return;
                }
            };
        }

        if current.is_null() {
            *current = Json::Object(Map::new());
        }
        match current {
            Json::Object(map) => {
                map.insert(last.clone(), value);
            }
            _ => log::debug!(
                "skipping assignment to {}: parent is not an object",
                attribute.join(".")
            ),
        }
    }
}

fn is_assignment_only(expression: &Expression) -> bool {
    match expression {
        Expression::Comparison(c) => c.operator() == ComparisonOperator::Equal,
        Expression::Logical {
            operator: LogicalOperator::And,
            children,
        } => children.iter().all(is_assignment_only),
        Expression::Logical {
            operator: LogicalOperator::Or,
            ..
        } => false,
    }
}
