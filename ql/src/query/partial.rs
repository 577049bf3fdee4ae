//! Lenient evaluation for pre-filtering incomplete records.
//!
//! A storage layer often holds only some attributes of a record (an index
//! entry, a projection). Evaluated leniently, a comparison on an attribute
//! the record does not have passes and the outcome is flagged as partial.
//! A partial match must be confirmed with a strict evaluation once the full
//! record is available.

use std::cell::Cell;

use serde_json::Value as Json;

use super::expression::EvalContext;
use super::facade::Query;
use crate::{Config, Result};

/// Outcome of a lenient evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialMatch {
    pub matched: bool,
    /// At least one comparison passed only because its attribute was missing
    pub partial: bool,
}

/// A query that can be evaluated leniently.
///
/// Keeps the partial-match flag of the last lenient [`PartialQuery::eval`].
/// The flag is not synchronized; share an instance across threads only
/// behind external locking.
#[derive(Debug, Clone)]
pub struct PartialQuery {
    query: Query,
    partial_match: Cell<bool>,
}

impl PartialQuery {
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, &Config::default())
    }

    pub fn parse_with(input: &str, config: &Config) -> Result<Self> {
        Ok(Query::parse_with(input, config)?.into())
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Evaluate the query.
    ///
    /// With `partial` set, missing attributes pass and the partial-match
    /// flag is reset then updated. Without it, evaluation is exact and the
    /// flag is left alone.
    pub fn eval(&self, target: &Json, partial: bool) -> bool {
        if !partial {
            return self.query.eval(target);
        }
        self.partial_match.set(false);
        let outcome = self.eval_partial(target);
        self.partial_match.set(outcome.partial);
        outcome.matched
    }

    /// Whether the last lenient evaluation relied on a missing attribute.
    pub fn was_partial_match(&self) -> bool {
        self.partial_match.get()
    }

    /// Lenient evaluation without touching the stored flag.
    pub fn eval_partial(&self, target: &Json) -> PartialMatch {
        let mut ctx = EvalContext {
            lenient: true,
            partial_match: false,
        };
        let matched = self.query.filter().evaluate(target, &mut ctx);
        PartialMatch {
            matched,
            partial: ctx.partial_match,
        }
    }
}

impl From<Query> for PartialQuery {
    fn from(query: Query) -> Self {
        Self {
            query,
            partial_match: Cell::new(false),
        }
    }
}
