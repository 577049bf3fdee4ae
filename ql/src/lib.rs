//! QL: a small query language for JSON records.
//!
//! One grammar selects, orders and paginates records, and expresses
//! assignment patches. See [`query`] for the syntax.

pub mod config;
pub mod error;
pub mod pattern;
pub mod query;
pub mod value;

pub use config::Config;
pub use error::{Error, Result};
pub use pattern::{like_to_regex, LikePattern};
pub use query::{
    prepend_condition, unsanitize, Comparison, ComparisonOperator, Direction, Expression,
    LogicalOperator, OrderBy, PartialMatch, PartialQuery, Query, SetterQuery,
};
pub use value::Value;
