//! Query language for filtering, ordering, paginating and patching records.
//!
//! # Syntax Overview
//!
//! Full pattern: `[expression] [ORDER BY ...] [LIMIT n] [OFFSET "token"]`
//!
//! - **Comparisons**: `attr = 1`, `a.b != 'x'`, `<`, `<=`, `>`, `>=`
//! - **Patterns**: `name LIKE 'J_n%'`
//! - **Membership**: `status IN ['open', 'done']`, `tags CONTAINS 'rust'`
//! - **Logic**: `AND` binds tighter than `OR`; parentheses group
//! - **Ordering**: `ORDER BY created DESC, name`
//! - **Pagination**: `LIMIT 100 OFFSET "continuation-token"`
//!
//! Keywords are upper case. Literals are `TRUE`/`FALSE`, integers, and
//! single- or double-quoted strings.

mod builder;
mod expression;
mod facade;
mod lexer;
mod parser;
mod partial;
mod setter;

pub use expression::{Comparison, ComparisonOperator, Expression, LogicalOperator};
pub use facade::{prepend_condition, unsanitize, Direction, OrderBy, Query};
pub use partial::{PartialMatch, PartialQuery};
pub use setter::SetterQuery;
