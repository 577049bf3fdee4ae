//! Turns a parse tree into a [`Query`].
//!
//! Same-operator chains are flattened as the tree is built: `a AND (b AND c)`
//! becomes a single AND with three children, while `a AND (b OR c)` keeps the
//! OR as one child.

use super::expression::{Comparison, ComparisonOperator, Expression, LogicalOperator};
use super::facade::{Direction, OrderBy, Query};
use super::parser::{Clause, Literal, LiteralKind, Node, Statement};
use crate::pattern::LikePattern;
use crate::value::Value;
use crate::{Error, Result};

/// Build a query from a parsed statement.
///
/// `input` is the original text, used for error messages.
pub(crate) fn build(statement: Statement, input: &str) -> Result<Query> {
    let filter = match statement.expression {
        Some(node) => build_expression(strip_parens(node), input)?,
        None => Expression::match_all(),
    };

    let query = statement.clauses.into_iter().try_fold(
        Query::from_filter(filter),
        |mut query, clause| -> Result<Query> {
            match clause {
                Clause::OrderBy(fields) => {
                    query.order_by = Some(
                        fields
                            .into_iter()
                            .map(|f| OrderBy {
                                field: f.field,
                                direction: f.direction.unwrap_or(Direction::Asc),
                            })
                            .collect(),
                    );
                }
                Clause::Limit(literal) => query.limit = Some(parse_integer(&literal, input)?),
                Clause::Offset(literal) => {
                    query.continuation_token = Some(unquote(&literal.text).to_string())
                }
            }
            Ok(query)
        },
    )?;

    Ok(query)
}

fn build_expression(node: Node, input: &str) -> Result<Expression> {
    let comparison = match node {
        Node::Paren(inner) => return build_expression(strip_parens(*inner), input),
        Node::And(nodes) => {
            return Ok(Expression::Logical {
                operator: LogicalOperator::And,
                children: flatten(LogicalOperator::And, nodes, input)?,
            });
        }
        Node::Or(nodes) => {
            return Ok(Expression::Logical {
                operator: LogicalOperator::Or,
                children: flatten(LogicalOperator::Or, nodes, input)?,
            });
        }
        Node::Like { ident, pattern } => {
            let text = unquote(&pattern.text).to_string();
            let compiled = LikePattern::compile(&text).map_err(|e| {
                Error::syntax(
                    input,
                    format!("column {}: invalid LIKE pattern: {}", pattern.column, e),
                )
            })?;
            Comparison::like(attribute_path(&ident), text, compiled)
        }
        Node::In { ident, values } => {
            let items = values
                .iter()
                .map(|literal| parse_literal(literal, input))
                .collect::<Result<Vec<_>>>()?;
            Comparison::new(
                ComparisonOperator::In,
                attribute_path(&ident),
                Value::List(items),
            )
        }
        Node::Contains { ident, value } => Comparison::new(
            ComparisonOperator::Contains,
            attribute_path(&ident),
            parse_literal(&value, input)?,
        ),
        Node::Compare { ident, op, value } => {
            Comparison::new(op, attribute_path(&ident), parse_literal(&value, input)?)
        }
    };
    Ok(Expression::Comparison(comparison))
}

/// Collect the children of a logical node.
///
/// Each operand loses its parentheses; an operand using the same operator
/// has its own children inlined, anything else becomes one opaque child.
/// Uses an explicit stack so nested parenthesized chains do not recurse.
fn flatten(operator: LogicalOperator, nodes: Vec<Node>, input: &str) -> Result<Vec<Expression>> {
    let mut children = Vec::new();
    let mut pending: Vec<Node> = nodes.into_iter().rev().collect();

    while let Some(node) = pending.pop() {
        match (operator, strip_parens(node)) {
            (LogicalOperator::And, Node::And(inner)) | (LogicalOperator::Or, Node::Or(inner)) => {
                pending.extend(inner.into_iter().rev());
            }
            (_, other) => children.push(build_expression(other, input)?),
        }
    }

    Ok(children)
}

fn strip_parens(mut node: Node) -> Node {
    while let Node::Paren(inner) = node {
        node = *inner;
    }
    node
}

fn attribute_path(ident: &str) -> Vec<String> {
    ident.split('.').map(str::to_string).collect()
}

fn parse_literal(literal: &Literal, input: &str) -> Result<Value> {
    match literal.kind {
        LiteralKind::Integer => parse_integer(literal, input).map(Value::Int),
        LiteralKind::Boolean => Ok(Value::Bool(literal.text == "TRUE")),
        LiteralKind::String => Ok(Value::String(unquote(&literal.text).to_string())),
    }
}

fn parse_integer(literal: &Literal, input: &str) -> Result<i64> {
    literal.text.parse::<i64>().map_err(|e| {
        Error::syntax(
            input,
            format!(
                "column {}: invalid integer '{}': {}",
                literal.column, literal.text, e
            ),
        )
    })
}

/// Drop the first and last character (the quote delimiters).
fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}
