//! Recursive descent parser producing the parse tree for one statement.
//!
//! ```text
//! query        := expression? orderClause? limitClause? offsetClause? EOF
//! expression   := ident LIKE string
//!               | ident IN '[' value (',' value)* ']'
//!               | ident CONTAINS string
//!               | ident compareOp value
//!               | '(' expression ')'
//!               | expression AND expression
//!               | expression OR expression
//! orderClause  := ORDER BY ident (ASC|DESC)? (',' ident (ASC|DESC)?)*
//! limitClause  := LIMIT integer
//! offsetClause := OFFSET string
//! ```
//!
//! AND binds tighter than OR. A run of operands joined by the same operator
//! becomes one n-ary node, so long chains never nest. Parentheses are kept as
//! written; flattening across them happens in the builder.

use super::expression::ComparisonOperator;
use super::facade::Direction;
use super::lexer::{tokenize, Token, TokenKind};
use crate::{Config, Error, Result};

/// Parse tree for one statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub expression: Option<Node>,
    /// Trailing clauses in source order
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Like {
        ident: String,
        pattern: Literal,
    },
    In {
        ident: String,
        values: Vec<Literal>,
    },
    Contains {
        ident: String,
        value: Literal,
    },
    Compare {
        ident: String,
        op: ComparisonOperator,
        value: Literal,
    },
    Paren(Box<Node>),
    /// Two or more operands
    And(Vec<Node>),
    /// Two or more operands
    Or(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Clause {
    OrderBy(Vec<OrderField>),
    Limit(Literal),
    Offset(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderField {
    pub field: String,
    pub direction: Option<Direction>,
}

/// An unconverted literal token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Literal {
    pub kind: LiteralKind,
    pub text: String,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralKind {
    Boolean,
    Integer,
    String,
}

/// Parse query text into a statement.
///
/// Stops at the first error; nothing is returned for partially valid input.
pub(crate) fn parse(input: &str, config: &Config) -> Result<Statement> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        max_depth: config.max_depth,
    };
    parser.statement()
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    max_depth: usize,
}

impl Parser<'_> {
    fn statement(&mut self) -> Result<Statement> {
        let expression = match self.peek() {
            TokenKind::Order | TokenKind::Limit | TokenKind::Offset | TokenKind::Eof => None,
            _ => Some(self.or_expression(0)?),
        };

        let mut clauses = Vec::new();
        if self.eat(&TokenKind::Order) {
            self.expect(&TokenKind::By)?;
            clauses.push(Clause::OrderBy(self.order_fields()?));
        }
        if self.eat(&TokenKind::Limit) {
            clauses.push(Clause::Limit(self.literal(&[LiteralKind::Integer])?));
        }
        if self.eat(&TokenKind::Offset) {
            clauses.push(Clause::Offset(self.literal(&[LiteralKind::String])?));
        }

        if *self.peek() != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }

        Ok(Statement {
            expression,
            clauses,
        })
    }

    fn or_expression(&mut self, depth: usize) -> Result<Node> {
        let mut operands = vec![self.and_expression(depth)?];
        while self.eat(&TokenKind::Or) {
            operands.push(self.and_expression(depth)?);
        }
        Ok(chain(operands, Node::Or))
    }

    fn and_expression(&mut self, depth: usize) -> Result<Node> {
        let mut operands = vec![self.primary(depth)?];
        while self.eat(&TokenKind::And) {
            operands.push(self.primary(depth)?);
        }
        Ok(chain(operands, Node::And))
    }

    fn primary(&mut self, depth: usize) -> Result<Node> {
        let token = self.advance();
        match token.kind {
            TokenKind::LParen => {
                if depth + 1 > self.max_depth {
                    return Err(self.error(
                        token.column,
                        format!("nesting deeper than {} levels", self.max_depth),
                    ));
                }
                let inner = self.or_expression(depth + 1)?;
                self.expect(&TokenKind::RParen)?;
                Ok(Node::Paren(Box::new(inner)))
            }
            TokenKind::Identifier(ident) => self.comparison(ident),
            value @ (TokenKind::Integer(_) | TokenKind::String(_) | TokenKind::Boolean(_)) => {
                Err(self.error(
                    token.column,
                    format!("a bare value {} is not an expression", value),
                ))
            }
            other => Err(self.error(
                token.column,
                format!("expected an expression, found {}", other),
            )),
        }
    }

    fn comparison(&mut self, ident: String) -> Result<Node> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::Like => {
                let pattern = self.literal(&[LiteralKind::String])?;
                return Ok(Node::Like { ident, pattern });
            }
            TokenKind::Contains => {
                let value = self.literal(&[LiteralKind::String])?;
                return Ok(Node::Contains { ident, value });
            }
            TokenKind::In => {
                let values = self.set_literal()?;
                return Ok(Node::In { ident, values });
            }
            TokenKind::Eq => ComparisonOperator::Equal,
            TokenKind::NotEq => ComparisonOperator::NotEqual,
            TokenKind::Lt => ComparisonOperator::Less,
            TokenKind::Lte => ComparisonOperator::LessOrEqual,
            TokenKind::Gt => ComparisonOperator::Greater,
            TokenKind::Gte => ComparisonOperator::GreaterOrEqual,
            other => {
                return Err(self.error(
                    token.column,
                    format!(
                        "expected an operator after identifier '{}', found {}",
                        ident, other
                    ),
                ));
            }
        };
        let value = self.literal(&ALL_LITERALS)?;
        Ok(Node::Compare { ident, op, value })
    }

    fn set_literal(&mut self) -> Result<Vec<Literal>> {
        self.expect(&TokenKind::LBracket)?;
        let mut values = vec![self.literal(&ALL_LITERALS)?];
        while self.eat(&TokenKind::Comma) {
            values.push(self.literal(&ALL_LITERALS)?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(values)
    }

    fn order_fields(&mut self) -> Result<Vec<OrderField>> {
        let mut fields = Vec::new();
        loop {
            let token = self.advance();
            let field = match token.kind {
                TokenKind::Identifier(field) => field,
                other => {
                    return Err(self.error(
                        token.column,
                        format!("expected a field name, found {}", other),
                    ));
                }
            };
            let direction = if self.eat(&TokenKind::Asc) {
                Some(Direction::Asc)
            } else if self.eat(&TokenKind::Desc) {
                Some(Direction::Desc)
            } else {
                None
            };
            fields.push(OrderField { field, direction });

            if !self.eat(&TokenKind::Comma) {
                return Ok(fields);
            }
        }
    }

    fn literal(&mut self, allowed: &[LiteralKind]) -> Result<Literal> {
        let token = self.advance();
        let (kind, text) = match token.kind {
            TokenKind::Integer(text) => (LiteralKind::Integer, text),
            TokenKind::String(text) => (LiteralKind::String, text),
            TokenKind::Boolean(text) => (LiteralKind::Boolean, text),
            other => {
                return Err(self.error(
                    token.column,
                    format!("expected {}, found {}", describe(allowed), other),
                ));
            }
        };
        if !allowed.contains(&kind) {
            return Err(self.error(
                token.column,
                format!("expected {}, found '{}'", describe(allowed), text),
            ));
        }
        Ok(Literal {
            kind,
            text,
            column: token.column,
        })
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    /// Take the current token. Eof is never consumed.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = &self.tokens[self.pos];
        self.error(
            token.column,
            format!("expected {}, found {}", expected, token.kind),
        )
    }

    fn error(&self, column: usize, message: String) -> Error {
        Error::syntax(self.input, format!("column {}: {}", column, message))
    }
}

/// A single operand stands alone; more are joined under one node.
fn chain(mut operands: Vec<Node>, join: fn(Vec<Node>) -> Node) -> Node {
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return only;
        }
    }
    join(operands)
}

const ALL_LITERALS: [LiteralKind; 3] = [
    LiteralKind::Boolean,
    LiteralKind::Integer,
    LiteralKind::String,
];

fn describe(allowed: &[LiteralKind]) -> &'static str {
    match allowed {
        [LiteralKind::Integer] => "an integer",
        [LiteralKind::String] => "a string",
        _ => "a value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(input: &str) -> Result<Statement> {
        parse(input, &Config::default())
    }

    fn compare(ident: &str, text: &str) -> Node {
        Node::Compare {
            ident: ident.to_string(),
            op: ComparisonOperator::Equal,
            value: Literal {
                kind: LiteralKind::Integer,
                text: text.to_string(),
                column: 0,
            },
        }
    }

    /// Strip columns so trees can be compared structurally.
    fn strip(node: Node) -> Node {
        match node {
            Node::Compare { ident, op, value } => Node::Compare {
                ident,
                op,
                value: Literal { column: 0, ..value },
            },
            Node::Paren(inner) => Node::Paren(Box::new(strip(*inner))),
            Node::And(nodes) => Node::And(nodes.into_iter().map(strip).collect()),
            Node::Or(nodes) => Node::Or(nodes.into_iter().map(strip).collect()),
            other => other,
        }
    }

    #[test]
    fn test_empty_statement() {
        let s = parse_default("").unwrap();
        assert!(s.expression.is_none());
        assert!(s.clauses.is_empty());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let s = parse_default("a = 1 OR b = 2 AND c = 3").unwrap();
        let expected = Node::Or(vec![
            compare("a", "1"),
            Node::And(vec![compare("b", "2"), compare("c", "3")]),
        ]);
        assert_eq!(strip(s.expression.unwrap()), expected);
    }

    #[test]
    fn test_chain_collects_operands() {
        let s = parse_default("a = 1 AND b = 2 AND c = 3").unwrap();
        let expected = Node::And(vec![compare("a", "1"), compare("b", "2"), compare("c", "3")]);
        assert_eq!(strip(s.expression.unwrap()), expected);
    }

    #[test]
    fn test_parentheses_not_merged_into_chain() {
        let s = parse_default("a = 1 AND (b = 2 AND c = 3)").unwrap();
        let expected = Node::And(vec![
            compare("a", "1"),
            Node::Paren(Box::new(Node::And(vec![compare("b", "2"), compare("c", "3")]))),
        ]);
        assert_eq!(strip(s.expression.unwrap()), expected);
    }

    #[test]
    fn test_parentheses_are_kept() {
        let s = parse_default("(a = 1)").unwrap();
        assert_eq!(
            strip(s.expression.unwrap()),
            Node::Paren(Box::new(compare("a", "1")))
        );
    }

    #[test]
    fn test_clauses_in_order() {
        let s = parse_default("ORDER BY a, b DESC LIMIT 10 OFFSET 'tok'").unwrap();
        assert!(s.expression.is_none());
        assert_eq!(s.clauses.len(), 3);
        match &s.clauses[0] {
            Clause::OrderBy(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "a");
                assert_eq!(fields[0].direction, None);
                assert_eq!(fields[1].direction, Some(Direction::Desc));
            }
            other => panic!("Expected OrderBy, got {:?}", other),
        }
        assert!(matches!(&s.clauses[1], Clause::Limit(l) if l.text == "10"));
        assert!(matches!(&s.clauses[2], Clause::Offset(l) if l.text == "'tok'"));
    }

    #[test]
    fn test_clauses_out_of_order() {
        assert!(parse_default("LIMIT 10 ORDER BY a").is_err());
    }

    #[test]
    fn test_in_requires_values() {
        assert!(parse_default("a IN []").is_err());
        let s = parse_default("a IN [1, 'b', TRUE]").unwrap();
        match s.expression.unwrap() {
            Node::In { values, .. } => {
                let kinds: Vec<LiteralKind> = values.iter().map(|v| v.kind).collect();
                assert_eq!(
                    kinds,
                    vec![LiteralKind::Integer, LiteralKind::String, LiteralKind::Boolean]
                );
            }
            other => panic!("Expected In, got {:?}", other),
        }
    }

    #[test]
    fn test_like_and_contains_need_strings() {
        assert!(parse_default("a LIKE 12").is_err());
        assert!(parse_default("a CONTAINS TRUE").is_err());
        assert!(parse_default("a LIKE 'x%'").is_ok());
    }

    #[test]
    fn test_limit_needs_integer() {
        let err = parse_default("LIMIT 'ten'").unwrap_err();
        assert!(err.to_string().contains("expected an integer"));
    }

    #[test]
    fn test_bare_atom_rejected() {
        assert!(parse_default("a").is_err());
        assert!(parse_default("12").is_err());
        assert!(parse_default("a = 1 AND b").is_err());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_default("a = 1 b = 2").unwrap_err();
        assert!(err.to_string().contains("column 7"));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(parse_default("(a = 1").is_err());
        assert!(parse_default("a = 1)").is_err());
    }

    #[test]
    fn test_max_depth() {
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        assert!(parse("((a = 1))", &config).is_ok());
        let err = parse("(((a = 1)))", &config).unwrap_err();
        assert!(err.to_string().contains("nesting deeper than 2 levels"));
    }

    fn long_chain(operator: &str, terms: usize) -> String {
        (0..terms)
            .map(|i| format!("a{} = {}", i, i))
            .collect::<Vec<_>>()
            .join(&format!(" {} ", operator))
    }

    #[test]
    fn test_long_and_chain_with_bad_clause() {
        let text = format!("{} LIMIT 'x'", long_chain("AND", 100_000));
        let err = parse_default(&text).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("expected an integer"));
    }

    #[test]
    fn test_long_or_chain_with_bad_clause() {
        let text = format!("{} OFFSET 12", long_chain("OR", 100_000));
        let err = parse_default(&text).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("expected a string"));
    }

    #[test]
    fn test_long_chain_with_bad_term() {
        let text = format!("{} AND b", long_chain("AND", 100_000));
        assert!(parse_default(&text).unwrap_err().is_syntax());
    }
}
