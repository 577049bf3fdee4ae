//! Tokenizer for query text.

use std::fmt;

use crate::{Error, Result};

/// A token and the 1-based column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Identifier(String),
    /// Raw digits, with an optional leading `-`
    Integer(String),
    /// Raw text including both quote characters
    String(String),
    /// `TRUE` or `FALSE`
    Boolean(String),

    And,
    Or,
    Like,
    In,
    Contains,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,

    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::Integer(s) | TokenKind::Boolean(s) => write!(f, "'{}'", s),
            TokenKind::String(s) => write!(f, "string {}", s),
            TokenKind::And => write!(f, "'AND'"),
            TokenKind::Or => write!(f, "'OR'"),
            TokenKind::Like => write!(f, "'LIKE'"),
            TokenKind::In => write!(f, "'IN'"),
            TokenKind::Contains => write!(f, "'CONTAINS'"),
            TokenKind::Order => write!(f, "'ORDER'"),
            TokenKind::By => write!(f, "'BY'"),
            TokenKind::Asc => write!(f, "'ASC'"),
            TokenKind::Desc => write!(f, "'DESC'"),
            TokenKind::Limit => write!(f, "'LIMIT'"),
            TokenKind::Offset => write!(f, "'OFFSET'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Lte => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Gte => write!(f, "'>='"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Split query text into tokens, ending with [`TokenKind::Eof`].
///
/// Keywords are case-sensitive. String literals use `'` or `"` and the
/// delimiter cannot be escaped inside them.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let column = pos + 1;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let (kind, len) = match c {
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '[' => (TokenKind::LBracket, 1),
            ']' => (TokenKind::RBracket, 1),
            ',' => (TokenKind::Comma, 1),
            '=' => (TokenKind::Eq, 1),
            '!' if chars.get(pos + 1) == Some(&'=') => (TokenKind::NotEq, 2),
            '<' if chars.get(pos + 1) == Some(&'=') => (TokenKind::Lte, 2),
            '<' => (TokenKind::Lt, 1),
            '>' if chars.get(pos + 1) == Some(&'=') => (TokenKind::Gte, 2),
            '>' => (TokenKind::Gt, 1),
            '\'' | '"' => {
                let end = chars[pos + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| {
                        Error::syntax(
                            input,
                            format!("column {}: unterminated string literal", column),
                        )
                    })?;
                let len = end + 2;
                let text: String = chars[pos..pos + len].iter().collect();
                (TokenKind::String(text), len)
            }
            '-' | '0'..='9' => {
                let digits_start = if c == '-' { pos + 1 } else { pos };
                let digits = chars[digits_start..]
                    .iter()
                    .take_while(|ch| ch.is_ascii_digit())
                    .count();
                if digits == 0 {
                    return Err(Error::syntax(
                        input,
                        format!("column {}: expected digits after '-'", column),
                    ));
                }
                let len = digits_start - pos + digits;
                let text: String = chars[pos..pos + len].iter().collect();
                (TokenKind::Integer(text), len)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let len = chars[pos..]
                    .iter()
                    .take_while(|ch| is_identifier_char(**ch))
                    .count();
                let text: String = chars[pos..pos + len].iter().collect();
                (keyword_or_identifier(text), len)
            }
            other => {
                return Err(Error::syntax(
                    input,
                    format!("column {}: unexpected character '{}'", column, other),
                ));
            }
        };

        tokens.push(Token { kind, column });
        pos += len;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        column: chars.len() + 1,
    });
    Ok(tokens)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn keyword_or_identifier(text: String) -> TokenKind {
    match text.as_str() {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "LIKE" => TokenKind::Like,
        "IN" => TokenKind::In,
        "CONTAINS" => TokenKind::Contains,
        "ORDER" => TokenKind::Order,
        "BY" => TokenKind::By,
        "ASC" => TokenKind::Asc,
        "DESC" => TokenKind::Desc,
        "LIMIT" => TokenKind::Limit,
        "OFFSET" => TokenKind::Offset,
        "TRUE" | "FALSE" => TokenKind::Boolean(text),
        _ => TokenKind::Identifier(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_comparison_tokens() {
        assert_eq!(
            kinds("a.b >= -12"),
            vec![
                TokenKind::Identifier("a.b".to_string()),
                TokenKind::Gte,
                TokenKind::Integer("-12".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= != < <= > >="),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Lte,
                TokenKind::Gt,
                TokenKind::Gte,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_keep_quotes() {
        assert_eq!(
            kinds(r#"'it"s' "it's""#),
            vec![
                TokenKind::String("'it\"s'".to_string()),
                TokenKind::String("\"it's\"".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            kinds("AND and TRUE true"),
            vec![
                TokenKind::And,
                TokenKind::Identifier("and".to_string()),
                TokenKind::Boolean("TRUE".to_string()),
                TokenKind::Identifier("true".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_columns() {
        let tokens = tokenize("a = 'x'").unwrap();
        let columns: Vec<usize> = tokens.iter().map(|t| t.column).collect();
        assert_eq!(columns, vec![1, 3, 5, 8]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("a = 'x").unwrap_err();
        assert!(err.to_string().contains("unterminated string literal"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a = #").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("column 5"));
    }

    #[test]
    fn test_lone_minus() {
        assert!(tokenize("a = -").is_err());
    }
}
