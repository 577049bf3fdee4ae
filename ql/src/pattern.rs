//! LIKE pattern compiler.
//!
//! `_` matches exactly one character and `%` matches any run of characters.
//! `\_` and `\%` are the literal characters. `?`, `[`, `{` and `(` carry no
//! meaning in LIKE and are escaped before the text reaches the regex engine.
//! A backslash before anything else stands for itself. Other regex syntax
//! passes through untouched, so `.` still matches any character.
//!
//! The resulting expression is unanchored and case-sensitive.

use std::fmt;

use regex::Regex;

/// A compiled LIKE pattern.
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: Regex,
}

impl LikePattern {
    /// Compile a LIKE pattern.
    ///
    /// Fails with the regex engine's message when the translated text is not
    /// a valid expression (an unbalanced `)` for instance).
    pub fn compile(pattern: &str) -> std::result::Result<Self, regex::Error> {
        let source = like_to_regex(pattern);
        log::trace!("LIKE {:?} compiled to /{}/", pattern, source);
        Ok(Self {
            regex: Regex::new(&source)?,
        })
    }

    /// Test whether the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The generated regular expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for LikePattern {}

impl fmt::Display for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

/// Translate LIKE syntax into regular expression text.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '?' | '[' | '{' | '(' => {
                out.push('\\');
                out.push(c);
            }
            '_' => out.push_str(".{1}"),
            '%' => out.push_str(".*"),
            '\\' => match chars.peek() {
                Some(&next) if next == '_' || next == '%' => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            },
            _ => out.push(c),
        }
    }

    out
}
