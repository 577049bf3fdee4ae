//! Error types for query operations.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query text could not be turned into a query.
    ///
    /// This is the only error a parse, a setter construction or any other
    /// query operation returns. It always originates from client input.
    #[error("Syntax error in query '{query}': {message}")]
    Syntax { query: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn syntax(query: &str, message: impl Into<String>) -> Self {
        Error::Syntax {
            query: query.to_string(),
            message: message.into(),
        }
    }

    /// True when the error was caused by the query text itself.
    ///
    /// HTTP layers map these to a 4xx response.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
