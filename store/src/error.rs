use std::fmt;

use blocks::ParseError;

#[derive(Debug)]
pub enum StoreError {
    /// The parser rejected the markup of a `Parse` action. The store keeps
    /// its previous state.
    MalformedMarkup(Vec<ParseError>),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::MalformedMarkup(errors) => match errors.first() {
                Some(first) if errors.len() > 1 => write!(
                    f,
                    "malformed markup: {} (and {} more)",
                    first,
                    errors.len() - 1
                ),
                Some(first) => write!(f, "malformed markup: {}", first),
                None => write!(f, "malformed markup"),
            },
        }
    }
}

impl std::error::Error for StoreError {}
