//! Search error type.

use crate::executor::ExecutorError;
use asset_query::ParseError;
use std::fmt;

/// Failure of a catalog search.
///
/// Rejected search terms are not an error: they produce an empty result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SearchError {
    /// The document store failed. The first failure of a fan-out wins.
    Executor(ExecutorError),
    /// A range bound could not be parsed as an integer.
    InvalidBound {
        /// Field paths holding an unparsable bound.
        fields: Vec<String>,
    },
    /// A pass-through query object could not be parsed.
    InvalidQuery(ParseError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executor(err) => write!(f, "search failed: {err}"),
            Self::InvalidBound { fields } => {
                write!(f, "range bound is not a number for: {}", fields.join(", "))
            },
            Self::InvalidQuery(err) => write!(f, "invalid query: {err}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Executor(err) => Some(err),
            Self::InvalidQuery(err) => Some(err),
            Self::InvalidBound { .. } => None,
        }
    }
}

impl From<ExecutorError> for SearchError {
    fn from(err: ExecutorError) -> Self {
        Self::Executor(err)
    }
}

impl From<ParseError> for SearchError {
    fn from(err: ParseError) -> Self {
        Self::InvalidQuery(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SearchError::InvalidBound {
            fields: vec!["price".into(), "fileSize".into()],
        };
        assert_eq!(err.to_string(), "range bound is not a number for: price, fileSize");

        let err = SearchError::from(ExecutorError::Unavailable("connection refused".into()));
        assert_eq!(
            err.to_string(),
            "search failed: document store unavailable: connection refused"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = SearchError::from(ParseError::ExpectedObject);
        assert!(err.source().is_some());
        assert!(SearchError::InvalidBound { fields: vec![] }.source().is_none());
    }
}
