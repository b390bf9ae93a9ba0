//! The document-store seam.
//!
//! Search code builds [`Query`] values and hands them to a [`QueryExecutor`].
//! A database driver implements the trait for production use;
//! [`MemoryExecutor`](crate::MemoryExecutor) implements it over in-memory
//! collections.

use crate::collection::{Collection, Document, Selection};
use asset_query::Query;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Runs queries against the catalog's document store.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Find every document in `collection` matching `query`, with the
    /// selection applied.
    async fn find(
        &self,
        collection: Collection,
        query: &Query,
        select: Option<&Selection>,
    ) -> Result<Vec<Document>, ExecutorError>;

    /// Find the first matching document.
    async fn find_one(
        &self,
        collection: Collection,
        query: &Query,
        select: Option<&Selection>,
    ) -> Result<Option<Document>, ExecutorError> {
        Ok(self.find(collection, query, select).await?.into_iter().next())
    }
}

/// Executor shared between concurrent searches.
pub type SharedExecutor = Arc<dyn QueryExecutor>;

/// Failure reported by a query executor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutorError {
    /// The store could not be reached.
    Unavailable(String),
    /// The store refused the query.
    InvalidQuery {
        /// Collection the query targeted.
        collection: Collection,
        /// Why the query was refused.
        reason: String,
    },
    /// A catalog could not be loaded.
    InvalidCatalog(String),
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "document store unavailable: {reason}"),
            Self::InvalidQuery { collection, reason } => {
                write!(f, "invalid query on {collection}: {reason}")
            },
            Self::InvalidCatalog(reason) => write!(f, "invalid catalog: {reason}"),
        }
    }
}

impl std::error::Error for ExecutorError {}
