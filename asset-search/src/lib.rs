// =============================================================================
// CRATE-LEVEL QUALITY LINTS
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Field names in docs read better unticked
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::must_use_candidate)] // Accessors don't need must_use
#![allow(clippy::future_not_send)] // Futures are Send whenever the executor is

//! # asset-search - Catalog Search over a Document Store
//!
//! Keyword, structured and autocomplete search over an asset catalog with
//! four collections: assets, tags, projects and categories. Queries are
//! built with [`asset_query`] and run through a [`QueryExecutor`]; the
//! [`MemoryExecutor`] evaluates them over JSON held in memory.
//!
//! ## Quick Start
//!
//! ```
//! use asset_query::Whitelist;
//! use asset_search::{CatalogSearch, MemoryExecutor};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let executor = MemoryExecutor::from_catalog(&json!({
//!     "assets": [
//!         { "_id": "a1", "name": "Gundam RX-78", "tags": ["t1"] },
//!         { "_id": "a2", "name": "Oak tree", "tags": [] }
//!     ],
//!     "tags": [{ "_id": "t1", "name": "mecha" }]
//! })).unwrap();
//! let search = CatalogSearch::new(Arc::new(executor), Arc::new(Whitelist::new(["name"])));
//!
//! // Keywords match asset names and referenced tag names.
//! let assets = search.search_by_keywords("mecha,oak", None).await.unwrap();
//! assert_eq!(assets.len(), 2);
//!
//! // Structured terms must be whitelisted.
//! let assets = search.asset_search(&json!({ "name": "gundam" })).await.unwrap();
//! assert_eq!(assets[0].get("tags"), Some(&json!([{ "_id": "t1", "name": "mecha" }])));
//! assert!(search.asset_search(&json!({ "owner": "x" })).await.unwrap().is_empty());
//!
//! // Autocomplete matches the start of any word.
//! assert_eq!(search.autocomplete("tr").await.unwrap(), vec!["oak tree"]);
//! # });
//! ```
//!
//! ## Logging
//!
//! Everything logs through the `log` facade; installing a backend is left to
//! the binary.

pub mod constants;

mod collection;
mod config;
mod error;
mod executor;
mod keywords;
mod memory;
mod search;

pub use collection::{Collection, Document, Selection, UnknownCollection};
pub use config::{ConfigError, SearchConfig};
pub use error::SearchError;
pub use executor::{ExecutorError, QueryExecutor, SharedExecutor};
pub use keywords::{parse_keywords, sanitize, strip_regex_chars};
pub use memory::MemoryExecutor;
pub use search::CatalogSearch;

// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
