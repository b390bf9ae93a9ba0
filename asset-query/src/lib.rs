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
#![allow(clippy::doc_markdown)] // Field paths in docs read better unticked
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::must_use_candidate)] // Constructors don't need must_use

//! # asset-query - Catalog Search Filters as Document Queries
//!
//! Turns the loosely-typed filter objects a catalog client sends into
//! Mongo-style document queries:
//!
//! 1. [`flatten`] nested terms into dot-delimited key paths.
//! 2. Check every key path against a [`Whitelist`].
//! 3. [`build_query`] from the flattened terms.
//! 4. Render with [`Query::to_json`] for the document store, or parse a
//!    rendered query back with [`Query::from_json`].
//!
//! ## Quick Start
//!
//! ```
//! use asset_query::prelude::*;
//! use serde_json::json;
//!
//! let whitelist = Whitelist::new(["name", "model.triCount.gte", "model.triCount.lte"]);
//! let terms = flatten(&json!({
//!     "name": ["Gundam", "Robot"],
//!     "model": { "triCount": { "gte": "1000", "lte": 5000 } }
//! }));
//!
//! assert!(whitelist.is_allowed(&terms));
//!
//! let query = build_query(&terms);
//! assert_eq!(
//!     query.to_json(),
//!     json!({
//!         "model.triCount": { "$gte": 1000, "$lte": 5000 },
//!         "name": { "$regex": "Gundam|Robot", "$options": "i" }
//!     })
//! );
//! ```
//!
//! ## Term Translation
//!
//! | Flattened term | Condition |
//! |----------------|-----------|
//! | `"tags": ["a", "b"]` | `Regex("a\|b", ci)` |
//! | `"price.gte": "10"` | `Range { gte: 10 }` on `price` |
//! | `"fileSize": 5` or `"fileSize": "5"` | `Literal` (unchanged) |
//! | `"name": "gun"` | `Regex("gun", ci)` |
//! | `"$and"` / `"$or"` present | whole filter passed through as `Raw` |
//!
//! ## Security
//!
//! Only whitelisted key paths may be filtered on. `$or` is the one exempt
//! key: it marks a compound query assembled by keyword search.

mod filter;
mod parse;
mod query;
mod render;
mod translate;
mod whitelist;

pub use filter::{FlatFilter, flatten};
pub use parse::{ParseError, parse_query};
pub use query::{
    AND_KEY, Condition, ID_FIELD, NumericRange, OR_KEY, Query, RangeBound, RangeOp, RegexMatch,
};
pub use translate::{
    TermKind, build_number_comparison, build_query, classify_term, is_numeric_literal, parse_int,
};
pub use whitelist::{VALID_QUERIES_KEY, ValidationError, Whitelist, WhitelistError, is_allowed};

/// Prelude module for convenient imports.
///
/// ```
/// use asset_query::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Condition, FlatFilter, NumericRange, ParseError, Query, RangeBound, RangeOp, RegexMatch,
        ValidationError, Whitelist, WhitelistError, build_query, flatten, is_allowed, parse_query,
    };
}

// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
