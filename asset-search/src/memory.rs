//! In-memory query executor.
//!
//! Holds the four catalog collections as JSON objects and evaluates queries
//! with document-store semantics:
//!
//! - Dot paths descend into nested objects and through arrays of objects.
//! - A condition on an array field matches when any element matches.
//! - Numbers compare numerically, and a numeric string equals the number it
//!   spells.
//! - Raw queries are parsed with [`Query::from_json`] before evaluation.

use crate::collection::{Collection, Document, Selection};
use crate::executor::{ExecutorError, QueryExecutor};
use asset_query::{Condition, ID_FIELD, NumericRange, Query, is_numeric_literal};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Executor over in-memory collections.
///
/// # Example
///
/// ```
/// use asset_search::{Collection, MemoryExecutor};
///
/// let executor = MemoryExecutor::from_catalog_json(r#"{
///     "assets": [{ "_id": "a1", "name": "Gundam", "tags": ["t1"] }],
///     "tags": [{ "_id": "t1", "name": "robot" }]
/// }"#).unwrap();
///
/// assert_eq!(executor.len(Collection::Asset), 1);
/// assert_eq!(executor.len(Collection::Project), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    collections: BTreeMap<Collection, Vec<Map<String, Value>>>,
}

impl MemoryExecutor {
    /// Create an executor with empty collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog document: `{"assets": [...], "tags": [...], ...}`.
    ///
    /// Missing collections are empty. Every document must be an object with
    /// an `_id`.
    pub fn from_catalog_json(json: &str) -> Result<Self, ExecutorError> {
        let catalog: Value = serde_json::from_str(json)
            .map_err(|e| ExecutorError::InvalidCatalog(e.to_string()))?;
        Self::from_catalog(&catalog)
    }

    /// Load a parsed catalog document.
    pub fn from_catalog(catalog: &Value) -> Result<Self, ExecutorError> {
        let Value::Object(catalog) = catalog else {
            return Err(ExecutorError::InvalidCatalog(
                "catalog must be a JSON object".to_string(),
            ));
        };

        let mut executor = Self::new();
        for collection in Collection::ALL {
            let Some(entries) = catalog.get(collection.key()) else {
                continue;
            };
            let Value::Array(entries) = entries else {
                return Err(ExecutorError::InvalidCatalog(format!(
                    "`{collection}` must be an array"
                )));
            };
            for (index, entry) in entries.iter().enumerate() {
                match entry {
                    Value::Object(doc) if doc.get(ID_FIELD).is_some_and(|id| !id.is_null()) => {
                        executor.push(collection, doc.clone());
                    },
                    _ => {
                        return Err(ExecutorError::InvalidCatalog(format!(
                            "{collection}[{index}] must be an object with an `_id`"
                        )));
                    },
                }
            }
        }

        log::debug!(
            "loaded catalog: {} asset(s), {} tag(s), {} project(s), {} categor(ies)",
            executor.len(Collection::Asset),
            executor.len(Collection::Tag),
            executor.len(Collection::Project),
            executor.len(Collection::Category)
        );
        Ok(executor)
    }

    /// Builder: add a document to a collection.
    #[must_use]
    pub fn with_document(mut self, collection: Collection, document: Document) -> Self {
        self.insert(collection, document);
        self
    }

    /// Add a document to a collection.
    pub fn insert(&mut self, collection: Collection, document: Document) {
        let Value::Object(map) = document.into_value() else {
            return;
        };
        self.push(collection, map);
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map_or(0, Vec::len)
    }

    /// `true` if every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.values().all(Vec::is_empty)
    }

    fn push(&mut self, collection: Collection, doc: Map<String, Value>) {
        self.collections.entry(collection).or_default().push(doc);
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn find(
        &self,
        collection: Collection,
        query: &Query,
        select: Option<&Selection>,
    ) -> Result<Vec<Document>, ExecutorError> {
        let matcher = Matcher::compile(query).map_err(|reason| ExecutorError::InvalidQuery {
            collection,
            reason,
        })?;

        let docs = self.collections.get(&collection).map_or(&[][..], Vec::as_slice);
        let found: Vec<Document> = docs
            .iter()
            .filter(|doc| matcher.matches(doc))
            .map(|doc| {
                let document = Document::from_map(doc.clone());
                match select {
                    Some(selection) => selection.apply(document),
                    None => document,
                }
            })
            .collect();

        log::debug!("{collection}: {} of {} document(s) matched", found.len(), docs.len());
        Ok(found)
    }
}

/// A query compiled for evaluation: regexes are built once per query.
#[derive(Debug)]
enum Matcher {
    Field { path: String, test: FieldTest },
    All(Vec<Matcher>),
    Any(Vec<Matcher>),
}

#[derive(Debug)]
enum FieldTest {
    Equals(Value),
    Pattern(Regex),
    Range(NumericRange),
    OneOf(Vec<Value>),
}

impl Matcher {
    fn compile(query: &Query) -> Result<Self, String> {
        match query {
            Query::Fields(fields) => fields
                .iter()
                .map(|(path, condition)| {
                    Ok(Self::Field {
                        path: path.clone(),
                        test: FieldTest::compile(condition)?,
                    })
                })
                .collect::<Result<Vec<_>, String>>()
                .map(Self::All),
            Query::And(queries) => Self::compile_all(queries).map(Self::All),
            Query::Or(queries) => Self::compile_all(queries).map(Self::Any),
            Query::Raw(raw) => {
                let parsed =
                    Query::from_json(&Value::Object(raw.clone())).map_err(|e| e.to_string())?;
                Self::compile(&parsed)
            },
        }
    }

    fn compile_all(queries: &[Query]) -> Result<Vec<Self>, String> {
        queries.iter().map(Self::compile).collect()
    }

    fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            Self::Field { path, test } => resolve(doc, path).into_iter().any(|v| test.matches(v)),
            Self::All(matchers) => matchers.iter().all(|m| m.matches(doc)),
            Self::Any(matchers) => matchers.iter().any(|m| m.matches(doc)),
        }
    }
}

impl FieldTest {
    fn compile(condition: &Condition) -> Result<Self, String> {
        Ok(match condition {
            Condition::Literal(value) => Self::Equals(value.clone()),
            Condition::Regex(regex) => Self::Pattern(
                RegexBuilder::new(&regex.pattern)
                    .case_insensitive(regex.case_insensitive)
                    .build()
                    .map_err(|e| format!("invalid pattern `{}`: {e}", regex.pattern))?,
            ),
            Condition::Range(range) => Self::Range(*range),
            Condition::In(values) => Self::OneOf(values.clone()),
        })
    }

    fn matches(&self, value: &Value) -> bool {
        if self.matches_scalar(value) {
            return true;
        }
        match value {
            Value::Array(items) => items.iter().any(|item| self.matches_scalar(item)),
            _ => false,
        }
    }

    fn matches_scalar(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => values_equal(value, expected),
            Self::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Self::Range(range) => value.as_f64().is_some_and(|n| range.contains(n)),
            Self::OneOf(values) => values.iter().any(|expected| values_equal(value, expected)),
        }
    }
}

/// Collect every value reachable through a dot path.
fn resolve<'a>(doc: &'a Map<String, Value>, path: &str) -> Vec<&'a Value> {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Vec::new();
    };
    let mut current: Vec<&Value> = doc.get(first).into_iter().collect();

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(obj) => next.extend(obj.get(segment)),
                Value::Array(items) => {
                    if let Ok(index) = segment.parse::<usize>() {
                        next.extend(items.get(index));
                    } else {
                        next.extend(items.iter().filter_map(|item| item.get(segment)));
                    }
                },
                _ => {},
            }
        }
        current = next;
    }
    current
}

#[allow(clippy::float_cmp)]
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            is_numeric_literal(s) && s.trim().parse::<f64>().ok() == n.as_f64()
        },
        _ => actual == expected,
    }
}
