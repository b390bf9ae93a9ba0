//! Catalog search service.
//!
//! [`CatalogSearch`] ties the pieces together: it checks user terms against
//! the whitelist, builds queries, runs them through a
//! [`QueryExecutor`](crate::QueryExecutor), and
//! populates asset references.

use crate::collection::{Collection, Document, Selection};
use crate::constants::{
    CATEGORIES_FIELD, NAME_FIELD, PROJECTS_FIELD, RESERVED_CATEGORIES, TAGS_FIELD,
};
use crate::error::SearchError;
use crate::executor::SharedExecutor;
use crate::keywords::{parse_keywords, strip_regex_chars};
use asset_query::{
    Condition, ID_FIELD, Query, RegexMatch, Whitelist, build_query, flatten, is_allowed,
};
use futures_util::future::try_join4;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Asset fields holding ids of other collections, in population order.
const REFERENCES: [(&str, Collection); 3] = [
    (TAGS_FIELD, Collection::Tag),
    (PROJECTS_FIELD, Collection::Project),
    (CATEGORIES_FIELD, Collection::Category),
];

/// Search over the asset catalog.
///
/// Cheap to clone; the executor and whitelist are shared.
///
/// # Example
///
/// ```
/// use asset_query::Whitelist;
/// use asset_search::{CatalogSearch, MemoryExecutor};
/// use std::sync::Arc;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let executor = MemoryExecutor::from_catalog_json(r#"{
///     "assets": [{ "_id": "a1", "name": "Gundam", "categories": ["c1"] }],
///     "categories": [{ "_id": "c1", "name": "model" }]
/// }"#).unwrap();
/// let search = CatalogSearch::new(Arc::new(executor), Arc::new(Whitelist::new(["name"])));
///
/// let assets = search.search_by_keywords("model", None).await.unwrap();
/// assert_eq!(assets[0].id(), Some("a1"));
/// # });
/// ```
#[derive(Clone)]
pub struct CatalogSearch {
    executor: SharedExecutor,
    whitelist: Arc<Whitelist>,
    category_keywords: Vec<String>,
}

impl fmt::Debug for CatalogSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogSearch")
            .field("whitelist", &self.whitelist)
            .field("category_keywords", &self.category_keywords)
            .finish_non_exhaustive()
    }
}

impl CatalogSearch {
    /// Create a search service with the default category keywords.
    pub fn new(executor: SharedExecutor, whitelist: Arc<Whitelist>) -> Self {
        Self {
            executor,
            whitelist,
            category_keywords: RESERVED_CATEGORIES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Builder: replace the category keywords. They are matched lowercased.
    #[must_use]
    pub fn with_category_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .collect();
        self
    }

    /// The whitelist user terms are checked against.
    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    // ========================================================================
    // Asset fetching
    // ========================================================================

    /// Run a query against the assets and populate their references.
    ///
    /// Queries holding a not-a-number range bound are refused, and pass-through
    /// queries must parse.
    pub async fn get_assets(
        &self,
        query: &Query,
        select: Option<&Selection>,
    ) -> Result<Vec<Document>, SearchError> {
        check_query(query)?;
        let mut assets = self.executor.find(Collection::Asset, query, select).await?;
        self.populate(&mut assets, select).await?;
        Ok(assets)
    }

    /// Look up one asset by id and populate its references.
    pub async fn find_asset_by_id(
        &self,
        id: &str,
        select: Option<&Selection>,
    ) -> Result<Option<Document>, SearchError> {
        let Some(asset) = self
            .executor
            .find_one(Collection::Asset, &Query::by_id(id), select)
            .await?
        else {
            return Ok(None);
        };
        let mut assets = vec![asset];
        self.populate(&mut assets, select).await?;
        Ok(assets.pop())
    }

    /// Replace reference ids with `{_id, name}` objects.
    ///
    /// One batched query per reference field; skipped when no asset
    /// references anything or the selection drops the field. Ids with no
    /// matching document are dropped.
    async fn populate(
        &self,
        assets: &mut [Document],
        select: Option<&Selection>,
    ) -> Result<(), SearchError> {
        for (field, collection) in REFERENCES {
            if select.is_some_and(|s| !s.keeps(field)) {
                continue;
            }

            let ids = referenced_ids(assets, field);
            if ids.is_empty() {
                continue;
            }

            let names = Selection::parse(NAME_FIELD);
            let found = self
                .executor
                .find(collection, &Query::ids_in(ID_FIELD, ids), Some(&names))
                .await?;
            let by_id: HashMap<String, Value> = found
                .into_iter()
                .filter_map(|doc| Some((doc.id.clone()?, doc.into_value())))
                .collect();

            for asset in assets.iter_mut() {
                if let Some(value) = asset.fields.get_mut(field) {
                    *value = resolve_references(value, &by_id);
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Structured search
    // ========================================================================

    /// Search assets by structured terms.
    ///
    /// Terms are flattened and checked against the whitelist; rejected terms
    /// give an empty result. A non-empty `_id` term looks up that one asset;
    /// an empty, zero, `false` or `null` one is translated like any other term.
    pub async fn asset_search(&self, terms: &Value) -> Result<Vec<Document>, SearchError> {
        let flat = flatten(terms);
        if !self.whitelist.is_allowed(&flat) {
            log::info!("no assets found for rejected terms {terms}");
            return Ok(Vec::new());
        }

        if let Some(id) = flat.get(ID_FIELD).filter(|id| is_truthy(id)) {
            let id = match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(self.find_asset_by_id(&id, None).await?.into_iter().collect());
        }

        let query = build_query(&flat);
        let assets = self.get_assets(&query, None).await?;
        log::info!("found {} asset(s) via {terms}", assets.len());
        Ok(assets)
    }

    /// Search a tag, project or category collection by exact field values.
    ///
    /// The raw terms are checked against the whitelist without flattening;
    /// rejected terms give an empty result.
    pub async fn search_collection(
        &self,
        collection: Collection,
        terms: &Value,
    ) -> Result<Vec<Document>, SearchError> {
        if !is_allowed(terms, &self.whitelist) {
            log::info!("no {collection} found for rejected terms {terms}");
            return Ok(Vec::new());
        }

        let query = terms.as_object().map_or_else(Query::all, exact_match);
        let found = self.executor.find(collection, &query, None).await?;
        log::info!("found {} {collection} via {terms}", found.len());
        Ok(found)
    }

    // ========================================================================
    // Keyword search
    // ========================================================================

    /// Search assets by a comma-separated keyword string.
    ///
    /// - No keywords: every asset.
    /// - One keyword naming a category (`model`, `texture`, ...): every asset
    ///   in that category.
    /// - Otherwise: [`keyword_search`](Self::keyword_search).
    pub async fn search_by_keywords(
        &self,
        raw: &str,
        select: Option<&Selection>,
    ) -> Result<Vec<Document>, SearchError> {
        let keywords = parse_keywords(raw);

        let assets = match keywords.as_slice() {
            [] => self.get_assets(&Query::all(), None).await?,
            [keyword] if self.category_keywords.contains(keyword) => {
                let id_only = Selection::parse(ID_FIELD);
                let categories = self
                    .find_by_names(Collection::Category, &keywords, Some(&id_only))
                    .await?;
                let query =
                    Query::any_of(vec![Query::ids_in(CATEGORIES_FIELD, ids_of(&categories))]);
                self.get_assets(&query, select).await?
            },
            _ => self.keyword_search(&keywords, select).await?,
        };

        log::info!("found {} asset(s) via keywords {keywords:?}", assets.len());
        Ok(assets)
    }

    /// Match keywords against asset names and against the tags, projects and
    /// categories assets reference.
    ///
    /// The four name lookups run concurrently; the first failure fails the
    /// search. Results are concatenated (name matches, then project, tag and
    /// category matches) and deduplicated by `_id`, first occurrence kept.
    pub async fn keyword_search(
        &self,
        keywords: &[String],
        select: Option<&Selection>,
    ) -> Result<Vec<Document>, SearchError> {
        let name_query = Query::any_of(
            keywords
                .iter()
                .map(|keyword| Query::matching(NAME_FIELD, keyword.clone()))
                .collect(),
        );

        let (tags, categories, projects, mut result) = try_join4(
            self.find_by_names(Collection::Tag, keywords, select),
            self.find_by_names(Collection::Category, keywords, select),
            self.find_by_names(Collection::Project, keywords, select),
            self.get_assets(&name_query, select),
        )
        .await?;

        for (field, matched) in [
            (PROJECTS_FIELD, &projects),
            (TAGS_FIELD, &tags),
            (CATEGORIES_FIELD, &categories),
        ] {
            if matched.is_empty() {
                continue;
            }
            let query = Query::any_of(vec![Query::ids_in(field, ids_of(matched))]);
            result.extend(self.get_assets(&query, select).await?);
        }

        Ok(dedup_by_id(result))
    }

    /// Documents whose name contains any of `names` as a whole word, ignoring
    /// case. One query per name, results concatenated.
    pub async fn find_by_names(
        &self,
        collection: Collection,
        names: &[String],
        select: Option<&Selection>,
    ) -> Result<Vec<Document>, SearchError> {
        let mut found = Vec::new();
        for name in names {
            let query = Query::matching(NAME_FIELD, format!(r"\b{name}\b"));
            found.extend(self.executor.find(collection, &query, select).await?);
        }
        Ok(found)
    }

    // ========================================================================
    // Autocomplete and name lookups
    // ========================================================================

    /// Lowercased names that could complete `input`.
    ///
    /// A name matches when a word in it starts with the input, ignoring case.
    /// Assets are searched first, then tags, projects and categories; each
    /// name appears once, in first-seen order.
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<String>, SearchError> {
        let input = strip_regex_chars(input);
        let query = Query::matching(NAME_FIELD, format!("^{input}| {input}"));
        let names_only = Selection::parse("name -_id");

        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for collection in Collection::ALL {
            for doc in self.executor.find(collection, &query, Some(&names_only)).await? {
                let Some(name) = doc.name() else { continue };
                let name = name.to_lowercase();
                if seen.insert(name.clone()) {
                    matches.push(name);
                }
            }
        }

        log::info!("found {} term(s) via {input:?}", matches.len());
        Ok(matches)
    }

    /// The tag named exactly `name`.
    pub async fn find_tag(&self, name: &str) -> Result<Option<Document>, SearchError> {
        let query = Query::field(NAME_FIELD, Condition::Literal(Value::String(name.to_string())));
        Ok(self.executor.find_one(Collection::Tag, &query, None).await?)
    }

    /// The project named `name`, ignoring case.
    pub async fn find_project_by_name(&self, name: &str) -> Result<Option<Document>, SearchError> {
        let pattern = format!("^{}$", regex::escape(name));
        let query = Query::field(
            NAME_FIELD,
            Condition::Regex(RegexMatch::case_insensitive(pattern)),
        );
        Ok(self.executor.find_one(Collection::Project, &query, None).await?)
    }
}

/// Refuse queries the store would misread.
fn check_query(query: &Query) -> Result<(), SearchError> {
    let parsed;
    let query = match query {
        Query::Raw(raw) => {
            parsed = Query::from_json(&Value::Object(raw.clone()))?;
            &parsed
        },
        other => other,
    };

    let invalid = query.invalid_bounds();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(SearchError::InvalidBound {
            fields: invalid.into_iter().map(str::to_string).collect(),
        })
    }
}

/// Whether a term value counts as set: not empty, zero, `false` or `null`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Exact-match query on every term.
fn exact_match(terms: &Map<String, Value>) -> Query {
    Query::Fields(
        terms
            .iter()
            .map(|(field, value)| (field.clone(), Condition::Literal(value.clone())))
            .collect(),
    )
}

fn ids_of(docs: &[Document]) -> Vec<String> {
    docs.iter().filter_map(|doc| doc.id.clone()).collect()
}

/// Distinct string ids referenced by `field`, in first-seen order.
fn referenced_ids(assets: &[Document], field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    assets
        .iter()
        .filter_map(|asset| asset.get(field))
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            Value::String(id) => vec![id.as_str()],
            _ => Vec::new(),
        })
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn resolve_references(value: &Value, by_id: &HashMap<String, Value>) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(id) => by_id.get(id).cloned(),
                    other => Some(other.clone()),
                })
                .collect(),
        ),
        Value::String(id) => by_id.get(id).cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Drop later documents whose `_id` was already seen.
fn dedup_by_id(docs: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| doc.id.as_ref().is_none_or(|id| seen.insert(id.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let docs = vec![
            Document::new("a").with("n", json!(1)),
            Document::new("b"),
            Document::new("a").with("n", json!(2)),
            Document::default(),
            Document::default(),
        ];
        let deduped = dedup_by_id(docs);
        assert_eq!(deduped.len(), 4);
        assert_eq!(deduped[0].get("n"), Some(&json!(1)));
    }

    #[test]
    fn test_truthy_term_values() {
        for value in [json!("a1"), json!(3), json!(true), json!(["x"])] {
            assert!(is_truthy(&value), "{value}");
        }
        for value in [json!(""), json!(0), json!(0.0), json!(false), Value::Null] {
            assert!(!is_truthy(&value), "{value}");
        }
    }

    #[test]
    fn test_referenced_ids_are_distinct() {
        let assets = vec![
            Document::new("a1").with("tags", json!(["t1", "t2"])),
            Document::new("a2").with("tags", json!(["t2", "t3"])),
            Document::new("a3").with("tags", json!("t4")),
            Document::new("a4"),
        ];
        assert_eq!(referenced_ids(&assets, "tags"), vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_resolve_references_drops_unknown_ids() {
        let by_id = HashMap::from([("t1".to_string(), json!({ "_id": "t1", "name": "robot" }))]);
        assert_eq!(
            resolve_references(&json!(["t1", "gone"]), &by_id),
            json!([{ "_id": "t1", "name": "robot" }])
        );
    }

    #[test]
    fn test_check_query_rejects_nan_bounds() {
        let query = build_query(&flatten(&json!({ "price": { "gte": "cheap" } })));
        assert_eq!(
            check_query(&query),
            Err(SearchError::InvalidBound {
                fields: vec!["price".into()]
            })
        );
    }

    #[test]
    fn test_check_query_parses_raw() {
        let Value::Object(raw) = json!({ "$or": 1 }) else {
            panic!("expected object")
        };
        assert!(matches!(
            check_query(&Query::Raw(raw)),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_exact_match_uses_literals() {
        let Value::Object(terms) = json!({ "name": "robot", "count": 2 }) else {
            panic!("expected object")
        };
        assert_eq!(
            exact_match(&terms).to_json(),
            json!({ "count": 2, "name": "robot" })
        );
    }
}
