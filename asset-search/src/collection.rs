//! Catalog collections, the documents they hold, and field selections.

use asset_query::ID_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One of the four catalog collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Game assets: models, textures, audio and so on.
    Asset,
    /// Free-form labels attached to assets.
    Tag,
    /// Productions an asset was made for.
    Project,
    /// Asset kinds (`model`, `texture`, ...).
    Category,
}

impl Collection {
    /// Every collection, in autocomplete order.
    pub const ALL: [Self; 4] = [Self::Asset, Self::Tag, Self::Project, Self::Category];

    /// Key of the collection in a JSON catalog (`"assets"`, `"tags"`, ...).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Asset => "assets",
            Self::Tag => "tags",
            Self::Project => "projects",
            Self::Category => "categories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Collection {
    type Err = UnknownCollection;

    /// Accepts singular or plural names, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asset" | "assets" => Ok(Self::Asset),
            "tag" | "tags" => Ok(Self::Tag),
            "project" | "projects" => Ok(Self::Project),
            "category" | "categories" => Ok(Self::Category),
            _ => Err(UnknownCollection(s.to_string())),
        }
    }
}

/// A collection name that does not match any catalog collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCollection(pub String);

impl fmt::Display for UnknownCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown collection '{}' (expected assets, tags, projects or categories)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCollection {}

/// A document returned by a query executor.
///
/// `_id` is absent only when a selection excluded it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identity.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Every other field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document with an identity and no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Map::new(),
        }
    }

    /// Builder: set a field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Split a JSON object into identity and fields.
    ///
    /// A string `_id` becomes the identity; any other `_id` value is rendered
    /// as JSON text.
    #[must_use]
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let id = map.remove(ID_FIELD).map(|id| match id {
            Value::String(s) => s,
            other => other.to_string(),
        });
        Self { id, fields: map }
    }

    /// The identity, if selected.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The `name` field, if it is a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get(crate::constants::NAME_FIELD).and_then(Value::as_str)
    }

    /// Look up a top-level field. `_id` is not a field; use [`Document::id`].
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Convert to a JSON object with `_id` first.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut obj = Map::new();
        if let Some(id) = self.id {
            obj.insert(ID_FIELD.to_string(), Value::String(id));
        }
        obj.extend(self.fields);
        Value::Object(obj)
    }
}

/// Field selection in the store's space-separated syntax.
///
/// `"name tags"` keeps only those fields (plus `_id`); `"-previews"` drops a
/// field; `"name -_id"` keeps only `name`. Paths are matched on their first
/// segment.
///
/// ```
/// use asset_search::Selection;
///
/// let select = Selection::parse("name -_id");
/// assert!(select.keeps("name"));
/// assert!(!select.keeps("tags"));
/// assert!(!select.keeps_id());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Selection {
    /// Parse a selection string. Empty tokens are ignored.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut selection = Self::default();
        for token in spec.split_whitespace() {
            match token.strip_prefix('-') {
                Some("") => {},
                Some(field) => selection.exclude.push(root(field).to_string()),
                None => selection.include.push(root(token.trim_start_matches('+')).to_string()),
            }
        }
        selection
    }

    /// `true` if the selection keeps every field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// `true` if `_id` survives the selection.
    #[must_use]
    pub fn keeps_id(&self) -> bool {
        !self.exclude.iter().any(|f| f == ID_FIELD)
    }

    /// `true` if the top-level field survives the selection.
    #[must_use]
    pub fn keeps(&self, field: &str) -> bool {
        let field = root(field);
        if field == ID_FIELD {
            return self.keeps_id();
        }
        if self.exclude.iter().any(|f| f == field) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|f| f == field)
    }

    /// Apply the selection to a document.
    #[must_use]
    pub fn apply(&self, mut document: Document) -> Document {
        if self.is_empty() {
            return document;
        }
        if !self.keeps_id() {
            document.id = None;
        }
        document.fields.retain(|field, _| self.keeps(field));
        document
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .include
            .iter()
            .cloned()
            .chain(self.exclude.iter().map(|field| format!("-{field}")))
            .collect();
        f.write_str(&tokens.join(" "))
    }
}

impl From<&str> for Selection {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

fn root(path: &str) -> &str {
    path.split_once('.').map_or(path, |(first, _)| first)
}
