//! Field whitelist for user-provided search terms.
//!
//! Only field paths an administrator listed may be filtered on. The list is
//! loaded once at startup and shared read-only; it is passed explicitly to
//! whatever checks terms, so tests can use any list they like.

use crate::filter::FlatFilter;
use crate::query::OR_KEY;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Key of the field list when the whitelist file is a JSON object.
pub const VALID_QUERIES_KEY: &str = "VALID_QUERIES";

/// Ordered set of field paths users may filter on.
///
/// `$or` is always exempt: it marks a compound query built by keyword search,
/// not a user-supplied field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    fields: Vec<String>,
}

impl Whitelist {
    /// Build a whitelist from field paths. Duplicates are dropped, first
    /// occurrence wins.
    ///
    /// # Example
    ///
    /// ```
    /// use asset_query::Whitelist;
    ///
    /// let whitelist = Whitelist::new(["name", "model.triCount", "name"]);
    /// assert_eq!(whitelist.fields(), ["name", "model.triCount"]);
    /// ```
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    /// A whitelist that permits no fields. Unfiltered queries still pass.
    #[must_use]
    pub const fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Parse a whitelist document.
    ///
    /// Accepts either a JSON array of strings or an object holding such an
    /// array under `VALID_QUERIES`.
    ///
    /// ```
    /// use asset_query::Whitelist;
    ///
    /// let a = Whitelist::from_json_str(r#"["name", "price"]"#).unwrap();
    /// let b = Whitelist::from_json_str(r#"{"VALID_QUERIES": ["name", "price"]}"#).unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, WhitelistError> {
        let value: Value = serde_json::from_str(json).map_err(WhitelistError::Json)?;
        Self::from_json(&value)
    }

    /// Build a whitelist from a parsed whitelist document.
    pub fn from_json(value: &Value) -> Result<Self, WhitelistError> {
        let list = match value {
            Value::Array(items) => items,
            Value::Object(obj) => match obj.get(VALID_QUERIES_KEY) {
                Some(Value::Array(items)) => items,
                _ => return Err(WhitelistError::MissingFieldList),
            },
            _ => return Err(WhitelistError::MissingFieldList),
        };

        let fields = list
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(WhitelistError::NonStringField(other.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(fields))
    }

    /// Read a whitelist file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, WhitelistError> {
        let contents = std::fs::read_to_string(path).map_err(WhitelistError::Io)?;
        Self::from_json_str(&contents)
    }

    /// Load a whitelist file, degrading to an empty whitelist on any failure.
    ///
    /// With an empty whitelist every filtered query is rejected while
    /// unfiltered queries still pass.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(whitelist) => {
                log::info!(
                    "loaded {} whitelisted search field(s) from {}",
                    whitelist.len(),
                    path.display()
                );
                whitelist
            },
            Err(err) => {
                log::error!("could not load whitelist {}: {err}", path.display());
                Self::empty()
            },
        }
    }

    /// Permitted field paths, in configuration order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of permitted field paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if no field path is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `true` if the key is whitelisted or is the exempt `$or` key.
    #[must_use]
    pub fn permits_key(&self, key: &str) -> bool {
        key == OR_KEY || self.fields.iter().any(|f| f == key)
    }

    /// Validate flattened terms, reporting every rejected key.
    pub fn validate(&self, filter: &FlatFilter) -> Result<(), ValidationError> {
        self.validate_keys(filter.keys())
    }

    /// Check flattened terms. Each rejected key is logged.
    ///
    /// An empty filter is always allowed.
    ///
    /// ```
    /// use asset_query::{Whitelist, flatten};
    /// use serde_json::json;
    ///
    /// let whitelist = Whitelist::new(["name"]);
    /// assert!(whitelist.is_allowed(&flatten(&json!({ "name": "x" }))));
    /// assert!(!whitelist.is_allowed(&flatten(&json!({ "ford": { "message": 2 } }))));
    /// assert!(Whitelist::empty().is_allowed(&flatten(&json!({ "$or": true }))));
    /// ```
    pub fn is_allowed(&self, filter: &FlatFilter) -> bool {
        Self::report(self.validate(filter))
    }

    /// Check raw terms. Anything other than a JSON object is rejected.
    ///
    /// Only the top-level keys are checked; nested objects are not flattened.
    pub fn permits(&self, terms: &Value) -> bool {
        match terms {
            Value::Object(obj) => Self::report(self.validate_keys(obj.keys().map(String::as_str))),
            other => {
                log::error!("invalid search terms: expected an object, got {other}");
                false
            },
        }
    }

    fn validate_keys<'a>(&self, keys: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
        let rejected: Vec<String> = keys
            .filter(|key| !self.permits_key(key))
            .map(str::to_string)
            .collect();

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::TermsNotAllowed { terms: rejected })
        }
    }

    fn report(result: Result<(), ValidationError>) -> bool {
        match result {
            Ok(()) => true,
            Err(ValidationError::TermsNotAllowed { terms }) => {
                for term in &terms {
                    log::error!("invalid search term: {term}");
                }
                false
            },
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Whitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Check raw terms against a whitelist.
///
/// ```
/// use asset_query::{Whitelist, is_allowed};
/// use serde_json::json;
///
/// assert!(is_allowed(&json!({ "name": "x" }), &Whitelist::new(["name"])));
/// assert!(is_allowed(&json!({}), &Whitelist::empty()));
/// assert!(!is_allowed(&json!("name"), &Whitelist::new(["name"])));
/// ```
pub fn is_allowed(terms: &Value, whitelist: &Whitelist) -> bool {
    whitelist.permits(terms)
}

/// Rejected search terms.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// One or more keys are not whitelisted.
    TermsNotAllowed {
        /// The rejected keys, in input order.
        terms: Vec<String>,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TermsNotAllowed { terms } => {
                write!(f, "search terms not allowed: {}", terms.join(", "))
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure to read or parse a whitelist document.
#[derive(Debug)]
#[non_exhaustive]
pub enum WhitelistError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid JSON.
    Json(serde_json::Error),
    /// Neither a top-level array nor a `VALID_QUERIES` array.
    MissingFieldList,
    /// An entry of the field list is not a string.
    NonStringField(String),
}

impl fmt::Display for WhitelistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read whitelist: {err}"),
            Self::Json(err) => write!(f, "invalid whitelist JSON: {err}"),
            Self::MissingFieldList => write!(
                f,
                "whitelist must be an array of field paths or an object with `{VALID_QUERIES_KEY}`"
            ),
            Self::NonStringField(value) => {
                write!(f, "whitelist entry `{value}` is not a string")
            },
        }
    }
}

impl std::error::Error for WhitelistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}
