//! Core types for the document query representation.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field holding the stable identity of every document.
pub const ID_FIELD: &str = "_id";

/// Reserved key for a pre-built conjunction.
pub const AND_KEY: &str = "$and";

/// Reserved key for a pre-built disjunction.
pub const OR_KEY: &str = "$or";

/// A regular-expression matcher applied to a string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexMatch {
    /// Regular-expression source.
    pub pattern: String,
    /// Match ignoring case (`$options: "i"`).
    pub case_insensitive: bool,
}

impl RegexMatch {
    /// Create a case-insensitive matcher.
    pub fn case_insensitive(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    /// Create a case-sensitive matcher.
    pub fn case_sensitive(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }
}

/// One side of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// A parsed integer bound.
    Int(i64),
    /// The value could not be parsed as an integer.
    NotANumber,
}

impl RangeBound {
    /// The integer, if the bound parsed.
    #[must_use]
    pub const fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n),
            Self::NotANumber => None,
        }
    }

    /// `true` if this is the not-a-number sentinel.
    #[must_use]
    pub const fn is_nan(self) -> bool {
        matches!(self, Self::NotANumber)
    }
}

/// Which bound of a range a `gte`/`lte` term sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
}

impl RangeOp {
    /// Parse a key segment (`"gte"` or `"lte"`).
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    /// Mongo-style operator key.
    #[must_use]
    pub const fn mongo_key(self) -> &'static str {
        match self {
            Self::Gte => "$gte",
            Self::Lte => "$lte",
        }
    }
}

/// Inclusive numeric range with optional bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumericRange {
    /// Lower bound, inclusive.
    pub gte: Option<RangeBound>,
    /// Upper bound, inclusive.
    pub lte: Option<RangeBound>,
}

impl NumericRange {
    /// A range with a single bound set.
    #[must_use]
    pub const fn with_bound(op: RangeOp, bound: RangeBound) -> Self {
        match op {
            RangeOp::Gte => Self {
                gte: Some(bound),
                lte: None,
            },
            RangeOp::Lte => Self {
                gte: None,
                lte: Some(bound),
            },
        }
    }

    /// Merge another range into this one. Bounds set on `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            gte: other.gte.or(self.gte),
            lte: other.lte.or(self.lte),
        }
    }

    /// `true` when neither bound is the not-a-number sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.gte.is_some_and(RangeBound::is_nan) && !self.lte.is_some_and(RangeBound::is_nan)
    }

    /// Test a number against the range. A not-a-number bound never matches.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, n: f64) -> bool {
        let lower = match self.gte {
            Some(RangeBound::Int(min)) => n >= min as f64,
            Some(RangeBound::NotANumber) => false,
            None => true,
        };
        let upper = match self.lte {
            Some(RangeBound::Int(max)) => n <= max as f64,
            Some(RangeBound::NotANumber) => false,
            None => true,
        };
        lower && upper
    }
}

/// A condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match against a literal value.
    Literal(Value),
    /// Regular-expression match.
    Regex(RegexMatch),
    /// Numeric range match.
    Range(NumericRange),
    /// Field equals (or, for an array field, contains) any of the values.
    In(Vec<Value>),
}

/// A document query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Per-field conditions; a document matches when every one holds.
    /// Each field path appears at most once.
    Fields(BTreeMap<String, Condition>),
    /// Matches when every sub-query matches.
    And(Vec<Query>),
    /// Matches when any sub-query matches.
    Or(Vec<Query>),
    /// A pre-assembled query object handed to the store untouched.
    Raw(Map<String, Value>),
}

impl Default for Query {
    fn default() -> Self {
        Self::all()
    }
}

impl Query {
    /// The unfiltered query: matches every document.
    #[must_use]
    pub const fn all() -> Self {
        Self::Fields(BTreeMap::new())
    }

    /// A query with a single field condition.
    pub fn field(field: impl Into<String>, condition: Condition) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), condition);
        Self::Fields(fields)
    }

    /// Match a document by its identity.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::field(ID_FIELD, Condition::Literal(Value::String(id.into())))
    }

    /// Match documents whose `field` equals or contains any of `ids`.
    pub fn ids_in<I, S>(field: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = ids.into_iter().map(|id| Value::String(id.into())).collect();
        Self::field(field, Condition::In(values))
    }

    /// Match documents whose `field` matches the pattern, ignoring case.
    pub fn matching(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::field(field, Condition::Regex(RegexMatch::case_insensitive(pattern)))
    }

    /// Disjunction of sub-queries.
    #[must_use]
    pub const fn any_of(queries: Vec<Self>) -> Self {
        Self::Or(queries)
    }

    /// Conjunction of sub-queries.
    #[must_use]
    pub const fn all_of(queries: Vec<Self>) -> Self {
        Self::And(queries)
    }

    /// `true` if this query matches every document.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        match self {
            Self::Fields(fields) => fields.is_empty(),
            Self::Raw(raw) => raw.is_empty(),
            Self::And(queries) => queries.iter().all(Self::is_unfiltered),
            Self::Or(_) => false,
        }
    }

    /// Field paths whose range holds a not-a-number bound.
    ///
    /// A non-empty result is a query-construction defect; such a query
    /// should not be executed.
    #[must_use]
    pub fn invalid_bounds(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_invalid_bounds(&mut fields);
        fields
    }

    fn collect_invalid_bounds<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Fields(fields) => {
                for (field, condition) in fields {
                    if let Condition::Range(range) = condition
                        && !range.is_valid()
                    {
                        out.push(field);
                    }
                }
            },
            Self::And(queries) | Self::Or(queries) => {
                for query in queries {
                    query.collect_invalid_bounds(out);
                }
            },
            Self::Raw(_) => {},
        }
    }
}
