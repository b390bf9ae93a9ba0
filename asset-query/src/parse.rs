//! Parsing of Mongo-style JSON back into a [`Query`].
//!
//! Accepts the shape produced by [`Query::to_json`]:
//!
//! | Syntax | Example |
//! |--------|---------|
//! | Implicit `$eq` | `{"name": "Gundam"}` |
//! | Explicit `$eq` | `{"name": {"$eq": "Gundam"}}` |
//! | `$regex` | `{"name": {"$regex": "gun", "$options": "i"}}` |
//! | `$in` | `{"tags": {"$in": ["t1", "t2"]}}` |
//! | `$gte` / `$lte` | `{"fileSize": {"$gte": 2, "$lte": 9}}` |
//! | `$and` / `$or` | `{"$or": [{...}, {...}]}` |
//!
//! Any other `$` operator is rejected.

use crate::query::{
    AND_KEY, Condition, NumericRange, OR_KEY, Query, RangeBound, RangeOp, RegexMatch,
};
use crate::render::{EQ_OP, IN_OP, OPTIONS_OP, REGEX_OP};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Error type for query parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Invalid JSON syntax.
    InvalidJson(String),
    /// Unknown operator (e.g. `$where`).
    UnknownOperator(String),
    /// Expected an object but got something else.
    ExpectedObject,
    /// Expected an array but got something else.
    ExpectedArray,
    /// Invalid operator value type.
    InvalidOperatorValue {
        /// The operator that had the wrong value type.
        op: String,
        /// Description of what was expected.
        expected: &'static str,
    },
    /// Operators on one field that cannot form a single condition.
    ConflictingOperators(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "Invalid JSON: {err}"),
            Self::UnknownOperator(op) => write!(f, "Unknown operator '{op}'"),
            Self::ExpectedObject => write!(f, "Expected JSON object"),
            Self::ExpectedArray => write!(f, "Expected JSON array"),
            Self::InvalidOperatorValue { op, expected } => {
                write!(f, "Operator '{op}' expects {expected}")
            },
            Self::ConflictingOperators(field) => {
                write!(f, "Conflicting operators on field '{field}'")
            },
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a Mongo-style query from a JSON string.
///
/// # Example
///
/// ```
/// use asset_query::{Query, parse_query};
///
/// let query = parse_query(r#"{"name": {"$regex": "gundam", "$options": "i"}}"#).unwrap();
/// assert_eq!(query, Query::matching("name", "gundam"));
/// ```
pub fn parse_query(json: &str) -> Result<Query, ParseError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    Query::from_json(&value)
}

impl Query {
    /// Parse a Mongo-style query object.
    ///
    /// Field conditions and `$and`/`$or` keys in one object are combined as a
    /// conjunction.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let Value::Object(obj) = value else {
            return Err(ParseError::ExpectedObject);
        };

        let mut fields = BTreeMap::new();
        let mut compounds = Vec::new();

        for (key, value) in obj {
            match key.as_str() {
                AND_KEY => compounds.push(Self::And(parse_list(key, value)?)),
                OR_KEY => compounds.push(Self::Or(parse_list(key, value)?)),
                op if op.starts_with('$') => {
                    return Err(ParseError::UnknownOperator(op.to_string()));
                },
                field => {
                    fields.insert(field.to_string(), parse_condition(field, value)?);
                },
            }
        }

        Ok(match (fields.is_empty(), compounds.len()) {
            (_, 0) => Self::Fields(fields),
            (true, 1) => compounds.remove(0),
            (true, _) => Self::And(compounds),
            (false, _) => {
                let mut parts = vec![Self::Fields(fields)];
                parts.append(&mut compounds);
                Self::And(parts)
            },
        })
    }
}

fn parse_list(op: &str, value: &Value) -> Result<Vec<Query>, ParseError> {
    let Value::Array(items) = value else {
        return Err(ParseError::InvalidOperatorValue {
            op: op.to_string(),
            expected: "an array of query objects",
        });
    };
    items.iter().map(Query::from_json).collect()
}

/// `true` if every key of the object is an operator.
fn is_operator_object(obj: &Map<String, Value>) -> bool {
    !obj.is_empty() && obj.keys().all(|k| k.starts_with('$'))
}

fn parse_condition(field: &str, value: &Value) -> Result<Condition, ParseError> {
    let Value::Object(ops) = value else {
        return Ok(Condition::Literal(value.clone()));
    };
    if !is_operator_object(ops) {
        return Ok(Condition::Literal(value.clone()));
    }

    let mut condition: Option<Condition> = None;
    let mut range = NumericRange::default();
    let mut has_range = false;
    let mut options: Option<&str> = None;

    for (op, arg) in ops {
        let parsed = match op.as_str() {
            EQ_OP => Condition::Literal(arg.clone()),
            REGEX_OP => match arg {
                Value::String(pattern) => {
                    Condition::Regex(RegexMatch::case_sensitive(pattern.clone()))
                },
                _ => return Err(invalid(op, "a string pattern")),
            },
            OPTIONS_OP => {
                options = Some(arg.as_str().ok_or_else(|| invalid(op, "a string of flags"))?);
                continue;
            },
            IN_OP => match arg {
                Value::Array(values) => Condition::In(values.clone()),
                _ => return Err(invalid(op, "an array")),
            },
            other => match other.strip_prefix('$').and_then(RangeOp::from_segment) {
                Some(range_op) => {
                    range = range.merge(NumericRange::with_bound(range_op, parse_bound(op, arg)?));
                    has_range = true;
                    continue;
                },
                _ => return Err(ParseError::UnknownOperator(other.to_string())),
            },
        };
        if condition.replace(parsed).is_some() {
            return Err(ParseError::ConflictingOperators(field.to_string()));
        }
    }

    if has_range {
        if condition.is_some() {
            return Err(ParseError::ConflictingOperators(field.to_string()));
        }
        condition = Some(Condition::Range(range));
    }

    match (condition, options) {
        (Some(Condition::Regex(mut regex)), Some(flags)) => {
            regex.case_insensitive = flags.contains('i');
            Ok(Condition::Regex(regex))
        },
        (_, Some(_)) => Err(invalid(OPTIONS_OP, "to accompany $regex")),
        (Some(condition), None) => Ok(condition),
        (None, None) => Ok(Condition::Literal(value.clone())),
    }
}

fn parse_bound(op: &str, value: &Value) -> Result<RangeBound, ParseError> {
    match value {
        Value::Null => Ok(RangeBound::NotANumber),
        Value::Number(n) => n
            .as_i64()
            .map(RangeBound::Int)
            .ok_or_else(|| invalid(op, "an integer")),
        _ => Err(invalid(op, "an integer")),
    }
}

fn invalid(op: &str, expected: &'static str) -> ParseError {
    ParseError::InvalidOperatorValue {
        op: op.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_implicit_eq() {
        let query = Query::from_json(&json!({ "name": "Gundam" })).unwrap();
        assert_eq!(query, Query::field("name", Condition::Literal(json!("Gundam"))));
    }

    #[test]
    fn test_parse_explicit_eq() {
        let query = Query::from_json(&json!({ "_id": { "$eq": "a1" } })).unwrap();
        assert_eq!(query, Query::by_id("a1"));
    }

    #[test]
    fn test_parse_regex_options() {
        let ci = Query::from_json(&json!({ "name": { "$regex": "g", "$options": "i" } })).unwrap();
        assert_eq!(ci, Query::matching("name", "g"));

        let cs = Query::from_json(&json!({ "name": { "$regex": "g" } })).unwrap();
        assert_eq!(
            cs,
            Query::field("name", Condition::Regex(RegexMatch::case_sensitive("g")))
        );
    }

    #[test]
    fn test_parse_range() {
        let query = Query::from_json(&json!({ "fileSize": { "$gte": 2, "$lte": null } })).unwrap();
        let expected = NumericRange {
            gte: Some(RangeBound::Int(2)),
            lte: Some(RangeBound::NotANumber),
        };
        assert_eq!(query, Query::field("fileSize", Condition::Range(expected)));
        assert_eq!(query.invalid_bounds(), vec!["fileSize"]);
    }

    #[test]
    fn test_parse_in_and_or() {
        let query = Query::from_json(&json!({
            "$or": [{ "tags": { "$in": ["t1"] } }, { "projects": { "$in": ["p1"] } }]
        }))
        .unwrap();
        assert_eq!(
            query,
            Query::any_of(vec![
                Query::ids_in("tags", ["t1"]),
                Query::ids_in("projects", ["p1"]),
            ])
        );
    }

    #[test]
    fn test_fields_and_compound_combine_as_conjunction() {
        let query = Query::from_json(&json!({ "name": "x", "$or": [{ "a": 1 }] })).unwrap();
        let Query::And(parts) = query else {
            panic!("expected conjunction")
        };
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_plain_object_value_is_literal() {
        let query = Query::from_json(&json!({ "meta": { "author": "x" } })).unwrap();
        assert_eq!(
            query,
            Query::field("meta", Condition::Literal(json!({ "author": "x" })))
        );
    }

    #[test]
    fn test_unknown_operators_are_rejected() {
        assert_eq!(
            Query::from_json(&json!({ "$where": "1" })),
            Err(ParseError::UnknownOperator("$where".into()))
        );
        assert_eq!(
            Query::from_json(&json!({ "a": { "$ne": 1 } })),
            Err(ParseError::UnknownOperator("$ne".into()))
        );
    }

    #[test]
    fn test_invalid_shapes() {
        assert_eq!(Query::from_json(&json!([1])), Err(ParseError::ExpectedObject));
        assert!(matches!(
            Query::from_json(&json!({ "$or": {} })),
            Err(ParseError::InvalidOperatorValue { .. })
        ));
        assert!(matches!(
            Query::from_json(&json!({ "a": { "$in": "x" } })),
            Err(ParseError::InvalidOperatorValue { .. })
        ));
        assert!(matches!(
            Query::from_json(&json!({ "a": { "$gte": "x" } })),
            Err(ParseError::InvalidOperatorValue { .. })
        ));
        assert!(matches!(
            parse_query("{not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_conflicting_operators() {
        assert_eq!(
            Query::from_json(&json!({ "a": { "$in": [1], "$gte": 1 } })),
            Err(ParseError::ConflictingOperators("a".into()))
        );
        assert_eq!(
            Query::from_json(&json!({ "a": { "$in": [1], "$eq": 1 } })),
            Err(ParseError::ConflictingOperators("a".into()))
        );
    }

    #[test]
    fn test_rendered_queries_parse_back() {
        let query = Query::all_of(vec![
            Query::matching("name", "gundam|robot"),
            Query::ids_in("tags", ["t1", "t2"]),
            Query::field(
                "price",
                Condition::Range(NumericRange::with_bound(RangeOp::Lte, RangeBound::Int(9))),
            ),
        ]);
        assert_eq!(Query::from_json(&query.to_json()).unwrap(), query);
    }
}
