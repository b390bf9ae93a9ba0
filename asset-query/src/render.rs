//! Rendering of [`Query`] into the Mongo-style wire shape.
//!
//! | Condition | Rendered |
//! |-----------|----------|
//! | `Literal(v)` | `v`, or `{"$eq": v}` when `v` is an object with `$` keys |
//! | `Regex` | `{"$regex": p, "$options": "i"}` (`$options` omitted when case-sensitive) |
//! | `Range` | `{"$gte": n, "$lte": n}` (missing bounds omitted, not-a-number as `null`) |
//! | `In(vs)` | `{"$in": vs}` |
//! | `And`/`Or` | `{"$and": [...]}` / `{"$or": [...]}` |
//! | `Raw(obj)` | `obj` |

use crate::query::{AND_KEY, Condition, NumericRange, OR_KEY, Query, RangeBound, RangeOp};
use serde_json::{Map, Value};

pub(crate) const EQ_OP: &str = "$eq";
pub(crate) const REGEX_OP: &str = "$regex";
pub(crate) const OPTIONS_OP: &str = "$options";
pub(crate) const IN_OP: &str = "$in";

impl Query {
    /// Render the query as a Mongo-style JSON object.
    ///
    /// ```
    /// use asset_query::Query;
    /// use serde_json::json;
    ///
    /// let query = Query::matching("name", "gundam");
    /// assert_eq!(
    ///     query.to_json(),
    ///     json!({ "name": { "$regex": "gundam", "$options": "i" } })
    /// );
    /// ```
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Fields(fields) => {
                let obj: Map<String, Value> = fields
                    .iter()
                    .map(|(field, condition)| (field.clone(), condition.to_json()))
                    .collect();
                Value::Object(obj)
            },
            Self::And(queries) => compound(AND_KEY, queries),
            Self::Or(queries) => compound(OR_KEY, queries),
            Self::Raw(raw) => Value::Object(raw.clone()),
        }
    }
}

impl Condition {
    /// Render the condition as the value of a field in a Mongo-style query.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Literal(value) if has_operator_keys(value) => {
                let mut obj = Map::new();
                obj.insert(EQ_OP.to_string(), value.clone());
                Value::Object(obj)
            },
            Self::Literal(value) => value.clone(),
            Self::Regex(regex) => {
                let mut obj = Map::new();
                obj.insert(REGEX_OP.to_string(), Value::String(regex.pattern.clone()));
                if regex.case_insensitive {
                    obj.insert(OPTIONS_OP.to_string(), Value::String("i".to_string()));
                }
                Value::Object(obj)
            },
            Self::Range(range) => render_range(range),
            Self::In(values) => {
                let mut obj = Map::new();
                obj.insert(IN_OP.to_string(), Value::Array(values.clone()));
                Value::Object(obj)
            },
        }
    }
}

/// An object literal holding `$` keys would read back as operators.
fn has_operator_keys(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.keys().any(|k| k.starts_with('$')))
}

fn compound(key: &str, queries: &[Query]) -> Value {
    let mut obj = Map::new();
    obj.insert(
        key.to_string(),
        Value::Array(queries.iter().map(Query::to_json).collect()),
    );
    Value::Object(obj)
}

fn render_range(range: &NumericRange) -> Value {
    let mut obj = Map::new();
    for (op, bound) in [(RangeOp::Gte, range.gte), (RangeOp::Lte, range.lte)] {
        if let Some(bound) = bound {
            let value = match bound {
                RangeBound::Int(n) => Value::from(n),
                RangeBound::NotANumber => Value::Null,
            };
            obj.insert(op.mongo_key().to_string(), value);
        }
    }
    Value::Object(obj)
}
