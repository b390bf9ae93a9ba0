//! Translation of flattened filter terms into a document query.
//!
//! Each key is classified once into a [`TermKind`], then folded into the
//! query:
//!
//! | Term | Condition |
//! |------|-----------|
//! | `"$and"` / `"$or"` key anywhere | whole filter passed through as [`Query::Raw`] |
//! | array value | case-insensitive regex, elements joined with `\|` |
//! | key ending in `.gte` / `.lte` | integer bound merged into a range on the parent path |
//! | number or numeric string | exact-match literal |
//! | boolean | exact-match literal |
//! | any other string | case-insensitive regex |

use crate::filter::FlatFilter;
use crate::query::{
    AND_KEY, Condition, NumericRange, OR_KEY, Query, RangeBound, RangeOp, RegexMatch,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// How a single flattened term translates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermKind<'a> {
    /// Array value: alternation regex over the elements.
    Alternation(&'a [Value]),
    /// `field.gte` / `field.lte`: a numeric bound on `field`.
    Bound {
        /// Field path with the operator segment stripped.
        field: &'a str,
        /// Which side of the range.
        op: RangeOp,
    },
    /// Number or numeric-looking string: exact match.
    NumericLiteral,
    /// Boolean (or any other non-string scalar): exact match.
    ExactLiteral,
    /// Non-numeric string: case-insensitive regex.
    Pattern(&'a str),
}

/// Classify one flattened term.
///
/// # Example
///
/// ```
/// use asset_query::{RangeOp, TermKind, classify_term};
/// use serde_json::json;
///
/// let value = json!(5);
/// assert_eq!(
///     classify_term("model.triCount.gte", &value),
///     TermKind::Bound { field: "model.triCount", op: RangeOp::Gte }
/// );
/// ```
#[must_use]
pub fn classify_term<'a>(key: &'a str, value: &'a Value) -> TermKind<'a> {
    if let Value::Array(items) = value {
        return TermKind::Alternation(items);
    }

    let (field, last) = key.rsplit_once('.').unwrap_or(("", key));
    if let Some(op) = RangeOp::from_segment(last) {
        return TermKind::Bound { field, op };
    }

    match value {
        Value::Number(_) => TermKind::NumericLiteral,
        Value::String(s) if is_numeric_literal(s) => TermKind::NumericLiteral,
        Value::String(s) => TermKind::Pattern(s),
        _ => TermKind::ExactLiteral,
    }
}

/// Build a query from flattened filter terms.
///
/// If `$and` or `$or` is one of the keys, the whole filter is returned as a
/// raw pass-through query and no other key is translated.
///
/// # Example
///
/// ```
/// use asset_query::{Condition, Query, RegexMatch, build_query, flatten};
/// use serde_json::json;
///
/// let query = build_query(&flatten(&json!({ "name": ["Gundam", "Robot"] })));
/// assert_eq!(
///     query,
///     Query::field("name", Condition::Regex(RegexMatch::case_insensitive("Gundam|Robot")))
/// );
/// ```
#[must_use]
pub fn build_query(filter: &FlatFilter) -> Query {
    if filter.contains_key(AND_KEY) || filter.contains_key(OR_KEY) {
        return Query::Raw(filter.as_map().clone());
    }

    let mut fields: BTreeMap<String, Condition> = BTreeMap::new();

    for (key, value) in filter.iter() {
        match classify_term(key, value) {
            TermKind::Alternation(items) => {
                let pattern = join_alternation(items);
                fields.insert(
                    key.to_string(),
                    Condition::Regex(RegexMatch::case_insensitive(pattern)),
                );
            },
            TermKind::Bound { field, op } => {
                let bound = build_number_comparison(op, value);
                let range = match fields.get(field) {
                    Some(Condition::Range(existing)) => existing.merge(bound),
                    _ => bound,
                };
                fields.insert(field.to_string(), Condition::Range(range));
            },
            TermKind::NumericLiteral | TermKind::ExactLiteral => {
                fields.insert(key.to_string(), Condition::Literal(value.clone()));
            },
            TermKind::Pattern(pattern) => {
                fields.insert(
                    key.to_string(),
                    Condition::Regex(RegexMatch::case_insensitive(pattern)),
                );
            },
        }
    }

    log::debug!("built query over {} field(s)", fields.len());
    Query::Fields(fields)
}

/// Build a single-bound numeric range for a `gte`/`lte` term.
///
/// The value is parsed with [`parse_int`]; an unparsable value produces the
/// [`RangeBound::NotANumber`] sentinel.
///
/// ```
/// use asset_query::{NumericRange, RangeBound, RangeOp, build_number_comparison};
/// use serde_json::json;
///
/// let range = build_number_comparison(RangeOp::Lte, &json!("3"));
/// assert_eq!(range.lte, Some(RangeBound::Int(3)));
/// assert_eq!(range.gte, None);
/// ```
#[must_use]
pub fn build_number_comparison(op: RangeOp, value: &Value) -> NumericRange {
    NumericRange::with_bound(op, parse_int(value))
}

/// Parse a JSON value as an integer bound.
///
/// - Integers are taken as is; floats are truncated toward zero.
/// - Strings: leading whitespace is skipped, then an optional sign and the
///   leading decimal digits are read (`" 12abc"` is 12).
/// - Anything else, or a string without leading digits, is not a number.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_int(value: &Value) -> RangeBound {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                RangeBound::Int(i)
            } else if let Some(f) = n.as_f64()
                && f.is_finite()
                && f.abs() < 9.223_372_036_854_775e18
            {
                RangeBound::Int(f.trunc() as i64)
            } else {
                RangeBound::NotANumber
            }
        },
        Value::String(s) => parse_leading_int(s),
        _ => RangeBound::NotANumber,
    }
}

fn parse_leading_int(s: &str) -> RangeBound {
    let s = s.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return RangeBound::NotANumber;
    }

    let (digits, _) = rest.split_at(digits_len);
    let parsed = if negative {
        format!("-{digits}").parse::<i64>()
    } else {
        digits.parse::<i64>()
    };
    parsed.map_or(RangeBound::NotANumber, RangeBound::Int)
}

/// `true` if a string should be treated as an exact-match number.
///
/// The trimmed string must parse as a finite number. Empty and
/// whitespace-only strings are not numeric.
#[must_use]
pub fn is_numeric_literal(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Join array elements into a `|` alternation pattern.
fn join_alternation(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::flatten;
    use serde_json::json;

    fn build(value: &Value) -> Query {
        build_query(&flatten(value))
    }

    fn regex(pattern: &str) -> Condition {
        Condition::Regex(RegexMatch::case_insensitive(pattern))
    }

    #[test]
    fn test_string_becomes_case_insensitive_regex() {
        assert_eq!(
            build(&json!({ "name": "Gundam" })),
            Query::field("name", regex("Gundam"))
        );
    }

    #[test]
    fn test_array_becomes_alternation() {
        assert_eq!(
            build(&json!({ "name": ["Gundam", "Robot", "Mecha"] })),
            Query::field("name", regex("Gundam|Robot|Mecha"))
        );
    }

    #[test]
    fn test_single_element_array_is_still_regex() {
        assert_eq!(
            build(&json!({ "name": ["Gundam"] })),
            Query::field("name", regex("Gundam"))
        );
    }

    #[test]
    fn test_alternation_renders_non_string_elements() {
        assert_eq!(
            build(&json!({ "format": ["fbx", 3, true, null] })),
            Query::field("format", regex("fbx|3|true|"))
        );
    }

    #[test]
    fn test_gte_and_lte_merge_into_one_range() {
        let query = build(&json!({ "model.triCount.gte": 5, "model.triCount.lte": 10 }));
        assert_eq!(
            query,
            Query::field(
                "model.triCount",
                Condition::Range(NumericRange {
                    gte: Some(RangeBound::Int(5)),
                    lte: Some(RangeBound::Int(10)),
                })
            )
        );
    }

    #[test]
    fn test_nested_lte_flattens_into_range() {
        let query = build(&json!({ "model": { "triCount": { "lte": 3 } } }));
        assert_eq!(
            query,
            Query::field(
                "model.triCount",
                Condition::Range(NumericRange::with_bound(RangeOp::Lte, RangeBound::Int(3)))
            )
        );
    }

    #[test]
    fn test_range_string_bounds_are_parsed() {
        let query = build(&json!({ "fileSize.gte": "100", "fileSize.lte": " 2000kb" }));
        assert_eq!(
            query,
            Query::field(
                "fileSize",
                Condition::Range(NumericRange {
                    gte: Some(RangeBound::Int(100)),
                    lte: Some(RangeBound::Int(2000)),
                })
            )
        );
    }

    #[test]
    fn test_invalid_bound_is_not_a_number() {
        let query = build(&json!({ "price.gte": "cheap" }));
        assert_eq!(query.invalid_bounds(), vec!["price"]);
    }

    #[test]
    fn test_and_short_circuits_whole_filter() {
        let filter = json!({ "name": "Gundam", "$and": [{ "a": 1 }] });
        let Query::Raw(raw) = build(&filter) else {
            panic!("expected raw pass-through")
        };
        assert_eq!(Value::Object(raw), filter);
    }

    #[test]
    fn test_or_short_circuits_for_any_value() {
        for value in [json!(2), json!(["item1", "item2"]), json!("x"), json!(true)] {
            let filter = json!({ "$or": value });
            assert_eq!(
                build(&filter),
                Query::Raw(filter.as_object().cloned().unwrap_or_default())
            );
        }
    }

    #[test]
    fn test_numeric_values_are_literals() {
        let query = build(&json!({ "price": 20, "fileSize": "2" }));
        let Query::Fields(fields) = query else {
            panic!("expected field query")
        };
        assert_eq!(fields.get("price"), Some(&Condition::Literal(json!(20))));
        assert_eq!(fields.get("fileSize"), Some(&Condition::Literal(json!("2"))));
    }

    #[test]
    fn test_booleans_are_literals() {
        assert_eq!(
            build(&json!({ "model.rigged": true })),
            Query::field("model.rigged", Condition::Literal(json!(true)))
        );
    }

    #[test]
    fn test_empty_and_whitespace_strings_are_patterns() {
        assert_eq!(build(&json!({ "license": "" })), Query::field("license", regex("")));
        assert_eq!(build(&json!({ "license": "  " })), Query::field("license", regex("  ")));
    }

    #[test]
    fn test_empty_filter_is_unfiltered() {
        assert!(build(&json!({})).is_unfiltered());
    }

    #[test]
    fn test_range_replaces_earlier_plain_condition() {
        let query = build(&json!({ "price": "cheap", "price.gte": 3 }));
        assert_eq!(
            query,
            Query::field(
                "price",
                Condition::Range(NumericRange::with_bound(RangeOp::Gte, RangeBound::Int(3)))
            )
        );
    }

    #[test]
    fn test_bare_bound_key_has_empty_field() {
        assert_eq!(
            classify_term("gte", &json!(1)),
            TermKind::Bound {
                field: "",
                op: RangeOp::Gte
            }
        );
    }

    #[test]
    fn test_array_takes_precedence_over_bound() {
        let value = json!([5]);
        assert!(matches!(
            classify_term("price.gte", &value),
            TermKind::Alternation(_)
        ));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(&json!(5)), RangeBound::Int(5));
        assert_eq!(parse_int(&json!(5.9)), RangeBound::Int(5));
        assert_eq!(parse_int(&json!(-5.9)), RangeBound::Int(-5));
        assert_eq!(parse_int(&json!("-4")), RangeBound::Int(-4));
        assert_eq!(parse_int(&json!("+7")), RangeBound::Int(7));
        assert_eq!(parse_int(&json!("3.7")), RangeBound::Int(3));
        assert_eq!(parse_int(&json!("  12abc")), RangeBound::Int(12));
        assert_eq!(parse_int(&json!("abc")), RangeBound::NotANumber);
        assert_eq!(parse_int(&json!("")), RangeBound::NotANumber);
        assert_eq!(parse_int(&json!("-")), RangeBound::NotANumber);
        assert_eq!(parse_int(&json!(true)), RangeBound::NotANumber);
        assert_eq!(
            parse_int(&json!("99999999999999999999")),
            RangeBound::NotANumber
        );
    }

    #[test]
    fn test_is_numeric_literal() {
        assert!(is_numeric_literal("2"));
        assert!(is_numeric_literal(" 2.5 "));
        assert!(is_numeric_literal("-1e3"));
        assert!(!is_numeric_literal(""));
        assert!(!is_numeric_literal("   "));
        assert!(!is_numeric_literal("Gundam"));
        assert!(!is_numeric_literal("NaN"));
        assert!(!is_numeric_literal("inf"));
    }
}
