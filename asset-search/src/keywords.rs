//! Keyword input cleaning.
//!
//! Keywords arrive as one comma-separated string from an untrusted client and
//! end up inside regular expressions, so markup and regex metacharacters are
//! removed before splitting.
//!
//! ```
//! use asset_search::parse_keywords;
//!
//! assert_eq!(parse_keywords("Robot,<b>Gundam</b>,,sci_fi"), vec!["robot", "gundam", "sci fi"]);
//! assert!(parse_keywords("").is_empty());
//! ```

use crate::constants::{RAW_TEXT_ELEMENTS, REGEX_METACHARACTERS};

/// Clean a raw keyword string.
///
/// - HTML tags are removed; `script` and `style` elements lose their content
///   too.
/// - Regex metacharacters `. * + ? ^ $ { } ( ) | [ ] \` are removed.
/// - `_` becomes a space.
///
/// ```
/// use asset_search::sanitize;
///
/// assert_eq!(sanitize("<script>alert(1)</script>low_poly.*"), "low poly");
/// ```
#[must_use]
pub fn sanitize(input: &str) -> String {
    strip_regex_chars(&strip_html(input)).replace('_', " ")
}

/// Split a keyword string on commas after sanitising it.
///
/// Keywords are lowercased and empty ones are dropped. Surrounding spaces are
/// kept.
#[must_use]
pub fn parse_keywords(raw: &str) -> Vec<String> {
    sanitize(raw)
        .to_lowercase()
        .split(',')
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove regex metacharacters so the input can be embedded in a pattern.
#[must_use]
pub fn strip_regex_chars(input: &str) -> String {
    input.chars().filter(|c| !REGEX_METACHARACTERS.contains(c)).collect()
}

/// Remove HTML tags, comments and the content of raw-text elements.
///
/// A `<` not followed by a letter, `/` or `!` is plain text.
fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        let (text, tail) = rest.split_at(start);
        out.push_str(text);

        let after = tail.get(1..).unwrap_or_default();
        let starts_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        if !starts_tag {
            out.push('<');
            rest = after;
            continue;
        }

        if let Some(comment) = after.strip_prefix("!--") {
            rest = comment.find("-->").map_or("", |end| comment.get(end + 3..).unwrap_or_default());
            continue;
        }

        let Some(end) = after.find('>') else {
            // Unterminated tag: the remainder is markup.
            rest = "";
            break;
        };
        let (tag, remainder) = after.split_at(end);
        rest = remainder.get(1..).unwrap_or_default();

        let name = tag_name(tag);
        if !tag.starts_with('/') && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            rest = skip_raw_text(rest, &name);
        }
    }

    out.push_str(rest);
    out
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Skip past the closing tag of a raw-text element, or to the end.
fn skip_raw_text<'a>(rest: &'a str, name: &str) -> &'a str {
    let closing = format!("</{name}");
    let lowered = rest.to_ascii_lowercase();
    let Some(close) = lowered.find(&closing) else {
        return "";
    };
    let after_close = rest.get(close..).unwrap_or_default();
    after_close
        .find('>')
        .map_or("", |end| after_close.get(end + 1..).unwrap_or_default())
}
