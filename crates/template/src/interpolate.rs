use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// `{#1}`, `{#2}`, ... (no leading zero) and the cursor token `{#n}`
static POSITIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{#([1-9][0-9]*|n)\}").unwrap());

/// `{$identifier}`
static NAMED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\$([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

/// Values source for a single interpolation call.
///
/// The variant decides which placeholder dialect is recognized. Placeholders
/// of the other dialect are copied to the output untouched.
#[derive(Debug, Clone, Copy)]
pub enum Values<'a> {
    /// Named lookup for `{$key}` placeholders
    Named(&'a HashMap<String, String>),

    /// Ordered sequence for `{#k}` (1-based) and `{#n}` (cursor) placeholders
    Positional(&'a [String]),
}

impl<'a> From<&'a HashMap<String, String>> for Values<'a> {
    fn from(values: &'a HashMap<String, String>) -> Self {
        Self::Named(values)
    }
}

impl<'a> From<&'a [String]> for Values<'a> {
    fn from(values: &'a [String]) -> Self {
        Self::Positional(values)
    }
}

impl<'a> From<&'a Vec<String>> for Values<'a> {
    fn from(values: &'a Vec<String>) -> Self {
        Self::Positional(values.as_slice())
    }
}

/// Substitution used when a placeholder has no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback<'a> {
    /// Replace the placeholder with this text
    Text(&'a str),

    /// Leave the placeholder text as written, braces and sigil included
    KeepPlaceholder,
}

impl Default for Fallback<'_> {
    fn default() -> Self {
        Self::Text("")
    }
}

/// Interpolate `template` with `values`.
///
/// The template is scanned once from left to right. Every recognized
/// placeholder is replaced by its value verbatim, or by `fallback` when the
/// value is missing. Everything else, including malformed brace sequences,
/// is copied unchanged. The `{#n}` cursor starts at zero for every call and
/// advances on each `{#n}`, whether or not it resolved.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use peekaboo_template::{interpolate, Fallback, Values};
///
/// let names = HashMap::from([("name".to_string(), "John".to_string())]);
/// assert_eq!(interpolate("Hello, {$name}", Values::Named(&names), Fallback::default()), "Hello, John");
///
/// let args = vec!["John".to_string()];
/// assert_eq!(interpolate("Hello, {#1}", (&args).into(), Fallback::default()), "Hello, John");
/// ```
pub fn interpolate(template: &str, values: Values<'_>, fallback: Fallback<'_>) -> String {
    let resolve = |caps: &Captures<'_>, value: Option<&String>| -> String {
        match (value, fallback) {
            (Some(value), _) => value.clone(),
            (None, Fallback::Text(text)) => text.to_string(),
            (None, Fallback::KeepPlaceholder) => caps[0].to_string(),
        }
    };

    match values {
        Values::Named(map) => NAMED_RE
            .replace_all(template, |caps: &Captures<'_>| resolve(caps, map.get(&caps[1])))
            .into_owned(),
        Values::Positional(seq) => {
            let mut cursor = 0usize;
            POSITIONAL_RE
                .replace_all(template, |caps: &Captures<'_>| {
                    let value = match &caps[1] {
                        "n" => {
                            let value = seq.get(cursor);
                            cursor += 1;
                            value
                        }
                        // Indices too large for usize cannot be in range
                        index => index
                            .parse::<usize>()
                            .ok()
                            .and_then(|k| seq.get(k - 1)),
                    };
                    resolve(caps, value)
                })
                .into_owned()
        }
    }
}

/// Interpolate, keeping unresolved placeholders as written
pub fn interpolate_or_keep(template: &str, values: Values<'_>) -> String {
    interpolate(template, values, Fallback::KeepPlaceholder)
}
