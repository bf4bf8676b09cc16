//! Dotted-path queries over JSON responses.
//!
//! A query is an optional leading `.` followed by `.`-separated segments.
//! Each segment is a field name, optionally followed by a single `[index]`.
//! Failures are reported as sentinel outcomes rather than errors so that
//! interactive inspection never aborts.

use std::fmt;

use serde_json::Value as JsonValue;

/// Result of evaluating a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome<'a> {
    /// The value the path leads to.
    Found(&'a JsonValue),
    /// The path ran into `null` before it was fully applied.
    Null,
    /// A field lookup failed.
    FieldNotFound,
    /// The bracketed index is not an integer.
    InvalidArrayIndex,
    /// The index is negative or past the end of the array.
    IndexOutOfBounds,
    /// An index was applied to something other than an array.
    NotAnArray,
}

impl QueryOutcome<'_> {
    /// Returns the sentinel text, or `None` for a found value.
    #[must_use]
    pub const fn sentinel(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::Null => Some("null"),
            Self::FieldNotFound => Some("Field not found"),
            Self::InvalidArrayIndex => Some("Invalid array index"),
            Self::IndexOutOfBounds => Some("Array index out of bounds"),
            Self::NotAnArray => Some("Not an array"),
        }
    }

    /// Returns the found value.
    #[must_use]
    pub const fn value(&self) -> Option<&JsonValue> {
        match self {
            Self::Found(value) => Some(*value),
            _ => None,
        }
    }

    /// Renders the outcome for display: strings as plain text, containers
    /// as indented JSON, sentinels as their message.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Found(JsonValue::String(text)) => text.clone(),
            Self::Found(value @ (JsonValue::Array(_) | JsonValue::Object(_))) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Found(value) => value.to_string(),
            sentinel => sentinel.sentinel().unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for QueryOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Evaluates `query` against `root`.
#[must_use]
pub fn evaluate<'a>(root: &'a JsonValue, query: &str) -> QueryOutcome<'a> {
    if root.is_null() {
        return QueryOutcome::Null;
    }
    let path = query.strip_prefix('.').unwrap_or(query);
    if path.is_empty() {
        return QueryOutcome::Found(root);
    }

    let mut current = root;
    for segment in path.split('.') {
        if current.is_null() {
            return QueryOutcome::Null;
        }
        let next = if segment.contains('[') && segment.contains(']') {
            index_segment(current, segment)
        } else {
            field(current, segment)
        };
        match next {
            QueryOutcome::Found(value) => current = value,
            sentinel => return sentinel,
        }
    }
    QueryOutcome::Found(current)
}

fn field<'a>(value: &'a JsonValue, name: &str) -> QueryOutcome<'a> {
    value
        .as_object()
        .and_then(|map| map.get(name))
        .map_or(QueryOutcome::FieldNotFound, QueryOutcome::Found)
}

fn index_segment<'a>(value: &'a JsonValue, segment: &str) -> QueryOutcome<'a> {
    let Some((name, rest)) = segment.split_once('[') else {
        return field(value, segment);
    };
    let Ok(index) = rest.strip_suffix(']').unwrap_or(rest).parse::<i64>() else {
        return QueryOutcome::InvalidArrayIndex;
    };

    let target = if name.is_empty() {
        value
    } else {
        match field(value, name) {
            QueryOutcome::Found(JsonValue::Null) => return QueryOutcome::Null,
            QueryOutcome::Found(found) => found,
            sentinel => return sentinel,
        }
    };

    let Some(items) = target.as_array() else {
        return QueryOutcome::NotAnArray;
    };
    usize::try_from(index)
        .ok()
        .and_then(|index| items.get(index))
        .map_or(QueryOutcome::IndexOutOfBounds, QueryOutcome::Found)
}
