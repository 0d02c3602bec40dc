//! SOQL WHERE clause building blocks

use chrono::NaiveDateTime;

/// Timestamp format SOQL expects for datetime literals
pub const SOQL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A literal value on the right-hand side of a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    /// Rendered unquoted in UTC (`2018-02-15T00:00:00Z`)
    DateTime(NaiveDateTime),
}

impl FilterValue {
    /// Render as a SOQL literal
    pub fn to_soql(&self) -> String {
        match self {
            FilterValue::String(s) => format!("'{}'", escape_soql(s)),
            FilterValue::DateTime(dt) => dt.format(SOQL_DATETIME_FORMAT).to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(dt: NaiveDateTime) -> Self {
        FilterValue::DateTime(dt)
    }
}

/// A single condition; multiple filters on a query are joined with AND
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Gt(String, FilterValue),
    Lt(String, FilterValue),
}

impl Filter {
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// Render as a SOQL condition
    pub fn to_soql(&self) -> String {
        match self {
            Filter::Gt(field, value) => format!("{} > {}", field, value.to_soql()),
            Filter::Lt(field, value) => format!("{} < {}", field, value.to_soql()),
        }
    }
}

/// Escape a string for use inside single quotes
fn escape_soql(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
