use crate::record::{FieldLookup, FieldValue};

/// Placeholder rendered for null or unresolvable table values.
pub const PLACEHOLDER: &str = "-";
/// Label substituted for unresolvable chart axis values.
pub const UNKNOWN_LABEL: &str = "unknown";

/// A template token: either literal display text, or a `{name}` reference
/// to a record attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    Literal(String),
    Field(String),
}

impl FieldRef {
    /// Tokens starting with `{` are references; everything else is literal.
    pub fn parse(token: &str) -> FieldRef {
        if token.starts_with('{') {
            FieldRef::Field(trim_braces(token).to_string())
        } else {
            FieldRef::Literal(token.to_string())
        }
    }

    /// The referenced attribute name, if this token is a reference.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            FieldRef::Field(name) => Some(name),
            FieldRef::Literal(_) => None,
        }
    }
}

/// Strip surrounding braces from a reference token.
/// Chart fields use this directly: their x/y/legend fields are attribute
/// names whether or not the author wrapped them.
pub fn trim_braces(token: &str) -> &str {
    token.trim_matches(|c| c == '{' || c == '}')
}

/// Outcome of resolving a reference against one record.
///
/// `Missing` is a defensive fallback: validation catches dangling
/// references before rendering starts, so hitting it at render time only
/// degrades to a placeholder, never a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(FieldValue),
    Literal(String),
    Missing,
}

impl Resolved {
    pub fn text(&self) -> Option<String> {
        match self {
            Resolved::Value(v) => v.text(),
            Resolved::Literal(s) => Some(s.clone()),
            Resolved::Missing => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Resolved::Value(v) => v.as_number(),
            Resolved::Literal(s) => s.trim().parse::<f64>().ok(),
            Resolved::Missing => None,
        }
    }
}

/// Resolve a reference against a record.
pub fn resolve<R: FieldLookup>(record: &R, reference: &FieldRef) -> Resolved {
    match reference {
        FieldRef::Literal(text) => Resolved::Literal(text.clone()),
        FieldRef::Field(name) => match record.get(name) {
            Some(value) => Resolved::Value(value),
            None => Resolved::Missing,
        },
    }
}
