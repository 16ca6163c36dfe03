//! Declarative record filters
//!
//! Services describe what they want as a list of [`Predicate`]s; each store
//! translates them (SQL over `resource->>'field'` for Postgres, direct JSON
//! evaluation for the memory store). Field names are always static.

use serde::Serialize;
use serde_json::Value as JsonValue;

fn to_json(value: impl Serialize) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field` equals `value` (JSON equality, so `"x"` never matches `1`).
    Eq {
        field: &'static str,
        value: JsonValue,
    },
    /// `field` is absent, null or different from `value`.
    NotEq {
        field: &'static str,
        value: JsonValue,
    },
    IsNull(&'static str),
    NotNull(&'static str),
    /// Case-insensitive substring match on any of `fields`.
    Search {
        fields: &'static [&'static str],
        term: String,
    },
    /// At least one of the inner predicates holds.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: &'static str, value: impl Serialize) -> Self {
        Self::Eq {
            field,
            value: to_json(value),
        }
    }

    pub fn not_eq(field: &'static str, value: impl Serialize) -> Self {
        Self::NotEq {
            field,
            value: to_json(value),
        }
    }

    /// Equality on an optional value; `None` matches null.
    pub fn eq_or_null<T: Serialize>(field: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => Self::eq(field, value),
            None => Self::IsNull(field),
        }
    }

    /// Search predicate, or nothing for a blank term.
    pub fn search(fields: &'static [&'static str], term: Option<&str>) -> Option<Self> {
        let term = term.map(str::trim).filter(|t| !t.is_empty())?;
        Some(Self::Search {
            fields,
            term: term.to_string(),
        })
    }

    pub fn matches(&self, document: &JsonValue) -> bool {
        let get = |field: &str| document.get(field).filter(|v| !v.is_null());
        match self {
            Self::Eq { field, value } => get(*field) == Some(value),
            Self::NotEq { field, value } => get(*field) != Some(value),
            Self::IsNull(field) => get(*field).is_none(),
            Self::NotNull(field) => get(*field).is_some(),
            Self::Search { fields, term } => {
                let term = term.to_lowercase();
                fields.iter().any(|field| {
                    get(*field)
                        .and_then(JsonValue::as_str)
                        .is_some_and(|text| text.to_lowercase().contains(&term))
                })
            }
            Self::Any(inner) => inner.iter().any(|p| p.matches(document)),
        }
    }
}

/// Filter plus window for list queries.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub predicates: Vec<Predicate>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl RecordQuery {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            ..Default::default()
        }
    }

    pub fn matches(&self, document: &JsonValue) -> bool {
        self.predicates.iter().all(|p| p.matches(document))
    }
}

/// One window of results plus the total number of matches.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
