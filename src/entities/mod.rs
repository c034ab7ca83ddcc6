mod products;

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

pub use products::{Product, ProductBrand, ProductType};

pub type EntityId = i32;

/// Anything a repository can serve: a value with a stable integer identity.
///
/// `field` exposes scalar attributes by name so criteria can be evaluated
/// in-process. Related data attached through includes is not a field.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Stable name used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> EntityId;

    fn field(&self, name: &str) -> Option<FieldValue>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    /// Orders two values of the same variant. Mixed variants are incomparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "int",
            FieldValue::Text(_) => "text",
            FieldValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Text(value) => write!(f, "{value:?}"),
            FieldValue::Timestamp(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::Timestamp(value)
    }
}
