mod compare;
mod wire;


use crate::db::MockInstance;
use mockdb_schema::types::Literal;
use serde::Serialize;

// re-exports
pub use compare::{loose_eq, order_cmp};

///
/// RecordId
/// Synthetic identity assigned by a record store on first persistence.
///

pub type RecordId = i64;

///
/// Attrs
/// Ordered mass-assignment payload or equality predicate.
///

pub type Attrs = Vec<(String, Value)>;

///
/// Value
///
/// Dynamically typed attribute value, stub argument and stub result.
///
/// Null   → the column holds no value.
/// Record → a handle to a mocked record, compared by identity.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Ordered list of values. As a query predicate it means membership.
    List(Vec<Self>),
    Record(MockInstance),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&MockInstance> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_record(self) -> Option<MockInstance> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Short label used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }

    /// Predicate match: a list expectation means membership, anything else
    /// is loose equality.
    #[must_use]
    pub fn satisfies(&self, expected: &Self) -> bool {
        match expected {
            Self::List(options) if !matches!(self, Self::List(_)) => {
                options.iter().any(|option| loose_eq(self, option))
            }
            _ => loose_eq(self, expected),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<MockInstance> for Value {
    fn from(v: MockInstance) -> Self {
        Self::Record(v)
    }
}

impl From<&MockInstance> for Value {
    fn from(v: &MockInstance) -> Self {
        Self::Record(v.clone())
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<Literal> for Value {
    fn from(v: Literal) -> Self {
        match v {
            Literal::Null => Self::Null,
            Literal::Bool(v) => Self::Bool(v),
            Literal::Int(v) => Self::Int(v),
            Literal::Float(v) => Self::Float(v),
            Literal::Text(v) => Self::Text(v),
        }
    }
}

impl From<&Literal> for Value {
    fn from(v: &Literal) -> Self {
        v.clone().into()
    }
}
