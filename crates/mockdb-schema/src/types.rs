use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// AttributeType
///
/// Column type as reported by the schema reader. The runtime stores values
/// untyped; the type is used to check declared defaults.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum AttributeType {
    BigInteger,
    Binary,
    Boolean,
    Date,
    DateTime,
    Decimal,
    Float,
    Integer,
    Json,
    String,
    Text,
    Time,
}

impl AttributeType {
    /// Whether a literal default is acceptable for a column of this type.
    #[must_use]
    pub const fn accepts(self, literal: &Literal) -> bool {
        match (self, literal) {
            (_, Literal::Null) | (Self::Json, _) => true,
            (Self::Boolean, Literal::Bool(_)) => true,
            (Self::Integer | Self::BigInteger, Literal::Int(_)) => true,
            (Self::Float | Self::Decimal, Literal::Int(_) | Literal::Float(_)) => true,
            (
                Self::String
                | Self::Text
                | Self::Binary
                | Self::Date
                | Self::DateTime
                | Self::Time
                | Self::Decimal,
                Literal::Text(_),
            ) => true,
            _ => false,
        }
    }
}

///
/// Literal
///
/// Schema-level constant: column defaults and declared class constants.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
