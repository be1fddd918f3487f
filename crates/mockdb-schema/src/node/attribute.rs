use crate::prelude::*;

///
/// Attribute
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: AttributeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Literal>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Value a fresh record starts with for this column.
    #[must_use]
    pub fn initial_value(&self) -> Literal {
        self.default.clone().unwrap_or_default()
    }
}
