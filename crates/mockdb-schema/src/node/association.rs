use crate::prelude::*;
use derive_more::Display;

///
/// AssociationKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    #[display("belongs_to")]
    BelongsTo,
    #[display("has_many")]
    HasMany,
    #[display("has_one")]
    HasOne,
}

impl AssociationKind {
    /// Whether the foreign key lives on the target class rather than the owner.
    #[must_use]
    pub const fn key_on_target(self) -> bool {
        matches!(self, Self::HasMany | Self::HasOne)
    }
}

///
/// AssociationSpec
///
/// One association declared on a model. For `has_many`/`has_one` the foreign
/// key is a column of the target class; for `belongs_to` it is a column of
/// the owner.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AssociationSpec {
    pub name: String,
    pub kind: AssociationKind,
    pub foreign_key: String,
    pub class_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_of: Option<String>,
}

impl AssociationSpec {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: AssociationKind,
        foreign_key: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            foreign_key: foreign_key.into(),
            class_name: class_name.into(),
            inverse_of: None,
        }
    }

    #[must_use]
    pub fn has_many(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::HasMany, foreign_key, class_name)
    }

    #[must_use]
    pub fn has_one(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::HasOne, foreign_key, class_name)
    }

    #[must_use]
    pub fn belongs_to(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self::new(name, AssociationKind::BelongsTo, foreign_key, class_name)
    }

    #[must_use]
    pub fn with_inverse(mut self, inverse_of: impl Into<String>) -> Self {
        self.inverse_of = Some(inverse_of.into());
        self
    }
}
