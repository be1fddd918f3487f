use crate::{
    db::MockInstance,
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    value::RecordId,
};
use derive_more::Deref;
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Couldn't find {class} with 'id'={id}")]
    NotFound { class: String, id: RecordId },

    #[error("Couldn't find {class}")]
    NotFoundBy { class: String },

    #[error("Duplicate ID found for record {id}")]
    DuplicateId { id: RecordId },

    #[error("cannot save destroyed {class}")]
    Destroyed { class: String },

    #[error("no identities left for {class}")]
    IdsExhausted { class: String },
}

impl StoreError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } | Self::NotFoundBy { .. } => ErrorClass::NotFound,
            Self::DuplicateId { .. } => ErrorClass::Conflict,
            Self::Destroyed { .. } | Self::IdsExhausted { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Store,
            err.to_string(),
            ErrorDetail::Store(err),
        )
    }
}

///
/// RecordStore
///
/// Ordered live records of one mocked class. Insertion order is persistence
/// order. Identities are unique and only move forward unless a clear is
/// asked to reset them.
///

#[derive(Debug, Deref)]
pub struct RecordStore {
    #[deref]
    records: Vec<MockInstance>,
    class_name: String,
    first_id: RecordId,
    // None once the largest identity has been handed out.
    next_id: Option<RecordId>,
}

impl RecordStore {
    #[must_use]
    pub fn new(class_name: impl Into<String>, first_id: RecordId) -> Self {
        Self {
            records: Vec::new(),
            class_name: class_name.into(),
            first_id,
            next_id: Some(first_id),
        }
    }

    /// Append `record` under `explicit` or the next free identity and
    /// return the identity used.
    pub fn insert(
        &mut self,
        record: MockInstance,
        explicit: Option<RecordId>,
    ) -> Result<RecordId, StoreError> {
        let id = match explicit {
            Some(id) => {
                if self.find(id).is_some() {
                    return Err(StoreError::DuplicateId { id });
                }
                id
            }
            None => self.next_id.ok_or_else(|| StoreError::IdsExhausted {
                class: self.class_name.clone(),
            })?,
        };

        self.next_id = match (self.next_id, id.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        self.records.push(record);

        Ok(id)
    }

    /// Remove `record` by handle identity.
    pub fn remove(&mut self, record: &MockInstance) -> bool {
        let before = self.records.len();
        self.records.retain(|r| !r.ptr_eq(record));

        self.records.len() != before
    }

    /// Empty the store, returning the removed records in store order.
    pub fn clear(&mut self, reset_ids: bool) -> Vec<MockInstance> {
        if reset_ids {
            self.next_id = Some(self.first_id);
        }

        std::mem::take(&mut self.records)
    }

    #[must_use]
    pub fn find(&self, id: RecordId) -> Option<MockInstance> {
        self.find_by(|r| r.id() == Some(id))
    }

    #[must_use]
    pub fn find_by(&self, predicate: impl Fn(&MockInstance) -> bool) -> Option<MockInstance> {
        self.records.iter().find(|r| predicate(r)).cloned()
    }

    /// Cloned handles in store order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<MockInstance> {
        self.records.clone()
    }
}
