//! Association proxies: relations bound to an owner identity that write
//! the foreign key on everything they build or create.

use crate::{
    db::{MockClass, MockInstance, Relation, WeakInstance},
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    value::{Attrs, RecordId, Value},
};
use mockdb_schema::node::AssociationKind;
use std::{cell::RefCell, fmt, rc::Rc};
use thiserror::Error as ThisError;

///
/// AssociationError
///

#[derive(Debug, ThisError)]
pub enum AssociationError {
    #[error("undefined association '{name}' for {class}")]
    Unknown { class: String, name: String },

    #[error("association '{name}' on {class} is {actual}, not {expected}")]
    KindMismatch {
        class: String,
        name: String,
        expected: AssociationKind,
        actual: AssociationKind,
    },

    #[error("{class} expected for '{name}', got {got}")]
    InvalidAssignment {
        class: String,
        name: String,
        got: String,
    },

    #[error("owner of '{foreign_key}' association is gone")]
    OwnerDropped { foreign_key: String },

    #[error("mock database for {class} has been dropped")]
    DbDropped { class: String },
}

impl AssociationError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unknown { .. } => ErrorClass::NoMethod,
            Self::KindMismatch { .. } | Self::InvalidAssignment { .. } => ErrorClass::Argument,
            Self::OwnerDropped { .. } | Self::DbDropped { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<AssociationError> for InternalError {
    fn from(err: AssociationError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Association,
            err.to_string(),
            ErrorDetail::Association(err),
        )
    }
}

///
/// ForeignId
///
/// Where a proxy reads the value it writes into the foreign key: a fixed
/// value, or the owner's identity read at write time so an owner saved
/// after the proxy was built still propagates its id.
///

#[derive(Clone, Debug)]
pub enum ForeignId {
    Fixed(Value),
    Owner(WeakInstance),
}

impl ForeignId {
    fn resolve(&self, foreign_key: &str) -> Result<Value, InternalError> {
        match self {
            Self::Fixed(value) => Ok(value.clone()),
            Self::Owner(owner) => owner.upgrade().map(|o| o.id_value()).ok_or_else(|| {
                AssociationError::OwnerDropped {
                    foreign_key: foreign_key.to_string(),
                }
                .into()
            }),
        }
    }
}

impl From<Value> for ForeignId {
    fn from(value: Value) -> Self {
        Self::Fixed(value)
    }
}

impl From<RecordId> for ForeignId {
    fn from(id: RecordId) -> Self {
        Self::Fixed(Value::Int(id))
    }
}

///
/// Binding
/// Foreign-key wiring shared by both proxy kinds.
///

#[derive(Clone, Debug)]
struct Binding {
    foreign_key: String,
    foreign_id: ForeignId,
    class: MockClass,
}

impl Binding {
    /// `{foreign_key => foreign_id}` followed by `attrs`; the owner binding
    /// wins over a caller-supplied foreign key.
    fn merged(&self, attrs: Attrs) -> Result<Attrs, InternalError> {
        let id = self.foreign_id.resolve(&self.foreign_key)?;

        let mut merged = Vec::with_capacity(attrs.len() + 1);
        merged.push((self.foreign_key.clone(), id));
        merged.extend(attrs.into_iter().filter(|(k, _)| *k != self.foreign_key));

        Ok(merged)
    }

    fn attach(&self, record: &MockInstance) -> Result<(), InternalError> {
        let id = self.foreign_id.resolve(&self.foreign_key)?;
        record.set(&self.foreign_key, id)
    }

    fn detach(&self, record: &MockInstance) -> Result<(), InternalError> {
        record.set(&self.foreign_key, Value::Null)
    }

    fn check_target(&self, name: &str, record: &MockInstance) -> Result<(), InternalError> {
        if record.class().ptr_eq(&self.class) {
            return Ok(());
        }

        Err(AssociationError::InvalidAssignment {
            class: self.class.name().to_string(),
            name: name.to_string(),
            got: record.class().name().to_string(),
        }
        .into())
    }
}

///
/// HasMany
///
/// Shared handle: clones see the same sequence, so the proxy an instance
/// caches and the one a test holds stay in step.
///

#[derive(Clone)]
pub struct HasMany(Rc<RefCell<HasManyState>>);

struct HasManyState {
    relation: Relation,
    binding: Binding,
}

impl HasMany {
    /// Bind `sequence` to `foreign_key`/`foreign_id`. Record entries already
    /// in the sequence get the foreign key written now.
    pub fn new(
        sequence: Vec<Value>,
        foreign_key: impl Into<String>,
        foreign_id: impl Into<ForeignId>,
        class: &MockClass,
    ) -> Result<Self, InternalError> {
        let binding = Binding {
            foreign_key: foreign_key.into(),
            foreign_id: foreign_id.into(),
            class: class.clone(),
        };
        let relation = Relation::with_class(sequence, class);

        for record in relation.records() {
            binding.attach(record)?;
        }

        Ok(Self(Rc::new(RefCell::new(HasManyState { relation, binding }))))
    }

    fn binding(&self) -> Binding {
        self.0.borrow().binding.clone()
    }

    #[must_use]
    pub fn foreign_key(&self) -> String {
        self.0.borrow().binding.foreign_key.clone()
    }

    #[must_use]
    pub fn class(&self) -> MockClass {
        self.0.borrow().binding.class.clone()
    }

    // ------------------------------------------------------------------
    // Build / create
    // ------------------------------------------------------------------

    /// Unsaved target instance carrying the owner binding, appended to
    /// this proxy.
    pub fn build(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        self.build_with(attrs, |_| {})
    }

    /// As [`HasMany::build`], yielding the instance to `block` before it
    /// is appended.
    pub fn build_with(
        &self,
        attrs: Attrs,
        block: impl FnOnce(&MockInstance),
    ) -> Result<MockInstance, InternalError> {
        let binding = self.binding();
        let record = binding.class.new_instance(binding.merged(attrs)?)?;
        block(&record);

        self.0.borrow_mut().relation.push(record.clone());

        Ok(record)
    }

    /// Persist through the target class and append.
    pub fn create(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        self.create_with(attrs, |_| {})
    }

    /// As [`HasMany::create`], yielding the instance to `block` before it
    /// is saved.
    pub fn create_with(
        &self,
        attrs: Attrs,
        block: impl FnOnce(&MockInstance),
    ) -> Result<MockInstance, InternalError> {
        let binding = self.binding();
        let record = binding.class.new_instance(binding.merged(attrs)?)?;
        block(&record);
        record.save()?;

        self.0.borrow_mut().relation.push(record.clone());

        Ok(record)
    }

    pub fn create_strict(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        self.create(attrs)
    }

    // ------------------------------------------------------------------
    // Sequence
    // ------------------------------------------------------------------

    /// Append without touching the foreign key.
    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().relation.push(value);
    }

    /// Snapshot of the current contents, bound to the target class.
    #[must_use]
    pub fn relation(&self) -> Relation {
        self.0.borrow().relation.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().relation.len()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().relation.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<MockInstance> {
        self.0.borrow().relation.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<MockInstance> {
        self.0.borrow().relation.last()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().relation.to_vec()
    }

    #[must_use]
    pub fn records(&self) -> Vec<MockInstance> {
        self.0.borrow().relation.records().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, record: &MockInstance) -> bool {
        self.0.borrow().relation.contains_record(record)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn find(&self, id: RecordId) -> Result<MockInstance, InternalError> {
        self.relation().find(id)
    }

    pub fn find_by(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<Option<MockInstance>, InternalError> {
        self.relation().find_by(predicate)
    }

    pub fn where_eq(&self, predicate: &[(String, Value)]) -> Result<Relation, InternalError> {
        self.relation().where_eq(predicate)
    }

    #[track_caller]
    pub fn scope(&self, name: &str, args: &[Value]) -> Result<Relation, InternalError> {
        self.relation().scope(name, args)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Drop `record` from the association and null its foreign key. The
    /// record stays in its store.
    pub fn delete(&self, record: &MockInstance) -> Result<bool, InternalError> {
        if !self.contains(record) {
            return Ok(false);
        }

        let binding = self.binding();
        binding.detach(record)?;
        self.0
            .borrow_mut()
            .relation
            .retain(|v| v.as_record().is_none_or(|r| !r.ptr_eq(record)));

        Ok(true)
    }

    /// Replace the contents with `records`: dropped members lose their
    /// foreign key, new members gain it.
    pub fn replace(&self, records: Vec<MockInstance>) -> Result<(), InternalError> {
        let binding = self.binding();
        for record in &records {
            binding.check_target(&binding.foreign_key, record)?;
        }

        for old in self.records() {
            if !records.iter().any(|r| r.ptr_eq(&old)) {
                binding.detach(&old)?;
            }
        }
        for record in &records {
            binding.attach(record)?;
        }

        self.0.borrow_mut().relation = Relation::from_records(records, &binding.class);

        Ok(())
    }

    pub(crate) fn release(&self) {
        self.0.borrow_mut().relation = Relation::default();
    }
}

impl fmt::Debug for HasMany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("HasMany")
            .field("class", &state.binding.class.name())
            .field("foreign_key", &state.binding.foreign_key)
            .field("len", &state.relation.len())
            .finish()
    }
}

///
/// HasOne
///

#[derive(Clone)]
pub struct HasOne(Rc<RefCell<HasOneState>>);

struct HasOneState {
    target: Option<MockInstance>,
    binding: Binding,
}

impl HasOne {
    pub fn new(
        target: Option<MockInstance>,
        foreign_key: impl Into<String>,
        foreign_id: impl Into<ForeignId>,
        class: &MockClass,
    ) -> Result<Self, InternalError> {
        let binding = Binding {
            foreign_key: foreign_key.into(),
            foreign_id: foreign_id.into(),
            class: class.clone(),
        };
        if let Some(record) = &target {
            binding.attach(record)?;
        }

        Ok(Self(Rc::new(RefCell::new(HasOneState { target, binding }))))
    }

    fn binding(&self) -> Binding {
        self.0.borrow().binding.clone()
    }

    #[must_use]
    pub fn get(&self) -> Option<MockInstance> {
        self.0.borrow().target.clone()
    }

    #[must_use]
    pub fn is_some(&self) -> bool {
        self.0.borrow().target.is_some()
    }

    /// Point the association at `target`. A different previous target has
    /// its foreign key nulled.
    pub fn set(&self, target: Option<MockInstance>) -> Result<(), InternalError> {
        let binding = self.binding();
        if let Some(record) = &target {
            binding.check_target(&binding.foreign_key, record)?;
        }

        let previous = self.get();
        if let Some(old) = previous
            && !target.as_ref().is_some_and(|t| t.ptr_eq(&old))
        {
            binding.detach(&old)?;
        }
        if let Some(record) = &target {
            binding.attach(record)?;
        }

        self.0.borrow_mut().target = target;

        Ok(())
    }

    /// Unsaved target carrying the owner binding; replaces the current one.
    pub fn build(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        let binding = self.binding();
        let record = binding.class.new_instance(binding.merged(attrs)?)?;
        self.set(Some(record.clone()))?;

        Ok(record)
    }

    /// Persisted target carrying the owner binding; replaces the current one.
    pub fn create(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        let binding = self.binding();
        let record = binding.class.create(binding.merged(attrs)?)?;
        self.set(Some(record.clone()))?;

        Ok(record)
    }

    pub(crate) fn release(&self) {
        self.0.borrow_mut().target = None;
    }
}

impl fmt::Debug for HasOne {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("HasOne")
            .field("class", &state.binding.class.name())
            .field("foreign_key", &state.binding.foreign_key)
            .field("target", &state.target)
            .finish()
    }
}
