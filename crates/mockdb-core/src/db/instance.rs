use crate::{
    db::{AssociationError, ForeignId, HasMany, HasOne, MockClass, StoreError},
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    obs::{
        StubScope,
        sink::{self, MockEvent},
    },
    stub::{Behavior, CallLevel, CallSite, DispatchTarget, MethodRegistry, MockMethod, Receiver, invoke},
    value::{Attrs, RecordId, Value},
};
use derive_more::Display;
use mockdb_schema::node::{AssociationKind, AssociationSpec};
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};
use thiserror::Error as ThisError;

///
/// AttributeError
///

#[derive(Debug, ThisError)]
pub enum AttributeError {
    #[error("unknown attribute: {key}")]
    Unknown { key: String },

    #[error("primary key '{key}' of {class} must be an integer, got {got}")]
    InvalidId {
        class: String,
        key: String,
        got: &'static str,
    },

    #[error("cannot change primary key '{key}' of persisted {class}")]
    ImmutableId { class: String, key: String },
}

impl AttributeError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unknown { .. } => ErrorClass::UnknownAttribute,
            Self::InvalidId { .. } | Self::ImmutableId { .. } => ErrorClass::Argument,
        }
    }
}

impl From<AttributeError> for InternalError {
    fn from(err: AttributeError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Instance,
            err.to_string(),
            ErrorDetail::Attribute(err),
        )
    }
}

///
/// Lifecycle
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum Lifecycle {
    #[default]
    #[display("new")]
    New,
    #[display("persisted")]
    Persisted,
    #[display("destroyed")]
    Destroyed,
}

///
/// AssociationSlot
/// Materialized association state, cached per association name.
///

enum AssociationSlot {
    HasMany(HasMany),
    HasOne(HasOne),
    BelongsTo(MockInstance),
}

#[derive(Debug)]
struct InstanceState {
    attributes: BTreeMap<String, Value>,
    lifecycle: Lifecycle,
}

struct InstanceInner {
    class: MockClass,
    state: RefCell<InstanceState>,
    methods: RefCell<MethodRegistry>,
    associations: RefCell<BTreeMap<String, AssociationSlot>>,
}

///
/// MockInstance
///
/// Handle to one mocked record. Clones share the record; equality is
/// handle identity.
///

#[derive(Clone)]
pub struct MockInstance(Rc<InstanceInner>);

impl MockInstance {
    /// Unsaved record with descriptor defaults, then `attrs` assigned.
    /// Every key is checked before anything is written.
    pub(crate) fn build(class: &MockClass, attrs: Attrs) -> Result<Self, InternalError> {
        let descriptor = class.descriptor();

        let attributes = descriptor
            .attribute_names()
            .into_iter()
            .map(|name| {
                let initial = descriptor
                    .get_attribute(name)
                    .map(|a| Value::from(a.initial_value()))
                    .unwrap_or_default();
                (name.to_string(), initial)
            })
            .collect();

        let instance = Self(Rc::new(InstanceInner {
            class: class.clone(),
            state: RefCell::new(InstanceState {
                attributes,
                lifecycle: Lifecycle::New,
            }),
            methods: RefCell::new(MethodRegistry::new()),
            associations: RefCell::new(BTreeMap::new()),
        }));
        instance.assign_attributes(attrs)?;

        Ok(instance)
    }

    #[must_use]
    pub fn class(&self) -> &MockClass {
        &self.0.class
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Result<Value, InternalError> {
        self.0
            .state
            .borrow()
            .attributes
            .get(key)
            .cloned()
            .ok_or_else(|| AttributeError::Unknown { key: key.to_string() }.into())
    }

    /// Write one attribute. The primary key only takes integers or null and
    /// is frozen once the record is persisted.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), InternalError> {
        let value = value.into();
        let descriptor = self.class().descriptor();

        if !descriptor.has_attribute(key) {
            return Err(AttributeError::Unknown { key: key.to_string() }.into());
        }

        if key == descriptor.primary_key {
            self.check_primary_key(&value)?;
        }

        self.0
            .state
            .borrow_mut()
            .attributes
            .insert(key.to_string(), value);

        // A rewritten foreign key invalidates the cached belongs_to target.
        let stale: Vec<&str> = descriptor
            .associations
            .iter()
            .filter(|a| a.kind == AssociationKind::BelongsTo && a.foreign_key == key)
            .map(|a| a.name.as_str())
            .collect();
        if !stale.is_empty() {
            let mut slots = self.0.associations.borrow_mut();
            for name in stale {
                slots.remove(name);
            }
        }

        Ok(())
    }

    /// Attribute pairs in declaration order.
    #[must_use]
    pub fn attributes(&self) -> Attrs {
        let state = self.0.state.borrow();

        self.class()
            .descriptor()
            .attribute_names()
            .into_iter()
            .map(|name| {
                let value = state.attributes.get(name).cloned().unwrap_or_default();
                (name.to_string(), value)
            })
            .collect()
    }

    fn check_primary_key(&self, value: &Value) -> Result<(), InternalError> {
        let descriptor = self.class().descriptor();
        let key = &descriptor.primary_key;

        if !matches!(value, Value::Int(_) | Value::Null) {
            return Err(AttributeError::InvalidId {
                class: descriptor.name.clone(),
                key: key.clone(),
                got: value.type_name(),
            }
            .into());
        }
        if self.is_persisted() && value.as_int() != self.id() {
            return Err(AttributeError::ImmutableId {
                class: descriptor.name.clone(),
                key: key.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Check every key, the primary key rules and the shape of association
    /// values without writing anything.
    pub fn check_keys(&self, attrs: &[(String, Value)]) -> Result<(), InternalError> {
        let descriptor = self.class().descriptor();

        for (key, value) in attrs {
            if !descriptor.accepts_key(key) {
                return Err(AttributeError::Unknown { key: key.clone() }.into());
            }
            let Some(spec) = descriptor.get_association(key) else {
                if *key == descriptor.primary_key {
                    self.check_primary_key(value)?;
                }
                continue;
            };

            let fits = match spec.kind {
                AssociationKind::HasMany => value
                    .as_list()
                    .is_some_and(|items| items.iter().all(|v| v.as_record().is_some())),
                AssociationKind::HasOne | AssociationKind::BelongsTo => {
                    matches!(value, Value::Record(_) | Value::Null)
                }
            };
            if !fits {
                return Err(AssociationError::InvalidAssignment {
                    class: spec.class_name.clone(),
                    name: spec.name.clone(),
                    got: value.type_name().to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Mass assignment over attributes and associations.
    pub fn assign_attributes(&self, attrs: Attrs) -> Result<(), InternalError> {
        self.check_keys(&attrs)?;

        for (key, value) in attrs {
            if self.class().descriptor().has_attribute(&key) {
                self.set(&key, value)?;
                continue;
            }

            let kind = self
                .class()
                .descriptor()
                .get_association(&key)
                .map(|spec| spec.kind);
            match (kind, value) {
                (Some(AssociationKind::HasMany), Value::List(items)) => {
                    let records = items.into_iter().filter_map(Value::into_record).collect();
                    self.has_many(&key)?.replace(records)?;
                }
                (Some(AssociationKind::HasOne), value) => {
                    self.has_one(&key)?.set(value.into_record())?;
                }
                (Some(AssociationKind::BelongsTo), value) => {
                    self.set_belongs_to(&key, value.as_record())?;
                }
                _ => return Err(AttributeError::Unknown { key }.into()),
            }
        }

        Ok(())
    }

    /// Whether every predicate entry holds. Keys may name attributes or
    /// `belongs_to` associations; a record compares through its identity.
    pub fn matches(&self, predicate: &[(String, Value)]) -> Result<bool, InternalError> {
        let descriptor = self.class().descriptor();

        for (key, expected) in predicate {
            let (actual, expected) = if descriptor.has_attribute(key) {
                (self.get(key)?, expected.clone())
            } else if let Some(spec) = descriptor
                .get_association(key)
                .filter(|spec| spec.kind == AssociationKind::BelongsTo)
            {
                (self.get(&spec.foreign_key)?, identity_of(expected))
            } else {
                return Err(AttributeError::Unknown { key: key.clone() }.into());
            };

            if !actual.satisfies(&expected) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    // ------------------------------------------------------------------
    // Identity & lifecycle
    // ------------------------------------------------------------------

    /// Integer identity, when one is set.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.id_value().as_int()
    }

    #[must_use]
    pub fn id_value(&self) -> Value {
        let key = &self.class().descriptor().primary_key;

        self.0
            .state
            .borrow()
            .attributes
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.0.state.borrow().lifecycle
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.lifecycle() == Lifecycle::Persisted
    }

    #[must_use]
    pub fn is_new_record(&self) -> bool {
        self.lifecycle() == Lifecycle::New
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle() == Lifecycle::Destroyed
    }

    pub(crate) fn mark_persisted(&self, id: RecordId) {
        let key = self.class().descriptor().primary_key.clone();
        let mut state = self.0.state.borrow_mut();

        state.attributes.insert(key, Value::Int(id));
        state.lifecycle = Lifecycle::Persisted;
    }

    /// Flag as destroyed and drop the record's own stubs.
    pub(crate) fn mark_destroyed(&self) {
        self.0.state.borrow_mut().lifecycle = Lifecycle::Destroyed;
        self.0.methods.borrow_mut().clear();
    }

    /// Persist on first save; later saves are no-ops because attributes
    /// are written in place.
    pub fn save(&self) -> Result<(), InternalError> {
        match self.lifecycle() {
            Lifecycle::New => self.class().persist(self),
            Lifecycle::Persisted => Ok(()),
            Lifecycle::Destroyed => Err(StoreError::Destroyed {
                class: self.class().name().to_string(),
            }
            .into()),
        }
    }

    /// Assign then save.
    pub fn update(&self, attrs: Attrs) -> Result<(), InternalError> {
        self.assign_attributes(attrs)?;
        self.save()
    }

    /// Remove from the store, mark destroyed and drop own stubs. Returns
    /// whether a stored record was removed.
    pub fn destroy(&self) -> bool {
        let removed = self.is_persisted() && self.class().remove_record(self);
        self.mark_destroyed();

        removed
    }

    pub fn delete(&self) -> bool {
        self.destroy()
    }

    // ------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------

    fn association_spec(
        &self,
        name: &str,
        expected: AssociationKind,
    ) -> Result<AssociationSpec, InternalError> {
        let descriptor = self.class().descriptor();
        let spec = descriptor
            .get_association(name)
            .ok_or_else(|| AssociationError::Unknown {
                class: descriptor.name.clone(),
                name: name.to_string(),
            })?;

        if spec.kind != expected {
            return Err(AssociationError::KindMismatch {
                class: descriptor.name.clone(),
                name: name.to_string(),
                expected,
                actual: spec.kind,
            }
            .into());
        }

        Ok(spec.clone())
    }

    /// Target records already pointing at this record, when it is stored.
    fn stored_children(&self, target: &MockClass, foreign_key: &str) -> Vec<MockInstance> {
        if !self.is_persisted() {
            return Vec::new();
        }

        target.records_with(foreign_key, &self.id_value())
    }

    /// Has-many proxy for `name`, materialized on first access from the
    /// target store and cached afterwards.
    pub fn has_many(&self, name: &str) -> Result<HasMany, InternalError> {
        if let Some(AssociationSlot::HasMany(proxy)) = self.0.associations.borrow().get(name) {
            return Ok(proxy.clone());
        }

        let spec = self.association_spec(name, AssociationKind::HasMany)?;
        let target = self.class().resolve_class(&spec.class_name)?;
        let seed = self
            .stored_children(&target, &spec.foreign_key)
            .into_iter()
            .map(Value::Record)
            .collect();

        let proxy = HasMany::new(
            seed,
            spec.foreign_key,
            ForeignId::Owner(self.downgrade()),
            &target,
        )?;
        self.0
            .associations
            .borrow_mut()
            .insert(name.to_string(), AssociationSlot::HasMany(proxy.clone()));

        Ok(proxy)
    }

    pub fn has_one(&self, name: &str) -> Result<HasOne, InternalError> {
        if let Some(AssociationSlot::HasOne(proxy)) = self.0.associations.borrow().get(name) {
            return Ok(proxy.clone());
        }

        let spec = self.association_spec(name, AssociationKind::HasOne)?;
        let target = self.class().resolve_class(&spec.class_name)?;
        let current = self
            .stored_children(&target, &spec.foreign_key)
            .into_iter()
            .next();

        let proxy = HasOne::new(
            current,
            spec.foreign_key,
            ForeignId::Owner(self.downgrade()),
            &target,
        )?;
        self.0
            .associations
            .borrow_mut()
            .insert(name.to_string(), AssociationSlot::HasOne(proxy.clone()));

        Ok(proxy)
    }

    /// The assigned target, or the stored target whose identity equals the
    /// foreign key.
    pub fn belongs_to(&self, name: &str) -> Result<Option<Self>, InternalError> {
        if let Some(AssociationSlot::BelongsTo(target)) = self.0.associations.borrow().get(name) {
            return Ok(Some(target.clone()));
        }

        let spec = self.association_spec(name, AssociationKind::BelongsTo)?;
        let foreign_id = self.get(&spec.foreign_key)?;
        if foreign_id.is_null() {
            return Ok(None);
        }

        let target = self.class().resolve_class(&spec.class_name)?;
        let primary_key = target.descriptor().primary_key.clone();

        Ok(target.records_with(&primary_key, &foreign_id).into_iter().next())
    }

    /// Assign (or clear) a `belongs_to` target, writing its identity into
    /// the foreign key.
    pub fn set_belongs_to(&self, name: &str, target: Option<&Self>) -> Result<(), InternalError> {
        let spec = self.association_spec(name, AssociationKind::BelongsTo)?;

        if let Some(record) = target
            && record.class().name() != spec.class_name
        {
            return Err(AssociationError::InvalidAssignment {
                class: spec.class_name,
                name: spec.name,
                got: record.class().name().to_string(),
            }
            .into());
        }

        let foreign_id = target.map_or(Value::Null, Self::id_value);
        self.set(&spec.foreign_key, foreign_id)?;

        if let Some(record) = target {
            self.0
                .associations
                .borrow_mut()
                .insert(spec.name, AssociationSlot::BelongsTo(record.clone()));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Stubbing
    // ------------------------------------------------------------------

    /// Stub an instance method on this record only.
    pub fn stub_instance_method(
        &self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value, InternalError> + 'static,
    ) {
        self.stub_instance_method_with(name, Behavior::unbound(f));
    }

    /// Stub an instance method whose behavior receives this record.
    pub fn stub_instance_method_bound(
        &self,
        name: &str,
        f: impl Fn(&Receiver, &[Value]) -> Result<Value, InternalError> + 'static,
    ) {
        self.stub_instance_method_with(name, Behavior::bound(f));
    }

    pub fn stub_instance_method_with(&self, name: &str, behavior: Behavior) {
        self.0.methods.borrow_mut().register(name, behavior);

        sink::record(MockEvent::StubRegistered {
            class: self.class().name(),
            method: name,
            scope: StubScope::InstanceMethod,
        });
    }

    /// Drop this record's own stubs. Class-wide stubs are untouched.
    pub fn clear_mocked_methods(&self) -> usize {
        let cleared = self.0.methods.borrow_mut().clear();

        sink::record(MockEvent::StubsCleared {
            class: self.class().name(),
            scope: StubScope::InstanceMethod,
            cleared: cleared as u64,
        });

        cleared
    }

    /// Arguments of the last call to the stub this record resolves `name`
    /// to.
    #[must_use]
    pub fn instance_method_arguments(&self, name: &str) -> Option<Vec<Value>> {
        self.own_method_stub(name)
            .or_else(|| self.class().instance_method_stub(name))
            .map(|stub| stub.last_arguments())
    }

    pub(crate) fn own_method_stub(&self, name: &str) -> Option<Rc<MockMethod>> {
        self.0.methods.borrow().get(name)
    }

    /// Call a declared instance method through the stub registries.
    #[track_caller]
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, InternalError> {
        let site = CallSite::here();
        self.class()
            .check_callable(CallLevel::Instance, name, args.len(), site)?;

        invoke(name, site, args, DispatchTarget::Instance(self))
    }

    /// Drop cached association state and stubs.
    pub(crate) fn release(&self) {
        let slots = std::mem::take(&mut *self.0.associations.borrow_mut());
        for slot in slots.into_values() {
            match slot {
                AssociationSlot::HasMany(proxy) => proxy.release(),
                AssociationSlot::HasOne(proxy) => proxy.release(),
                AssociationSlot::BelongsTo(_) => {}
            }
        }
        self.0.methods.borrow_mut().clear();
    }
}

/// Identity of a record predicate value, element-wise for lists.
fn identity_of(value: &Value) -> Value {
    match value {
        Value::Record(record) => record.id_value(),
        Value::List(items) => Value::List(items.iter().map(identity_of).collect()),
        other => other.clone(),
    }
}

impl PartialEq for MockInstance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MockInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockInstance")
            .field("class", &self.class().name())
            .field("id", &self.id())
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

impl Serialize for MockInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attributes = self.attributes();
        let mut map = serializer.serialize_map(Some(attributes.len()))?;
        for (key, value) in &attributes {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}

///
/// WeakInstance
///

#[derive(Clone)]
pub struct WeakInstance(Weak<InstanceInner>);

impl WeakInstance {
    #[must_use]
    pub fn upgrade(&self) -> Option<MockInstance> {
        self.0.upgrade().map(MockInstance)
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(instance) => write!(f, "WeakInstance({instance:?})"),
            None => write!(f, "WeakInstance(<dropped>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::MockConfig, db::MockDb, test_fixtures::{blog_db, blog_schema}};

    #[test]
    fn build_applies_descriptor_defaults() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");

        let user = users.new_instance(attrs! { "name" => "Ada" }).expect("build should succeed");

        assert_eq!(user.get("admin").expect("declared"), Value::Bool(false));
        assert_eq!(user.get("email").expect("declared"), Value::Null);
        assert_eq!(user.id(), None);
        assert!(user.is_new_record());
        assert_eq!(
            user.attributes().first().map(|(k, _)| k.as_str()),
            Some("id"),
            "attributes come back in declaration order"
        );
    }

    #[test]
    fn unknown_key_fails_before_any_write() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users.create(attrs! { "name" => "Ada" }).expect("create should succeed");

        let err = user
            .assign_attributes(attrs! { "name" => "Bob", "nickname" => "b" })
            .expect_err("unknown key should fail");

        assert_eq!(err.class, ErrorClass::UnknownAttribute);
        assert_eq!(err.message, "unknown attribute: nickname");
        assert_eq!(user.get("name").expect("declared"), Value::from("Ada"));
    }

    #[test]
    fn update_merges_and_saves() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users.new_instance(attrs! {}).expect("build should succeed");

        user.update(attrs! { "email" => "a@b.c" }).expect("update should persist");

        assert!(user.is_persisted());
        assert_eq!(users.count(), 1);
        assert_eq!(
            users.find_by(&attrs! { "email" => "a@b.c" }).expect("find_by should run"),
            Some(user)
        );
    }

    #[test]
    fn saving_twice_keeps_one_identity() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users.new_instance(attrs! {}).expect("build should succeed");

        user.save().expect("first save should persist");
        user.save().expect("second save should be a no-op");

        assert_eq!(user.id(), Some(1));
        assert_eq!(users.count(), 1);
    }

    #[test]
    fn persisted_identity_is_frozen() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users.create(attrs! {}).expect("create should succeed");

        let err = user.set("id", 9).expect_err("persisted id cannot change");
        let bad = users
            .new_instance(attrs! { "id" => "x" })
            .expect_err("text id should be rejected");

        assert_eq!(err.message, "cannot change primary key 'id' of persisted User");
        assert_eq!(bad.message, "primary key 'id' of User must be an integer, got text");
        user.set("id", 1).expect("rewriting the same id is allowed");
    }

    #[test]
    fn primary_key_rules_fail_before_any_write() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users
            .create(attrs! { "name" => "Ada" })
            .expect("create should succeed");

        let err = user
            .assign_attributes(attrs! { "name" => "Bob", "id" => 7 })
            .expect_err("persisted id cannot change");
        let bad = user
            .assign_attributes(attrs! { "name" => "Cy", "id" => "x" })
            .expect_err("text id should be rejected");

        assert_eq!(err.class, ErrorClass::Argument);
        assert_eq!(bad.class, ErrorClass::Argument);
        assert_eq!(user.get("name").expect("declared"), Value::from("Ada"));
        assert_eq!(user.id(), Some(1));
    }

    #[test]
    fn destroyed_records_cannot_be_saved() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users.create(attrs! {}).expect("create should succeed");

        assert!(user.destroy());
        assert!(!user.delete(), "already removed");

        let err = user.save().expect_err("destroyed record should not save");
        assert_eq!(err.message, "cannot save destroyed User");
        assert_eq!(users.count(), 0);
    }

    #[test]
    fn identities_stay_monotonic_across_delete_all() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        users.create(attrs! {}).expect("create should succeed");
        users.create(attrs! {}).expect("create should succeed");

        assert_eq!(users.delete_all(), 2);
        let next = users.create(attrs! {}).expect("create should succeed");

        assert_eq!(next.id(), Some(3));
    }

    #[test]
    fn reset_config_restarts_identities() {
        let config = MockConfig::from_toml_str("first_id = 100\nreset_ids_on_clear = true")
            .expect("config should parse");
        let db = MockDb::with_config(blog_schema(), config).expect("db should build");
        let users = db.class("User").expect("User should exist");
        users.create(attrs! {}).expect("create should succeed");
        users.create(attrs! {}).expect("create should succeed");

        users.destroy_all();
        let next = users.create(attrs! {}).expect("create should succeed");

        assert_eq!(next.id(), Some(100));
    }

    #[test]
    fn belongs_to_assignment_writes_the_foreign_key() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let posts = db.class("Post").expect("Post should exist");
        let ada = users.create(attrs! {}).expect("create should succeed");
        let bob = users.create(attrs! {}).expect("create should succeed");
        let post = posts.new_instance(attrs! {}).expect("build should succeed");

        post.set_belongs_to("user", Some(&ada)).expect("assignment should succeed");
        assert_eq!(post.get("user_id").expect("declared"), Value::Int(1));

        post.set("user_id", 2).expect("raw foreign key write should succeed");
        assert_eq!(
            post.belongs_to("user").expect("user is declared"),
            Some(bob),
            "a rewritten foreign key drops the cached target"
        );

        post.set_belongs_to("user", None).expect("clearing should succeed");
        assert_eq!(post.belongs_to("user").expect("user is declared"), None);
    }

    #[test]
    fn belongs_to_rejects_the_wrong_class() {
        let db = blog_db();
        let posts = db.class("Post").expect("Post should exist");
        let post = posts.create(attrs! {}).expect("create should succeed");
        let other = posts.create(attrs! {}).expect("create should succeed");

        let err = post
            .set_belongs_to("user", Some(&other))
            .expect_err("a Post is not a User");

        assert_eq!(err.message, "User expected for 'user', got Post");
    }

    #[test]
    fn find_by_accepts_belongs_to_records() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let posts = db.class("Post").expect("Post should exist");
        let ada = users.create(attrs! {}).expect("create should succeed");
        let post = posts
            .create(attrs! { "user" => &ada })
            .expect("create should succeed");

        assert_eq!(
            posts.find_by(&attrs! { "user" => &ada }).expect("find_by should run"),
            Some(post)
        );
    }

    #[test]
    fn has_many_assignment_replaces_members() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let posts = db.class("Post").expect("Post should exist");
        let user = users.create(attrs! {}).expect("create should succeed");
        let kept = user.has_many("posts").expect("declared").create(attrs! {}).expect("create");
        let dropped = user.has_many("posts").expect("declared").create(attrs! {}).expect("create");
        let added = posts.create(attrs! {}).expect("create should succeed");

        user.assign_attributes(attrs! { "posts" => vec![&kept, &added] })
            .expect("list of posts should assign");

        assert_eq!(dropped.get("user_id").expect("declared"), Value::Null);
        assert_eq!(added.get("user_id").expect("declared"), user.id_value());
        assert_eq!(user.has_many("posts").expect("declared").count(), 2);

        let err = user
            .assign_attributes(attrs! { "posts" => "nope" })
            .expect_err("text is not a list of posts");
        assert_eq!(err.class, ErrorClass::Argument);
    }

    #[test]
    fn records_serialize_as_attribute_maps() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        let user = users
            .create(attrs! { "name" => "Ada", "age" => 36 })
            .expect("create should succeed");

        let json = serde_json::to_value(&user).expect("record should serialize");

        assert_eq!(
            json,
            serde_json::json!({
                "id": 1, "name": "Ada", "email": null, "age": 36, "admin": false
            })
        );
    }

    #[test]
    fn constants_are_exposed_as_values() {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");

        assert_eq!(users.constant("ROLES"), Some(Value::from("admin,member")));
        assert_eq!(users.constant("MISSING"), None);
    }
}
