use crate::{
    config::MockConfig,
    db::{
        AssociationError, AttributeError, DbInner, MockInstance, RecordStore, Relation,
        StoreError,
    },
    error::InternalError,
    obs::{
        StubScope,
        sink::{self, MockEvent},
    },
    stub::{
        Behavior, CallLevel, CallSite, DispatchError, DispatchTarget, MethodRegistry, MockMethod,
        Receiver, invoke,
    },
    value::{Attrs, RecordId, Value, loose_eq},
};
use mockdb_schema::node::{AssociationKind, ClassDescriptor};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

///
/// ScopeFn
/// Named query function: narrows a relation given the scope arguments.
///

pub type ScopeFn = Rc<dyn Fn(&Relation, &[Value]) -> Result<Relation, InternalError>>;

struct ClassState {
    store: RecordStore,
    class_methods: MethodRegistry,
    instance_methods: MethodRegistry,
    scopes: HashMap<String, ScopeFn>,
}

struct ClassInner {
    descriptor: ClassDescriptor,
    config: MockConfig,
    db: Weak<DbInner>,
    state: RefCell<ClassState>,
}

///
/// MockClass
///
/// In-memory stand-in for one model class: its record store, its two stub
/// registries (class methods and class-wide instance methods) and its
/// scope table. Cheap to clone; clones share state.
///

#[derive(Clone)]
pub struct MockClass(Rc<ClassInner>);

impl MockClass {
    pub(crate) fn new(descriptor: ClassDescriptor, config: MockConfig, db: Weak<DbInner>) -> Self {
        let store = RecordStore::new(descriptor.name.clone(), config.first_id);

        Self(Rc::new(ClassInner {
            descriptor,
            config,
            db,
            state: RefCell::new(ClassState {
                store,
                class_methods: MethodRegistry::new(),
                instance_methods: MethodRegistry::new(),
                scopes: HashMap::new(),
            }),
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.descriptor.name
    }

    #[must_use]
    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.0.descriptor
    }

    #[must_use]
    pub fn config(&self) -> &MockConfig {
        &self.0.config
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Declared constant, converted to a runtime value.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<Value> {
        self.descriptor().get_constant(name).map(Value::from)
    }

    /// Sibling class from the same database.
    pub fn resolve_class(&self, name: &str) -> Result<Self, InternalError> {
        if name == self.name() {
            return Ok(self.clone());
        }

        let db = self.0.db.upgrade().ok_or_else(|| AssociationError::DbDropped {
            class: self.name().to_string(),
        })?;

        db.class(name)
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Unsaved instance (the `new` operation).
    pub fn new_instance(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        MockInstance::build(self, attrs)
    }

    pub fn create(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        let record = self.new_instance(attrs)?;
        self.persist(&record)?;

        Ok(record)
    }

    pub fn create_strict(&self, attrs: Attrs) -> Result<MockInstance, InternalError> {
        self.create(attrs)
    }

    /// Give `record` its identity and append it to the store.
    pub(crate) fn persist(&self, record: &MockInstance) -> Result<(), InternalError> {
        let id = self
            .0
            .state
            .borrow_mut()
            .store
            .insert(record.clone(), record.id())?;
        record.mark_persisted(id);

        sink::record(MockEvent::RecordInserted {
            class: self.name(),
            id,
        });

        Ok(())
    }

    pub(crate) fn remove_record(&self, record: &MockInstance) -> bool {
        let removed = self.0.state.borrow_mut().store.remove(record);

        if removed && let Some(id) = record.id() {
            sink::record(MockEvent::RecordRemoved {
                class: self.name(),
                id,
            });
        }

        removed
    }

    /// Stored records whose `key` equals `value`.
    pub(crate) fn records_with(&self, key: &str, value: &Value) -> Vec<MockInstance> {
        self.0
            .state
            .borrow()
            .store
            .iter()
            .filter(|r| r.get(key).is_ok_and(|v| loose_eq(&v, value)))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.0.state.borrow().store.len()
    }

    /// Every stored record, in persistence order.
    #[must_use]
    pub fn all(&self) -> Relation {
        let records = self.0.state.borrow().store.to_vec();

        Relation::from_records(records, self)
    }

    pub fn find(&self, id: RecordId) -> Result<MockInstance, InternalError> {
        let found = self.0.state.borrow().store.find(id);

        found.ok_or_else(|| {
            StoreError::NotFound {
                class: self.name().to_string(),
                id,
            }
            .into()
        })
    }

    /// Predicate keys must be attributes or `belongs_to` associations,
    /// checked even when the store is empty.
    fn check_predicate(&self, predicate: &[(String, Value)]) -> Result<(), InternalError> {
        let descriptor = self.descriptor();

        for (key, _) in predicate {
            let known = descriptor.has_attribute(key)
                || descriptor
                    .get_association(key)
                    .is_some_and(|a| a.kind == AssociationKind::BelongsTo);
            if !known {
                return Err(AttributeError::Unknown { key: key.clone() }.into());
            }
        }

        Ok(())
    }

    pub fn find_by(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<Option<MockInstance>, InternalError> {
        self.check_predicate(predicate)?;
        self.all().find_by(predicate)
    }

    pub fn find_by_strict(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<MockInstance, InternalError> {
        self.check_predicate(predicate)?;
        self.all().find_by_strict(predicate)
    }

    pub fn find_or_create_by(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<MockInstance, InternalError> {
        match self.find_by(predicate)? {
            Some(record) => Ok(record),
            None => self.create(predicate.to_vec()),
        }
    }

    pub fn find_or_initialize_by(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<MockInstance, InternalError> {
        match self.find_by(predicate)? {
            Some(record) => Ok(record),
            None => self.new_instance(predicate.to_vec()),
        }
    }

    pub fn where_eq(&self, predicate: &[(String, Value)]) -> Result<Relation, InternalError> {
        self.check_predicate(predicate)?;
        self.all().where_eq(predicate)
    }

    pub fn where_not(&self, predicate: &[(String, Value)]) -> Result<Relation, InternalError> {
        self.check_predicate(predicate)?;
        self.all().where_not(predicate)
    }

    #[must_use]
    pub fn first(&self) -> Option<MockInstance> {
        self.0.state.borrow().store.first().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<MockInstance> {
        self.0.state.borrow().store.last().cloned()
    }

    pub fn exists(&self, predicate: &[(String, Value)]) -> Result<bool, InternalError> {
        self.check_predicate(predicate)?;
        self.all().exists(predicate)
    }

    pub fn pluck(&self, attr: &str) -> Result<Vec<Value>, InternalError> {
        self.all().pluck(attr)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.all().ids()
    }

    /// Empty the store. Removed records are marked destroyed and lose
    /// their own stubs. Identities restart only when the config asks.
    pub fn destroy_all(&self) -> usize {
        let removed = self
            .0
            .state
            .borrow_mut()
            .store
            .clear(self.0.config.reset_ids_on_clear);

        for record in &removed {
            record.mark_destroyed();
        }

        sink::record(MockEvent::StoreCleared {
            class: self.name(),
            removed: removed.len() as u64,
        });

        removed.len()
    }

    pub fn delete_all(&self) -> usize {
        self.destroy_all()
    }

    // ------------------------------------------------------------------
    // Stubbing
    // ------------------------------------------------------------------

    pub fn stub_class_method(
        &self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value, InternalError> + 'static,
    ) {
        self.stub_class_method_with(name, Behavior::unbound(f));
    }

    /// Stub a class method whose behavior receives this class.
    pub fn stub_class_method_bound(
        &self,
        name: &str,
        f: impl Fn(&Receiver, &[Value]) -> Result<Value, InternalError> + 'static,
    ) {
        self.stub_class_method_with(name, Behavior::bound(f));
    }

    pub fn stub_class_method_with(&self, name: &str, behavior: Behavior) {
        self.0
            .state
            .borrow_mut()
            .class_methods
            .register(name, behavior);

        sink::record(MockEvent::StubRegistered {
            class: self.name(),
            method: name,
            scope: StubScope::ClassMethod,
        });
    }

    /// Class-wide default for an instance method; instances without their
    /// own stub fall back to it.
    pub fn stub_instance_method(
        &self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value, InternalError> + 'static,
    ) {
        self.stub_instance_method_with(name, Behavior::unbound(f));
    }

    pub fn stub_instance_method_bound(
        &self,
        name: &str,
        f: impl Fn(&Receiver, &[Value]) -> Result<Value, InternalError> + 'static,
    ) {
        self.stub_instance_method_with(name, Behavior::bound(f));
    }

    pub fn stub_instance_method_with(&self, name: &str, behavior: Behavior) {
        self.0
            .state
            .borrow_mut()
            .instance_methods
            .register(name, behavior);

        sink::record(MockEvent::StubRegistered {
            class: self.name(),
            method: name,
            scope: StubScope::ClassInstanceMethod,
        });
    }

    /// Clear the class-method and class-wide instance-method registries.
    /// Instances keep their own stubs.
    pub fn clear_mocked_methods(&self) -> usize {
        let (class_cleared, instance_cleared) = {
            let mut state = self.0.state.borrow_mut();
            (state.class_methods.clear(), state.instance_methods.clear())
        };

        sink::record(MockEvent::StubsCleared {
            class: self.name(),
            scope: StubScope::ClassMethod,
            cleared: class_cleared as u64,
        });
        sink::record(MockEvent::StubsCleared {
            class: self.name(),
            scope: StubScope::ClassInstanceMethod,
            cleared: instance_cleared as u64,
        });

        class_cleared + instance_cleared
    }

    #[must_use]
    pub fn class_method_arguments(&self, name: &str) -> Option<Vec<Value>> {
        self.class_method_stub(name)
            .map(|stub| stub.last_arguments())
    }

    /// Last arguments of the class-wide instance-method stub.
    #[must_use]
    pub fn instance_method_arguments(&self, name: &str) -> Option<Vec<Value>> {
        self.instance_method_stub(name)
            .map(|stub| stub.last_arguments())
    }

    pub(crate) fn class_method_stub(&self, name: &str) -> Option<Rc<MockMethod>> {
        self.0.state.borrow().class_methods.get(name)
    }

    pub(crate) fn instance_method_stub(&self, name: &str) -> Option<Rc<MockMethod>> {
        self.0.state.borrow().instance_methods.get(name)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Reject names the descriptor never declared, and argument counts the
    /// declared parameters cannot take.
    pub(crate) fn check_callable(
        &self,
        level: CallLevel,
        name: &str,
        given: usize,
        site: CallSite,
    ) -> Result<(), InternalError> {
        let descriptor = self.descriptor();
        let signature = match level {
            CallLevel::Class => descriptor.get_class_method(name),
            CallLevel::Instance => descriptor.get_instance_method(name),
        };

        let Some(signature) = signature else {
            let err: InternalError = DispatchError::no_method(level, name, self.name()).into();
            return Err(err.at(site.location()));
        };

        let expected = signature.arity();
        if self.0.config.check_arity && !expected.accepts(given) {
            let err: InternalError = DispatchError::Arity {
                method: name.to_string(),
                given,
                expected,
            }
            .into();
            return Err(err.at(site.location()));
        }

        Ok(())
    }

    /// Call a declared class method through the class-method registry.
    #[track_caller]
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, InternalError> {
        let site = CallSite::here();
        self.check_callable(CallLevel::Class, name, args.len(), site)?;

        invoke(name, site, args, DispatchTarget::Class(self))
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// Supply the query function behind a declared scope.
    pub fn define_scope(
        &self,
        name: &str,
        f: impl Fn(&Relation, &[Value]) -> Result<Relation, InternalError> + 'static,
    ) -> Result<(), InternalError> {
        if self.descriptor().get_scope(name).is_none() {
            return Err(DispatchError::no_method(CallLevel::Class, name, self.name()).into());
        }

        self.0
            .state
            .borrow_mut()
            .scopes
            .insert(name.to_string(), Rc::new(f));

        Ok(())
    }

    /// Apply a scope to every stored record.
    #[track_caller]
    pub fn scope(&self, name: &str, args: &[Value]) -> Result<Relation, InternalError> {
        let site = CallSite::here();

        self.apply_scope(&self.all(), name, args, site)
    }

    pub(crate) fn apply_scope(
        &self,
        relation: &Relation,
        name: &str,
        args: &[Value],
        site: CallSite,
    ) -> Result<Relation, InternalError> {
        let Some(signature) = self.descriptor().get_scope(name) else {
            let err: InternalError =
                DispatchError::no_method(CallLevel::Class, name, self.name()).into();
            return Err(err.at(site.location()));
        };

        let expected = signature.arity();
        if self.0.config.check_arity && !expected.accepts(args.len()) {
            let err: InternalError = DispatchError::Arity {
                method: name.to_string(),
                given: args.len(),
                expected,
            }
            .into();
            return Err(err.at(site.location()));
        }

        let scope = self.0.state.borrow().scopes.get(name).cloned();
        let Some(scope) = scope else {
            sink::record(MockEvent::DispatchMiss {
                class: self.name(),
                method: name,
                level: CallLevel::Class,
            });
            let err: InternalError =
                DispatchError::not_implemented(CallLevel::Class, name, self.name()).into();
            return Err(err.at(site.location()));
        };

        sink::record(MockEvent::DispatchHit {
            class: self.name(),
            method: name,
            level: CallLevel::Class,
        });

        scope(relation, args)
    }

    pub(crate) fn clear_scopes(&self) -> usize {
        let mut state = self.0.state.borrow_mut();
        let cleared = state.scopes.len();
        state.scopes.clear();

        cleared
    }

    /// Empty the store and every registry, and drop the association
    /// caches of the stored records.
    pub(crate) fn release(&self) {
        let records = {
            let mut state = self.0.state.borrow_mut();
            state.class_methods.clear();
            state.instance_methods.clear();
            state.scopes.clear();
            state.store.clear(false)
        };

        for record in records {
            record.release();
        }
    }

    /// Stored records, for database-wide resets.
    pub(crate) fn stored(&self) -> Vec<MockInstance> {
        self.0.state.borrow().store.to_vec()
    }
}

impl fmt::Debug for MockClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.0.state.try_borrow().map(|s| s.store.len()).ok();

        f.debug_struct("MockClass")
            .field("name", &self.name())
            .field("records", &records)
            .finish()
    }
}
