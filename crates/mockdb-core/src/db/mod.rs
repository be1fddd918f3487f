//! Mock database: every mocked class built from one validated schema.

mod association;
mod class;
mod instance;
mod relation;
mod store;

pub use association::{AssociationError, ForeignId, HasMany, HasOne};
pub use class::{MockClass, ScopeFn};
pub use instance::{AttributeError, Lifecycle, MockInstance, WeakInstance};
pub use relation::{Direction, Relation};
pub use store::{RecordStore, StoreError};

use crate::{
    config::MockConfig,
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
};
use mockdb_schema::node::Schema;
use std::{collections::BTreeMap, rc::Rc};
use thiserror::Error as ThisError;

///
/// DbError
///

#[derive(Debug, ThisError)]
pub enum DbError {
    #[error("uninitialized constant {name}")]
    ClassNotFound { name: String },
}

impl DbError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::ClassNotFound { .. } => ErrorClass::NotFound,
        }
    }
}

impl From<DbError> for InternalError {
    fn from(err: DbError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Db,
            err.to_string(),
            ErrorDetail::Db(err),
        )
    }
}

///
/// DbInner
///

pub(crate) struct DbInner {
    classes: BTreeMap<String, MockClass>,
    config: MockConfig,
}

impl DbInner {
    pub(crate) fn class(&self, name: &str) -> Result<MockClass, InternalError> {
        self.classes.get(name).cloned().ok_or_else(|| {
            DbError::ClassNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}

impl Drop for DbInner {
    // Stored records hold their class strongly; emptying the stores lets
    // every class and record go.
    fn drop(&mut self) {
        for class in self.classes.values() {
            class.release();
        }
    }
}

///
/// MockDb
///
/// Owns the mocked classes. Classes reach their siblings through a weak
/// handle back to this database, so association targets resolve by name.
///

#[derive(Clone)]
pub struct MockDb(Rc<DbInner>);

impl MockDb {
    /// Validate `schema` and build one mocked class per descriptor with the
    /// default config.
    pub fn new(schema: Schema) -> Result<Self, InternalError> {
        Self::with_config(schema, MockConfig::default())
    }

    pub fn with_config(schema: Schema, config: MockConfig) -> Result<Self, InternalError> {
        schema.validate()?;
        config.validate()?;

        let inner = Rc::new_cyclic(|db| DbInner {
            classes: schema
                .classes()
                .map(|descriptor| {
                    let class = MockClass::new(descriptor.clone(), config.clone(), db.clone());
                    (descriptor.name.clone(), class)
                })
                .collect(),
            config,
        });

        tracing::debug!(
            target: "mockdb",
            classes = inner.classes.len(),
            first_id = inner.config.first_id,
            reset_ids_on_clear = inner.config.reset_ids_on_clear,
            "mock database ready"
        );

        Ok(Self(inner))
    }

    pub fn class(&self, name: &str) -> Result<MockClass, InternalError> {
        self.0.class(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &MockClass> {
        self.0.classes.values()
    }

    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        self.0.classes.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn config(&self) -> &MockConfig {
        &self.0.config
    }

    /// Empty every store, returning how many records were removed.
    pub fn delete_all(&self) -> usize {
        self.classes().map(MockClass::delete_all).sum()
    }

    /// Clear every class registry and the own registries of stored records.
    pub fn clear_mocked_methods(&self) -> usize {
        let mut cleared = 0;
        for class in self.classes() {
            cleared += class.clear_mocked_methods();
            for record in class.stored() {
                cleared += record.clear_mocked_methods();
            }
        }

        cleared
    }

    /// Reset between test cases: stubs, scope definitions and stores.
    pub fn clear_all(&self) {
        self.clear_mocked_methods();
        for class in self.classes() {
            class.clear_scopes();
        }
        self.delete_all();

        tracing::debug!(target: "mockdb", "mock database cleared");
    }
}

impl std::fmt::Debug for MockDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDb")
            .field("classes", &self.class_names())
            .field("config", &self.0.config)
            .finish()
    }
}
