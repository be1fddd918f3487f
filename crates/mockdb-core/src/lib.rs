//! Runtime engine for MockDB: values, stub registries and dispatch, record
//! stores, relations, association proxies, mocked classes and instances.
//!
//! Everything here is single-threaded. Handles are `Rc`-based and share
//! state between clones.
#![warn(unreachable_pub)]

#[macro_use]
mod macros;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod obs;
pub mod stub;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Domain vocabulary for test code: the database, its handles and values.
///

pub mod prelude {
    pub use crate::{
        attrs,
        config::MockConfig,
        db::{Direction, HasMany, HasOne, MockClass, MockDb, MockInstance, Relation},
        error::{ErrorClass, InternalError},
        stub::Receiver,
        value::{Attrs, RecordId, Value},
    };
}
