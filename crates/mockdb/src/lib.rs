//! ## Crate layout
//! - `core`: runtime engine: values, stubs, stores, relations, mocked
//!   classes and instances, observability.
//! - `schema`: class descriptors, schema container and validation.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries what a test needs to declare a schema,
//! build a [`core::db::MockDb`] and drive it.

pub use mockdb_core as core;
pub use mockdb_schema as schema;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use mockdb_core::attrs;

/// Result alias over the public [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error, ErrorKind, Result,
        core::prelude::*,
        schema::{
            node::{AssociationSpec, ClassDescriptor, MethodSignature, Schema},
            types::AttributeType,
        },
    };
}
