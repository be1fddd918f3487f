//! Declarative class descriptors consumed by the mock runtime.
//!
//! A generator reads application schema files and emits one
//! [`node::ClassDescriptor`] per model. This crate owns those descriptors,
//! the [`node::Schema`] container that groups them, and the validation pass
//! that runs before any mock class is built.

pub mod error;
pub mod node;
pub mod types;
pub mod validate;

/// Maximum length for class identifiers.
pub const MAX_CLASS_NAME_LEN: usize = 64;

/// Maximum length for attribute, association and method identifiers.
pub const MAX_MEMBER_NAME_LEN: usize = 64;

/// Primary key attribute used when a descriptor does not name one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

use crate::{error::ErrorTree, node::NodeError};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::*,
        types::{AttributeType, Literal},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    NodeError(#[from] NodeError),

    #[error("schema validation failed: {0}")]
    Validation(ErrorTree),

    #[error("schema decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}
