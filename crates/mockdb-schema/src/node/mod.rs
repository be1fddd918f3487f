mod association;
mod attribute;
mod class;
mod method;
mod schema;

pub use association::{AssociationKind, AssociationSpec};
pub use attribute::Attribute;
pub use class::{ClassDescriptor, Constant};
pub use method::{Arity, MethodSignature, Param, ParamKind};
pub use schema::Schema;

use thiserror::Error as ThisError;

///
/// NodeError
///

#[derive(Debug, ThisError)]
pub enum NodeError {
    #[error("class '{0}' already registered")]
    DuplicateClass(String),

    #[error("class '{0}' not found")]
    ClassNotFound(String),
}
