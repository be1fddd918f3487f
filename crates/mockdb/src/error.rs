use derive_more::Display;
use mockdb_core::{
    config::ConfigError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,

    /// `file:line:column` of the call that failed, when captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn is_not_implemented(&self) -> bool {
        self.kind == ErrorKind::NotImplemented
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let location = err
            .location
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));

        Self {
            location,
            ..Self::new(err.class.into(), err.origin.into(), err.message)
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        InternalError::from(err).into()
    }
}

impl From<mockdb_schema::Error> for Error {
    fn from(err: mockdb_schema::Error) -> Self {
        InternalError::from(err).into()
    }
}

///
/// ErrorKind
/// Public error taxonomy for test code.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A mocked method was called without a stub.
    NotImplemented,

    /// The name was never declared on the mocked class.
    NoMethod,

    /// Mass assignment or a finder named an undeclared attribute.
    UnknownAttribute,

    /// Wrong arity, wrong value shape or a non-numeric aggregate.
    Argument,

    NotFound,

    /// Identity already taken.
    Conflict,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::NotImplemented => Self::NotImplemented,
            ErrorClass::NoMethod => Self::NoMethod,
            ErrorClass::UnknownAttribute => Self::UnknownAttribute,
            ErrorClass::Argument => Self::Argument,
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::InvariantViolation => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Association,
    Config,
    Db,
    Dispatch,
    Instance,
    Relation,
    Schema,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Association => Self::Association,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Db => Self::Db,
            CoreErrorOrigin::Dispatch => Self::Dispatch,
            CoreErrorOrigin::Instance => Self::Instance,
            CoreErrorOrigin::Relation => Self::Relation,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}
