use crate::{
    config::ConfigError,
    db::{AssociationError, AttributeError, DbError, StoreError},
    stub::DispatchError,
};
use std::{fmt, panic::Location};
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification. The message is
/// part of the contract: tests assert on it verbatim.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,

    /// Source location of the caller that triggered the failure, when the
    /// raising path captured one.
    pub location: Option<&'static Location<'static>>,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
            location: None,
        }
    }

    pub(crate) fn with_detail(
        class: ErrorClass,
        origin: ErrorOrigin,
        message: impl Into<String>,
        detail: ErrorDetail,
    ) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(class, origin, message)
        }
    }

    /// Attach the caller location the failure should point at.
    #[must_use]
    pub fn at(mut self, location: &'static Location<'static>) -> Self {
        self.location = Some(location);
        self
    }

    /// Construct an argument error with a caller-facing message.
    pub fn argument(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Argument, origin, message)
    }

    #[must_use]
    pub const fn is_not_implemented(&self) -> bool {
        matches!(self.class, ErrorClass::NotImplemented)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    /// `file:line:column: message`, or just the message without a location.
    #[must_use]
    pub fn display_with_location(&self) -> String {
        match self.location {
            Some(loc) => format!(
                "{}:{}:{}: {}",
                loc.file(),
                loc.line(),
                loc.column(),
                self.message
            ),
            None => self.message.clone(),
        }
    }
}

impl From<mockdb_schema::Error> for InternalError {
    fn from(err: mockdb_schema::Error) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Schema,
            err.to_string(),
        )
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Argument, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Dispatch(DispatchError),

    #[error("{0}")]
    Attribute(AttributeError),

    #[error("{0}")]
    Association(AssociationError),

    #[error("{0}")]
    Store(StoreError),

    #[error("{0}")]
    Db(DbError),
}

///
/// ErrorClass
/// Runtime error taxonomy.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotImplemented,
    NoMethod,
    UnknownAttribute,
    Argument,
    NotFound,
    Conflict,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotImplemented => "not_implemented",
            Self::NoMethod => "no_method",
            Self::UnknownAttribute => "unknown_attribute",
            Self::Argument => "argument",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which component raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Dispatch,
    Store,
    Relation,
    Association,
    Instance,
    Db,
    Schema,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Dispatch => "dispatch",
            Self::Store => "store",
            Self::Relation => "relation",
            Self::Association => "association",
            Self::Instance => "instance",
            Self::Db => "db",
            Self::Schema => "schema",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
