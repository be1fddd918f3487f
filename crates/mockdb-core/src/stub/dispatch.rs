use crate::{
    db::{MockClass, MockInstance},
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    obs::sink::{self, MockEvent},
    stub::Receiver,
    value::Value,
};
use derive_more::Display;
use mockdb_schema::node::Arity;
use std::panic::Location;
use thiserror::Error as ThisError;

///
/// CallLevel
///
/// Whether a call targeted a class or an instance. Displays as the sigil
/// used in failure messages.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum CallLevel {
    #[display("::")]
    Class,
    #[display("#")]
    Instance,
}

///
/// CallSite
///
/// Source location of the test line that made a mocked call. Public call
/// entry points are `#[track_caller]`, so the captured location is the
/// caller's and never the dispatcher's.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallSite(&'static Location<'static>);

impl CallSite {
    #[must_use]
    #[track_caller]
    pub fn here() -> Self {
        Self(Location::caller())
    }

    #[must_use]
    pub const fn location(self) -> &'static Location<'static> {
        self.0
    }
}

///
/// DispatchError
///

#[derive(Debug, ThisError)]
pub enum DispatchError {
    #[error("{level}{method} for Class: {class}. To continue stub the method.")]
    NotImplemented {
        level: CallLevel,
        method: String,
        class: String,
    },

    #[error("undefined method '{method}' for {class}")]
    NoMethod {
        level: CallLevel,
        method: String,
        class: String,
    },

    #[error("wrong number of arguments (given {given}, expected {expected})")]
    Arity {
        method: String,
        given: usize,
        expected: Arity,
    },
}

impl DispatchError {
    pub(crate) fn not_implemented(level: CallLevel, method: &str, class: &str) -> Self {
        Self::NotImplemented {
            level,
            method: method.to_string(),
            class: class.to_string(),
        }
    }

    pub(crate) fn no_method(level: CallLevel, method: &str, class: &str) -> Self {
        Self::NoMethod {
            level,
            method: method.to_string(),
            class: class.to_string(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotImplemented { .. } => ErrorClass::NotImplemented,
            Self::NoMethod { .. } => ErrorClass::NoMethod,
            Self::Arity { .. } => ErrorClass::Argument,
        }
    }
}

impl From<DispatchError> for InternalError {
    fn from(err: DispatchError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Dispatch,
            err.to_string(),
            ErrorDetail::Dispatch(err),
        )
    }
}

///
/// DispatchTarget
///

#[derive(Clone, Copy, Debug)]
pub enum DispatchTarget<'a> {
    Class(&'a MockClass),
    Instance(&'a MockInstance),
}

impl DispatchTarget<'_> {
    #[must_use]
    pub const fn level(&self) -> CallLevel {
        match self {
            Self::Class(_) => CallLevel::Class,
            Self::Instance(_) => CallLevel::Instance,
        }
    }

    fn class(&self) -> &MockClass {
        match self {
            Self::Class(class) => class,
            Self::Instance(instance) => instance.class(),
        }
    }
}

/// Resolve `method` against the target's registries and run it.
///
/// Instance targets look in the instance's own registry, then in the
/// class-wide instance-method registry. Class targets look only in the
/// class-method registry. A miss fails `NotImplemented` at `site`.
pub fn invoke(
    method: &str,
    site: CallSite,
    args: &[Value],
    target: DispatchTarget<'_>,
) -> Result<Value, InternalError> {
    let level = target.level();
    let class = target.class();

    // Registry borrows end here; behaviors may re-enter the dispatcher.
    let (resolved, receiver) = match target {
        DispatchTarget::Class(class) => (
            class.class_method_stub(method),
            Receiver::Class(class.clone()),
        ),
        DispatchTarget::Instance(instance) => (
            instance
                .own_method_stub(method)
                .or_else(|| class.instance_method_stub(method)),
            Receiver::Instance(instance.clone()),
        ),
    };

    let Some(stub) = resolved else {
        sink::record(MockEvent::DispatchMiss {
            class: class.name(),
            method,
            level,
        });

        let err: InternalError = DispatchError::not_implemented(level, method, class.name()).into();
        return Err(err.at(site.location()));
    };

    sink::record(MockEvent::DispatchHit {
        class: class.name(),
        method,
        level,
    });

    stub.execute(&receiver, args)
}
