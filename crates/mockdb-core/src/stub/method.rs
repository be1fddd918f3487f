use crate::{
    db::{MockClass, MockInstance},
    error::InternalError,
    value::Value,
};
use derive_more::Display;
use std::{cell::RefCell, fmt, rc::Rc};

type UnboundFn = dyn Fn(&[Value]) -> Result<Value, InternalError>;
type BoundFn = dyn Fn(&Receiver, &[Value]) -> Result<Value, InternalError>;

///
/// BindingMode
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum BindingMode {
    /// Behavior sees the call arguments only.
    #[default]
    Unbound,
    /// Behavior also receives the receiver the call was made on.
    Bound,
}

///
/// Receiver
///
/// The object a bound behavior runs against: the class for class-method
/// calls, the instance for instance-method calls (including calls resolved
/// through the class-wide fallback).
///

#[derive(Clone, Debug)]
pub enum Receiver {
    Class(MockClass),
    Instance(MockInstance),
}

impl Receiver {
    /// The receiving class, or the instance's class.
    #[must_use]
    pub fn class(&self) -> &MockClass {
        match self {
            Self::Class(class) => class,
            Self::Instance(instance) => instance.class(),
        }
    }

    #[must_use]
    pub const fn instance(&self) -> Option<&MockInstance> {
        match self {
            Self::Class(_) => None,
            Self::Instance(instance) => Some(instance),
        }
    }
}

///
/// Behavior
///

#[derive(Clone)]
pub enum Behavior {
    Unbound(Rc<UnboundFn>),
    Bound(Rc<BoundFn>),
}

impl Behavior {
    pub fn unbound(f: impl Fn(&[Value]) -> Result<Value, InternalError> + 'static) -> Self {
        Self::Unbound(Rc::new(f))
    }

    pub fn bound(f: impl Fn(&Receiver, &[Value]) -> Result<Value, InternalError> + 'static) -> Self {
        Self::Bound(Rc::new(f))
    }

    #[must_use]
    pub const fn binding_mode(&self) -> BindingMode {
        match self {
            Self::Unbound(_) => BindingMode::Unbound,
            Self::Bound(_) => BindingMode::Bound,
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Behavior({})", self.binding_mode())
    }
}

///
/// MockMethod
///
/// One registry entry: the behavior plus the argument slot written on
/// every invocation. Re-stubbing replaces the whole entry.
///

#[derive(Debug)]
pub struct MockMethod {
    behavior: Behavior,
    arguments: RefCell<Vec<Value>>,
}

impl MockMethod {
    #[must_use]
    pub const fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            arguments: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn binding_mode(&self) -> BindingMode {
        self.behavior.binding_mode()
    }

    /// Arguments of the most recent invocation.
    #[must_use]
    pub fn last_arguments(&self) -> Vec<Value> {
        self.arguments.borrow().clone()
    }

    /// Record the arguments, then run the behavior with or without the
    /// receiver according to its binding mode.
    pub fn execute(&self, receiver: &Receiver, args: &[Value]) -> Result<Value, InternalError> {
        *self.arguments.borrow_mut() = args.to_vec();

        match &self.behavior {
            Behavior::Unbound(f) => f(args),
            Behavior::Bound(f) => f(receiver, args),
        }
    }
}
