use crate::prelude::*;
use std::fmt;

///
/// ParamKind
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    Required,
    Optional,
    Rest,
    Block,
}

///
/// Param
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Param {
    pub name: String,

    #[serde(default)]
    pub kind: ParamKind,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

///
/// MethodSignature
///
/// A method the source model declares. Only declared methods can be called
/// on a mock; the parameter list fixes the accepted arity.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MethodSignature {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

impl MethodSignature {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param::new(name, kind));
        self
    }

    #[must_use]
    pub fn required(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Required)
    }

    #[must_use]
    pub fn optional(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Optional)
    }

    #[must_use]
    pub fn rest(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Rest)
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        let mut arity = Arity::default();
        for param in &self.params {
            match param.kind {
                ParamKind::Required => arity.required += 1,
                ParamKind::Optional => arity.optional += 1,
                ParamKind::Rest => arity.rest = true,
                ParamKind::Block => {}
            }
        }

        arity
    }
}

///
/// Arity
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Arity {
    pub required: usize,
    pub optional: usize,
    pub rest: bool,
}

impl Arity {
    #[must_use]
    pub const fn accepts(&self, given: usize) -> bool {
        given >= self.required && (self.rest || given <= self.required + self.optional)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest {
            write!(f, "{}+", self.required)
        } else if self.optional > 0 {
            write!(f, "{}..{}", self.required, self.required + self.optional)
        } else {
            write!(f, "{}", self.required)
        }
    }
}
