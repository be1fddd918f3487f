use crate::stub::{Behavior, MockMethod};
use std::{collections::HashMap, rc::Rc};

///
/// MethodRegistry
///
/// Method name → stub. Keys are unique and the last registration wins.
///

#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Rc<MockMethod>>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `behavior` under `name`, replacing any previous stub.
    /// Returns `true` when an earlier stub was replaced.
    pub fn register(&mut self, name: impl Into<String>, behavior: Behavior) -> bool {
        self.methods
            .insert(name.into(), Rc::new(MockMethod::new(behavior)))
            .is_some()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<MockMethod>> {
        self.methods.get(name).cloned()
    }

    /// Drop every stub, returning how many were registered.
    pub fn clear(&mut self) -> usize {
        let cleared = self.methods.len();
        self.methods.clear();
        cleared
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
