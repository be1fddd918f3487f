use std::{collections::BTreeMap, fmt};

///
/// ErrorTree
///
/// Accumulates validation messages per route so one pass can report every
/// problem in a schema instead of stopping at the first.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, Self>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message at this level.
    pub fn add(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Merge a child tree under `route`, skipping it when empty.
    pub fn add_child(&mut self, route: impl Into<String>, child: Self) {
        if child.is_empty() {
            return;
        }

        let route = route.into();
        match self.children.get_mut(&route) {
            Some(existing) => existing.merge(child),
            None => {
                self.children.insert(route, child);
            }
        }
    }

    /// Fold another tree into this one at the same level.
    pub fn merge(&mut self, other: Self) {
        self.messages.extend(other.messages);
        for (route, child) in other.children {
            self.add_child(route, child);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Number of messages across the whole tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    /// Flatten into `route: message` lines, depth first.
    #[must_use]
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<String>) {
        for message in &self.messages {
            if prefix.is_empty() {
                out.push(message.clone());
            } else {
                out.push(format!("{prefix}: {message}"));
            }
        }

        for (route, child) in &self.children {
            let route = if prefix.is_empty() {
                route.clone()
            } else {
                format!("{prefix}.{route}")
            };
            child.flatten_into(&route, out);
        }
    }

    /// Convert into a `Result`, failing when any message was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flatten().join("; "))
    }
}

///
/// err
///
/// Format and record a message on an `ErrorTree`.
///
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}
