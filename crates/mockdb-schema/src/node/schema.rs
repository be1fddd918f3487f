use crate::{Error, node::NodeError, prelude::*, validate::validate_schema};
use std::collections::BTreeMap;

///
/// SchemaFile
/// Wire shape emitted by the generator.
///

#[derive(Deserialize)]
struct SchemaFile {
    classes: Vec<ClassDescriptor>,
}

///
/// Schema
///
/// All mocked class descriptors for one application, keyed by class name.
///

#[derive(Clone, Debug, Default)]
pub struct Schema {
    classes: BTreeMap<String, ClassDescriptor>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a generator payload of the form `{"classes": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let file: SchemaFile = serde_json::from_str(json)?;

        let mut schema = Self::new();
        for class in file.classes {
            schema.insert(class)?;
        }

        Ok(schema)
    }

    /// Register a descriptor; class names are unique.
    pub fn insert(&mut self, class: ClassDescriptor) -> Result<(), NodeError> {
        if self.classes.contains_key(&class.name) {
            return Err(NodeError::DuplicateClass(class.name));
        }

        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Builder-style [`Self::insert`].
    pub fn with_class(mut self, class: ClassDescriptor) -> Result<Self, NodeError> {
        self.insert(class)?;
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn try_get(&self, name: &str) -> Result<&ClassDescriptor, NodeError> {
        self.get(name)
            .ok_or_else(|| NodeError::ClassNotFound(name.to_string()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Run every schema check, reporting all failures at once.
    pub fn validate(&self) -> Result<(), Error> {
        validate_schema(self).map_err(Error::Validation)
    }
}
