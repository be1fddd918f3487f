use crate::{DEFAULT_PRIMARY_KEY, prelude::*};

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

///
/// Constant
///
/// Class-level constant declared by the source model or one of its modules.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Constant {
    pub name: String,
    pub value: Literal,
}

///
/// ClassDescriptor
///
/// Everything the runtime needs to synthesize one mocked class. Produced by
/// the generator and never mutated once handed to the runtime.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClassDescriptor {
    pub name: String,

    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    #[serde(default)]
    pub attributes: Vec<Attribute>,

    #[serde(default)]
    pub associations: Vec<AssociationSpec>,

    #[serde(default)]
    pub scopes: Vec<MethodSignature>,

    #[serde(default)]
    pub instance_methods: Vec<MethodSignature>,

    #[serde(default)]
    pub class_methods: Vec<MethodSignature>,

    #[serde(default)]
    pub constants: Vec<Constant>,
}

impl ClassDescriptor {
    /// Start a descriptor with only the primary key column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: default_primary_key(),
            attributes: vec![Attribute::new(DEFAULT_PRIMARY_KEY, AttributeType::Integer)],
            associations: Vec::new(),
            scopes: Vec::new(),
            instance_methods: Vec::new(),
            class_methods: Vec::new(),
            constants: Vec::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, ty: AttributeType) -> Self {
        self.attributes.push(Attribute::new(name, ty));
        self
    }

    #[must_use]
    pub fn attribute_with_default(
        mut self,
        name: impl Into<String>,
        ty: AttributeType,
        default: impl Into<Literal>,
    ) -> Self {
        self.attributes
            .push(Attribute::new(name, ty).with_default(default));
        self
    }

    #[must_use]
    pub fn association(mut self, spec: AssociationSpec) -> Self {
        self.associations.push(spec);
        self
    }

    #[must_use]
    pub fn scope(mut self, signature: MethodSignature) -> Self {
        self.scopes.push(signature);
        self
    }

    #[must_use]
    pub fn instance_method(mut self, signature: MethodSignature) -> Self {
        self.instance_methods.push(signature);
        self
    }

    #[must_use]
    pub fn class_method(mut self, signature: MethodSignature) -> Self {
        self.class_methods.push(signature);
        self
    }

    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.constants.push(Constant {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        name == self.primary_key || self.get_attribute(name).is_some()
    }

    #[must_use]
    pub fn get_association(&self, name: &str) -> Option<&AssociationSpec> {
        self.associations.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn get_scope(&self, name: &str) -> Option<&MethodSignature> {
        self.scopes.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn get_instance_method(&self, name: &str) -> Option<&MethodSignature> {
        self.instance_methods.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn get_class_method(&self, name: &str) -> Option<&MethodSignature> {
        self.class_methods.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn get_constant(&self, name: &str) -> Option<&Literal> {
        self.constants
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    /// Attribute names in declaration order, primary key first when it is
    /// not declared explicitly.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.attributes.len() + 1);
        if self.get_attribute(&self.primary_key).is_none() {
            names.push(self.primary_key.as_str());
        }
        names.extend(self.attributes.iter().map(|a| a.name.as_str()));

        names
    }

    /// Whether `key` may appear in a mass-assignment payload.
    #[must_use]
    pub fn accepts_key(&self, key: &str) -> bool {
        self.has_attribute(key) || self.get_association(key).is_some()
    }
}
