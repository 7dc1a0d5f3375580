use crate::schema::Property;
use std::collections::BTreeMap;

/// Field name → property mapping for one object level, with an optional
/// catch-all rule for fields not named explicitly.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    fields: BTreeMap<String, Property>,
    catch_all: Option<Box<Property>>,
}

impl SchemaNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, property: Property) -> Self {
        self.fields.insert(name.into(), property);
        self
    }

    pub fn catch_all(mut self, property: Property) -> Self {
        self.catch_all = Some(Box::new(property));
        self
    }

    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.fields.get(name)
    }

    /// Explicit property for `name`, falling back to the catch-all.
    pub fn resolve(&self, name: &str) -> Option<&Property> {
        self.fields.get(name).or(self.catch_all.as_deref())
    }

    pub fn catch_all_property(&self) -> Option<&Property> {
        self.catch_all.as_deref()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &Property)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
