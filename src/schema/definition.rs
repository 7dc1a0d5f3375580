use crate::core::{DocError, Result, is_reserved};
use crate::schema::{Kind, Migration, SchemaNode};

/// One entry of the version chain. Its index is the schema version.
#[derive(Debug, Clone)]
pub struct VersionedSchema {
    pub(crate) schema: SchemaNode,
    pub(crate) migration: Option<Migration>,
}

impl VersionedSchema {
    pub fn new(schema: SchemaNode) -> Self {
        Self {
            schema,
            migration: None,
        }
    }

    /// Upgrades a document from the previous version to this one.
    pub fn with_migration(mut self, migration: Migration) -> Self {
        self.migration = Some(migration);
        self
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn migration(&self) -> Option<&Migration> {
        self.migration.as_ref()
    }
}

/// A collection plus the ordered chain of its schema versions.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    collection_name: String,
    versions: Vec<VersionedSchema>,
}

impl ModelDefinition {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            versions: Vec::new(),
        }
    }

    /// Appends the next version; versions are numbered from 0 in push order.
    pub fn version(mut self, version: VersionedSchema) -> Self {
        self.versions.push(version);
        self
    }

    /// Shorthand for a version without a migration.
    pub fn schema(self, schema: SchemaNode) -> Self {
        self.version(VersionedSchema::new(schema))
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn versions(&self) -> &[VersionedSchema] {
        &self.versions
    }

    /// Index of the last version, `None` for an empty chain.
    pub fn current_version(&self) -> Option<u32> {
        self.versions.len().checked_sub(1).map(|last| last as u32)
    }

    pub fn latest(&self) -> Option<&VersionedSchema> {
        self.versions.last()
    }

    /// Checks that the definition can back a model.
    pub fn validate(&self) -> Result<()> {
        validate_collection_name(&self.collection_name)?;

        if self.versions.is_empty() {
            return Err(DocError::InvalidDefinition(format!(
                "Model '{}' must declare at least one schema version",
                self.collection_name
            )));
        }

        if u32::try_from(self.versions.len()).is_err() {
            return Err(DocError::InvalidDefinition(format!(
                "Model '{}' declares too many schema versions",
                self.collection_name
            )));
        }

        for (index, version) in self.versions.iter().enumerate() {
            check_reserved_keys(&version.schema, index, "")?;
        }

        Ok(())
    }
}

fn check_reserved_keys(node: &SchemaNode, version: usize, prefix: &str) -> Result<()> {
    for (name, property) in node.properties() {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        if is_reserved(name) {
            return Err(DocError::InvalidDefinition(format!(
                "Schema version {} declares reserved field '{}'",
                version, path
            )));
        }

        if let Kind::Model(child) = property.kind() {
            check_reserved_keys(child, version, &path)?;
        }
    }
    Ok(())
}

/// Validates collection names: a letter or underscore first, then letters,
/// digits and underscores, at most 64 characters.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let Some(first) = name.chars().next() else {
        return Err(DocError::InvalidDefinition(
            "Collection name cannot be empty".to_string(),
        ));
    };

    if !first.is_alphabetic() && first != '_' {
        return Err(DocError::InvalidDefinition(
            "Collection name must start with a letter or underscore".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(DocError::InvalidDefinition(
            "Collection name can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    if name.len() > 64 {
        return Err(DocError::InvalidDefinition(
            "Collection name too long (max 64 characters)".to_string(),
        ));
    }

    Ok(())
}
