//! Models: a versioned schema bound to one collection of a database.
//!
//! A model hands out [`TrackedDocument`]s from `create*` and the read family
//! and only accepts its own documents back in `save`, `merge` and
//! `increment`.

mod persist;
mod read;

use crate::core::{DocError, Document, Fields, Result, is_reserved};
use crate::facade::DatabaseInner;
use crate::schema::{ModelDefinition, SchemaNode};
use crate::store::StoreCollection;
use crate::tracker::{ModelKey, TrackedDocument};
use crate::validator::{ValidationMode, validate_document, validate_fields};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Handle to one defined model. Clones share tracking: a document created
/// through a clone is managed by the original as well.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    key: ModelKey,
    definition: ModelDefinition,
    version: u32,
    database: Arc<DatabaseInner>,
    collection: OnceCell<Arc<dyn StoreCollection>>,
}

impl Model {
    pub(crate) fn new(database: Arc<DatabaseInner>, definition: ModelDefinition) -> Result<Self> {
        definition.validate()?;
        let version = definition.current_version().ok_or_else(|| {
            DocError::InvalidDefinition(format!(
                "Model '{}' has no schema versions",
                definition.collection_name()
            ))
        })?;

        Ok(Self {
            inner: Arc::new(ModelInner {
                key: ModelKey::next(),
                definition,
                version,
                database,
                collection: OnceCell::new(),
            }),
        })
    }

    /// Current schema version, the index of the last declared schema.
    pub fn version(&self) -> u32 {
        self.inner.version
    }

    pub fn collection_name(&self) -> &str {
        self.inner.definition.collection_name()
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.inner.definition
    }

    pub fn key(&self) -> ModelKey {
        self.inner.key
    }

    fn schema(&self) -> &SchemaNode {
        self.inner.definition.versions()[self.inner.version as usize].schema()
    }

    fn ensure_owned(&self, doc: &TrackedDocument) -> Result<()> {
        doc.ensure_owned_by(self.inner.key, self.collection_name())
    }

    /// Collection handle, resolved once after the connection gate opens.
    async fn collection(&self) -> Result<&Arc<dyn StoreCollection>> {
        self.inner.database.gate.wait().await;
        self.inner
            .collection
            .get_or_try_init(|| self.inner.database.store.collection(self.collection_name()))
            .await
    }

    /// New document with every default applied.
    pub fn create(&self) -> Result<TrackedDocument> {
        self.create_with(Fields::new())
    }

    /// New document from partial input. Defaults fill the gaps; missing
    /// required fields are only reported by `save`.
    pub fn create_with(&self, fields: Fields) -> Result<TrackedDocument> {
        reject_reserved(&fields)?;
        let mut doc = Document::new(self.inner.version, fields);
        validate_fields(self.schema(), doc.fields_mut(), ValidationMode::Creation)?;
        Ok(TrackedDocument::new_document(self.inner.key, doc))
    }

    /// Like [`Model::create_with`], from a JSON object. Reserved `_id` and
    /// `_v` keys are lifted out of the input and discarded.
    pub fn create_from_json(&self, json: serde_json::Value) -> Result<TrackedDocument> {
        let fields = Document::from_json(json)?.into_fields();
        self.create_with(fields)
    }

    /// Strict validation against the current schema. Identity is only
    /// required once the document has been stored.
    pub fn validate(&self, doc: &mut TrackedDocument) -> Result<()> {
        self.ensure_owned(doc)?;
        if doc.is_new() {
            validate_fields(self.schema(), doc.fields_mut(), ValidationMode::Strict)
        } else {
            validate_document(self.schema(), doc, ValidationMode::Strict)
        }
    }

    /// Overlays top-level fields onto a tracked document. The result is
    /// checked in partial mode first; a rejected patch leaves the document
    /// untouched.
    pub fn merge(&self, doc: &mut TrackedDocument, patch: Fields) -> Result<()> {
        self.ensure_owned(doc)?;
        reject_reserved(&patch)?;

        let mut merged = doc.fields().clone();
        merged.extend(patch);
        validate_fields(self.schema(), &mut merged, ValidationMode::Partial)?;
        *doc.fields_mut() = merged;
        Ok(())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("collection", &self.collection_name())
            .field("version", &self.inner.version)
            .field("key", &self.inner.key)
            .finish()
    }
}

fn reject_reserved(fields: &Fields) -> Result<()> {
    match fields.keys().find(|key| is_reserved(key)) {
        Some(key) => Err(DocError::violation(
            key.as_str(),
            "reserved field cannot be set directly",
        )),
        None => Ok(()),
    }
}
