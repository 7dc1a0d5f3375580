use super::Model;
use crate::core::{DocError, DocId, IdentityRef, Result};
use crate::schema::{Kind, SchemaNode};
use crate::store::Filter;
use crate::tracker::{DocRef, TrackedDocument};
use tracing::{Instrument, Level, event, info_span};

impl Model {
    /// Persists a tracked document.
    ///
    /// A new document is inserted and receives its identity; a fetched one
    /// fully replaces the stored record. The document is stamped with the
    /// current schema version either way. Validation failures leave the
    /// store and the tracking state unchanged.
    pub async fn save(&self, doc: &mut TrackedDocument) -> Result<()> {
        let span = info_span!(
            "model.save",
            collection = %self.collection_name(),
            new = doc.is_new()
        );
        async move {
            self.validate(doc)?;
            doc.set_schema_version(self.inner.version);

            let collection = self.collection().await?;
            if doc.is_new() {
                doc.set_id(None);
                let id = collection.insert_one(doc.document()).await.inspect_err(|err| {
                    event!(Level::ERROR, error = %err, "insert failed");
                })?;
                doc.mark_inserted(id);
                event!(Level::DEBUG, id = %id, "document inserted");
                return Ok(());
            }

            let id = doc.to_doc_id()?;
            let matched = collection.replace_one(id, doc.document()).await.inspect_err(|err| {
                event!(Level::ERROR, id = %id, error = %err, "replace failed");
            })?;
            if matched == 0 {
                event!(Level::WARN, id = %id, "replace matched no stored document");
            } else {
                event!(Level::DEBUG, id = %id, "document replaced");
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Deletes by identity, identity string or stored document. Returns
    /// whether a record was removed.
    pub async fn delete(&self, target: &(impl IdentityRef + ?Sized)) -> Result<bool> {
        let id = target.to_doc_id()?;
        let removed = self
            .collection()
            .await?
            .delete_one(id)
            .await
            .inspect_err(|err| {
                event!(Level::ERROR, collection = %self.collection_name(), id = %id, error = %err, "delete failed");
            })?;
        event!(
            Level::DEBUG,
            collection = %self.collection_name(),
            id = %id,
            removed,
            "delete"
        );
        Ok(removed > 0)
    }

    /// Deletes every record matching `filter` and returns how many went.
    pub async fn delete_by_filter(&self, filter: &Filter) -> Result<u64> {
        let removed = self
            .collection()
            .await?
            .delete_many(filter)
            .await
            .inspect_err(|err| {
                event!(Level::ERROR, collection = %self.collection_name(), error = %err, "delete by filter failed");
            })?;
        event!(
            Level::DEBUG,
            collection = %self.collection_name(),
            removed,
            "delete by filter"
        );
        Ok(removed)
    }

    /// Atomically adds `amount` to a numeric field.
    ///
    /// With an identity only the stored record changes. With a fetched
    /// document the in-memory field changes too; with a new document nothing
    /// is stored yet, so only the in-memory field changes. No validation or
    /// full replace takes place.
    pub async fn increment<'a>(
        &self,
        target: impl Into<DocRef<'a>>,
        field: &str,
        amount: f64,
    ) -> Result<()> {
        let span = info_span!(
            "model.increment",
            collection = %self.collection_name(),
            field = %field,
            amount
        );
        self.increment_inner(target.into(), field, amount)
            .instrument(span)
            .await
    }

    pub async fn increment_by_one<'a>(
        &self,
        target: impl Into<DocRef<'a>>,
        field: &str,
    ) -> Result<()> {
        self.increment(target, field, 1.0).await
    }

    async fn increment_inner(&self, target: DocRef<'_>, field: &str, amount: f64) -> Result<()> {
        check_incrementable(self.schema(), field)?;

        let (id, local) = match target {
            DocRef::Id(id) => (Some(id), None),
            DocRef::Str(raw) => (Some(raw.parse::<DocId>()?), None),
            DocRef::Tracked(doc) => {
                self.ensure_owned(doc)?;
                // Checked on a copy first so a non-numeric field fails before
                // the store is touched.
                doc.document().clone().increment(field, amount)?;
                let id = if doc.is_fetched() {
                    Some(doc.to_doc_id()?)
                } else {
                    None
                };
                (id, Some(doc))
            }
        };

        if let Some(id) = id {
            let updated = self
                .collection()
                .await?
                .find_one_and_increment(id, field, amount)
                .await
                .inspect_err(|err| {
                    event!(Level::ERROR, id = %id, error = %err, "increment failed");
                })?;
            if updated.is_none() {
                event!(Level::WARN, id = %id, "increment matched no stored document");
            }
        }

        if let Some(doc) = local {
            doc.increment(field, amount)?;
        }
        Ok(())
    }
}

/// Only numeric (or untyped) scalar fields can be incremented; dotted paths
/// walk through nested models.
fn check_incrementable(schema: &SchemaNode, field: &str) -> Result<()> {
    let mut node = schema;
    let mut segments = field.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(property) = node.resolve(segment) else {
            return Err(DocError::violation(field, "field is not declared"));
        };
        if property.is_array() {
            return Err(DocError::violation(field, "cannot increment an array field"));
        }

        match (property.kind(), segments.peek().is_some()) {
            (Kind::Model(child), true) => node = child,
            (Kind::Number | Kind::Any, false) => return Ok(()),
            (kind, _) => {
                return Err(DocError::violation(
                    field,
                    format!("cannot increment a field of type {}", kind.name()),
                ));
            }
        }
    }
    Err(DocError::violation(field, "empty field path"))
}
