use super::Model;
use crate::core::{DocError, Document, IdentityRef, Result};
use crate::migration::{MigrationOutcome, MigrationRunner};
use crate::store::{Filter, StoreCollection};
use crate::tracker::TrackedDocument;
use crate::validator::{ValidationMode, validate_document};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

impl Model {
    /// Loads one document by identity, identity string or document.
    pub async fn find_by_id(
        &self,
        target: &(impl IdentityRef + ?Sized),
    ) -> Result<Option<TrackedDocument>> {
        let id = target.to_doc_id()?;
        self.find_one(&Filter::by_id(id)).await
    }

    /// Loads the first document matching `filter`, upgraded to the current
    /// schema version.
    pub async fn find_one(&self, filter: &Filter) -> Result<Option<TrackedDocument>> {
        let span = info_span!("model.find", collection = %self.collection_name(), many = false);
        async move {
            let collection = self.collection().await?;
            let found = collection.find_one(filter).await.inspect_err(|err| {
                event!(Level::ERROR, error = %err, "find_one failed");
            })?;
            match found {
                Some(raw) => Ok(Some(self.hydrate(collection, raw).await?)),
                None => Ok(None),
            }
        }
        .instrument(span)
        .await
    }

    /// Loads every document matching `filter`. Stale documents are upgraded
    /// concurrently; the first failure fails the whole call.
    pub async fn find(&self, filter: &Filter) -> Result<Vec<TrackedDocument>> {
        let span = info_span!("model.find", collection = %self.collection_name(), many = true);
        async move {
            let collection = self.collection().await?;
            let raw = collection.find(filter).await.inspect_err(|err| {
                event!(Level::ERROR, error = %err, "find failed");
            })?;
            event!(Level::DEBUG, found = raw.len(), "documents loaded");
            try_join_all(raw.into_iter().map(|doc| self.hydrate(collection, doc))).await
        }
        .instrument(span)
        .await
    }

    /// Brings a stored document to the current version and starts tracking
    /// it. An upgraded document is validated and written back unless
    /// upgrades are configured not to persist.
    async fn hydrate(
        &self,
        collection: &Arc<dyn StoreCollection>,
        mut doc: Document,
    ) -> Result<TrackedDocument> {
        let id = doc.id().ok_or_else(|| {
            DocError::Store(format!(
                "Stored document in '{}' has no identity",
                self.collection_name()
            ))
        })?;

        let span = info_span!("model.migrate", collection = %self.collection_name(), id = %id);
        let outcome = MigrationRunner::new(self.definition())
            .run(&mut doc)
            .instrument(span)
            .await?;

        if let MigrationOutcome::Upgraded { from, to, steps_applied } = outcome {
            if self.inner.database.config.persist_upgrades {
                validate_document(self.schema(), &mut doc, ValidationMode::Strict)?;
                let matched = collection.replace_one(id, &doc).await.inspect_err(|err| {
                    event!(Level::ERROR, id = %id, error = %err, "persisting upgrade failed");
                })?;
                if matched == 0 {
                    event!(
                        Level::WARN,
                        collection = %self.collection_name(),
                        id = %id,
                        "upgraded document no longer stored, write-back matched nothing"
                    );
                } else {
                    event!(
                        Level::INFO,
                        collection = %self.collection_name(),
                        id = %id,
                        from,
                        to,
                        steps_applied,
                        "upgraded document persisted"
                    );
                }
            } else {
                event!(
                    Level::DEBUG,
                    collection = %self.collection_name(),
                    id = %id,
                    from,
                    to,
                    "upgraded document left stale in store"
                );
            }
        }

        Ok(TrackedDocument::fetched(self.inner.key, doc))
    }
}
