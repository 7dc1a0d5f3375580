use super::Filter;
use crate::core::{DocId, Document, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A document store backend. Connection handling is optional; stores that are
/// always available keep the default hooks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Handle to a named collection, created on first use.
    async fn collection(&self, name: &str) -> Result<Arc<dyn StoreCollection>>;
}

/// Operations on one collection of persisted documents.
///
/// Documents cross this boundary in their persisted layout: identity, schema
/// version and declared fields. Implementations never validate.
#[async_trait]
pub trait StoreCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Inserts a document and returns its identity. The store generates one
    /// when the document carries none.
    async fn insert_one(&self, doc: &Document) -> Result<DocId>;

    /// Replaces the whole record matching `id`. Returns the number of matched
    /// records.
    async fn replace_one(&self, id: DocId, doc: &Document) -> Result<u64>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>>;

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>>;

    async fn delete_one(&self, id: DocId) -> Result<u64>;

    async fn delete_many(&self, filter: &Filter) -> Result<u64>;

    /// Atomically adds `amount` to a numeric field and returns the record
    /// after the change, or `None` when no record matches. A missing field
    /// starts from zero.
    async fn find_one_and_increment(
        &self,
        id: DocId,
        field: &str,
        amount: f64,
    ) -> Result<Option<Document>>;
}
