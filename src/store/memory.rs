use super::{DocumentStore, Filter, StoreCollection};
use crate::core::{DocError, DocId, Document, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Embedded store keeping every collection in memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn collection(&self, name: &str) -> Result<Arc<dyn StoreCollection>> {
        if let Some(existing) = self.collections.read().await.get(name) {
            return Ok(existing.clone());
        }

        let mut collections = self.collections.write().await;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone();
        Ok(collection)
    }
}

/// One collection of [`MemoryStore`], kept in insertion order.
pub struct MemoryCollection {
    name: String,
    records: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StoreCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: &Document) -> Result<DocId> {
        let mut records = self.records.write().await;
        let id = match doc.id() {
            Some(id) if records.iter().any(|r| r.id() == Some(id)) => {
                return Err(DocError::Store(format!(
                    "Duplicate identity {} in collection '{}'",
                    id, self.name
                )));
            }
            Some(id) => id,
            None => DocId::generate(),
        };

        records.push(doc.clone().with_id(id));
        Ok(id)
    }

    async fn replace_one(&self, id: DocId, doc: &Document) -> Result<u64> {
        let mut records = self.records.write().await;
        let Some(slot) = records.iter_mut().find(|r| r.id() == Some(id)) else {
            return Ok(0);
        };
        *slot = doc.clone().with_id(id);
        Ok(1)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn delete_one(&self, id: DocId) -> Result<u64> {
        let mut records = self.records.write().await;
        match records.iter().position(|r| r.id() == Some(id)) {
            Some(index) => {
                records.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !filter.matches(r));
        Ok((before - records.len()) as u64)
    }

    async fn find_one_and_increment(
        &self,
        id: DocId,
        field: &str,
        amount: f64,
    ) -> Result<Option<Document>> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.id() == Some(id)) else {
            return Ok(None);
        };
        record.increment(field, amount).map_err(|err| {
            DocError::Store(format!("Cannot increment in '{}': {}", self.name, err))
        })?;
        Ok(Some(record.clone()))
    }
}
