//! In-process document store.

use super::{
    remove_nested_field, CollectionPath, DocPath, Document, DocumentSnapshot, DocumentStore,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Collections = BTreeMap<CollectionPath, BTreeMap<String, Document>>;

/// Document store kept entirely in memory.
///
/// Used by hosts without a remote backend and by tests.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        Ok(self
            .lock()
            .get(path.collection())
            .and_then(|docs| docs.get(path.doc_id()))
            .cloned())
    }

    async fn set_document(&self, path: &DocPath, data: Document) -> StoreResult<()> {
        self.lock()
            .entry(path.collection().clone())
            .or_default()
            .insert(path.doc_id().to_string(), data);
        Ok(())
    }

    async fn delete_document(&self, path: &DocPath) -> StoreResult<()> {
        if let Some(docs) = self.lock().get_mut(path.collection()) {
            docs.remove(path.doc_id());
        }
        Ok(())
    }

    async fn list_documents(&self, collection: &CollectionPath) -> StoreResult<Vec<DocumentSnapshot>> {
        Ok(self
            .lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| DocumentSnapshot {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_field(&self, path: &DocPath, field_path: &[&str]) -> StoreResult<()> {
        let mut collections = self.lock();
        let data = collections
            .get_mut(path.collection())
            .and_then(|docs| docs.get_mut(path.doc_id()))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        remove_nested_field(data, field_path);
        Ok(())
    }
}
