//! In-memory document store
//!
//! Thread-safe via `Arc<RwLock<>>`; each operation holds the lock for its whole
//! read-check-write sequence, so conditional writes are atomic.
//! Faults can be injected to exercise storage failure paths in tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{matches_all, Document, DocumentStore, Filter, StoreError, StoredDocument};

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Document>>,
    unavailable: bool,
    failing_writes: HashSet<(String, String)>,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn check_writable(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if self
            .failing_writes
            .contains(&(collection.to_string(), id.to_string()))
        {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for {collection}/{id}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to one document fail with `Unavailable`.
    pub fn fail_writes_for(&self, collection: &str, id: &str) {
        if let Ok(mut inner) = self.inner.write() {
            inner
                .failing_writes
                .insert((collection.to_string(), id.to_string()));
        }
    }

    /// Make every operation fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut inner) = self.inner.write() {
            inner.unavailable = unavailable;
        }
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.unavailable = false;
            inner.failing_writes.clear();
        }
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .map(|inner| inner.collections.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.check_writable(collection, id)?;

        let documents = inner.collections.entry(collection.to_string()).or_default();
        if documents.contains_key(id) {
            return Err(StoreError::AlreadyExists);
        }
        documents.insert(id.to_string(), data);
        tracing::debug!(collection, id, "Memory store: created document");
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let inner = self.read()?;
        inner.check_available()?;

        Ok(inner
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|data| StoredDocument {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let inner = self.read()?;
        inner.check_available()?;

        let Some(documents) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|(_, data)| matches_all(filters, data))
            .map(|(id, data)| StoredDocument {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        preconditions: &[Filter],
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.check_writable(collection, id)?;

        let document = inner
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        if !matches_all(preconditions, document) {
            return Err(StoreError::PreconditionFailed);
        }

        document.extend(fields);
        Ok(())
    }

    async fn delete_if(
        &self,
        collection: &str,
        id: &str,
        preconditions: &[Filter],
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.check_writable(collection, id)?;

        let documents = inner
            .collections
            .get_mut(collection)
            .ok_or(StoreError::NotFound)?;
        let document = documents.get(id).ok_or(StoreError::NotFound)?;

        if !matches_all(preconditions, document) {
            return Err(StoreError::PreconditionFailed);
        }

        documents.remove(id);
        Ok(())
    }
}
