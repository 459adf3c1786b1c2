//! Konoha document store
//!
//! A minimal collection/document interface the waitlist core persists through:
//! - `DocumentStore` trait with conditional create, update and delete
//! - In-memory store for tests and local development
//! - PostgreSQL JSONB store for deployments

pub mod filter;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use filter::{matches_all, Filter, FilterOp};
pub use memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A document body: a JSON object keyed by field name
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Document not found")]
    NotFound,

    #[error("Document already exists")]
    AlreadyExists,

    #[error("Document does not match the expected state")]
    PreconditionFailed,

    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Decode(e) => StoreError::Malformed(e.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Malformed(format!("column {index}: {source}"))
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// A document together with its identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Document store operations.
///
/// Every single-document operation is atomic. Nothing spans documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document under a freshly generated id.
    async fn create(&self, collection: &str, data: Document) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.create_with_id(collection, &id, data).await?;
        Ok(id)
    }

    /// Create a document under a caller-chosen id.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// All documents of a collection matching every filter, in no particular order.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Merge `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.update_if(collection, id, &[], fields).await
    }

    /// Merge `fields` into a document only if it matches every precondition.
    ///
    /// Fails with `NotFound` if absent and `PreconditionFailed` on mismatch.
    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        preconditions: &[Filter],
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        match self.delete_if(collection, id, &[]).await {
            Err(StoreError::NotFound) => Ok(()),
            other => other,
        }
    }

    /// Delete a document only if it matches every precondition.
    async fn delete_if(
        &self,
        collection: &str,
        id: &str,
        preconditions: &[Filter],
    ) -> Result<(), StoreError>;
}

/// Document store configuration
#[derive(Clone)]
pub struct StoreConfig {
    /// Store provider (memory, postgres)
    pub provider: String,
    /// Connection URL for the postgres provider
    pub database_url: Option<String>,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("provider", &self.provider)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Factory for creating DocumentStore implementations.
pub struct DocumentStoreFactory;

impl DocumentStoreFactory {
    /// Create a DocumentStore based on configuration.
    pub async fn create(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match config.provider.as_str() {
            "memory" => {
                tracing::info!("Creating in-memory document store");
                Ok(Arc::new(InMemoryDocumentStore::new()))
            }
            "postgres" => {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    StoreError::Unavailable(
                        "DATABASE_URL is required for the postgres store".to_string(),
                    )
                })?;
                tracing::info!("Creating PostgreSQL document store");
                let store = PgDocumentStore::connect(url).await?;
                store.migrate().await?;
                Ok(Arc::new(store))
            }
            provider => Err(StoreError::Unavailable(format!(
                "Unknown store provider: {}. Supported providers: memory, postgres",
                provider
            ))),
        }
    }
}
