//! PostgreSQL document store
//!
//! All collections share one `documents` table keyed by `(collection, id)`.
//! Document bodies live in a JSONB column; filters compile to `data -> field`
//! predicates so conditional writes are decided by a single statement.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};

use crate::{Document, DocumentStore, Filter, FilterOp, StoreError, StoredDocument};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Document>,
}

impl From<DocumentRow> for StoredDocument {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            data: row.data.0,
        }
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT id FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Tell `NotFound` apart from `PreconditionFailed` after a write matched no row
    async fn explain_miss(&self, collection: &str, id: &str) -> StoreError {
        match self.exists(collection, id).await {
            Ok(true) => StoreError::PreconditionFailed,
            Ok(false) => StoreError::NotFound,
            Err(e) => e,
        }
    }
}

/// Append one ` AND <predicate>` per filter
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for filter in filters {
        builder.push(" AND (data -> ");
        builder.push_bind(filter.field.clone());
        match filter.op {
            FilterOp::Eq => {
                builder.push(") = ");
                builder.push_bind(Json(filter.value.clone()));
            }
            FilterOp::Ne => {
                builder.push(") IS DISTINCT FROM ");
                builder.push_bind(Json(filter.value.clone()));
            }
            FilterOp::In => {
                builder.push(") IN (SELECT jsonb_array_elements(");
                builder.push_bind(Json(filter.value.clone()));
                builder.push("))");
            }
            FilterOp::Absent => {
                builder.push(") IS NULL");
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_with_id(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(StoredDocument::from))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT id, data FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());
        push_filters(&mut builder, filters);

        let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(StoredDocument::from).collect())
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        preconditions: &[Filter],
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE documents SET data = data || ");
        builder.push_bind(Json(fields));
        builder.push(", updated_at = NOW() WHERE collection = ");
        builder.push_bind(collection.to_string());
        builder.push(" AND id = ");
        builder.push_bind(id.to_string());
        push_filters(&mut builder, preconditions);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.explain_miss(collection, id).await);
        }
        Ok(())
    }

    async fn delete_if(
        &self,
        collection: &str,
        id: &str,
        preconditions: &[Filter],
    ) -> Result<(), StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());
        builder.push(" AND id = ");
        builder.push_bind(id.to_string());
        push_filters(&mut builder, preconditions);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.explain_miss(collection, id).await);
        }
        Ok(())
    }
}
