//! Read access to user records

use konoha_docstore::DocumentStore;
use std::sync::Arc;

use crate::domain::entities::{User, USERS_COLLECTION};
use crate::domain::error::Result;

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<User>> {
        match self.store.get(USERS_COLLECTION, user_id).await? {
            Some(stored) => User::from_document(&stored).map(Some),
            None => Ok(None),
        }
    }
}
