//! Repository implementations for the waitlist domain

pub mod entries;
pub mod events;
pub mod users;

use konoha_docstore::DocumentStore;
use std::sync::Arc;

pub use entries::WaitlistRepository;
pub use events::EventRepository;
pub use users::UserRepository;

/// Combined repository access for the waitlist domain
#[derive(Clone)]
pub struct WaitlistRepositories {
    pub entries: WaitlistRepository,
    pub events: EventRepository,
    pub users: UserRepository,
}

impl WaitlistRepositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            entries: WaitlistRepository::new(store.clone()),
            events: EventRepository::new(store.clone()),
            users: UserRepository::new(store),
        }
    }
}
