//! Persistence layer
//!
//! Four independent collections (users, follows, goals-with-embedded
//! participants, invitations) plus the sticker-image catalog. Each entity is
//! reached through a narrow store trait so the services can run against
//! MongoDB in production or the in-memory store in dev mode and tests.

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

use std::sync::Arc;

pub use mongo::{MongoClient, MongoCollection};

use crate::types::Result;
use store::{FollowStore, GoalStore, InvitationStore, StickerImageStore, UserStore};

/// The full set of entity stores the services are wired with.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub follows: Arc<dyn FollowStore>,
    pub goals: Arc<dyn GoalStore>,
    pub invitations: Arc<dyn InvitationStore>,
    pub sticker_images: Arc<dyn StickerImageStore>,
}

impl Stores {
    /// MongoDB-backed stores. Creates the typed collections and applies
    /// their schema-declared indexes.
    pub async fn mongo(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            users: Arc::new(store::MongoUserStore::new(client).await?),
            follows: Arc::new(store::MongoFollowStore::new(client).await?),
            goals: Arc::new(store::MongoGoalStore::new(client).await?),
            invitations: Arc::new(store::MongoInvitationStore::new(client).await?),
            sticker_images: Arc::new(store::MongoStickerImageStore::new(client).await?),
        })
    }

    /// In-memory stores for dev mode and tests.
    pub fn memory() -> Self {
        Self {
            users: Arc::new(memory::MemUserStore::default()),
            follows: Arc::new(memory::MemFollowStore::default()),
            goals: Arc::new(memory::MemGoalStore::default()),
            invitations: Arc::new(memory::MemInvitationStore::default()),
            sticker_images: Arc::new(memory::MemStickerImageStore::default()),
        }
    }
}
