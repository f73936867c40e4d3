//! User store

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::types::Result;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Duplicate handle or email surfaces as Conflict.
    async fn insert(&self, doc: UserDoc) -> Result<UserDoc>;

    /// Lookup by the storage-assigned id.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserDoc>>;

    async fn find_by_handle(&self, user_id: &str) -> Result<Option<UserDoc>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    /// Case-insensitive substring match on nickname, newest first.
    async fn search_by_nickname(&self, pattern: &str) -> Result<Vec<UserDoc>>;

    async fn update_nickname(&self, user_id: &str, nickname: &str) -> Result<Option<UserDoc>>;

    async fn update_profile_image(&self, user_id: &str, url: &str) -> Result<Option<UserDoc>>;

    async fn delete_by_handle(&self, user_id: &str) -> Result<bool>;
}

/// MongoDB-backed user store
pub struct MongoUserStore {
    collection: MongoCollection<UserDoc>,
}

impl MongoUserStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(USER_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, doc: UserDoc) -> Result<UserDoc> {
        let mut saved = doc.clone();
        let id = self.collection.insert_one(doc).await?;
        saved._id = Some(id);
        Ok(saved)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserDoc>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        self.collection.find_one(doc! { "_id": oid }).await
    }

    async fn find_by_handle(&self, user_id: &str) -> Result<Option<UserDoc>> {
        self.collection.find_one(doc! { "user_id": user_id }).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.collection.find_one(doc! { "email": email }).await
    }

    async fn search_by_nickname(&self, pattern: &str) -> Result<Vec<UserDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "nickname": { "$regex": pattern, "$options": "i" } },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn update_nickname(&self, user_id: &str, nickname: &str) -> Result<Option<UserDoc>> {
        self.collection
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! { "$set": { "nickname": nickname, "metadata.updated_at": DateTime::now() } },
            )
            .await
    }

    async fn update_profile_image(&self, user_id: &str, url: &str) -> Result<Option<UserDoc>> {
        self.collection
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! { "$set": { "profile_image": url, "metadata.updated_at": DateTime::now() } },
            )
            .await
    }

    async fn delete_by_handle(&self, user_id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "user_id": user_id }).await?;
        Ok(result.deleted_count > 0)
    }
}
