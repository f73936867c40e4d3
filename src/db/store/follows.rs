//! Follow edge store

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{FollowDoc, FollowStatus, FOLLOW_COLLECTION};
use crate::db::store::to_bson_value;
use crate::types::Result;

#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Insert a new edge. A duplicate ordered pair surfaces as Conflict.
    async fn insert(&self, doc: FollowDoc) -> Result<FollowDoc>;

    async fn find_by_id(&self, id: &str) -> Result<Option<FollowDoc>>;

    /// The edge for an ordered (follower, following) pair, any status.
    async fn find_pair(&self, follower: &str, following: &str) -> Result<Option<FollowDoc>>;

    /// Promote an edge to approved, stamping approved_at.
    async fn mark_approved(&self, id: &str, updated_by: &str) -> Result<Option<FollowDoc>>;

    /// All edges touching a user in either role, newest first.
    async fn find_for_user(
        &self,
        user: &str,
        status: Option<FollowStatus>,
    ) -> Result<Vec<FollowDoc>>;

    /// Edges sent by a user with the given status, newest first.
    async fn find_sent(&self, follower: &str, status: FollowStatus) -> Result<Vec<FollowDoc>>;

    /// Edges received by a user with the given status, newest first.
    async fn find_received(&self, following: &str, status: FollowStatus) -> Result<Vec<FollowDoc>>;

    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    /// Remove every edge touching a user. Returns the number removed.
    async fn delete_all_for_user(&self, user: &str) -> Result<u64>;
}

/// MongoDB-backed follow store
pub struct MongoFollowStore {
    collection: MongoCollection<FollowDoc>,
}

impl MongoFollowStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(FOLLOW_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl FollowStore for MongoFollowStore {
    async fn insert(&self, doc: FollowDoc) -> Result<FollowDoc> {
        let mut saved = doc.clone();
        let id = self.collection.insert_one(doc).await?;
        saved._id = Some(id);
        Ok(saved)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<FollowDoc>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        self.collection.find_one(doc! { "_id": oid }).await
    }

    async fn find_pair(&self, follower: &str, following: &str) -> Result<Option<FollowDoc>> {
        self.collection
            .find_one(doc! { "follower_id": follower, "following_id": following })
            .await
    }

    async fn mark_approved(&self, id: &str, updated_by: &str) -> Result<Option<FollowDoc>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        self.collection
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$set": {
                    "status": to_bson_value(&FollowStatus::Approved)?,
                    "approved_at": DateTime::now(),
                    "updated_by": updated_by,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await
    }

    async fn find_for_user(
        &self,
        user: &str,
        status: Option<FollowStatus>,
    ) -> Result<Vec<FollowDoc>> {
        let mut filter = doc! {
            "$or": [ { "follower_id": user }, { "following_id": user } ],
        };
        if let Some(status) = status {
            filter.insert("status", to_bson_value(&status)?);
        }
        self.collection
            .find_many_sorted(filter, doc! { "metadata.created_at": -1 })
            .await
    }

    async fn find_sent(&self, follower: &str, status: FollowStatus) -> Result<Vec<FollowDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "follower_id": follower, "status": to_bson_value(&status)? },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn find_received(&self, following: &str, status: FollowStatus) -> Result<Vec<FollowDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "following_id": following, "status": to_bson_value(&status)? },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(false);
        };
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_all_for_user(&self, user: &str) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {
                "$or": [ { "follower_id": user }, { "following_id": user } ],
            })
            .await?;
        Ok(result.deleted_count)
    }
}
