//! Goal store
//!
//! Roster mutations are narrow, targeted updates ($push/$pull/positional
//! $set) rather than whole-document replacement, matching the
//! single-writer-per-request model.

use async_trait::async_trait;
use bson::{doc, DateTime, Document};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    GoalDoc, GoalMode, GoalStatus, GoalVisibility, Participant, GOAL_COLLECTION,
};
use crate::db::store::to_bson_value;
use crate::types::Result;

/// Partial update for a goal; None fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sticker_count: Option<i32>,
    pub mode: Option<GoalMode>,
    pub visibility: Option<GoalVisibility>,
    pub status: Option<GoalStatus>,
    pub auto_approve: Option<bool>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.sticker_count.is_none()
            && self.mode.is_none()
            && self.visibility.is_none()
            && self.status.is_none()
            && self.auto_approve.is_none()
    }
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Insert a new goal. A duplicate handle surfaces as Conflict.
    async fn insert(&self, doc: GoalDoc) -> Result<GoalDoc>;

    async fn find_by_handle(&self, goal_id: &str) -> Result<Option<GoalDoc>>;

    /// All goals, newest first. Visibility filtering is the service's job.
    async fn find_all(&self) -> Result<Vec<GoalDoc>>;

    async fn find_by_creator(&self, user: &str) -> Result<Vec<GoalDoc>>;

    /// Goals created by any of the given users, newest first.
    async fn find_by_creators(&self, users: &[String]) -> Result<Vec<GoalDoc>>;

    async fn find_participating(&self, user: &str) -> Result<Vec<GoalDoc>>;

    /// Apply a partial update and return the updated goal.
    async fn apply_patch(&self, goal_id: &str, patch: GoalPatch) -> Result<Option<GoalDoc>>;

    /// Append a roster entry. The caller is responsible for duplicate checks.
    async fn push_participant(&self, goal_id: &str, participant: Participant) -> Result<bool>;

    /// Replace an existing roster entry in place (matched by user handle).
    async fn update_participant(&self, goal_id: &str, participant: &Participant) -> Result<bool>;

    /// Remove one user's roster entry from one goal.
    async fn pull_participant(&self, goal_id: &str, user: &str) -> Result<bool>;

    /// Remove one user's roster entry from every goal. Goals persist.
    async fn pull_participant_from_all(&self, user: &str) -> Result<u64>;

    async fn delete_by_handle(&self, goal_id: &str) -> Result<bool>;
}

/// MongoDB-backed goal store
pub struct MongoGoalStore {
    collection: MongoCollection<GoalDoc>,
}

impl MongoGoalStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(GOAL_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl GoalStore for MongoGoalStore {
    async fn insert(&self, doc: GoalDoc) -> Result<GoalDoc> {
        let mut saved = doc.clone();
        let id = self.collection.insert_one(doc).await?;
        saved._id = Some(id);
        Ok(saved)
    }

    async fn find_by_handle(&self, goal_id: &str) -> Result<Option<GoalDoc>> {
        self.collection.find_one(doc! { "goal_id": goal_id }).await
    }

    async fn find_all(&self) -> Result<Vec<GoalDoc>> {
        self.collection
            .find_many_sorted(doc! {}, doc! { "metadata.created_at": -1 })
            .await
    }

    async fn find_by_creator(&self, user: &str) -> Result<Vec<GoalDoc>> {
        self.collection
            .find_many_sorted(doc! { "created_by": user }, doc! { "metadata.created_at": -1 })
            .await
    }

    async fn find_by_creators(&self, users: &[String]) -> Result<Vec<GoalDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "created_by": { "$in": users } },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn find_participating(&self, user: &str) -> Result<Vec<GoalDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "participants.user_id": user },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn apply_patch(&self, goal_id: &str, patch: GoalPatch) -> Result<Option<GoalDoc>> {
        let mut set = Document::new();
        if let Some(title) = patch.title {
            set.insert("title", title);
        }
        if let Some(description) = patch.description {
            set.insert("description", description);
        }
        if let Some(sticker_count) = patch.sticker_count {
            set.insert("sticker_count", sticker_count);
        }
        if let Some(mode) = patch.mode {
            set.insert("mode", to_bson_value(&mode)?);
        }
        if let Some(visibility) = patch.visibility {
            set.insert("visibility", to_bson_value(&visibility)?);
        }
        if let Some(status) = patch.status {
            set.insert("status", to_bson_value(&status)?);
        }
        if let Some(auto_approve) = patch.auto_approve {
            set.insert("auto_approve", auto_approve);
        }
        set.insert("metadata.updated_at", DateTime::now());

        self.collection
            .find_one_and_update(doc! { "goal_id": goal_id }, doc! { "$set": set })
            .await
    }

    async fn push_participant(&self, goal_id: &str, participant: Participant) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "goal_id": goal_id },
                doc! {
                    "$push": { "participants": to_bson_value(&participant)? },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn update_participant(&self, goal_id: &str, participant: &Participant) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "goal_id": goal_id, "participants.user_id": &participant.user_id },
                doc! {
                    "$set": {
                        "participants.$": to_bson_value(participant)?,
                        "metadata.updated_at": DateTime::now(),
                    },
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_participant(&self, goal_id: &str, user: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "goal_id": goal_id },
                doc! {
                    "$pull": { "participants": { "user_id": user } },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn pull_participant_from_all(&self, user: &str) -> Result<u64> {
        let result = self
            .collection
            .update_many(
                doc! { "participants.user_id": user },
                doc! {
                    "$pull": { "participants": { "user_id": user } },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_by_handle(&self, goal_id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "goal_id": goal_id }).await?;
        Ok(result.deleted_count > 0)
    }
}
