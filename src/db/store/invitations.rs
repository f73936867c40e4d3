//! Invitation store

use async_trait::async_trait;
use bson::{doc, Bson, DateTime};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{InvitationDoc, InvitationStatus, InvitationType, INVITATION_COLLECTION};
use crate::db::store::to_bson_value;
use crate::types::Result;

#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Insert a new invitation. A duplicate handle surfaces as Conflict.
    async fn insert(&self, doc: InvitationDoc) -> Result<InvitationDoc>;

    async fn find_by_handle(&self, invitation_id: &str) -> Result<Option<InvitationDoc>>;

    /// The newest invitation between a (goal, sender, recipient) triple whose
    /// status is one of the given set.
    async fn find_between(
        &self,
        goal_id: &str,
        from: &str,
        to: &str,
        statuses: &[InvitationStatus],
    ) -> Result<Option<InvitationDoc>>;

    /// Every invitation touching a user as sender or recipient, newest first.
    async fn find_for_user(&self, user: &str) -> Result<Vec<InvitationDoc>>;

    async fn find_for_user_with_status(
        &self,
        user: &str,
        status: InvitationStatus,
    ) -> Result<Vec<InvitationDoc>>;

    async fn find_received(
        &self,
        to: &str,
        invitation_type: Option<InvitationType>,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<InvitationDoc>>;

    async fn find_sent(
        &self,
        from: &str,
        invitation_type: Option<InvitationType>,
    ) -> Result<Vec<InvitationDoc>>;

    /// Invitations for a goal where the user is sender or recipient.
    async fn find_by_goal_for_user(&self, goal_id: &str, user: &str)
        -> Result<Vec<InvitationDoc>>;

    /// Record the recipient's response, stamping responded_at.
    async fn update_status(
        &self,
        invitation_id: &str,
        status: InvitationStatus,
        updated_by: &str,
    ) -> Result<Option<InvitationDoc>>;

    async fn delete_by_handle(&self, invitation_id: &str) -> Result<bool>;

    /// Remove every invitation touching a user. Returns the number removed.
    async fn delete_all_for_user(&self, user: &str) -> Result<u64>;
}

/// MongoDB-backed invitation store
pub struct MongoInvitationStore {
    collection: MongoCollection<InvitationDoc>,
}

impl MongoInvitationStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(INVITATION_COLLECTION).await?,
        })
    }
}

fn statuses_to_bson(statuses: &[InvitationStatus]) -> Result<Vec<Bson>> {
    statuses.iter().map(to_bson_value).collect()
}

#[async_trait]
impl InvitationStore for MongoInvitationStore {
    async fn insert(&self, doc: InvitationDoc) -> Result<InvitationDoc> {
        let mut saved = doc.clone();
        let id = self.collection.insert_one(doc).await?;
        saved._id = Some(id);
        Ok(saved)
    }

    async fn find_by_handle(&self, invitation_id: &str) -> Result<Option<InvitationDoc>> {
        self.collection
            .find_one(doc! { "invitation_id": invitation_id })
            .await
    }

    async fn find_between(
        &self,
        goal_id: &str,
        from: &str,
        to: &str,
        statuses: &[InvitationStatus],
    ) -> Result<Option<InvitationDoc>> {
        self.collection
            .find_one(doc! {
                "goal_id": goal_id,
                "from_user_id": from,
                "to_user_id": to,
                "status": { "$in": statuses_to_bson(statuses)? },
            })
            .await
    }

    async fn find_for_user(&self, user: &str) -> Result<Vec<InvitationDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "$or": [ { "from_user_id": user }, { "to_user_id": user } ] },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn find_for_user_with_status(
        &self,
        user: &str,
        status: InvitationStatus,
    ) -> Result<Vec<InvitationDoc>> {
        self.collection
            .find_many_sorted(
                doc! {
                    "$or": [ { "from_user_id": user }, { "to_user_id": user } ],
                    "status": to_bson_value(&status)?,
                },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn find_received(
        &self,
        to: &str,
        invitation_type: Option<InvitationType>,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<InvitationDoc>> {
        let mut filter = doc! { "to_user_id": to };
        if let Some(t) = invitation_type {
            filter.insert("type", to_bson_value(&t)?);
        }
        if let Some(s) = status {
            filter.insert("status", to_bson_value(&s)?);
        }
        self.collection
            .find_many_sorted(filter, doc! { "metadata.created_at": -1 })
            .await
    }

    async fn find_sent(
        &self,
        from: &str,
        invitation_type: Option<InvitationType>,
    ) -> Result<Vec<InvitationDoc>> {
        let mut filter = doc! { "from_user_id": from };
        if let Some(t) = invitation_type {
            filter.insert("type", to_bson_value(&t)?);
        }
        self.collection
            .find_many_sorted(filter, doc! { "metadata.created_at": -1 })
            .await
    }

    async fn find_by_goal_for_user(
        &self,
        goal_id: &str,
        user: &str,
    ) -> Result<Vec<InvitationDoc>> {
        self.collection
            .find_many_sorted(
                doc! {
                    "goal_id": goal_id,
                    "$or": [ { "from_user_id": user }, { "to_user_id": user } ],
                },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn update_status(
        &self,
        invitation_id: &str,
        status: InvitationStatus,
        updated_by: &str,
    ) -> Result<Option<InvitationDoc>> {
        self.collection
            .find_one_and_update(
                doc! { "invitation_id": invitation_id },
                doc! { "$set": {
                    "status": to_bson_value(&status)?,
                    "responded_at": DateTime::now(),
                    "updated_by": updated_by,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await
    }

    async fn delete_by_handle(&self, invitation_id: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "invitation_id": invitation_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_all_for_user(&self, user: &str) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {
                "$or": [ { "from_user_id": user }, { "to_user_id": user } ],
            })
            .await?;
        Ok(result.deleted_count)
    }
}
