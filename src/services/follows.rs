//! Follow relationship engine
//!
//! Directed follow edges with an approval workflow. Creating a follow while
//! the reciprocal pending request exists promotes that edge in place instead
//! of inserting a second one, so simultaneous interest reconciles to a
//! single approved edge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::db::schemas::{FollowDoc, FollowStatus};
use crate::db::store::FollowStore;
use crate::services::{to_chrono, FollowGraph, FollowRelation, NicknameResolver, UserProfile};
use crate::types::{Enrichment, GoalpostError, Result};

/// Follow edge projection returned to callers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowView {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub status: FollowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Best-effort identity projection of the follower
    pub follower: Enrichment<UserProfile>,
    /// Best-effort identity projection of the followed user
    pub following: Enrichment<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct FollowService {
    store: Arc<dyn FollowStore>,
    directory: Arc<dyn NicknameResolver>,
}

impl FollowService {
    pub fn new(store: Arc<dyn FollowStore>, directory: Arc<dyn NicknameResolver>) -> Self {
        Self { store, directory }
    }

    /// Request to follow another user.
    ///
    /// If the counterpart already has a pending request in the opposite
    /// direction, that edge is promoted to approved in place (the
    /// reciprocal-auto-approval rule). A duplicate ordered-pair edge is a
    /// conflict; the unique index backs this check against races.
    pub async fn create(&self, follower: &str, following: &str) -> Result<FollowView> {
        if follower.is_empty() || following.is_empty() {
            return Err(GoalpostError::Validation(
                "follower and following handles are required".into(),
            ));
        }

        if let Some(reverse) = self.store.find_pair(following, follower).await? {
            if reverse.status == FollowStatus::Pending {
                let promoted = self
                    .store
                    .mark_approved(&reverse.id_string(), follower)
                    .await?
                    .ok_or_else(|| {
                        GoalpostError::NotFound("follow request no longer exists".into())
                    })?;
                tracing::info!(follower, following, "reciprocal follow reconciled");
                return Ok(self.view(promoted).await);
            }
        }

        if self.store.find_pair(follower, following).await?.is_some() {
            return Err(GoalpostError::Conflict("follow request already exists".into()));
        }

        let doc = self
            .store
            .insert(FollowDoc::new(
                follower.to_string(),
                following.to_string(),
                follower.to_string(),
            ))
            .await?;
        Ok(self.view(doc).await)
    }

    /// Approve a pending follow request. Only the followed party may approve.
    pub async fn approve(&self, follow_id: &str, approver: &str) -> Result<FollowView> {
        let follow = self
            .store
            .find_by_id(follow_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("follow request not found".into()))?;

        if follow.following_id != approver {
            return Err(GoalpostError::Forbidden(
                "only the followed user may approve this request".into(),
            ));
        }

        if follow.status == FollowStatus::Approved {
            return Err(GoalpostError::Conflict("follow request already approved".into()));
        }

        let approved = self
            .store
            .mark_approved(follow_id, approver)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("follow request not found".into()))?;
        Ok(self.view(approved).await)
    }

    /// Unfollow. Either party may remove the edge.
    pub async fn remove(&self, follow_id: &str, requester: &str) -> Result<bool> {
        let follow = self
            .store
            .find_by_id(follow_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("follow not found".into()))?;

        if follow.follower_id != requester && follow.following_id != requester {
            return Err(GoalpostError::Forbidden(
                "only a party to the follow may remove it".into(),
            ));
        }

        self.store.delete_by_id(follow_id).await
    }

    /// All edges touching the user, optionally filtered by status, enriched
    /// with both identity projections.
    pub async fn list_for_user(
        &self,
        user: &str,
        status: Option<FollowStatus>,
    ) -> Result<Vec<FollowView>> {
        let docs = self.store.find_for_user(user, status).await?;
        // Fan out: each edge enriches independently.
        Ok(join_all(docs.into_iter().map(|doc| self.view(doc))).await)
    }

    /// Pending requests the user has received plus the ones they have sent.
    pub async fn follow_requests(&self, user: &str) -> Result<Vec<FollowView>> {
        let received = self.store.find_received(user, FollowStatus::Pending).await?;
        let sent = self.store.find_sent(user, FollowStatus::Pending).await?;

        let mut views = Vec::with_capacity(received.len() + sent.len());
        for doc in received.into_iter().chain(sent) {
            views.push(self.view(doc).await);
        }
        Ok(views)
    }

    async fn view(&self, doc: FollowDoc) -> FollowView {
        let (follower, following) = tokio::join!(
            self.directory.resolve(&doc.follower_id),
            self.directory.resolve(&doc.following_id),
        );

        FollowView {
            id: doc.id_string(),
            follower: Enrichment::from_lookup(follower, "user", &doc.follower_id),
            following: Enrichment::from_lookup(following, "user", &doc.following_id),
            follower_id: doc.follower_id,
            following_id: doc.following_id,
            status: doc.status,
            approved_at: to_chrono(doc.approved_at),
            created_at: to_chrono(doc.metadata.created_at),
            updated_at: to_chrono(doc.metadata.updated_at),
        }
    }
}

#[async_trait]
impl FollowGraph for FollowService {
    async fn check_status(&self, follower: &str, following: &str) -> Result<FollowRelation> {
        let forward = self.store.find_pair(follower, following).await?;
        let reverse = self.store.find_pair(following, follower).await?;

        if let (Some(f), Some(r)) = (&forward, &reverse) {
            if f.status == FollowStatus::Approved && r.status == FollowStatus::Approved {
                return Ok(FollowRelation {
                    follow_status: Some(FollowStatus::Mutual),
                    follow_id: Some(f.id_string()),
                });
            }
        }

        let edge = forward.or(reverse);
        Ok(match edge {
            Some(doc) => FollowRelation {
                follow_status: Some(doc.status),
                follow_id: Some(doc.id_string()),
            },
            None => FollowRelation::none(),
        })
    }

    async fn is_following(&self, a: &str, b: &str) -> Result<bool> {
        let forward = self.store.find_pair(a, b).await?;
        if matches!(forward, Some(ref f) if f.status == FollowStatus::Approved) {
            return Ok(true);
        }
        let reverse = self.store.find_pair(b, a).await?;
        Ok(matches!(reverse, Some(ref r) if r.status == FollowStatus::Approved))
    }

    async fn followed_handles(&self, user: &str) -> Result<Vec<String>> {
        let edges = self
            .store
            .find_for_user(user, Some(FollowStatus::Approved))
            .await?;

        let mut handles = BTreeSet::new();
        for edge in edges {
            if edge.follower_id == user {
                handles.insert(edge.following_id);
            } else {
                handles.insert(edge.follower_id);
            }
        }
        Ok(handles.into_iter().collect())
    }

    async fn remove_all_for_user(&self, user: &str) -> Result<u64> {
        self.store.delete_all_for_user(user).await
    }
}
