//! In-memory store implementations
//!
//! Used in dev mode (no MongoDB required) and by the test suite. Documents
//! are appended in insertion order, so "newest first" is reverse iteration.
//! The unique constraints the MongoDB indexes enforce (handles, emails, the
//! follow pair) are checked explicitly here so both backends surface the
//! same Conflict errors.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use tokio::sync::RwLock;

use crate::db::schemas::{
    FollowDoc, FollowStatus, GoalDoc, InvitationDoc, InvitationStatus, InvitationType,
    Participant, StickerImageDoc, UserDoc,
};
use crate::db::store::{
    FollowStore, GoalPatch, GoalStore, InvitationStore, StickerImageStore, UserStore,
};
use crate::types::{GoalpostError, Result};

fn stamp_new(metadata: &mut crate::db::schemas::Metadata) {
    metadata.created_at = Some(DateTime::now());
    metadata.updated_at = Some(DateTime::now());
}

fn touch(metadata: &mut crate::db::schemas::Metadata) {
    metadata.updated_at = Some(DateTime::now());
}

// ============================================================================
// Users
// ============================================================================

#[derive(Default)]
pub struct MemUserStore {
    docs: RwLock<Vec<UserDoc>>,
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn insert(&self, mut doc: UserDoc) -> Result<UserDoc> {
        let mut docs = self.docs.write().await;
        if docs
            .iter()
            .any(|d| d.user_id == doc.user_id || d.email == doc.email)
        {
            return Err(GoalpostError::Conflict("duplicate key".into()));
        }
        doc._id = Some(ObjectId::new());
        stamp_new(&mut doc.metadata);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|d| d._id.map(|oid| oid.to_hex()).as_deref() == Some(id))
            .cloned())
    }

    async fn find_by_handle(&self, user_id: &str) -> Result<Option<UserDoc>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| d.user_id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| d.email == email).cloned())
    }

    async fn search_by_nickname(&self, pattern: &str) -> Result<Vec<UserDoc>> {
        let needle = pattern.to_lowercase();
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.nickname.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn update_nickname(&self, user_id: &str, nickname: &str) -> Result<Option<UserDoc>> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.user_id == user_id) {
            Some(doc) => {
                doc.nickname = nickname.to_string();
                touch(&mut doc.metadata);
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_profile_image(&self, user_id: &str, url: &str) -> Result<Option<UserDoc>> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.user_id == user_id) {
            Some(doc) => {
                doc.profile_image = Some(url.to_string());
                touch(&mut doc.metadata);
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_handle(&self, user_id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.user_id != user_id);
        Ok(docs.len() < before)
    }
}

// ============================================================================
// Follows
// ============================================================================

#[derive(Default)]
pub struct MemFollowStore {
    docs: RwLock<Vec<FollowDoc>>,
}

#[async_trait]
impl FollowStore for MemFollowStore {
    async fn insert(&self, mut doc: FollowDoc) -> Result<FollowDoc> {
        let mut docs = self.docs.write().await;
        if docs
            .iter()
            .any(|d| d.follower_id == doc.follower_id && d.following_id == doc.following_id)
        {
            return Err(GoalpostError::Conflict("duplicate key".into()));
        }
        doc._id = Some(ObjectId::new());
        stamp_new(&mut doc.metadata);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<FollowDoc>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| d.id_string() == id).cloned())
    }

    async fn find_pair(&self, follower: &str, following: &str) -> Result<Option<FollowDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|d| d.follower_id == follower && d.following_id == following)
            .cloned())
    }

    async fn mark_approved(&self, id: &str, updated_by: &str) -> Result<Option<FollowDoc>> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.id_string() == id) {
            Some(doc) => {
                doc.status = FollowStatus::Approved;
                doc.approved_at = Some(DateTime::now());
                doc.updated_by = Some(updated_by.to_string());
                touch(&mut doc.metadata);
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_for_user(
        &self,
        user: &str,
        status: Option<FollowStatus>,
    ) -> Result<Vec<FollowDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.follower_id == user || d.following_id == user)
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect())
    }

    async fn find_sent(&self, follower: &str, status: FollowStatus) -> Result<Vec<FollowDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.follower_id == follower && d.status == status)
            .cloned()
            .collect())
    }

    async fn find_received(&self, following: &str, status: FollowStatus) -> Result<Vec<FollowDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.following_id == following && d.status == status)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.id_string() != id);
        Ok(docs.len() < before)
    }

    async fn delete_all_for_user(&self, user: &str) -> Result<u64> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.follower_id != user && d.following_id != user);
        Ok((before - docs.len()) as u64)
    }
}

// ============================================================================
// Goals
// ============================================================================

#[derive(Default)]
pub struct MemGoalStore {
    docs: RwLock<Vec<GoalDoc>>,
}

#[async_trait]
impl GoalStore for MemGoalStore {
    async fn insert(&self, mut doc: GoalDoc) -> Result<GoalDoc> {
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.goal_id == doc.goal_id) {
            return Err(GoalpostError::Conflict("duplicate key".into()));
        }
        doc._id = Some(ObjectId::new());
        stamp_new(&mut doc.metadata);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_handle(&self, goal_id: &str) -> Result<Option<GoalDoc>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| d.goal_id == goal_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<GoalDoc>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().rev().cloned().collect())
    }

    async fn find_by_creator(&self, user: &str) -> Result<Vec<GoalDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.created_by == user)
            .cloned()
            .collect())
    }

    async fn find_by_creators(&self, users: &[String]) -> Result<Vec<GoalDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| users.iter().any(|u| *u == d.created_by))
            .cloned()
            .collect())
    }

    async fn find_participating(&self, user: &str) -> Result<Vec<GoalDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.is_participant(user))
            .cloned()
            .collect())
    }

    async fn apply_patch(&self, goal_id: &str, patch: GoalPatch) -> Result<Option<GoalDoc>> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.goal_id == goal_id) {
            Some(doc) => {
                if let Some(title) = patch.title {
                    doc.title = title;
                }
                if let Some(description) = patch.description {
                    doc.description = Some(description);
                }
                if let Some(sticker_count) = patch.sticker_count {
                    doc.sticker_count = sticker_count;
                }
                if let Some(mode) = patch.mode {
                    doc.mode = mode;
                }
                if let Some(visibility) = patch.visibility {
                    doc.visibility = visibility;
                }
                if let Some(status) = patch.status {
                    doc.status = status;
                }
                if let Some(auto_approve) = patch.auto_approve {
                    doc.auto_approve = auto_approve;
                }
                touch(&mut doc.metadata);
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn push_participant(&self, goal_id: &str, participant: Participant) -> Result<bool> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.goal_id == goal_id) {
            Some(doc) => {
                doc.participants.push(participant);
                touch(&mut doc.metadata);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_participant(&self, goal_id: &str, participant: &Participant) -> Result<bool> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.goal_id == goal_id) {
            Some(doc) => {
                match doc
                    .participants
                    .iter_mut()
                    .find(|p| p.user_id == participant.user_id)
                {
                    Some(entry) => {
                        *entry = participant.clone();
                        touch(&mut doc.metadata);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            None => Ok(false),
        }
    }

    async fn pull_participant(&self, goal_id: &str, user: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.goal_id == goal_id) {
            Some(doc) => {
                let before = doc.participants.len();
                doc.participants.retain(|p| p.user_id != user);
                let removed = doc.participants.len() < before;
                if removed {
                    touch(&mut doc.metadata);
                }
                Ok(removed)
            }
            None => Ok(false),
        }
    }

    async fn pull_participant_from_all(&self, user: &str) -> Result<u64> {
        let mut docs = self.docs.write().await;
        let mut removed = 0u64;
        for doc in docs.iter_mut() {
            let before = doc.participants.len();
            doc.participants.retain(|p| p.user_id != user);
            if doc.participants.len() < before {
                touch(&mut doc.metadata);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_by_handle(&self, goal_id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.goal_id != goal_id);
        Ok(docs.len() < before)
    }
}

// ============================================================================
// Invitations
// ============================================================================

#[derive(Default)]
pub struct MemInvitationStore {
    docs: RwLock<Vec<InvitationDoc>>,
}

#[async_trait]
impl InvitationStore for MemInvitationStore {
    async fn insert(&self, mut doc: InvitationDoc) -> Result<InvitationDoc> {
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.invitation_id == doc.invitation_id) {
            return Err(GoalpostError::Conflict("duplicate key".into()));
        }
        doc._id = Some(ObjectId::new());
        stamp_new(&mut doc.metadata);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_handle(&self, invitation_id: &str) -> Result<Option<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|d| d.invitation_id == invitation_id)
            .cloned())
    }

    async fn find_between(
        &self,
        goal_id: &str,
        from: &str,
        to: &str,
        statuses: &[InvitationStatus],
    ) -> Result<Option<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .find(|d| {
                d.goal_id == goal_id
                    && d.from_user_id == from
                    && d.to_user_id == to
                    && statuses.contains(&d.status)
            })
            .cloned())
    }

    async fn find_for_user(&self, user: &str) -> Result<Vec<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.from_user_id == user || d.to_user_id == user)
            .cloned()
            .collect())
    }

    async fn find_for_user_with_status(
        &self,
        user: &str,
        status: InvitationStatus,
    ) -> Result<Vec<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| (d.from_user_id == user || d.to_user_id == user) && d.status == status)
            .cloned()
            .collect())
    }

    async fn find_received(
        &self,
        to: &str,
        invitation_type: Option<InvitationType>,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.to_user_id == to)
            .filter(|d| invitation_type.map_or(true, |t| d.invitation_type == t))
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect())
    }

    async fn find_sent(
        &self,
        from: &str,
        invitation_type: Option<InvitationType>,
    ) -> Result<Vec<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.from_user_id == from)
            .filter(|d| invitation_type.map_or(true, |t| d.invitation_type == t))
            .cloned()
            .collect())
    }

    async fn find_by_goal_for_user(
        &self,
        goal_id: &str,
        user: &str,
    ) -> Result<Vec<InvitationDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.goal_id == goal_id && (d.from_user_id == user || d.to_user_id == user))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        invitation_id: &str,
        status: InvitationStatus,
        updated_by: &str,
    ) -> Result<Option<InvitationDoc>> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.invitation_id == invitation_id) {
            Some(doc) => {
                doc.status = status;
                doc.responded_at = Some(DateTime::now());
                doc.updated_by = Some(updated_by.to_string());
                touch(&mut doc.metadata);
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_handle(&self, invitation_id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.invitation_id != invitation_id);
        Ok(docs.len() < before)
    }

    async fn delete_all_for_user(&self, user: &str) -> Result<u64> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.from_user_id != user && d.to_user_id != user);
        Ok((before - docs.len()) as u64)
    }
}

// ============================================================================
// Sticker images
// ============================================================================

#[derive(Default)]
pub struct MemStickerImageStore {
    docs: RwLock<Vec<StickerImageDoc>>,
}

#[async_trait]
impl StickerImageStore for MemStickerImageStore {
    async fn insert(&self, mut doc: StickerImageDoc) -> Result<StickerImageDoc> {
        let mut docs = self.docs.write().await;
        if docs
            .iter()
            .any(|d| d.sticker_image_id == doc.sticker_image_id)
        {
            return Err(GoalpostError::Conflict("duplicate key".into()));
        }
        doc._id = Some(ObjectId::new());
        stamp_new(&mut doc.metadata);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_by_handle(&self, sticker_image_id: &str) -> Result<Option<StickerImageDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|d| d.sticker_image_id == sticker_image_id)
            .cloned())
    }

    async fn find_for_user(&self, user: &str) -> Result<Vec<StickerImageDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.is_default || d.uploaded_by.as_deref() == Some(user))
            .cloned()
            .collect())
    }

    async fn find_defaults(&self) -> Result<Vec<StickerImageDoc>> {
        let docs = self.docs.read().await;
        let mut defaults: Vec<StickerImageDoc> =
            docs.iter().filter(|d| d.is_default).cloned().collect();
        defaults.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(defaults)
    }

    async fn delete_by_handle(&self, sticker_image_id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.sticker_image_id != sticker_image_id);
        Ok(docs.len() < before)
    }
}
