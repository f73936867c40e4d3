//! User directory
//!
//! Identity records looked up by handle or email, fuzzy nickname search with
//! follow-status annotation, and the cascading delete that removes a user's
//! follow edges, invitations and roster entries while leaving the goals they
//! created in place.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::db::schemas::{FollowStatus, UserDoc};
use crate::db::store::UserStore;
use crate::handle;
use crate::services::{to_chrono, FollowGraph, InvitationSweeper, RosterMutator, UserProfile};
use crate::types::{GoalpostError, Result};

/// Full user projection (still excludes the password hash)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&UserDoc> for UserView {
    fn from(doc: &UserDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doc.user_id.clone(),
            email: doc.email.clone(),
            nickname: doc.nickname.clone(),
            profile_image: doc.profile_image.clone(),
            created_at: to_chrono(doc.metadata.created_at),
        }
    }
}

/// Nickname search result, annotated with the caller's follow relationship
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchHit {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_status: Option<FollowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_id: Option<String>,
}

pub struct UserService {
    store: Arc<dyn UserStore>,
    follows: Arc<dyn FollowGraph>,
    roster: Arc<dyn RosterMutator>,
    sweeper: Arc<dyn InvitationSweeper>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        follows: Arc<dyn FollowGraph>,
        roster: Arc<dyn RosterMutator>,
        sweeper: Arc<dyn InvitationSweeper>,
    ) -> Self {
        Self {
            store,
            follows,
            roster,
            sweeper,
        }
    }

    /// Create a user at registration time. The password arrives already
    /// hashed; assigning the handle happens here.
    pub async fn create(
        &self,
        email: &str,
        nickname: &str,
        password_hash: &str,
    ) -> Result<UserView> {
        if email.is_empty() || nickname.is_empty() {
            return Err(GoalpostError::Validation(
                "email and nickname are required".into(),
            ));
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(GoalpostError::Conflict(
                "an account with this email already exists".into(),
            ));
        }

        let doc = self
            .store
            .insert(UserDoc::new(
                handle::user_handle(),
                email.to_string(),
                nickname.to_string(),
                password_hash.to_string(),
            ))
            .await?;
        tracing::info!(user_id = %doc.user_id, "user registered");
        Ok(UserView::from(&doc))
    }

    /// Lookup by the storage-assigned id. A missing user is a normal empty
    /// result.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserView>> {
        Ok(self
            .store
            .find_by_id(id)
            .await?
            .map(|doc| UserView::from(&doc)))
    }

    /// Lookup by handle. A missing user is a normal empty result.
    pub async fn find_by_handle(&self, user_id: &str) -> Result<Option<UserView>> {
        Ok(self
            .store
            .find_by_handle(user_id)
            .await?
            .map(|doc| UserView::from(&doc)))
    }

    /// Full credential record for the login flow.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<UserDoc>> {
        self.store.find_by_email(email).await
    }

    /// Case-insensitive substring search on nickname. The caller is excluded
    /// from the results; each hit is annotated with the caller's follow
    /// status toward it (best-effort: a failed status check degrades to an
    /// unannotated hit).
    pub async fn search_by_nickname(
        &self,
        pattern: &str,
        caller: Option<&str>,
    ) -> Result<Vec<UserSearchHit>> {
        if pattern.is_empty() {
            return Err(GoalpostError::Validation("nickname pattern is required".into()));
        }

        let matches = self.store.search_by_nickname(pattern).await?;

        let mut hits = Vec::with_capacity(matches.len());
        for doc in matches {
            if caller == Some(doc.user_id.as_str()) {
                continue;
            }

            let (follow_status, follow_id) = match caller {
                Some(caller) => match self.follows.check_status(caller, &doc.user_id).await {
                    Ok(relation) => (relation.follow_status, relation.follow_id),
                    Err(err) => {
                        tracing::warn!(user_id = %doc.user_id, error = %err, "follow status check failed");
                        (None, None)
                    }
                },
                None => (None, None),
            };

            hits.push(UserSearchHit {
                profile: UserProfile::from(&doc),
                follow_status,
                follow_id,
            });
        }
        Ok(hits)
    }

    pub async fn update_nickname(&self, user_id: &str, nickname: &str) -> Result<UserView> {
        if nickname.trim().is_empty() {
            return Err(GoalpostError::Validation("nickname must not be empty".into()));
        }
        let doc = self
            .store
            .update_nickname(user_id, nickname)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("user not found".into()))?;
        Ok(UserView::from(&doc))
    }

    pub async fn update_profile_image(&self, user_id: &str, url: &str) -> Result<UserView> {
        let doc = self
            .store
            .update_profile_image(user_id, url)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("user not found".into()))?;
        Ok(UserView::from(&doc))
    }

    /// Delete a user and cascade: follow edges and invitations are removed,
    /// roster entries are stripped, goals the user created persist.
    pub async fn delete(&self, user_id: &str) -> Result<bool> {
        if self.store.find_by_handle(user_id).await?.is_none() {
            return Err(GoalpostError::NotFound("user not found".into()));
        }

        let follows = self.follows.remove_all_for_user(user_id).await?;
        let rosters = self.roster.strip_user_from_all_goals(user_id).await?;
        let invitations = self.sweeper.remove_all_for_user(user_id).await?;
        tracing::info!(user_id, follows, rosters, invitations, "user cascade cleanup");

        self.store.delete_by_handle(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemFollowStore, MemGoalStore, MemInvitationStore, MemUserStore};
    use crate::services::goals::CreateGoalInput;
    use crate::services::{
        FollowService, GoalService, InvitationService, UserDirectory,
    };

    struct Fixture {
        users: Arc<UserService>,
        follows: Arc<FollowService>,
        goals: Arc<GoalService>,
        invitations: Arc<InvitationService>,
    }

    async fn fixture() -> Fixture {
        let user_store = Arc::new(MemUserStore::default());
        let directory = Arc::new(UserDirectory::new(user_store.clone()));
        let follows = Arc::new(FollowService::new(
            Arc::new(MemFollowStore::default()),
            directory.clone(),
        ));
        let goal_store = Arc::new(MemGoalStore::default());
        let goals = Arc::new(GoalService::new(
            goal_store.clone(),
            directory.clone(),
            follows.clone(),
        ));
        let invitations = Arc::new(InvitationService::new(
            Arc::new(MemInvitationStore::default()),
            goal_store,
            goals.clone(),
            directory,
        ));
        let users = Arc::new(UserService::new(
            user_store,
            follows.clone(),
            goals.clone(),
            invitations.clone(),
        ));
        Fixture {
            users,
            follows,
            goals,
            invitations,
        }
    }

    async fn register(fx: &Fixture, nickname: &str) -> String {
        fx.users
            .create(&format!("{nickname}@example.com"), nickname, "hash")
            .await
            .unwrap()
            .user_id
    }

    #[tokio::test]
    async fn test_create_assigns_handle_and_rejects_duplicate_email() {
        let fx = fixture().await;

        let view = fx
            .users
            .create("kim@example.com", "kim", "hash")
            .await
            .unwrap();
        assert!(view.user_id.starts_with("user_"));

        let err = fx
            .users
            .create("kim@example.com", "other", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lookup_missing_user_is_empty_not_error() {
        let fx = fixture().await;
        assert!(fx
            .users
            .find_by_handle("user_missing0")
            .await
            .unwrap()
            .is_none());
        assert!(fx
            .users
            .find_by_id("not-an-object-id")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_lookup_by_storage_id() {
        let fx = fixture().await;
        let kim = fx
            .users
            .create("kim@example.com", "kim", "hash")
            .await
            .unwrap();

        let found = fx.users.find_by_id(&kim.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, kim.user_id);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_excludes_caller() {
        let fx = fixture().await;
        let kim = register(&fx, "KimRunner").await;
        register(&fx, "kimchi").await;
        register(&fx, "lee").await;

        let hits = fx.users.search_by_nickname("kim", Some(&kim)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].profile.nickname, "kimchi");

        // Without a caller nothing is excluded or annotated.
        let hits = fx.users.search_by_nickname("KIM", None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.follow_status.is_none()));
    }

    #[tokio::test]
    async fn test_search_annotates_follow_status() {
        let fx = fixture().await;
        let caller = register(&fx, "caller").await;
        let pending = register(&fx, "friend-pending").await;
        let mutual = register(&fx, "friend-mutual").await;
        register(&fx, "friend-none").await;

        fx.follows.create(&caller, &pending).await.unwrap();

        let ab = fx.follows.create(&caller, &mutual).await.unwrap();
        fx.follows.approve(&ab.id, &mutual).await.unwrap();
        let ba = fx.follows.create(&mutual, &caller).await.unwrap();
        fx.follows.approve(&ba.id, &caller).await.unwrap();

        let hits = fx
            .users
            .search_by_nickname("friend", Some(&caller))
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);

        let status_of = |nickname: &str| {
            hits.iter()
                .find(|h| h.profile.nickname == nickname)
                .unwrap()
                .follow_status
        };
        assert_eq!(status_of("friend-pending"), Some(FollowStatus::Pending));
        assert_eq!(status_of("friend-mutual"), Some(FollowStatus::Mutual));
        assert_eq!(status_of("friend-none"), None);
    }

    #[tokio::test]
    async fn test_update_nickname() {
        let fx = fixture().await;
        let kim = register(&fx, "kim").await;

        let updated = fx.users.update_nickname(&kim, "kim-two").await.unwrap();
        assert_eq!(updated.nickname, "kim-two");

        let err = fx
            .users
            .update_nickname("user_missing0", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));

        let err = fx.users.update_nickname(&kim, "  ").await.unwrap_err();
        assert!(matches!(err, GoalpostError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_but_keeps_created_goals() {
        let fx = fixture().await;
        let owner = register(&fx, "owner").await;
        let doomed = register(&fx, "doomed").await;

        // doomed follows owner (approved), joins owner's goal, and has a
        // pending invitation besides; doomed also owns a goal.
        let edge = fx.follows.create(&doomed, &owner).await.unwrap();
        fx.follows.approve(&edge.id, &owner).await.unwrap();

        let owners_goal = fx
            .goals
            .create(
                CreateGoalInput {
                    title: "Shared".into(),
                    sticker_count: 5,
                    mode: Some(crate::db::schemas::GoalMode::Competition),
                    ..Default::default()
                },
                &owner,
            )
            .await
            .unwrap();
        fx.goals.enroll(&owners_goal.goal_id, &doomed).await.unwrap();

        let doomed_goal = fx
            .goals
            .create(
                CreateGoalInput {
                    title: "Orphaned".into(),
                    sticker_count: 5,
                    mode: Some(crate::db::schemas::GoalMode::Personal),
                    ..Default::default()
                },
                &doomed,
            )
            .await
            .unwrap();

        fx.invitations
            .create_invite(&owners_goal.goal_id, &doomed, &owner, None)
            .await
            .unwrap_err(); // already a participant
        let second_goal = fx
            .goals
            .create(
                CreateGoalInput {
                    title: "Second".into(),
                    sticker_count: 5,
                    mode: Some(crate::db::schemas::GoalMode::Competition),
                    ..Default::default()
                },
                &owner,
            )
            .await
            .unwrap();
        fx.invitations
            .create_invite(&second_goal.goal_id, &doomed, &owner, None)
            .await
            .unwrap();

        assert!(fx.users.delete(&doomed).await.unwrap());

        // User is gone, edges are gone, invitations are gone.
        assert!(fx.users.find_by_handle(&doomed).await.unwrap().is_none());
        assert!(fx.follows.list_for_user(&doomed, None).await.unwrap().is_empty());
        assert!(fx.invitations.list_for_user(&doomed).await.unwrap().is_empty());

        // Roster entry stripped from the shared goal.
        let shared = fx
            .goals
            .find_by_handle(&owners_goal.goal_id, Some(&owner))
            .await
            .unwrap();
        assert!(shared.participants.iter().all(|p| p.user_id != doomed));

        // The goal the deleted user created persists: the lookup is refused
        // for visibility (Forbidden), not missing (NotFound).
        let orphaned = fx
            .goals
            .find_by_handle(&doomed_goal.goal_id, Some(&owner))
            .await
            .unwrap_err();
        assert!(matches!(orphaned, GoalpostError::Forbidden(_)));

        let err = fx.users.delete(&doomed).await.unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));
    }
}
