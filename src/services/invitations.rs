//! Goal invitation workflow
//!
//! Mediates between the goal registry and its would-be participants. An
//! `invite` flows from the goal owner to a target user; a `request` flows
//! from an aspiring participant to the owner. Acceptance appends the sender
//! to the goal roster through the `RosterMutator` contract; this service
//! never touches rosters directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

use crate::db::schemas::{
    GoalDoc, GoalMode, GoalStatus, GoalVisibility, InvitationDoc, InvitationStatus,
    InvitationType, ParticipationStatus,
};
use crate::db::store::{GoalStore, InvitationStore};
use crate::handle;
use crate::services::{to_chrono, InvitationSweeper, NicknameResolver, RosterMutator, UserProfile};
use crate::types::{Enrichment, GoalpostError, Result};

/// Compact goal snapshot attached to invitation views
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub goal_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sticker_count: i32,
    pub mode: GoalMode,
    pub visibility: GoalVisibility,
    pub status: GoalStatus,
    pub created_by: String,
    pub auto_approve: bool,
    pub participants: Vec<SnapshotParticipant>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParticipant {
    pub user_id: String,
    pub status: ParticipationStatus,
    pub current_sticker_count: i32,
    pub joined_at: DateTime<Utc>,
}

impl From<&GoalDoc> for GoalSnapshot {
    fn from(goal: &GoalDoc) -> Self {
        Self {
            goal_id: goal.goal_id.clone(),
            title: goal.title.clone(),
            description: goal.description.clone(),
            sticker_count: goal.sticker_count,
            mode: goal.mode,
            visibility: goal.visibility,
            status: goal.status,
            created_by: goal.created_by.clone(),
            auto_approve: goal.auto_approve,
            participants: goal
                .participants
                .iter()
                .map(|p| SnapshotParticipant {
                    user_id: p.user_id.clone(),
                    status: p.status,
                    current_sticker_count: p.current_sticker_count,
                    joined_at: p.joined_at.to_chrono(),
                })
                .collect(),
        }
    }
}

/// Invitation projection returned to callers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationView {
    pub id: String,
    pub invitation_id: String,
    pub goal_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    #[serde(rename = "type")]
    pub invitation_type: InvitationType,
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    /// Best-effort snapshot of the referenced goal
    pub goal: Enrichment<GoalSnapshot>,
    /// Best-effort identity projections of both parties
    pub from_user: Enrichment<UserProfile>,
    pub to_user: Enrichment<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct InvitationService {
    store: Arc<dyn InvitationStore>,
    goals: Arc<dyn GoalStore>,
    roster: Arc<dyn RosterMutator>,
    directory: Arc<dyn NicknameResolver>,
}

impl InvitationService {
    pub fn new(
        store: Arc<dyn InvitationStore>,
        goals: Arc<dyn GoalStore>,
        roster: Arc<dyn RosterMutator>,
        directory: Arc<dyn NicknameResolver>,
    ) -> Self {
        Self {
            store,
            goals,
            roster,
            directory,
        }
    }

    /// Invite a user to a goal. Owner only.
    pub async fn create_invite(
        &self,
        goal_id: &str,
        to_user: &str,
        caller: &str,
        message: Option<String>,
    ) -> Result<InvitationView> {
        if to_user.is_empty() {
            return Err(GoalpostError::Validation("toUserId is required".into()));
        }

        let goal = self.require_goal(goal_id).await?;

        if goal.created_by != caller {
            return Err(GoalpostError::Forbidden(
                "only the goal owner may send invitations".into(),
            ));
        }

        if goal.is_participant(to_user) {
            return Err(GoalpostError::Conflict(
                "user already participates in this goal".into(),
            ));
        }

        let active = self
            .store
            .find_between(
                goal_id,
                caller,
                to_user,
                &[InvitationStatus::Pending, InvitationStatus::Accepted],
            )
            .await?;
        if active.is_some() {
            return Err(GoalpostError::Conflict(
                "an invitation for this user already exists".into(),
            ));
        }

        let doc = self
            .store
            .insert(InvitationDoc::new(
                handle::invitation_handle(),
                goal_id.to_string(),
                caller.to_string(),
                to_user.to_string(),
                InvitationType::Invite,
                message,
            ))
            .await?;
        Ok(self.view(doc).await)
    }

    /// Request to join a goal.
    ///
    /// An owner requesting to join their own goal is enrolled directly and
    /// receives an immediately-accepted synthetic record; nothing is
    /// persisted. A previously rejected request permanently blocks
    /// re-requesting.
    pub async fn create_join_request(
        &self,
        goal_id: &str,
        caller: &str,
        message: Option<String>,
    ) -> Result<InvitationView> {
        let goal = self.require_goal(goal_id).await?;

        if goal.is_participant(caller) {
            return Err(GoalpostError::Conflict(
                "you already participate in this goal".into(),
            ));
        }

        if goal.created_by == caller {
            self.roster.enroll(goal_id, caller).await?;
            tracing::info!(goal_id, caller, "owner self-request enrolled directly");

            let mut synthetic = InvitationDoc::new(
                handle::invitation_handle(),
                goal_id.to_string(),
                caller.to_string(),
                caller.to_string(),
                InvitationType::Request,
                message,
            );
            synthetic.status = InvitationStatus::Accepted;
            synthetic.responded_at = Some(bson::DateTime::now());
            return Ok(self.view(synthetic).await);
        }

        let existing = self
            .store
            .find_between(
                goal_id,
                caller,
                &goal.created_by,
                &[
                    InvitationStatus::Pending,
                    InvitationStatus::Accepted,
                    InvitationStatus::Rejected,
                ],
            )
            .await?;
        if let Some(existing) = existing {
            return Err(match existing.status {
                InvitationStatus::Pending => GoalpostError::Conflict(
                    "join request already sent and awaiting a response".into(),
                ),
                InvitationStatus::Accepted => {
                    GoalpostError::Conflict("join request already accepted".into())
                }
                InvitationStatus::Rejected => GoalpostError::Conflict(
                    "join request was rejected; a new request cannot be sent".into(),
                ),
                InvitationStatus::Cancelled => {
                    GoalpostError::Conflict("join request already sent".into())
                }
            });
        }

        let doc = self
            .store
            .insert(InvitationDoc::new(
                handle::invitation_handle(),
                goal_id.to_string(),
                caller.to_string(),
                goal.created_by.clone(),
                InvitationType::Request,
                message,
            ))
            .await?;
        Ok(self.view(doc).await)
    }

    /// Respond to an invitation or join request. Recipient only; `pending`
    /// is the only state a response is accepted from. Acceptance appends the
    /// sender to the goal roster.
    pub async fn respond(
        &self,
        invitation_id: &str,
        new_status: InvitationStatus,
        responder: &str,
    ) -> Result<InvitationView> {
        if new_status == InvitationStatus::Pending {
            return Err(GoalpostError::Validation(
                "status must be accepted, rejected, or cancelled".into(),
            ));
        }

        let invitation = self
            .store
            .find_by_handle(invitation_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("invitation not found".into()))?;

        if invitation.to_user_id != responder {
            return Err(GoalpostError::Forbidden(
                "only the recipient may respond to this invitation".into(),
            ));
        }

        if invitation.status != InvitationStatus::Pending {
            return Err(GoalpostError::Conflict(
                "invitation has already been responded to".into(),
            ));
        }

        let updated = self
            .store
            .update_status(invitation_id, new_status, responder)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("invitation not found".into()))?;

        // The accepted party is the sender: the requester for join requests.
        // Status update and roster append are two separate writes; a crash
        // between them is an acknowledged gap.
        if new_status == InvitationStatus::Accepted {
            self.roster
                .enroll(&updated.goal_id, &updated.from_user_id)
                .await?;
        }

        Ok(self.view(updated).await)
    }

    /// Cancel (hard-delete) an invitation. Sender only.
    pub async fn cancel(&self, invitation_id: &str, requester: &str) -> Result<bool> {
        let invitation = self
            .store
            .find_by_handle(invitation_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("invitation not found".into()))?;

        if invitation.from_user_id != requester {
            return Err(GoalpostError::Forbidden(
                "only the sender may cancel this invitation".into(),
            ));
        }

        self.store.delete_by_handle(invitation_id).await
    }

    /// Everything touching the user, newest first.
    pub async fn list_for_user(&self, user: &str) -> Result<Vec<InvitationView>> {
        let docs = self.store.find_for_user(user).await?;
        Ok(join_all(docs.into_iter().map(|doc| self.view(doc))).await)
    }

    pub async fn list_by_status(
        &self,
        user: &str,
        status: InvitationStatus,
    ) -> Result<Vec<InvitationView>> {
        let docs = self.store.find_for_user_with_status(user, status).await?;
        Ok(join_all(docs.into_iter().map(|doc| self.view(doc))).await)
    }

    /// Pending invitations/requests awaiting the user's response.
    pub async fn list_received(
        &self,
        user: &str,
        invitation_type: Option<InvitationType>,
    ) -> Result<Vec<InvitationView>> {
        let docs = self
            .store
            .find_received(user, invitation_type, Some(InvitationStatus::Pending))
            .await?;
        Ok(join_all(docs.into_iter().map(|doc| self.view(doc))).await)
    }

    /// Invitations/requests the user has sent.
    pub async fn list_sent(
        &self,
        user: &str,
        invitation_type: Option<InvitationType>,
    ) -> Result<Vec<InvitationView>> {
        let docs = self.store.find_sent(user, invitation_type).await?;
        Ok(join_all(docs.into_iter().map(|doc| self.view(doc))).await)
    }

    /// Invitations for one goal where the user is a party.
    pub async fn list_by_goal(&self, goal_id: &str, user: &str) -> Result<Vec<InvitationView>> {
        let docs = self.store.find_by_goal_for_user(goal_id, user).await?;
        Ok(join_all(docs.into_iter().map(|doc| self.view(doc))).await)
    }

    pub async fn find_by_handle(&self, invitation_id: &str) -> Result<InvitationView> {
        let doc = self
            .store
            .find_by_handle(invitation_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("invitation not found".into()))?;
        Ok(self.view(doc).await)
    }

    async fn require_goal(&self, goal_id: &str) -> Result<GoalDoc> {
        self.goals
            .find_by_handle(goal_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("goal not found".into()))
    }

    async fn goal_snapshot(&self, goal_id: &str) -> Result<Option<GoalSnapshot>> {
        Ok(self
            .goals
            .find_by_handle(goal_id)
            .await?
            .map(|goal| GoalSnapshot::from(&goal)))
    }

    async fn view(&self, doc: InvitationDoc) -> InvitationView {
        let (goal, from_user, to_user) = tokio::join!(
            self.goal_snapshot(&doc.goal_id),
            self.directory.resolve(&doc.from_user_id),
            self.directory.resolve(&doc.to_user_id),
        );

        InvitationView {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            goal: Enrichment::from_lookup(goal, "goal", &doc.goal_id),
            from_user: Enrichment::from_lookup(from_user, "user", &doc.from_user_id),
            to_user: Enrichment::from_lookup(to_user, "user", &doc.to_user_id),
            invitation_id: doc.invitation_id,
            goal_id: doc.goal_id,
            from_user_id: doc.from_user_id,
            to_user_id: doc.to_user_id,
            invitation_type: doc.invitation_type,
            status: doc.status,
            message: doc.message,
            responded_at: to_chrono(doc.responded_at),
            created_at: to_chrono(doc.metadata.created_at),
            updated_at: to_chrono(doc.metadata.updated_at),
        }
    }
}

#[async_trait]
impl InvitationSweeper for InvitationService {
    async fn remove_all_for_user(&self, user_id: &str) -> Result<u64> {
        self.store.delete_all_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemFollowStore, MemGoalStore, MemInvitationStore, MemUserStore};
    use crate::db::schemas::UserDoc;
    use crate::db::store::UserStore;
    use crate::services::goals::CreateGoalInput;
    use crate::services::{FollowService, GoalService, UserDirectory};

    struct Fixture {
        invitations: Arc<InvitationService>,
        goals: Arc<GoalService>,
        invitation_store: Arc<MemInvitationStore>,
    }

    async fn fixture(handles: &[&str]) -> Fixture {
        let users = Arc::new(MemUserStore::default());
        for handle in handles {
            users
                .insert(UserDoc::new(
                    handle.to_string(),
                    format!("{handle}@example.com"),
                    format!("{handle}-nick"),
                    "hash".into(),
                ))
                .await
                .unwrap();
        }
        let directory = Arc::new(UserDirectory::new(users));
        let follows = Arc::new(FollowService::new(
            Arc::new(MemFollowStore::default()),
            directory.clone(),
        ));
        let goal_store = Arc::new(MemGoalStore::default());
        let goals = Arc::new(GoalService::new(
            goal_store.clone(),
            directory.clone(),
            follows,
        ));
        let invitation_store = Arc::new(MemInvitationStore::default());
        let invitations = Arc::new(InvitationService::new(
            invitation_store.clone(),
            goal_store,
            goals.clone(),
            directory,
        ));
        Fixture {
            invitations,
            goals,
            invitation_store,
        }
    }

    async fn competition_goal(fx: &Fixture, owner: &str, title: &str) -> String {
        fx.goals
            .create(
                CreateGoalInput {
                    title: title.into(),
                    sticker_count: 10,
                    mode: Some(crate::db::schemas::GoalMode::Competition),
                    ..Default::default()
                },
                owner,
            )
            .await
            .unwrap()
            .goal_id
    }

    #[tokio::test]
    async fn test_invite_restricted_to_owner() {
        let fx = fixture(&["user_owner", "user_b", "user_c"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let err = fx
            .invitations
            .create_invite(&goal_id, "user_c", "user_b", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Forbidden(_)));

        let view = fx
            .invitations
            .create_invite(&goal_id, "user_b", "user_owner", Some("join us".into()))
            .await
            .unwrap();
        assert_eq!(view.invitation_type, InvitationType::Invite);
        assert_eq!(view.status, InvitationStatus::Pending);
        assert!(view.goal.is_found());
    }

    #[tokio::test]
    async fn test_invite_conflicts_on_participant_or_active_invitation() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        fx.invitations
            .create_invite(&goal_id, "user_b", "user_owner", None)
            .await
            .unwrap();

        // Active (pending) invitation already exists.
        let err = fx
            .invitations
            .create_invite(&goal_id, "user_b", "user_owner", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Conflict(_)));

        // Once the target participates, inviting again conflicts too.
        fx.goals.enroll(&goal_id, "user_b").await.unwrap();
        let err = fx
            .invitations
            .create_invite(&goal_id, "user_b", "user_owner", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invite_for_missing_goal_is_not_found() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let err = fx
            .invitations
            .create_invite("goal_missing0", "user_b", "user_owner", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_join_request_lifecycle_and_duplicate_rules() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();
        assert_eq!(request.invitation_type, InvitationType::Request);
        assert_eq!(request.to_user_id, "user_owner");

        // Duplicate while pending.
        let err = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap_err();
        match err {
            GoalpostError::Conflict(msg) => assert!(msg.contains("awaiting")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_request_permanently_blocks_resending() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();
        fx.invitations
            .respond(
                &request.invitation_id,
                InvitationStatus::Rejected,
                "user_owner",
            )
            .await
            .unwrap();

        let err = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap_err();
        match err {
            GoalpostError::Conflict(msg) => assert!(msg.contains("rejected")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_owner_self_request_enrolls_without_persisting() {
        let fx = fixture(&["user_owner"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let view = fx
            .invitations
            .create_join_request(&goal_id, "user_owner", None)
            .await
            .unwrap();
        assert_eq!(view.status, InvitationStatus::Accepted);
        assert!(view.responded_at.is_some());

        // The owner is on the roster, but no invitation row exists.
        let goal = fx
            .goals
            .find_by_handle(&goal_id, Some("user_owner"))
            .await
            .unwrap();
        assert_eq!(goal.participants.len(), 1);
        assert_eq!(goal.participants[0].user_id, "user_owner");

        let stored = fx
            .invitation_store
            .find_for_user("user_owner")
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_respond_restricted_to_recipient() {
        let fx = fixture(&["user_owner", "user_b", "user_c"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();

        // Neither the sender nor a stranger may respond.
        for caller in ["user_b", "user_c"] {
            let err = fx
                .invitations
                .respond(&request.invitation_id, InvitationStatus::Accepted, caller)
                .await
                .unwrap_err();
            assert!(matches!(err, GoalpostError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn test_accepting_request_enrolls_sender_exactly_once() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();

        let accepted = fx
            .invitations
            .respond(
                &request.invitation_id,
                InvitationStatus::Accepted,
                "user_owner",
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert!(accepted.responded_at.is_some());

        // The sender (requester), not the responder, joins the roster.
        let goal = fx
            .goals
            .find_by_handle(&goal_id, Some("user_owner"))
            .await
            .unwrap();
        assert_eq!(goal.participants.len(), 1);
        assert_eq!(goal.participants[0].user_id, "user_b");
        assert_eq!(goal.participants[0].current_sticker_count, 0);
    }

    #[tokio::test]
    async fn test_responded_invitation_is_terminal() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();
        fx.invitations
            .respond(
                &request.invitation_id,
                InvitationStatus::Rejected,
                "user_owner",
            )
            .await
            .unwrap();

        for status in [
            InvitationStatus::Accepted,
            InvitationStatus::Rejected,
            InvitationStatus::Cancelled,
        ] {
            let err = fx
                .invitations
                .respond(&request.invitation_id, status, "user_owner")
                .await
                .unwrap_err();
            assert!(matches!(err, GoalpostError::Conflict(_)));
        }
    }

    #[tokio::test]
    async fn test_respond_rejects_pending_target() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();
        let err = fx
            .invitations
            .respond(
                &request.invitation_id,
                InvitationStatus::Pending,
                "user_owner",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_restricted_to_sender() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        let request = fx
            .invitations
            .create_join_request(&goal_id, "user_b", None)
            .await
            .unwrap();

        let err = fx
            .invitations
            .cancel(&request.invitation_id, "user_owner")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Forbidden(_)));

        assert!(fx
            .invitations
            .cancel(&request.invitation_id, "user_b")
            .await
            .unwrap());
        let err = fx
            .invitations
            .find_by_handle(&request.invitation_id)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_views_enrich_goal_and_parties() {
        let fx = fixture(&["user_owner", "user_b"]).await;
        let goal_id = competition_goal(&fx, "user_owner", "Race").await;

        fx.invitations
            .create_join_request(&goal_id, "user_b", Some("let me in".into()))
            .await
            .unwrap();

        let received = fx
            .invitations
            .list_received("user_owner", None)
            .await
            .unwrap();
        assert_eq!(received.len(), 1);
        let view = &received[0];
        assert!(view.goal.is_found());
        assert_eq!(view.goal.as_option().unwrap().title, "Race");
        assert!(view.from_user.is_found());
        assert!(view.to_user.is_found());
        assert_eq!(view.message.as_deref(), Some("let me in"));

        // Goal deletion degrades the snapshot without failing the list.
        fx.goals.remove(&goal_id, "user_owner").await.unwrap();
        let received = fx
            .invitations
            .list_received("user_owner", None)
            .await
            .unwrap();
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0].goal, Enrichment::Absent));
    }
}
