//! Goal registry
//!
//! Owns goal records, their visibility policy, and the embedded participant
//! roster with per-participant sticker counters and daily receipt logs.
//! Roster mutation from other components goes through the `RosterMutator`
//! contract implemented here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::schemas::{
    GoalDoc, GoalMode, GoalStatus, GoalVisibility, Participant, ParticipationStatus, StickerLog,
};
use crate::db::store::{GoalPatch, GoalStore};
use crate::handle;
use crate::services::{to_chrono, FollowGraph, NicknameResolver, RosterMutator, UserProfile};
use crate::types::{Enrichment, GoalpostError, Result};

/// Input for creating a goal. Mode drives the visibility/auto-approve
/// defaults; explicit fields override them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sticker_count: i32,
    #[serde(default)]
    pub mode: Option<GoalMode>,
    #[serde(default)]
    pub visibility: Option<GoalVisibility>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub auto_approve: Option<bool>,
}

/// Partial update input. A supplied mode re-runs the defaults table exactly
/// as in create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sticker_count: Option<i32>,
    #[serde(default)]
    pub mode: Option<GoalMode>,
    #[serde(default)]
    pub visibility: Option<GoalVisibility>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub auto_approve: Option<bool>,
}

/// Roster entry projection with a best-effort identity lookup
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub user_id: String,
    pub status: ParticipationStatus,
    pub current_sticker_count: i32,
    pub joined_at: DateTime<Utc>,
    pub sticker_logs: Vec<StickerLog>,
    pub profile: Enrichment<UserProfile>,
}

/// Goal projection returned to callers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    pub id: String,
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
    pub participants: Vec<ParticipantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct GoalService {
    store: Arc<dyn GoalStore>,
    directory: Arc<dyn NicknameResolver>,
    follows: Arc<dyn FollowGraph>,
}

impl GoalService {
    pub fn new(
        store: Arc<dyn GoalStore>,
        directory: Arc<dyn NicknameResolver>,
        follows: Arc<dyn FollowGraph>,
    ) -> Self {
        Self {
            store,
            directory,
            follows,
        }
    }

    /// Create a goal. Mode defaults resolve first, explicit input overrides,
    /// and the owner is auto-enrolled only in personal mode.
    pub async fn create(&self, input: CreateGoalInput, owner: &str) -> Result<GoalView> {
        if input.title.trim().is_empty() {
            return Err(GoalpostError::Validation("title is required".into()));
        }
        if input.sticker_count <= 0 {
            return Err(GoalpostError::Validation(
                "stickerCount must be positive".into(),
            ));
        }

        let mode = input.mode.unwrap_or_default();
        let defaults = mode.defaults();

        let participants = if defaults.enroll_owner {
            vec![Participant::new(owner.to_string())]
        } else {
            Vec::new()
        };

        let doc = GoalDoc {
            _id: None,
            metadata: crate::db::schemas::Metadata::new(),
            goal_id: handle::goal_handle(),
            title: input.title,
            description: input.description,
            sticker_count: input.sticker_count,
            mode,
            visibility: input.visibility.unwrap_or(defaults.visibility),
            status: input.status.unwrap_or_default(),
            created_by: owner.to_string(),
            auto_approve: input.auto_approve.unwrap_or(defaults.auto_approve),
            participants,
        };

        let saved = self.store.insert(doc).await?;
        tracing::info!(goal_id = %saved.goal_id, owner, "goal created");
        Ok(self.view(saved).await)
    }

    /// Whether a goal is visible to the (possibly anonymous) caller.
    async fn visible_to(&self, goal: &GoalDoc, caller: Option<&str>) -> Result<bool> {
        match goal.visibility {
            GoalVisibility::Public => Ok(true),
            GoalVisibility::Private => {
                Ok(caller.is_some_and(|c| goal.is_participant(c)))
            }
            GoalVisibility::Followers => {
                let Some(caller) = caller else {
                    return Ok(false);
                };
                if goal.created_by == caller {
                    return Ok(true);
                }
                self.follows.is_following(caller, &goal.created_by).await
            }
        }
    }

    /// All goals the caller may see, newest first.
    pub async fn find_visible(&self, caller: Option<&str>) -> Result<Vec<GoalView>> {
        let goals = self.store.find_all().await?;

        let mut views = Vec::new();
        for goal in goals {
            if self.visible_to(&goal, caller).await? {
                views.push(self.view(goal).await);
            }
        }
        Ok(views)
    }

    /// Goals the caller created or participates in.
    pub async fn find_mine(&self, caller: &str) -> Result<Vec<GoalView>> {
        let created = self.store.find_by_creator(caller).await?;
        let participating = self.store.find_participating(caller).await?;

        let mut goals = created;
        for goal in participating {
            if !goals.iter().any(|g| g.goal_id == goal.goal_id) {
                goals.push(goal);
            }
        }

        let mut views = Vec::with_capacity(goals.len());
        for goal in goals {
            views.push(self.view(goal).await);
        }
        Ok(views)
    }

    /// The "goals from people I follow" feed: goals created by any user the
    /// caller has an approved relation with, still subject to the
    /// per-goal visibility policy.
    pub async fn find_followed(&self, caller: &str) -> Result<Vec<GoalView>> {
        let followed = self.follows.followed_handles(caller).await?;
        if followed.is_empty() {
            return Ok(Vec::new());
        }

        let goals = self.store.find_by_creators(&followed).await?;
        let mut views = Vec::new();
        for goal in goals {
            if self.visible_to(&goal, Some(caller)).await? {
                views.push(self.view(goal).await);
            }
        }
        Ok(views)
    }

    /// One goal, subject to the visibility policy.
    pub async fn find_by_handle(&self, goal_id: &str, caller: Option<&str>) -> Result<GoalView> {
        let goal = self.require(goal_id).await?;
        // Owners always see their own goal.
        if caller != Some(goal.created_by.as_str()) && !self.visible_to(&goal, caller).await? {
            return Err(GoalpostError::Forbidden("goal is not visible to you".into()));
        }
        Ok(self.view(goal).await)
    }

    /// Update a goal. Owner only. A supplied mode re-runs the defaults table
    /// exactly as in create before explicit overrides apply.
    pub async fn update(
        &self,
        goal_id: &str,
        input: UpdateGoalInput,
        requester: &str,
    ) -> Result<GoalView> {
        let goal = self.require(goal_id).await?;
        if goal.created_by != requester {
            return Err(GoalpostError::Forbidden(
                "only the goal owner may update it".into(),
            ));
        }

        if let Some(ref title) = input.title {
            if title.trim().is_empty() {
                return Err(GoalpostError::Validation("title must not be empty".into()));
            }
        }
        if let Some(count) = input.sticker_count {
            if count <= 0 {
                return Err(GoalpostError::Validation(
                    "stickerCount must be positive".into(),
                ));
            }
        }

        let mut patch = GoalPatch {
            title: input.title,
            description: input.description,
            sticker_count: input.sticker_count,
            mode: input.mode,
            visibility: input.visibility,
            status: input.status,
            auto_approve: input.auto_approve,
        };

        if let Some(mode) = input.mode {
            let defaults = mode.defaults();
            patch.visibility = patch.visibility.or(Some(defaults.visibility));
            patch.auto_approve = patch.auto_approve.or(Some(defaults.auto_approve));
        }

        let updated = self
            .store
            .apply_patch(goal_id, patch)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("goal not found".into()))?;
        Ok(self.view(updated).await)
    }

    /// Delete a goal. Owner only.
    pub async fn remove(&self, goal_id: &str, requester: &str) -> Result<bool> {
        let goal = self.require(goal_id).await?;
        if goal.created_by != requester {
            return Err(GoalpostError::Forbidden(
                "only the goal owner may delete it".into(),
            ));
        }
        self.store.delete_by_handle(goal_id).await
    }

    /// Award stickers to a roster participant. Never creates a roster entry;
    /// awarding to a non-participant is NotFound. Same-day awards merge into
    /// a single receipt-log entry.
    pub async fn award_sticker(
        &self,
        goal_id: &str,
        recipient: &str,
        count: Option<i32>,
        awarder: &str,
    ) -> Result<GoalView> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.award_sticker_on_date(goal_id, recipient, count, awarder, &today)
            .await
    }

    /// Date-injectable core of `award_sticker`.
    pub(crate) async fn award_sticker_on_date(
        &self,
        goal_id: &str,
        recipient: &str,
        count: Option<i32>,
        awarder: &str,
        date: &str,
    ) -> Result<GoalView> {
        let count = count.unwrap_or(1);
        if count <= 0 {
            return Err(GoalpostError::Validation(
                "stickerCount must be positive".into(),
            ));
        }

        let goal = self.require(goal_id).await?;
        let Some(participant) = goal.participant(recipient) else {
            return Err(GoalpostError::NotFound(
                "recipient is not a participant of this goal".into(),
            ));
        };

        let mut updated = participant.clone();
        updated.current_sticker_count += count;
        match updated.sticker_logs.iter_mut().find(|log| log.date == date) {
            Some(log) => log.count += count,
            None => updated.sticker_logs.push(StickerLog {
                date: date.to_string(),
                count,
            }),
        }

        self.store.update_participant(goal_id, &updated).await?;
        tracing::info!(goal_id, recipient, awarder, count, "stickers awarded");

        let goal = self.require(goal_id).await?;
        Ok(self.view(goal).await)
    }

    /// Remove a participant's roster entry.
    pub async fn leave(
        &self,
        goal_id: &str,
        participant_id: &str,
        requester: &str,
    ) -> Result<GoalView> {
        let goal = self.require(goal_id).await?;
        if !goal.is_participant(participant_id) {
            return Err(GoalpostError::NotFound(
                "participant is not on this goal".into(),
            ));
        }

        self.store.pull_participant(goal_id, participant_id).await?;
        tracing::info!(goal_id, participant_id, requester, "participant left goal");

        let goal = self.require(goal_id).await?;
        Ok(self.view(goal).await)
    }

    async fn require(&self, goal_id: &str) -> Result<GoalDoc> {
        self.store
            .find_by_handle(goal_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("goal not found".into()))
    }

    async fn view(&self, doc: GoalDoc) -> GoalView {
        // Fan out the per-participant identity lookups; each one degrades
        // independently.
        let participants = join_all(doc.participants.iter().map(|p| async {
            let profile = self.directory.resolve(&p.user_id).await;
            ParticipantView {
                user_id: p.user_id.clone(),
                status: p.status,
                current_sticker_count: p.current_sticker_count,
                joined_at: p.joined_at.to_chrono(),
                sticker_logs: p.sticker_logs.clone(),
                profile: Enrichment::from_lookup(profile, "user", &p.user_id),
            }
        }))
        .await;

        GoalView {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            goal_id: doc.goal_id,
            title: doc.title,
            description: doc.description,
            sticker_count: doc.sticker_count,
            mode: doc.mode,
            visibility: doc.visibility,
            status: doc.status,
            created_by: doc.created_by,
            auto_approve: doc.auto_approve,
            participants,
            created_at: to_chrono(doc.metadata.created_at),
            updated_at: to_chrono(doc.metadata.updated_at),
        }
    }
}

#[async_trait]
impl RosterMutator for GoalService {
    async fn enroll(&self, goal_id: &str, user_id: &str) -> Result<()> {
        let goal = self.require(goal_id).await?;
        if goal.is_participant(user_id) {
            return Ok(());
        }
        self.store
            .push_participant(goal_id, Participant::new(user_id.to_string()))
            .await?;
        tracing::info!(goal_id, user_id, "participant enrolled");
        Ok(())
    }

    async fn strip_user_from_all_goals(&self, user_id: &str) -> Result<u64> {
        self.store.pull_participant_from_all(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemFollowStore, MemGoalStore, MemUserStore};
    use crate::db::schemas::UserDoc;
    use crate::db::store::UserStore;
    use crate::services::{FollowService, UserDirectory};

    struct Fixture {
        goals: Arc<GoalService>,
        follows: Arc<FollowService>,
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
        let goals = Arc::new(GoalService::new(
            Arc::new(MemGoalStore::default()),
            directory,
            follows.clone(),
        ));
        Fixture { goals, follows }
    }

    fn personal_goal(title: &str, sticker_count: i32) -> CreateGoalInput {
        CreateGoalInput {
            title: title.into(),
            sticker_count,
            mode: Some(GoalMode::Personal),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_personal_mode_defaults_and_owner_enrollment() {
        let fx = fixture(&["user_a"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Read daily", 5), "user_a")
            .await
            .unwrap();

        assert_eq!(goal.visibility, GoalVisibility::Private);
        assert!(goal.auto_approve);
        assert_eq!(goal.participants.len(), 1);
        assert_eq!(goal.participants[0].user_id, "user_a");
        assert_eq!(goal.participants[0].current_sticker_count, 0);
    }

    #[tokio::test]
    async fn test_competition_and_recruitment_defaults() {
        let fx = fixture(&["user_a"]).await;

        let competition = fx
            .goals
            .create(
                CreateGoalInput {
                    title: "Race".into(),
                    sticker_count: 10,
                    mode: Some(GoalMode::Competition),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();
        assert_eq!(competition.visibility, GoalVisibility::Public);
        assert!(!competition.auto_approve);
        assert!(competition.participants.is_empty());

        let recruitment = fx
            .goals
            .create(
                CreateGoalInput {
                    title: "Join me".into(),
                    sticker_count: 10,
                    mode: Some(GoalMode::ChallengerRecruitment),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();
        assert_eq!(recruitment.visibility, GoalVisibility::Followers);
        assert!(!recruitment.auto_approve);
    }

    #[tokio::test]
    async fn test_explicit_input_overrides_mode_defaults() {
        let fx = fixture(&["user_a"]).await;

        let goal = fx
            .goals
            .create(
                CreateGoalInput {
                    title: "Open diary".into(),
                    sticker_count: 3,
                    mode: Some(GoalMode::Personal),
                    visibility: Some(GoalVisibility::Public),
                    auto_approve: Some(false),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();

        assert_eq!(goal.visibility, GoalVisibility::Public);
        assert!(!goal.auto_approve);
        // Owner enrollment follows the mode, not the visibility override.
        assert_eq!(goal.participants.len(), 1);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let fx = fixture(&["user_a"]).await;

        let err = fx
            .goals
            .create(personal_goal("  ", 5), "user_a")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Validation(_)));

        let err = fx
            .goals
            .create(personal_goal("Valid", 0), "user_a")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Validation(_)));
    }

    #[tokio::test]
    async fn test_private_goal_hidden_from_non_participants() {
        let fx = fixture(&["user_a", "user_b"]).await;

        fx.goals
            .create(personal_goal("Secret", 5), "user_a")
            .await
            .unwrap();

        let for_owner = fx.goals.find_visible(Some("user_a")).await.unwrap();
        assert_eq!(for_owner.len(), 1);

        let for_other = fx.goals.find_visible(Some("user_b")).await.unwrap();
        assert!(for_other.is_empty());

        let anonymous = fx.goals.find_visible(None).await.unwrap();
        assert!(anonymous.is_empty());
    }

    #[tokio::test]
    async fn test_followers_goal_requires_approved_relation() {
        let fx = fixture(&["user_a", "user_b", "user_c"]).await;

        fx.goals
            .create(
                CreateGoalInput {
                    title: "For my circle".into(),
                    sticker_count: 5,
                    mode: Some(GoalMode::ChallengerRecruitment),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();

        // user_b has a pending edge only: not visible yet.
        let edge = fx.follows.create("user_b", "user_a").await.unwrap();
        assert!(fx.goals.find_visible(Some("user_b")).await.unwrap().is_empty());

        // Approval in either direction opens the gate.
        fx.follows.approve(&edge.id, "user_a").await.unwrap();
        assert_eq!(fx.goals.find_visible(Some("user_b")).await.unwrap().len(), 1);

        // Strangers and anonymous callers still see nothing.
        assert!(fx.goals.find_visible(Some("user_c")).await.unwrap().is_empty());
        assert!(fx.goals.find_visible(None).await.unwrap().is_empty());

        // The owner sees their own goal.
        assert_eq!(fx.goals.find_visible(Some("user_a")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_public_goal_visible_to_everyone() {
        let fx = fixture(&["user_a", "user_b"]).await;

        fx.goals
            .create(
                CreateGoalInput {
                    title: "Marathon".into(),
                    sticker_count: 42,
                    mode: Some(GoalMode::Competition),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();

        assert_eq!(fx.goals.find_visible(Some("user_b")).await.unwrap().len(), 1);
        assert_eq!(fx.goals.find_visible(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_award_sticker_merges_same_day_logs() {
        let fx = fixture(&["user_a"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Read daily", 5), "user_a")
            .await
            .unwrap();

        fx.goals
            .award_sticker_on_date(&goal.goal_id, "user_a", Some(1), "user_a", "2026-08-07")
            .await
            .unwrap();
        let after = fx
            .goals
            .award_sticker_on_date(&goal.goal_id, "user_a", Some(1), "user_a", "2026-08-07")
            .await
            .unwrap();

        let participant = &after.participants[0];
        assert_eq!(participant.current_sticker_count, 2);
        assert_eq!(participant.sticker_logs.len(), 1);
        assert_eq!(participant.sticker_logs[0].count, 2);
        assert_eq!(participant.sticker_logs[0].date, "2026-08-07");
    }

    #[tokio::test]
    async fn test_award_sticker_separate_days_separate_logs() {
        let fx = fixture(&["user_a"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Read daily", 5), "user_a")
            .await
            .unwrap();

        fx.goals
            .award_sticker_on_date(&goal.goal_id, "user_a", Some(2), "user_a", "2026-08-06")
            .await
            .unwrap();
        let after = fx
            .goals
            .award_sticker_on_date(&goal.goal_id, "user_a", None, "user_a", "2026-08-07")
            .await
            .unwrap();

        let participant = &after.participants[0];
        assert_eq!(participant.current_sticker_count, 3);
        assert_eq!(participant.sticker_logs.len(), 2);
    }

    #[tokio::test]
    async fn test_award_sticker_to_non_participant_is_not_found() {
        let fx = fixture(&["user_a", "user_b"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Mine", 5), "user_a")
            .await
            .unwrap();

        let err = fx
            .goals
            .award_sticker(&goal.goal_id, "user_b", Some(1), "user_a")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));

        // The failed award must not have created a roster entry.
        let goal = fx
            .goals
            .find_by_handle(&goal.goal_id, Some("user_a"))
            .await
            .unwrap();
        assert_eq!(goal.participants.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_removes_roster_entry() {
        let fx = fixture(&["user_a", "user_b"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Mine", 5), "user_a")
            .await
            .unwrap();
        fx.goals.enroll(&goal.goal_id, "user_b").await.unwrap();

        let after = fx
            .goals
            .leave(&goal.goal_id, "user_b", "user_b")
            .await
            .unwrap();
        assert_eq!(after.participants.len(), 1);

        let err = fx
            .goals
            .leave(&goal.goal_id, "user_b", "user_b")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_enforces_ownership_and_recomputes_mode_defaults() {
        let fx = fixture(&["user_a", "user_b"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Mine", 5), "user_a")
            .await
            .unwrap();

        let err = fx
            .goals
            .update(&goal.goal_id, UpdateGoalInput::default(), "user_b")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Forbidden(_)));

        // Switching mode re-resolves visibility and autoApprove.
        let updated = fx
            .goals
            .update(
                &goal.goal_id,
                UpdateGoalInput {
                    mode: Some(GoalMode::Competition),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();
        assert_eq!(updated.mode, GoalMode::Competition);
        assert_eq!(updated.visibility, GoalVisibility::Public);
        assert!(!updated.auto_approve);

        // Explicit fields still win over the recomputed defaults.
        let updated = fx
            .goals
            .update(
                &goal.goal_id,
                UpdateGoalInput {
                    mode: Some(GoalMode::Competition),
                    visibility: Some(GoalVisibility::Private),
                    ..Default::default()
                },
                "user_a",
            )
            .await
            .unwrap();
        assert_eq!(updated.visibility, GoalVisibility::Private);
    }

    #[tokio::test]
    async fn test_remove_enforces_ownership() {
        let fx = fixture(&["user_a", "user_b"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Mine", 5), "user_a")
            .await
            .unwrap();

        let err = fx.goals.remove(&goal.goal_id, "user_b").await.unwrap_err();
        assert!(matches!(err, GoalpostError::Forbidden(_)));

        assert!(fx.goals.remove(&goal.goal_id, "user_a").await.unwrap());
    }

    #[tokio::test]
    async fn test_enroll_is_idempotent() {
        let fx = fixture(&["user_a", "user_b"]).await;

        let goal = fx
            .goals
            .create(personal_goal("Mine", 5), "user_a")
            .await
            .unwrap();

        fx.goals.enroll(&goal.goal_id, "user_b").await.unwrap();
        fx.goals.enroll(&goal.goal_id, "user_b").await.unwrap();

        let goal = fx
            .goals
            .find_by_handle(&goal.goal_id, Some("user_a"))
            .await
            .unwrap();
        assert_eq!(goal.participants.len(), 2);
    }

    #[tokio::test]
    async fn test_strip_user_from_all_goals_keeps_goals() {
        let fx = fixture(&["user_a", "user_b"]).await;

        let g1 = fx
            .goals
            .create(personal_goal("One", 5), "user_a")
            .await
            .unwrap();
        let g2 = fx
            .goals
            .create(personal_goal("Two", 5), "user_a")
            .await
            .unwrap();
        fx.goals.enroll(&g1.goal_id, "user_b").await.unwrap();
        fx.goals.enroll(&g2.goal_id, "user_b").await.unwrap();

        let stripped = fx.goals.strip_user_from_all_goals("user_b").await.unwrap();
        assert_eq!(stripped, 2);

        let g1 = fx
            .goals
            .find_by_handle(&g1.goal_id, Some("user_a"))
            .await
            .unwrap();
        assert_eq!(g1.participants.len(), 1);
        assert_eq!(g1.participants[0].user_id, "user_a");
    }

    #[tokio::test]
    async fn test_followed_feed() {
        let fx = fixture(&["user_a", "user_b", "user_c"]).await;

        // user_b creates a public goal and a private one.
        fx.goals
            .create(
                CreateGoalInput {
                    title: "Public race".into(),
                    sticker_count: 5,
                    mode: Some(GoalMode::Competition),
                    ..Default::default()
                },
                "user_b",
            )
            .await
            .unwrap();
        fx.goals
            .create(personal_goal("Private diary", 5), "user_b")
            .await
            .unwrap();

        // Nothing followed yet.
        assert!(fx.goals.find_followed("user_a").await.unwrap().is_empty());

        let edge = fx.follows.create("user_a", "user_b").await.unwrap();
        fx.follows.approve(&edge.id, "user_b").await.unwrap();

        // The feed respects visibility: only the public goal shows up.
        let feed = fx.goals.find_followed("user_a").await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Public race");
    }
}
