//! Goal document schema
//!
//! Goals own their participant roster: participants are embedded documents
//! with no independent lifecycle. Each participant carries a sticker counter
//! and a per-calendar-date receipt log.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for goals
pub const GOAL_COLLECTION: &str = "goals";

/// Goal category, driving default visibility and approval policy
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalMode {
    #[default]
    Personal,
    Competition,
    ChallengerRecruitment,
}

/// Who may see a goal
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalVisibility {
    Public,
    Followers,
    #[default]
    Private,
}

/// Lifecycle state of a goal
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// Lifecycle state of a roster entry
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    #[default]
    Active,
    Completed,
    Withdrawn,
}

/// Per-mode creation defaults, overridable by explicit input.
///
/// This is the single decision table for the visibility x mode x autoApprove
/// rules; every create and update path goes through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDefaults {
    pub visibility: GoalVisibility,
    pub auto_approve: bool,
    pub enroll_owner: bool,
}

impl GoalMode {
    pub fn defaults(self) -> ModeDefaults {
        match self {
            GoalMode::Personal => ModeDefaults {
                visibility: GoalVisibility::Private,
                auto_approve: true,
                enroll_owner: true,
            },
            GoalMode::Competition => ModeDefaults {
                visibility: GoalVisibility::Public,
                auto_approve: false,
                enroll_owner: false,
            },
            GoalMode::ChallengerRecruitment => ModeDefaults {
                visibility: GoalVisibility::Followers,
                auto_approve: false,
                enroll_owner: false,
            },
        }
    }
}

/// One day's sticker receipts for a participant.
///
/// `date` is the calendar date in "YYYY-MM-DD" form. At most one entry per
/// date: same-day awards increment `count` on the existing entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StickerLog {
    pub date: String,
    pub count: i32,
}

/// Roster entry embedded in a goal
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Participant {
    /// Handle of the participating user
    pub user_id: String,

    #[serde(default)]
    pub status: ParticipationStatus,

    /// Total stickers received on this goal
    #[serde(default)]
    pub current_sticker_count: i32,

    pub joined_at: DateTime,

    /// Daily receipt log, one entry per calendar date
    #[serde(default)]
    pub sticker_logs: Vec<StickerLog>,
}

impl Participant {
    /// A fresh roster entry with a zero sticker count
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            status: ParticipationStatus::Active,
            current_sticker_count: 0,
            joined_at: DateTime::now(),
            sticker_logs: Vec::new(),
        }
    }
}

/// Goal document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GoalDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Generated goal handle (e.g. "goal_8fh2k1p7d"), unique
    pub goal_id: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stickers required to complete the goal
    pub sticker_count: i32,

    pub mode: GoalMode,

    #[serde(default)]
    pub visibility: GoalVisibility,

    #[serde(default)]
    pub status: GoalStatus,

    /// Handle of the goal owner
    pub created_by: String,

    /// Whether join requests are accepted without owner approval
    #[serde(default)]
    pub auto_approve: bool,

    /// Embedded participant roster
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl GoalDoc {
    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participant(user_id).is_some()
    }
}

impl IntoIndexes for GoalDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "goal_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("goal_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "created_by": 1 },
                Some(
                    IndexOptions::builder()
                        .name("created_by_index".to_string())
                        .build(),
                ),
            ),
            // Roster membership lookups
            (
                doc! { "participants.user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("participant_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for GoalDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_decision_table() {
        let personal = GoalMode::Personal.defaults();
        assert_eq!(personal.visibility, GoalVisibility::Private);
        assert!(personal.auto_approve);
        assert!(personal.enroll_owner);

        let competition = GoalMode::Competition.defaults();
        assert_eq!(competition.visibility, GoalVisibility::Public);
        assert!(!competition.auto_approve);
        assert!(!competition.enroll_owner);

        let recruitment = GoalMode::ChallengerRecruitment.defaults();
        assert_eq!(recruitment.visibility, GoalVisibility::Followers);
        assert!(!recruitment.auto_approve);
        assert!(!recruitment.enroll_owner);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&GoalMode::ChallengerRecruitment).unwrap(),
            "\"challenger_recruitment\""
        );
        assert_eq!(serde_json::to_string(&GoalMode::Personal).unwrap(), "\"personal\"");
        assert_eq!(
            serde_json::to_string(&GoalVisibility::Followers).unwrap(),
            "\"followers\""
        );
    }

    #[test]
    fn test_fresh_participant_has_zero_count() {
        let p = Participant::new("user_abc123def".into());
        assert_eq!(p.current_sticker_count, 0);
        assert_eq!(p.status, ParticipationStatus::Active);
        assert!(p.sticker_logs.is_empty());
    }
}
