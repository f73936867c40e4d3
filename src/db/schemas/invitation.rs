//! Goal invitation document schema
//!
//! Covers both directions of the participation workflow: `invite` flows from
//! the goal owner to a target user, `request` flows from an aspiring
//! participant to the goal owner.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for goal invitations
pub const INVITATION_COLLECTION: &str = "invitations";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationType {
    /// Goal owner invites a user
    #[default]
    Invite,
    /// User requests to join a goal
    Request,
}

/// Invitation lifecycle. `pending` transitions to any of the other three;
/// all three are terminal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

/// Invitation document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InvitationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Generated invitation handle (e.g. "invitation_9dk2m1x7q"), unique
    pub invitation_id: String,

    /// Handle of the referenced goal
    pub goal_id: String,

    /// Handle of the sender
    pub from_user_id: String,

    /// Handle of the recipient
    pub to_user_id: String,

    #[serde(rename = "type")]
    pub invitation_type: InvitationType,

    #[serde(default)]
    pub status: InvitationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// When the recipient responded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime>,

    pub created_by: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl InvitationDoc {
    pub fn new(
        invitation_id: String,
        goal_id: String,
        from_user_id: String,
        to_user_id: String,
        invitation_type: InvitationType,
        message: Option<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            invitation_id,
            goal_id,
            created_by: from_user_id.clone(),
            updated_by: Some(from_user_id.clone()),
            from_user_id,
            to_user_id,
            invitation_type,
            status: InvitationStatus::Pending,
            message,
            responded_at: None,
        }
    }
}

impl IntoIndexes for InvitationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "invitation_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("invitation_id_unique".to_string())
                        .build(),
                ),
            ),
            // Duplicate-invitation checks filter on this triple
            (
                doc! { "goal_id": 1, "from_user_id": 1, "to_user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("goal_pair_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "to_user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("to_user_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "from_user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("from_user_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for InvitationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
