//! Follow edge document schema
//!
//! One document per directed (follower, following) pair. The compound unique
//! index is the storage-level guard against duplicate edges from racing
//! creates.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for follow edges
pub const FOLLOW_COLLECTION: &str = "follows";

/// Approval state of a follow edge.
///
/// `mutual` is reported by status checks when both directional edges are
/// approved; stored edges normally hold one of the other three states.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    #[default]
    Pending,
    Approved,
    Blocked,
    Mutual,
}

/// Follow edge stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FollowDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Handle of the user who requested the follow
    pub follower_id: String,

    /// Handle of the user being followed
    pub following_id: String,

    /// Approval state
    #[serde(default)]
    pub status: FollowStatus,

    /// When the edge was approved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl FollowDoc {
    pub fn new(follower_id: String, following_id: String, created_by: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            follower_id,
            following_id,
            status: FollowStatus::Pending,
            approved_at: None,
            created_by: Some(created_by.clone()),
            updated_by: Some(created_by),
        }
    }

    /// String form of the storage id ("" before insertion)
    pub fn id_string(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

impl IntoIndexes for FollowDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // At most one edge per ordered (follower, following) pair
            (
                doc! { "follower_id": 1, "following_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("follower_following_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "following_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("following_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "follower_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("follower_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for FollowDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
