//! User document schema
//!
//! Stores identity records: the generated user handle, login credentials and
//! the profile fields other services project (nickname, profile image).

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Generated user handle (e.g. "user_k3j9x2m4q"), unique
    pub user_id: String,

    /// Email address, unique
    pub email: String,

    /// Display nickname
    pub nickname: String,

    /// Profile image URL (managed by the external upload collaborator)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    /// Argon2 password hash
    pub password_hash: String,
}

impl UserDoc {
    pub fn new(user_id: String, email: String, nickname: String, password_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            email,
            nickname,
            profile_image: None,
            password_hash,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Nickname search
            (
                doc! { "nickname": 1 },
                Some(
                    IndexOptions::builder()
                        .name("nickname_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
