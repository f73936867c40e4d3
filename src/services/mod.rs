//! Domain services
//!
//! One service per component: users, follows, goals, invitations, sticker
//! images. Services collaborate only through the capability traits below,
//! which keeps the construction graph acyclic:
//!
//! stores -> UserDirectory -> FollowService -> GoalService ->
//! InvitationService -> UserService

pub mod follows;
pub mod goals;
pub mod invitations;
pub mod sticker_images;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::db::schemas::{FollowStatus, UserDoc};
use crate::db::store::UserStore;
use crate::types::Result;

pub use follows::{FollowService, FollowView};
pub use goals::{CreateGoalInput, GoalService, GoalView, ParticipantView, UpdateGoalInput};
pub use invitations::{GoalSnapshot, InvitationService, InvitationView};
pub use sticker_images::{StickerImageService, StickerImageView};
pub use users::{UserService, UserSearchHit};

/// Identity projection other components attach to their results
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub nickname: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<&UserDoc> for UserProfile {
    fn from(doc: &UserDoc) -> Self {
        Self {
            user_id: doc.user_id.clone(),
            nickname: doc.nickname.clone(),
            email: doc.email.clone(),
            profile_image: doc.profile_image.clone(),
        }
    }
}

/// Follow relationship between two users, as reported by status checks.
///
/// `follow_status` is `Mutual` when both directional edges are approved;
/// otherwise it carries the status of whichever single edge exists, and is
/// None when no edge exists in either direction.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FollowRelation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_status: Option<FollowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_id: Option<String>,
}

impl FollowRelation {
    pub fn none() -> Self {
        Self {
            follow_status: None,
            follow_id: None,
        }
    }
}

/// Nickname/profile projection capability (User Directory)
#[async_trait]
pub trait NicknameResolver: Send + Sync {
    /// Look up the identity projection for a handle. `Ok(None)` is a normal
    /// empty result; errors are the caller's cue to degrade, not abort.
    async fn resolve(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// Follow relationship capability (Follow Engine)
#[async_trait]
pub trait FollowGraph: Send + Sync {
    /// Inspect both directions between two users.
    async fn check_status(&self, follower: &str, following: &str) -> Result<FollowRelation>;

    /// True if an approved edge exists in either direction. Deliberately
    /// symmetric despite the directed storage model.
    async fn is_following(&self, a: &str, b: &str) -> Result<bool>;

    /// Counterpart handles of all approved edges touching the user.
    async fn followed_handles(&self, user: &str) -> Result<Vec<String>>;

    /// Cascade hook: drop every edge touching the user.
    async fn remove_all_for_user(&self, user: &str) -> Result<u64>;
}

/// Roster mutation capability (Goal Registry). The Invitation Workflow and
/// User Directory mutate rosters only through this contract.
#[async_trait]
pub trait RosterMutator: Send + Sync {
    /// Append a zero-count roster entry. Idempotent: an existing entry is
    /// left untouched.
    async fn enroll(&self, goal_id: &str, user_id: &str) -> Result<()>;

    /// Cascade hook: strip the user from every roster. Goals persist.
    async fn strip_user_from_all_goals(&self, user_id: &str) -> Result<u64>;
}

/// Invitation cleanup capability, consumed by the User Directory cascade.
#[async_trait]
pub trait InvitationSweeper: Send + Sync {
    async fn remove_all_for_user(&self, user_id: &str) -> Result<u64>;
}

/// `NicknameResolver` implementation over the user store.
///
/// A thin adapter rather than the full `UserService`, so that follow, goal
/// and invitation services can be constructed before the directory service
/// that depends on them.
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NicknameResolver for UserDirectory {
    async fn resolve(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .store
            .find_by_handle(user_id)
            .await?
            .map(|doc| UserProfile::from(&doc)))
    }
}

/// Convert a stored bson timestamp to the chrono type used in API views.
pub(crate) fn to_chrono(ts: Option<bson::DateTime>) -> Option<DateTime<Utc>> {
    ts.map(|t| t.to_chrono())
}
