//! Per-entity store traits and their MongoDB implementations
//!
//! Services depend on these traits, never on collections directly, so the
//! whole domain runs against MongoDB in production and the in-memory store
//! in dev mode and tests.

mod follows;
mod goals;
mod invitations;
mod sticker_images;
mod users;

pub use follows::{FollowStore, MongoFollowStore};
pub use goals::{GoalPatch, GoalStore, MongoGoalStore};
pub use invitations::{InvitationStore, MongoInvitationStore};
pub use sticker_images::{MongoStickerImageStore, StickerImageStore};
pub use users::{MongoUserStore, UserStore};

use bson::Bson;
use serde::Serialize;

use crate::types::{GoalpostError, Result};

/// Serialize a value (typically an enum) to its BSON representation for use
/// in query filters.
pub(crate) fn to_bson_value<T: Serialize>(value: &T) -> Result<Bson> {
    bson::to_bson(value).map_err(|e| GoalpostError::Internal(format!("BSON encode failed: {}", e)))
}
