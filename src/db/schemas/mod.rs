//! Database schemas for Goalpost
//!
//! Defines MongoDB document structures for users, follow edges, goals (with
//! embedded participants), invitations, and sticker images.

mod follow;
mod goal;
mod invitation;
mod metadata;
mod sticker_image;
mod user;

pub use follow::{FollowDoc, FollowStatus, FOLLOW_COLLECTION};
pub use goal::{
    GoalDoc, GoalMode, GoalStatus, GoalVisibility, ModeDefaults, Participant,
    ParticipationStatus, StickerLog, GOAL_COLLECTION,
};
pub use invitation::{InvitationDoc, InvitationStatus, InvitationType, INVITATION_COLLECTION};
pub use metadata::Metadata;
pub use sticker_image::{StickerImageDoc, STICKER_IMAGE_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
