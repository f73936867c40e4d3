//! HTTP routes for Goalpost
//!
//! Each family handles its own `(method, path)` dispatch and returns None
//! for requests it does not own, in which case the server falls through to
//! the next family or a 404.

pub mod auth_routes;
pub mod follows;
pub mod goals;
pub mod health;
pub mod helpers;
pub mod invitations;
pub mod sticker_images;
pub mod users;

pub use auth_routes::handle_auth_request;
pub use follows::handle_follow_request;
pub use goals::handle_goal_request;
pub use health::{health_check, readiness_check, version_info};
pub use invitations::handle_invitation_request;
pub use sticker_images::handle_sticker_image_request;
pub use users::handle_user_request;
