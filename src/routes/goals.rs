//! Goal registry routes
//!
//! - POST   /api/goals                       - create a goal
//! - GET    /api/goals?scope=visible|mine|followed - goal feeds
//! - GET    /api/goals/{goalId}              - one goal
//! - PATCH  /api/goals/{goalId}              - update (owner only)
//! - DELETE /api/goals/{goalId}              - delete (owner only)
//! - POST   /api/goals/{goalId}/stickers     - award stickers
//! - POST   /api/goals/{goalId}/leave        - remove a roster entry
//! - GET    /api/goals/{goalId}/invitations  - invitations for the goal

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::routes::helpers::{
    authenticate, error_response, json_response, parse_json_body, query_param, respond, BoxBody,
    SuccessResponse,
};
use crate::server::AppState;
use crate::services::{CreateGoalInput, UpdateGoalInput};
use crate::types::GoalpostError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardStickerBody {
    pub to_user_id: String,
    #[serde(default)]
    pub sticker_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGoalBody {
    pub participant_id: String,
}

/// Dispatch for /api/goals/*. Returns None when the path is not owned here.
pub async fn handle_goal_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/goals") => Some(handle_create(req, state).await),
        (Method::GET, "/api/goals") => Some(handle_feed(req, state).await),
        (method, p) => {
            let rest = p.strip_prefix("/api/goals/")?;
            let (goal_id, action) = match rest.split_once('/') {
                Some((goal_id, action)) => (goal_id.to_string(), Some(action.to_string())),
                None => (rest.to_string(), None),
            };
            if goal_id.is_empty() {
                return None;
            }

            match (method, action.as_deref()) {
                (Method::GET, None) => Some(handle_get(req, state, goal_id).await),
                (Method::PATCH, None) => Some(handle_update(req, state, goal_id).await),
                (Method::DELETE, None) => Some(handle_delete(req, state, goal_id).await),
                (Method::POST, Some("stickers")) => {
                    Some(handle_award_sticker(req, state, goal_id).await)
                }
                (Method::POST, Some("leave")) => Some(handle_leave(req, state, goal_id).await),
                (Method::GET, Some("invitations")) => {
                    Some(handle_invitations(req, state, goal_id).await)
                }
                _ => None,
            }
        }
    }
}

async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let input: CreateGoalInput = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(StatusCode::CREATED, state.goals.create(input, &caller).await)
}

async fn handle_feed(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let scope = query_param(&req, "scope").unwrap_or_else(|| "visible".to_string());

    match scope.as_str() {
        // The visible feed works for anonymous callers too; public goals
        // are returned for any caller including none.
        "visible" => {
            let caller = authenticate(&req, &state).ok();
            respond(
                StatusCode::OK,
                state.goals.find_visible(caller.as_deref()).await,
            )
        }
        "mine" => {
            let caller = match authenticate(&req, &state) {
                Ok(c) => c,
                Err(e) => return error_response(e),
            };
            respond(StatusCode::OK, state.goals.find_mine(&caller).await)
        }
        "followed" => {
            let caller = match authenticate(&req, &state) {
                Ok(c) => c,
                Err(e) => return error_response(e),
            };
            respond(StatusCode::OK, state.goals.find_followed(&caller).await)
        }
        other => error_response(GoalpostError::Validation(format!(
            "invalid scope: {} (expected visible, mine, or followed)",
            other
        ))),
    }
}

async fn handle_get(
    req: Request<Incoming>,
    state: Arc<AppState>,
    goal_id: String,
) -> Response<BoxBody> {
    let caller = authenticate(&req, &state).ok();
    respond(
        StatusCode::OK,
        state.goals.find_by_handle(&goal_id, caller.as_deref()).await,
    )
}

async fn handle_update(
    req: Request<Incoming>,
    state: Arc<AppState>,
    goal_id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let input: UpdateGoalInput = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state.goals.update(&goal_id, input, &caller).await,
    )
}

async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    goal_id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.goals.remove(&goal_id, &caller).await {
        Ok(success) => json_response(StatusCode::OK, &SuccessResponse { success }),
        Err(e) => error_response(e),
    }
}

async fn handle_award_sticker(
    req: Request<Incoming>,
    state: Arc<AppState>,
    goal_id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: AwardStickerBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state
            .goals
            .award_sticker(&goal_id, &body.to_user_id, body.sticker_count, &caller)
            .await,
    )
}

async fn handle_leave(
    req: Request<Incoming>,
    state: Arc<AppState>,
    goal_id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: LeaveGoalBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state
            .goals
            .leave(&goal_id, &body.participant_id, &caller)
            .await,
    )
}

async fn handle_invitations(
    req: Request<Incoming>,
    state: Arc<AppState>,
    goal_id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state.invitations.list_by_goal(&goal_id, &caller).await,
    )
}
