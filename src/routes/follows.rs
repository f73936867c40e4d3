//! Follow engine routes
//!
//! - POST   /api/follows               - request to follow a user
//! - GET    /api/follows?status=...    - own edges, optionally by status
//! - GET    /api/follows/requests      - pending requests (sent + received)
//! - GET    /api/follows/status?target=... - relationship with another user
//! - POST   /api/follows/{id}/approve  - approve a received request
//! - DELETE /api/follows/{id}          - unfollow

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::schemas::FollowStatus;
use crate::routes::helpers::{
    authenticate, error_response, json_response, parse_enum, parse_json_body, query_param,
    respond, BoxBody, SuccessResponse,
};
use crate::server::AppState;
use crate::services::FollowGraph;
use crate::types::GoalpostError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowBody {
    pub following_id: String,
}

/// Dispatch for /api/follows/*. Returns None when the path is not owned here.
pub async fn handle_follow_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/follows") => Some(handle_create(req, state).await),
        (Method::GET, "/api/follows") => Some(handle_list(req, state).await),
        (Method::GET, "/api/follows/requests") => Some(handle_requests(req, state).await),
        (Method::GET, "/api/follows/status") => Some(handle_status(req, state).await),
        (Method::POST, p) => {
            let id = p
                .strip_prefix("/api/follows/")?
                .strip_suffix("/approve")?
                .to_string();
            Some(handle_approve(req, state, id).await)
        }
        (Method::DELETE, p) => {
            let id = p.strip_prefix("/api/follows/")?;
            if id.is_empty() || id.contains('/') {
                return None;
            }
            Some(handle_remove(req, state, id.to_string()).await)
        }
        _ => None,
    }
}

async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: CreateFollowBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::CREATED,
        state.follows.create(&caller, &body.following_id).await,
    )
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    let status = match query_param(&req, "status") {
        Some(raw) => match parse_enum::<FollowStatus>(&raw, "follow status") {
            Ok(status) => Some(status),
            Err(e) => return error_response(e),
        },
        None => None,
    };

    respond(
        StatusCode::OK,
        state.follows.list_for_user(&caller, status).await,
    )
}

async fn handle_requests(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    respond(StatusCode::OK, state.follows.follow_requests(&caller).await)
}

async fn handle_status(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    let Some(target) = query_param(&req, "target") else {
        return error_response(GoalpostError::Validation(
            "target query parameter is required".into(),
        ));
    };

    respond(
        StatusCode::OK,
        state.follows.check_status(&caller, &target).await,
    )
}

async fn handle_approve(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    respond(StatusCode::OK, state.follows.approve(&id, &caller).await)
}

async fn handle_remove(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.follows.remove(&id, &caller).await {
        Ok(success) => json_response(StatusCode::OK, &SuccessResponse { success }),
        Err(e) => error_response(e),
    }
}
