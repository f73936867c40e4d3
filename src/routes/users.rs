//! User directory routes
//!
//! - GET    /api/users/search?nickname=... - fuzzy nickname search
//! - GET    /api/users/{handle}            - profile lookup
//! - PATCH  /api/users/me/nickname         - change own nickname
//! - PATCH  /api/users/me/profile-image    - change own profile image URL
//! - DELETE /api/users/me                  - delete own account (cascades)

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::routes::helpers::{
    authenticate, error_response, json_response, parse_json_body, query_param, respond, BoxBody,
    SuccessResponse,
};
use crate::server::AppState;
use crate::types::GoalpostError;

#[derive(Debug, Deserialize)]
pub struct NicknameBody {
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageBody {
    pub profile_image: String,
}

/// Dispatch for /api/users/*. Returns None when the path is not owned here.
pub async fn handle_user_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/users/search") => Some(handle_search(req, state).await),
        (Method::PATCH, "/api/users/me/nickname") => Some(handle_nickname(req, state).await),
        (Method::PATCH, "/api/users/me/profile-image") => {
            Some(handle_profile_image(req, state).await)
        }
        (Method::DELETE, "/api/users/me") => Some(handle_delete(req, state).await),
        (Method::GET, p) => {
            let handle = p.strip_prefix("/api/users/")?;
            if handle.is_empty() || handle.contains('/') {
                return None;
            }
            Some(handle_lookup(req, state, handle.to_string()).await)
        }
        _ => None,
    }
}

async fn handle_search(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    // The caller annotation is optional: an unauthenticated search still
    // returns matches, just without follow status.
    let caller = authenticate(&req, &state).ok();

    let Some(pattern) = query_param(&req, "nickname") else {
        return error_response(GoalpostError::Validation(
            "nickname query parameter is required".into(),
        ));
    };

    respond(
        StatusCode::OK,
        state
            .users
            .search_by_nickname(&pattern, caller.as_deref())
            .await,
    )
}

async fn handle_lookup(
    req: Request<Incoming>,
    state: Arc<AppState>,
    handle: String,
) -> Response<BoxBody> {
    if let Err(e) = authenticate(&req, &state) {
        return error_response(e);
    }

    match state.users.find_by_handle(&handle).await {
        Ok(Some(user)) => json_response(StatusCode::OK, &user),
        Ok(None) => error_response(GoalpostError::NotFound("user not found".into())),
        Err(e) => error_response(e),
    }
}

async fn handle_nickname(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: NicknameBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state.users.update_nickname(&caller, &body.nickname).await,
    )
}

async fn handle_profile_image(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: ProfileImageBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state
            .users
            .update_profile_image(&caller, &body.profile_image)
            .await,
    )
}

async fn handle_delete(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.users.delete(&caller).await {
        Ok(success) => json_response(StatusCode::OK, &SuccessResponse { success }),
        Err(e) => error_response(e),
    }
}
