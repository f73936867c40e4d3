//! Invitation workflow routes
//!
//! - POST   /api/invitations             - invite a user (owner only)
//! - POST   /api/invitations/requests    - request to join a goal
//! - GET    /api/invitations?status=...  - everything touching the caller
//! - GET    /api/invitations/received?type=... - pending, awaiting response
//! - GET    /api/invitations/sent?type=...     - sent by the caller
//! - GET    /api/invitations/{id}        - one invitation (parties only)
//! - POST   /api/invitations/{id}/respond - accept/reject/cancel (recipient)
//! - DELETE /api/invitations/{id}        - cancel (sender only)

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::schemas::{InvitationStatus, InvitationType};
use crate::routes::helpers::{
    authenticate, error_response, json_response, parse_enum, parse_json_body, query_param,
    respond, BoxBody, SuccessResponse,
};
use crate::server::AppState;
use crate::types::GoalpostError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteBody {
    pub goal_id: String,
    pub to_user_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJoinRequestBody {
    pub goal_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub status: InvitationStatus,
}

/// Dispatch for /api/invitations/*. Returns None when not owned here.
pub async fn handle_invitation_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/invitations") => Some(handle_invite(req, state).await),
        (Method::POST, "/api/invitations/requests") => {
            Some(handle_join_request(req, state).await)
        }
        (Method::GET, "/api/invitations") => Some(handle_list(req, state).await),
        (Method::GET, "/api/invitations/received") => Some(handle_received(req, state).await),
        (Method::GET, "/api/invitations/sent") => Some(handle_sent(req, state).await),
        (Method::POST, p) => {
            let id = p
                .strip_prefix("/api/invitations/")?
                .strip_suffix("/respond")?
                .to_string();
            Some(handle_respond(req, state, id).await)
        }
        (Method::GET, p) => {
            let id = p.strip_prefix("/api/invitations/")?;
            if id.is_empty() || id.contains('/') {
                return None;
            }
            Some(handle_get(req, state, id.to_string()).await)
        }
        (Method::DELETE, p) => {
            let id = p.strip_prefix("/api/invitations/")?;
            if id.is_empty() || id.contains('/') {
                return None;
            }
            Some(handle_cancel(req, state, id.to_string()).await)
        }
        _ => None,
    }
}

async fn handle_invite(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: CreateInviteBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::CREATED,
        state
            .invitations
            .create_invite(&body.goal_id, &body.to_user_id, &caller, body.message)
            .await,
    )
}

async fn handle_join_request(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: CreateJoinRequestBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::CREATED,
        state
            .invitations
            .create_join_request(&body.goal_id, &caller, body.message)
            .await,
    )
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match query_param(&req, "status") {
        Some(raw) => {
            let status = match parse_enum::<InvitationStatus>(&raw, "invitation status") {
                Ok(status) => status,
                Err(e) => return error_response(e),
            };
            respond(
                StatusCode::OK,
                state.invitations.list_by_status(&caller, status).await,
            )
        }
        None => respond(StatusCode::OK, state.invitations.list_for_user(&caller).await),
    }
}

fn type_filter(req: &Request<Incoming>) -> Result<Option<InvitationType>, GoalpostError> {
    match query_param(req, "type") {
        Some(raw) => Ok(Some(parse_enum::<InvitationType>(&raw, "invitation type")?)),
        None => Ok(None),
    }
}

async fn handle_received(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let invitation_type = match type_filter(&req) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state
            .invitations
            .list_received(&caller, invitation_type)
            .await,
    )
}

async fn handle_sent(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let invitation_type = match type_filter(&req) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state.invitations.list_sent(&caller, invitation_type).await,
    )
}

async fn handle_get(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.invitations.find_by_handle(&id).await {
        Ok(view) => {
            if view.from_user_id != caller && view.to_user_id != caller {
                return error_response(GoalpostError::Forbidden(
                    "you are not a party to this invitation".into(),
                ));
            }
            json_response(StatusCode::OK, &view)
        }
        Err(e) => error_response(e),
    }
}

async fn handle_respond(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: RespondBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::OK,
        state.invitations.respond(&id, body.status, &caller).await,
    )
}

async fn handle_cancel(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.invitations.cancel(&id, &caller).await {
        Ok(success) => json_response(StatusCode::OK, &SuccessResponse { success }),
        Err(e) => error_response(e),
    }
}
