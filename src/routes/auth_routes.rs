//! Authentication routes
//!
//! - POST /auth/register - create an account and get a JWT token
//! - POST /auth/login    - authenticate and get a JWT token
//! - GET  /auth/me       - current user info from the token

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::routes::helpers::{
    authenticate, error_response, json_response, parse_json_body, BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::services::users::UserView;
use crate::types::GoalpostError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: u64,
    pub user: UserView,
}

/// Dispatch for /auth/*. Returns None when the path is not an auth route.
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/auth/register") => Some(handle_register(req, state).await),
        (Method::POST, "/auth/login") => Some(handle_login(req, state).await),
        (Method::GET, "/auth/me") => Some(handle_me(req, state).await),
        _ => None,
    }
}

async fn handle_register(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    if body.email.is_empty() || body.password.is_empty() || body.nickname.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Missing required fields: email, password, nickname".into(),
            },
        );
    }

    if body.password.len() < 8 {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Password must be at least 8 characters".into(),
            },
        );
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };

    let user = match state
        .users
        .create(&body.email, &body.nickname, &password_hash)
        .await
    {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let token = match state.jwt.generate_token(&user.user_id) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    info!(user_id = %user.user_id, "registered new user");
    json_response(
        StatusCode::CREATED,
        &AuthResponse {
            token,
            expires_at: state.jwt.expires_at(),
            user,
        },
    )
}

async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    // One message for both failure cases: no account-existence oracle.
    let reject = || {
        json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse {
                error: "Invalid email or password".into(),
            },
        )
    };

    let user = match state.users.find_credentials(&body.email).await {
        Ok(Some(user)) => user,
        Ok(None) => return reject(),
        Err(e) => return error_response(e),
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return reject(),
        Err(e) => return error_response(e),
    }

    let token = match state.jwt.generate_token(&user.user_id) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    info!(user_id = %user.user_id, "user logged in");
    json_response(
        StatusCode::OK,
        &AuthResponse {
            token,
            expires_at: state.jwt.expires_at(),
            user: UserView::from(&user),
        },
    )
}

async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.users.find_by_handle(&caller).await {
        Ok(Some(user)) => json_response(StatusCode::OK, &user),
        Ok(None) => error_response(GoalpostError::NotFound("user not found".into())),
        Err(e) => error_response(e),
    }
}
