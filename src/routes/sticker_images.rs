//! Sticker image catalog routes
//!
//! - GET    /api/sticker-images          - own uploads plus the default set
//! - GET    /api/sticker-images/defaults - default images (public)
//! - POST   /api/sticker-images          - register an uploaded image
//! - DELETE /api/sticker-images/{id}     - delete an uploaded image

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::routes::helpers::{
    authenticate, error_response, json_response, parse_json_body, respond, BoxBody,
    SuccessResponse,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStickerImageBody {
    pub name: String,
    pub image_url: String,
    pub thumbnail_url: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Dispatch for /api/sticker-images/*. Returns None when not owned here.
pub async fn handle_sticker_image_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/sticker-images") => Some(handle_list(req, state).await),
        (Method::GET, "/api/sticker-images/defaults") => Some(handle_defaults(state).await),
        (Method::POST, "/api/sticker-images") => Some(handle_create(req, state).await),
        (Method::DELETE, p) => {
            let id = p.strip_prefix("/api/sticker-images/")?;
            if id.is_empty() || id.contains('/') {
                return None;
            }
            Some(handle_delete(req, state, id.to_string()).await)
        }
        _ => None,
    }
}

async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    respond(StatusCode::OK, state.sticker_images.list_for_user(&caller).await)
}

async fn handle_defaults(state: Arc<AppState>) -> Response<BoxBody> {
    respond(StatusCode::OK, state.sticker_images.list_defaults().await)
}

async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };
    let body: CreateStickerImageBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    respond(
        StatusCode::CREATED,
        state
            .sticker_images
            .create(
                &body.name,
                &body.image_url,
                &body.thumbnail_url,
                body.category,
                &caller,
            )
            .await,
    )
}

async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: String,
) -> Response<BoxBody> {
    let caller = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match state.sticker_images.remove(&id, &caller).await {
        Ok(success) => json_response(StatusCode::OK, &SuccessResponse { success }),
        Err(e) => error_response(e),
    }
}
