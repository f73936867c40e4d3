//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Request dispatch hands
//! each path family to its routes module; a module returning None falls
//! through to 404.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::Stores;
use crate::routes;
use crate::routes::helpers::{cors_preflight, not_found_response, BoxBody};
use crate::services::{
    FollowService, GoalService, InvitationService, StickerImageService, UserDirectory,
    UserService,
};
use crate::types::{GoalpostError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    pub users: Arc<UserService>,
    pub follows: Arc<FollowService>,
    pub goals: Arc<GoalService>,
    pub invitations: Arc<InvitationService>,
    pub sticker_images: Arc<StickerImageService>,
    /// False when running on the in-memory dev store
    pub mongo_connected: bool,
    started_at: Instant,
}

impl AppState {
    /// Wire the services over the given stores. Construction is strictly
    /// ordered (directory adapter, follows, goals, invitations, users) so
    /// no service ever needs a reference cycle.
    pub fn new(args: Args, stores: Stores, mongo_connected: bool) -> Result<Self> {
        let jwt = match &args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), args.jwt_expiry_seconds)?,
            None => JwtValidator::new_dev(),
        };

        let directory = Arc::new(UserDirectory::new(stores.users.clone()));
        let follows = Arc::new(FollowService::new(
            stores.follows.clone(),
            directory.clone(),
        ));
        let goals = Arc::new(GoalService::new(
            stores.goals.clone(),
            directory.clone(),
            follows.clone(),
        ));
        let invitations = Arc::new(InvitationService::new(
            stores.invitations.clone(),
            stores.goals.clone(),
            goals.clone(),
            directory,
        ));
        let users = Arc::new(UserService::new(
            stores.users.clone(),
            follows.clone(),
            goals.clone(),
            invitations.clone(),
        ));
        let sticker_images = Arc::new(StickerImageService::new(stores.sticker_images.clone()));

        Ok(Self {
            args,
            jwt,
            users,
            follows,
            goals,
            invitations,
            sticker_images,
            mongo_connected,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(cors_preflight());
    }

    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path.starts_with("/api/users") {
        if let Some(response) = routes::handle_user_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path.starts_with("/api/follows") {
        if let Some(response) = routes::handle_follow_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path.starts_with("/api/goals") {
        if let Some(response) = routes::handle_goal_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path.starts_with("/api/invitations") {
        if let Some(response) = routes::handle_invitation_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path.starts_with("/api/sticker-images") {
        if let Some(response) =
            routes::handle_sticker_image_request(req, Arc::clone(&state)).await
        {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }
        (Method::GET, "/version") => routes::version_info(),
        _ => not_found_response(&path),
    };

    Ok(response)
}

/// Accept loop. One spawned task per connection.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| GoalpostError::Config(format!("Failed to bind {}: {}", state.args.listen, e)))?;

    info!(
        "Goalpost listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - header auth accepted");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}
