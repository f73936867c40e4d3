//! Shared plumbing for route handlers: JSON responses, body parsing, caller
//! authentication, and query-string access.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::extract_token_from_header;
use crate::server::AppState;
use crate::types::GoalpostError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

const MAX_BODY_BYTES: usize = 65536;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Map a service error to its HTTP status and a JSON error body.
pub fn error_response(err: GoalpostError) -> Response<BoxBody> {
    let (status, message) = err.into_status_code_and_body();
    json_response(status, &ErrorResponse { error: message })
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("no route for {}", path),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

/// Shorthand for handlers: run a service result into a response.
pub fn respond<T: Serialize>(
    status: StatusCode,
    result: crate::types::Result<T>,
) -> Response<BoxBody> {
    match result {
        Ok(body) => json_response(status, &body),
        Err(err) => error_response(err),
    }
}

pub async fn parse_json_body<T: DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<T, GoalpostError> {
    let body = req
        .collect()
        .await
        .map_err(|e| GoalpostError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(GoalpostError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| GoalpostError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Resolve the verified caller handle for a guarded operation.
///
/// Production: Bearer JWT only. Dev mode additionally accepts an `x-user-id`
/// header in place of a token.
pub fn authenticate(req: &Request<Incoming>, state: &AppState) -> Result<String, GoalpostError> {
    let auth_header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if let Some(token) = extract_token_from_header(auth_header) {
        let result = state.jwt.verify_token(token);
        return match result.claims {
            Some(claims) => Ok(claims.sub),
            None => Err(GoalpostError::Unauthorized(
                result.error.unwrap_or_else(|| "invalid token".into()),
            )),
        };
    }

    if state.args.dev_mode {
        if let Some(user) = req.headers().get("x-user-id").and_then(|v| v.to_str().ok()) {
            if !user.is_empty() {
                return Ok(user.to_string());
            }
        }
    }

    Err(GoalpostError::Unauthorized("missing bearer token".into()))
}

/// Extract a single decoded query parameter from the request URI.
pub fn query_param(req: &Request<Incoming>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == name {
                return urlencoding::decode(value).ok().map(|v| v.into_owned());
            }
        }
    }
    None
}

/// Parse a lowercase enum value ("pending", "invite", ...) from a query
/// parameter or body field.
pub fn parse_enum<T: DeserializeOwned>(value: &str, what: &str) -> Result<T, GoalpostError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| GoalpostError::Validation(format!("invalid {}: {}", what, value)))
}
