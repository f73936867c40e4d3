//! Error types and shared result wrappers for Goalpost

use hyper::StatusCode;
use serde::{Serialize, Serializer};

/// Main error type for Goalpost operations
#[derive(Debug, thiserror::Error)]
pub enum GoalpostError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl GoalpostError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.to_string();
        (status, body)
    }
}

impl From<std::io::Error> for GoalpostError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GoalpostError {
    fn from(err: serde_json::Error) -> Self {
        Self::Http(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for GoalpostError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for GoalpostError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for GoalpostError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Goalpost operations
pub type Result<T> = std::result::Result<T, GoalpostError>;

/// Outcome of a best-effort secondary lookup.
///
/// Enrichment lookups (nicknames, goal snapshots) must never fail the primary
/// operation. `Absent` means the referenced entity does not exist;
/// `Unavailable` means the lookup itself failed and was logged. Both
/// serialize as JSON `null` so the wire format degrades the same way, while
/// tests can still tell a clean miss from a degraded response.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment<T> {
    Found(T),
    Absent,
    Unavailable,
}

impl<T> Enrichment<T> {
    /// Build from a fallible optional lookup, logging the failure case.
    pub fn from_lookup(result: Result<Option<T>>, what: &str, key: &str) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::Absent,
            Err(err) => {
                tracing::warn!(what, key, error = %err, "enrichment lookup failed");
                Self::Unavailable
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Enrichment<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Found(value) => value.serialize(serializer),
            Self::Absent | Self::Unavailable => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GoalpostError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GoalpostError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GoalpostError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GoalpostError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GoalpostError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_enrichment_serializes_found_as_value() {
        let e = Enrichment::Found("nickname".to_string());
        assert_eq!(serde_json::to_string(&e).unwrap(), "\"nickname\"");
    }

    #[test]
    fn test_enrichment_degrades_to_null() {
        // Absent and Unavailable are distinguishable in process but
        // identical on the wire.
        let absent: Enrichment<String> = Enrichment::Absent;
        let unavailable: Enrichment<String> = Enrichment::Unavailable;
        assert_eq!(serde_json::to_string(&absent).unwrap(), "null");
        assert_eq!(serde_json::to_string(&unavailable).unwrap(), "null");
        assert_ne!(absent, unavailable);
    }

    #[test]
    fn test_enrichment_from_lookup() {
        let found = Enrichment::from_lookup(Ok(Some(1)), "user", "user_a");
        assert_eq!(found, Enrichment::Found(1));

        let absent: Enrichment<i32> = Enrichment::from_lookup(Ok(None), "user", "user_b");
        assert_eq!(absent, Enrichment::Absent);

        let failed: Enrichment<i32> = Enrichment::from_lookup(
            Err(GoalpostError::Database("down".into())),
            "user",
            "user_c",
        );
        assert_eq!(failed, Enrichment::Unavailable);
    }
}
