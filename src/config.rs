//! Configuration for Goalpost
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::types::{GoalpostError, Result};

/// Goalpost - social goal-tracking backend
#[derive(Parser, Debug, Clone)]
#[command(name = "goalpost")]
#[command(about = "Social goal-tracking backend with sticker rewards")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "goalpost")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (in-memory store fallback, header auth)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration at startup.
    ///
    /// Production mode requires a JWT secret; dev mode falls back to a
    /// built-in one.
    pub fn validate(&self) -> Result<()> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err(GoalpostError::Config(
                "JWT_SECRET is required outside dev mode".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["goalpost"])
    }

    #[test]
    fn test_defaults() {
        let args = base_args();
        assert_eq!(args.mongodb_db, "goalpost");
        assert_eq!(args.jwt_expiry_seconds, 3600);
        assert!(!args.dev_mode);
    }

    #[test]
    fn test_validate_requires_secret_in_production() {
        let args = base_args();
        assert!(args.validate().is_err());

        let mut dev = base_args();
        dev.dev_mode = true;
        assert!(dev.validate().is_ok());

        let mut prod = base_args();
        prod.jwt_secret = Some("secret-that-is-long-enough-for-hs256".into());
        assert!(prod.validate().is_ok());
    }
}
