//! Remote procedure calls used by the handoff protocol.
//!
//! The core never speaks a wire format itself. It builds a [`Call`], hands
//! it to a [`Transport`], and receives a [`Response`]. Each call expects one
//! particular response variant; anything else is a protocol error.
//!
//! ## Calls
//!
//! | Call | Expected response |
//! |------|-------------------|
//! | `ExportLoginToken` | `LoginToken` (token, migrate-to, or success) |
//! | `ImportLoginToken` | `LoginToken` (success or not-yet-successful) |
//! | `CheckLoginToken` | `LoginTokenInfo` |
//! | `AcceptLoginToken` | `Updates` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{DatacenterId, UserId};
use crate::token::TokenInfo;

/// A request sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Ask for a new transfer token on a logged-out session
    ExportLoginToken {
        /// Application id
        api_id: i32,
        /// Application hash
        api_hash: String,
        /// Users already logged in on this device
        except_ids: Vec<UserId>,
    },
    /// Consume a token issued on another datacenter
    ImportLoginToken {
        /// Token value
        token: Vec<u8>,
    },
    /// Look up who is asking to log in with a token
    CheckLoginToken {
        /// Token value
        token: Vec<u8>,
    },
    /// Approve a token from an authorized session
    AcceptLoginToken {
        /// Token value
        token: Vec<u8>,
    },
}

impl Call {
    /// Method name, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ExportLoginToken { .. } => "auth.exportLoginToken",
            Self::ImportLoginToken { .. } => "auth.importLoginToken",
            Self::CheckLoginToken { .. } => "auth.checkLoginToken",
            Self::AcceptLoginToken { .. } => "auth.acceptLoginToken",
        }
    }
}

/// A reply from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Outcome of an export or import
    LoginToken(LoginToken),
    /// Metadata about a token
    LoginTokenInfo(TokenInfo),
    /// Update batch produced by an accepted token
    Updates(UpdateBatch),
}

impl Response {
    /// Variant name, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoginToken(_) => "LoginToken",
            Self::LoginTokenInfo(_) => "LoginTokenInfo",
            Self::Updates(_) => "Updates",
        }
    }
}

/// The three shapes a login-token reply can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginToken {
    /// A fresh token to display
    Token {
        /// Server-side expiry hint
        expires: DateTime<Utc>,
        /// Token value
        token: Vec<u8>,
    },
    /// The token must be imported on another datacenter
    MigrateTo {
        /// Datacenter that owns the token
        dc_id: DatacenterId,
        /// Token value to import there
        token: Vec<u8>,
    },
    /// The handoff already completed
    Success(AuthorizationResult),
}

/// Result of a completed authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    /// The session is now logged in as this user
    Authorized(User),
    /// The remote wants a new account created instead (unsupported here)
    SignUpRequired,
}

/// A remote user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display name
    #[serde(default)]
    pub display_name: String,
}

/// Opaque batch of updates produced by the remote service.
///
/// The core only forwards these to the update pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateBatch {
    /// Sequence number of the batch
    pub seq: i32,
    /// Serialized updates
    pub updates: Vec<Vec<u8>>,
}

/// Failure of a single remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The request never produced a reply
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote service rejected the request
    #[error("remote error {code}: {message}")]
    Remote {
        /// Numeric error class
        code: i32,
        /// Textual error code, e.g. `AUTH_TOKEN_EXPIRED`
        message: String,
    },
}

impl RpcError {
    /// Textual error code reported by the remote, if it replied at all.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Remote { message, .. } => Some(message),
            Self::Transport(_) => None,
        }
    }
}

/// Request/response channel to one datacenter.
///
/// Every call is single-shot: implementations must not retry on behalf of
/// the core.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one call and wait for its reply.
    async fn request(&self, call: Call) -> Result<Response, RpcError>;
}

/// Establishes transports for datacenters.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `datacenter_id` and establish credentials there.
    async fn connect(
        &self,
        datacenter_id: DatacenterId,
        testing_environment: bool,
    ) -> Result<Arc<dyn Transport>, RpcError>;
}
