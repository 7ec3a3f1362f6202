//! Error types for Handoff.
//!
//! Two layers live here:
//!
//! - [`Error`] covers local failures (account database, configuration,
//!   login links, I/O) and is what collaborators return.
//! - [`HandoffError`] and [`InspectError`] are the closed error sets of the
//!   protocol operations. Every remote or collaborator failure is collapsed
//!   into one of these at the operation boundary.

use std::io;

use thiserror::Error;

use crate::rpc::RpcError;
use crate::session::AccountId;

/// A specialized `Result` type for Handoff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for local Handoff state.
#[derive(Error, Debug)]
pub enum Error {
    /// Account not present in the account database (H001)
    #[error("account '{0}' not found")]
    AccountNotFound(AccountId),

    /// Account exists but has never been authorized (H002)
    #[error("account '{0}' is not authorized")]
    AccountNotAuthorized(AccountId),

    /// Account database could not be read or written (H003)
    #[error("account database error: {0}")]
    AccountDbError(String),

    /// Login link could not be parsed (H004)
    #[error("invalid login link: {0}")]
    InvalidLink(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code associated with this error, if any.
    ///
    /// Error codes follow the pattern HXXX where XXX is a 3-digit number.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::AccountNotFound(_) => Some("H001"),
            Self::AccountNotAuthorized(_) => Some("H002"),
            Self::AccountDbError(_) => Some("H003"),
            Self::InvalidLink(_) => Some("H004"),
            _ => None,
        }
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::AccountNotFound(_) => Some("List known accounts with:\n  handoff accounts list"),
            Self::InvalidLink(_) => Some(
                "Scan the code again. Login links look like:\n  tg://login?token=...",
            ),
            Self::AccountDbError(_) => Some(
                "Check permissions on the account database, or point\n\
                 [storage] accounts_path at a writable location.",
            ),
            _ => None,
        }
    }
}

/// Failure of export, import, approval or migration.
///
/// Any transport failure, unexpected remote reply, or unsupported sign-up
/// outcome collapses to `Generic`. The caller's recourse is always to retry
/// the whole flow.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    /// The operation failed
    #[error("login handoff failed")]
    Generic,
}

/// Failure of token inspection on the approving device.
///
/// Distinguished so the approving UI can tell the user why a scanned code
/// cannot be used.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectError {
    /// The lookup failed for any other reason
    #[error("failed to look up login token")]
    Generic,

    /// The token value is not known to the service
    #[error("login token is invalid")]
    Invalid,

    /// The token has expired
    #[error("login token has expired")]
    Expired,

    /// The token was already used to log in a device
    #[error("login token was already accepted")]
    AlreadyAccepted,
}

impl InspectError {
    /// Map a remote failure to the inspection error set.
    ///
    /// Only the three token error codes are distinguished; everything else,
    /// transport failures included, is `Generic`.
    #[must_use]
    pub fn from_rpc(error: &RpcError) -> Self {
        match error.error_code() {
            Some("AUTH_TOKEN_INVALID") => Self::Invalid,
            Some("AUTH_TOKEN_EXPIRED") => Self::Expired,
            Some("AUTH_TOKEN_ALREADY_ACCEPTED") => Self::AlreadyAccepted,
            _ => Self::Generic,
        }
    }
}
