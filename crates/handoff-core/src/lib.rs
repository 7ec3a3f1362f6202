//! # Handoff Core Library
//!
//! `handoff-core` implements cross-device login handoff: a logged-out device
//! displays a short-lived transfer token, and an already-authenticated device
//! inspects and approves it, which authorizes the logged-out device.
//!
//! ## Features
//!
//! - **Token export**: request a transfer token on a logged-out session
//! - **Datacenter migration**: silently move a session to the datacenter that owns the token
//! - **Approval**: inspect and accept a scanned token from an authorized device
//! - **Account commit**: durably record the new authorization and make it the active account
//!
//! ## Modules
//!
//! - [`accounts`] - JSON-backed local account database
//! - [`config`] - Configuration management
//! - [`handoff`] - The handoff protocol operations
//! - [`rpc`] - Remote procedure calls and the transport seam
//! - [`session`] - Session handles and identifiers
//! - [`token`] - Transfer tokens and login links
//!
//! ## Example
//!
//! ```rust,ignore
//! use handoff_core::handoff::{ExportOutcome, TokenExporter};
//!
//! // Logged-out device
//! match exporter.export(&session, true).await? {
//!     ExportOutcome::TokenIssued(token) => println!("{}", token.deep_link("tg")),
//!     ExportOutcome::SessionChanged(moved) => session = moved,
//!     ExportOutcome::Authorized(record) => println!("logged in as {}", record.user_id),
//! }
//!
//! // Approving device, after scanning the link
//! let value = handoff_core::token::parse_login_link(&link, "tg")?;
//! let info = handoff_core::handoff::inspect(&approving, &value).await?;
//! handoff_core::handoff::approve(&approving, &value, &updates).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod accounts;
pub mod config;
pub mod error;
pub mod handoff;
pub mod rpc;
pub mod session;
pub mod token;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default URL scheme for login links
pub const DEFAULT_LINK_SCHEME: &str = "tg";
