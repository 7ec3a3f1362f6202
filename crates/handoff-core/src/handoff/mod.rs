//! The login handoff protocol.
//!
//! ## Flow
//!
//! ### Logged-out device ([`TokenExporter`])
//! 1. Request a transfer token
//! 2. If the server issues one, show it and wait for approval
//! 3. If the server demands another datacenter, migrate the session there
//!    ([`DatacenterMigrator`]) and import the token on it ([`import`])
//! 4. On success, commit the authorization ([`AccountCommitter`])
//!
//! ### Approving device
//! 1. Scan the login link and look up the token ([`inspect`])
//! 2. Let the user confirm, then accept it ([`approve`])
//!
//! The two sides never talk to each other directly. They meet only through
//! the remote service's token state. Nothing here retries: every remote call
//! is attempted once and failures surface immediately.

mod approve;
mod commit;
mod export;
mod import;
mod inspect;
mod migrate;

pub use approve::{approve, UpdateSink};
pub use commit::{
    AccountCommitter, AccountRecord, AccountRegistry, Authorization, AuthorizedState,
    PostLoginSettings, SessionStore, SyncCursor,
};
pub use export::{ExportOutcome, TokenExporter};
pub use import::{import, ImportOutcome};
pub use inspect::inspect;
pub use migrate::DatacenterMigrator;

use crate::error::HandoffError;
use crate::rpc::{Call, Response, RpcError};
use crate::session::Session;

/// Issue one call on the session's transport.
async fn send(session: &Session, call: Call) -> Result<Response, RpcError> {
    let name = call.name();
    tracing::debug!(
        "{} on {} (account {})",
        name,
        session.datacenter_id(),
        session.account_id()
    );

    session.transport().request(call).await.inspect_err(|e| {
        tracing::debug!("{} failed: {}", name, e);
    })
}

/// Send a call whose failure collapses to [`HandoffError::Generic`].
async fn send_or_generic(session: &Session, call: Call) -> Result<Response, HandoffError> {
    let name = call.name();
    send(session, call).await.map_err(|e| {
        tracing::warn!("{} failed: {}", name, e);
        HandoffError::Generic
    })
}

/// Reply of the wrong kind for the call that was made.
fn unexpected(call: &'static str, response: &Response) -> HandoffError {
    tracing::warn!("{} returned unexpected {}", call, response.name());
    HandoffError::Generic
}
