//! Approving a scanned token.

use crate::error::HandoffError;
use crate::rpc::{Call, Response, UpdateBatch};
use crate::session::Session;

use super::{send_or_generic, unexpected};

/// Receives update batches for the local update pipeline.
pub trait UpdateSink: Send + Sync {
    /// Hand a batch to the pipeline.
    fn add_updates(&self, batch: UpdateBatch);
}

impl<F> UpdateSink for F
where
    F: Fn(UpdateBatch) + Send + Sync,
{
    fn add_updates(&self, batch: UpdateBatch) {
        self(batch);
    }
}

/// Accept `token` from an authorized session.
///
/// The update batch returned by the remote is forwarded to `updates` as is.
/// No validation happens locally; whatever the remote rejects surfaces as
/// `Generic`.
///
/// # Errors
///
/// Returns [`HandoffError::Generic`] on any failure. Nothing is forwarded then.
pub async fn approve(
    session: &Session,
    token: &[u8],
    updates: &dyn UpdateSink,
) -> Result<(), HandoffError> {
    let call = Call::AcceptLoginToken {
        token: token.to_vec(),
    };
    let name = call.name();

    match send_or_generic(session, call).await? {
        Response::Updates(batch) => {
            tracing::info!("Login token accepted from account {}", session.account_id());
            updates.add_updates(batch);
            Ok(())
        }
        other @ (Response::LoginToken(_) | Response::LoginTokenInfo(_)) => {
            Err(unexpected(name, &other))
        }
    }
}
