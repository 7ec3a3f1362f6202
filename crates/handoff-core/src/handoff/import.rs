//! Consuming an issued token on a (possibly migrated) session.

use crate::error::HandoffError;
use crate::rpc::{AuthorizationResult, Call, LoginToken, Response};
use crate::session::Session;

use super::{send_or_generic, unexpected, Authorization};

/// Result of importing a token.
#[derive(Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The session is now authorized
    Authorized(Authorization),
    /// The remote has not completed the handoff yet; keep the session and retry later
    Pending,
}

/// Submit `token` on `session`.
///
/// # Errors
///
/// Returns [`HandoffError::Generic`] on transport failure, an unexpected
/// reply, or when the remote asks for sign-up instead.
pub async fn import(session: &Session, token: &[u8]) -> Result<ImportOutcome, HandoffError> {
    let call = Call::ImportLoginToken {
        token: token.to_vec(),
    };
    let name = call.name();

    match send_or_generic(session, call).await? {
        Response::LoginToken(LoginToken::Success(AuthorizationResult::Authorized(user))) => {
            tracing::debug!("Token import authorized user {}", user.id);
            Ok(ImportOutcome::Authorized(Authorization::new(user)))
        }
        Response::LoginToken(LoginToken::Success(AuthorizationResult::SignUpRequired)) => {
            tracing::warn!("Token import requires sign-up, which is not supported");
            Err(HandoffError::Generic)
        }
        Response::LoginToken(LoginToken::Token { .. } | LoginToken::MigrateTo { .. }) => {
            tracing::debug!("Token import on {} not completed yet", session.datacenter_id());
            Ok(ImportOutcome::Pending)
        }
        other @ (Response::LoginTokenInfo(_) | Response::Updates(_)) => {
            Err(unexpected(name, &other))
        }
    }
}
