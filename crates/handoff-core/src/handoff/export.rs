//! Requesting a transfer token on the logged-out device.

use crate::error::HandoffError;
use crate::rpc::{AuthorizationResult, Call, LoginToken, Response};
use crate::session::{DatacenterId, Session, UserId};
use crate::token::TransferToken;

use super::{
    import, send_or_generic, unexpected, AccountCommitter, AccountRecord, Authorization,
    DatacenterMigrator, ImportOutcome,
};

/// Result of one export attempt.
#[derive(Debug, PartialEq)]
pub enum ExportOutcome {
    /// Show this token to the user and wait for approval
    TokenIssued(TransferToken),
    /// The session moved to another datacenter without completing; export again on it
    SessionChanged(Session),
    /// The handoff completed and the account was committed
    Authorized(AccountRecord),
}

/// Entry point of the handoff on the logged-out device.
#[derive(Debug, Clone)]
pub struct TokenExporter {
    migrator: DatacenterMigrator,
    committer: AccountCommitter,
    except_ids: Vec<UserId>,
}

impl TokenExporter {
    /// Create an exporter.
    #[must_use]
    pub fn new(migrator: DatacenterMigrator, committer: AccountCommitter) -> Self {
        Self {
            migrator,
            committer,
            except_ids: Vec::new(),
        }
    }

    /// Users already logged in on this device.
    ///
    /// The server will not issue a token that would log one of them in again.
    #[must_use]
    pub fn with_excluded_users(mut self, users: Vec<UserId>) -> Self {
        self.except_ids = users;
        self
    }

    /// Request a token on `session`, following a datacenter migration if
    /// the server asks for one.
    ///
    /// `sync_contacts` only feeds the post-login settings.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Generic`] on any failure, including a
    /// sign-up-required reply.
    pub async fn export(
        &self,
        session: &Session,
        sync_contacts: bool,
    ) -> Result<ExportOutcome, HandoffError> {
        let call = Call::ExportLoginToken {
            api_id: session.api().api_id,
            api_hash: session.api().api_hash.clone(),
            except_ids: self.except_ids.clone(),
        };
        let name = call.name();

        let reply = match send_or_generic(session, call).await? {
            Response::LoginToken(reply) => reply,
            other @ (Response::LoginTokenInfo(_) | Response::Updates(_)) => {
                return Err(unexpected(name, &other));
            }
        };

        match reply {
            LoginToken::Token { expires, token } => {
                tracing::info!(
                    "Issued {}-byte login token valid until {}",
                    token.len(),
                    expires
                );
                Ok(ExportOutcome::TokenIssued(TransferToken::new(token, expires)))
            }
            LoginToken::MigrateTo { dc_id, token } => {
                self.migrate_and_import(session, dc_id, &token, sync_contacts)
                    .await
            }
            LoginToken::Success(AuthorizationResult::Authorized(user)) => {
                tracing::debug!("Export completed the handoff directly");
                self.committer
                    .commit(session, Authorization::new(user), sync_contacts)
                    .await
                    .map(ExportOutcome::Authorized)
            }
            LoginToken::Success(AuthorizationResult::SignUpRequired) => {
                tracing::warn!("Export requires sign-up, which is not supported");
                Err(HandoffError::Generic)
            }
        }
    }

    async fn migrate_and_import(
        &self,
        session: &Session,
        target: DatacenterId,
        token: &[u8],
        sync_contacts: bool,
    ) -> Result<ExportOutcome, HandoffError> {
        tracing::info!(
            "Token lives on {}, moving session off {}",
            target,
            session.datacenter_id()
        );

        let moved = self.migrator.migrate(session, target).await?;

        match import(&moved, token).await? {
            ImportOutcome::Authorized(authorization) => self
                .committer
                .commit(&moved, authorization, sync_contacts)
                .await
                .map(ExportOutcome::Authorized),
            ImportOutcome::Pending => Ok(ExportOutcome::SessionChanged(moved)),
        }
    }
}
