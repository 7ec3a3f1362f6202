//! Committing a successful authorization.
//!
//! Two collaborator steps, strictly in order:
//!
//! 1. [`SessionStore::set_authorized_state`] writes the authorized state and
//!    the post-login settings in one store transaction.
//! 2. [`AccountRegistry::switch_to_authorized_account`] makes the account the
//!    active one.
//!
//! Step 2 runs only after step 1 succeeded. There is no rollback of step 1
//! when step 2 fails.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HandoffError, Result};
use crate::rpc::User;
use crate::session::{AccountId, DatacenterId, Session, UserId};

/// Proof that the remote authorized a session.
///
/// Not `Clone`: it is consumed by [`AccountCommitter::commit`], so a single
/// successful outcome can be committed at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an authorization does nothing until it is committed"]
pub struct Authorization {
    user: User,
}

impl Authorization {
    pub(crate) fn new(user: User) -> Self {
        Self { user }
    }

    /// The user the session is now logged in as.
    pub fn user(&self) -> &User {
        &self.user
    }
}

/// Update-stream position of an authorized account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Persistent timestamp
    pub pts: i32,
    /// Secondary persistent timestamp
    pub qts: i32,
    /// Date of the last received update
    pub date: i32,
    /// Sequence number
    pub seq: i32,
}

/// State persisted for an account once it is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedState {
    /// Home datacenter
    pub datacenter_id: DatacenterId,
    /// Whether the account lives in the testing environment
    pub testing_environment: bool,
    /// The logged-in user
    pub user_id: UserId,
    /// Update-stream position, unknown right after login
    pub sync_cursor: Option<SyncCursor>,
}

/// Application settings initialised right after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLoginSettings {
    /// Version of the application that performed the login
    pub app_version: String,
    /// Whether contacts should be synced for this account
    pub sync_contacts: bool,
}

/// An account known to the registry as logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Local account slot
    pub id: AccountId,
    /// The logged-in user
    pub user_id: UserId,
    /// Home datacenter
    pub datacenter_id: DatacenterId,
    /// Whether the account lives in the testing environment
    pub testing_environment: bool,
    /// When the account was authorized
    pub authorized_at: DateTime<Utc>,
}

/// Persistent store of per-account session state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Durably record that an account's session now lives on `datacenter_id`.
    async fn set_datacenter(&self, account: AccountId, datacenter_id: DatacenterId) -> Result<()>;

    /// Write the authorized state and post-login settings in one transaction.
    async fn set_authorized_state(
        &self,
        account: AccountId,
        state: AuthorizedState,
        settings: PostLoginSettings,
    ) -> Result<()>;
}

/// Registry deciding which account is the active one.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Make an authorized account the active account.
    async fn switch_to_authorized_account(&self, account: AccountId) -> Result<AccountRecord>;
}

/// Records a successful authorization and activates the account.
#[derive(Clone)]
pub struct AccountCommitter {
    store: Arc<dyn SessionStore>,
    registry: Arc<dyn AccountRegistry>,
    app_version: String,
}

impl AccountCommitter {
    /// Create a committer over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<dyn AccountRegistry>,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            app_version: app_version.into(),
        }
    }

    /// Commit `authorization` for `session`'s account.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Generic`] if either step fails. If the registry
    /// step fails, the authorized state written by the first step stays.
    pub async fn commit(
        &self,
        session: &Session,
        authorization: Authorization,
        sync_contacts: bool,
    ) -> std::result::Result<AccountRecord, HandoffError> {
        let account = session.account_id();
        let state = AuthorizedState {
            datacenter_id: session.datacenter_id(),
            testing_environment: session.testing_environment(),
            user_id: authorization.user.id,
            sync_cursor: None,
        };
        let settings = PostLoginSettings {
            app_version: self.app_version.clone(),
            sync_contacts,
        };

        self.store
            .set_authorized_state(account, state, settings)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to store authorized state for {}: {}", account, e);
                HandoffError::Generic
            })?;

        let record = self
            .registry
            .switch_to_authorized_account(account)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Authorized state stored but switching to {} failed: {}",
                    account,
                    e
                );
                HandoffError::Generic
            })?;

        tracing::info!(
            "Account {} logged in as user {} on {}",
            account,
            record.user_id,
            record.datacenter_id
        );
        Ok(record)
    }
}

impl std::fmt::Debug for AccountCommitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCommitter")
            .field("app_version", &self.app_version)
            .finish_non_exhaustive()
    }
}
