//! Moving a logged-out session to another datacenter.

use std::sync::Arc;

use crate::error::HandoffError;
use crate::rpc::Connector;
use crate::session::{DatacenterId, Session};

use super::SessionStore;

/// Reassigns a session's home datacenter.
#[derive(Clone)]
pub struct DatacenterMigrator {
    connector: Arc<dyn Connector>,
    store: Arc<dyn SessionStore>,
}

impl DatacenterMigrator {
    /// Create a migrator that connects through `connector` and records the
    /// new datacenter in `store`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, store: Arc<dyn SessionStore>) -> Self {
        Self { connector, store }
    }

    /// Move `session` to `target`.
    ///
    /// Migrating to the datacenter the session already uses returns an equal
    /// session and touches nothing. Otherwise the new transport is
    /// established first, then the move is recorded durably, and only then is
    /// the new session handed out.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Generic`] if the datacenter cannot be reached
    /// or the move cannot be recorded. `session` stays usable either way.
    pub async fn migrate(
        &self,
        session: &Session,
        target: DatacenterId,
    ) -> Result<Session, HandoffError> {
        if session.datacenter_id() == target {
            tracing::debug!("Session {} already on {}", session.account_id(), target);
            return Ok(session.clone());
        }

        let transport = self
            .connector
            .connect(target, session.testing_environment())
            .await
            .map_err(|e| {
                tracing::warn!("Failed to connect to {}: {}", target, e);
                HandoffError::Generic
            })?;

        self.store
            .set_datacenter(session.account_id(), target)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Failed to record move of {} to {}: {}",
                    session.account_id(),
                    target,
                    e
                );
                HandoffError::Generic
            })?;

        tracing::info!(
            "Migrated session {} from {} to {}",
            session.account_id(),
            session.datacenter_id(),
            target
        );
        Ok(session.relocated(target, transport))
    }
}

impl std::fmt::Debug for DatacenterMigrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatacenterMigrator").finish_non_exhaustive()
    }
}
