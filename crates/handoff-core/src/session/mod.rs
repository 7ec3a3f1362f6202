//! Session handles and the identifiers they carry.
//!
//! A [`Session`] is the working credential set of a device. On the device
//! being logged in it is still unauthorized; on the approving device it is
//! the logged-in session that inspects and accepts tokens. Either way it is
//! scoped to one datacenter and owns the transport used to talk to that
//! datacenter. Only the datacenter migrator produces a session with a
//! different datacenter. Nothing else changes one after creation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rpc::Transport;

/// Identifier of a backend datacenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatacenterId(pub i32);

impl fmt::Display for DatacenterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DC{}", self.0)
    }
}

/// Identifier of a remote user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local identifier of an account slot on this device.
///
/// A slot exists before login (holding a logged-out session) and keeps its
/// id once authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Allocate a fresh account id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account id from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a UUID.
    pub fn parse(input: &str) -> crate::Result<Self> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|e| crate::Error::Serialization(format!("invalid account id '{input}': {e}")))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application credentials presented when requesting a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    /// Application id
    pub api_id: i32,
    /// Application hash
    pub api_hash: String,
}

/// A session bound to one datacenter.
#[derive(Clone)]
pub struct Session {
    account_id: AccountId,
    datacenter_id: DatacenterId,
    testing_environment: bool,
    api: ApiCredentials,
    transport: Arc<dyn Transport>,
}

impl Session {
    /// Create a session handle over an established transport.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        datacenter_id: DatacenterId,
        testing_environment: bool,
        api: ApiCredentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            account_id,
            datacenter_id,
            testing_environment,
            api,
            transport,
        }
    }

    /// Account slot this session belongs to.
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Datacenter this session currently talks to.
    #[must_use]
    pub fn datacenter_id(&self) -> DatacenterId {
        self.datacenter_id
    }

    /// Whether the session targets the testing environment.
    #[must_use]
    pub fn testing_environment(&self) -> bool {
        self.testing_environment
    }

    /// Application credentials.
    #[must_use]
    pub fn api(&self) -> &ApiCredentials {
        &self.api
    }

    /// Transport bound to this session's datacenter.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Same identity, moved onto another datacenter's transport.
    pub(crate) fn relocated(
        &self,
        datacenter_id: DatacenterId,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            account_id: self.account_id,
            datacenter_id,
            testing_environment: self.testing_environment,
            api: self.api.clone(),
            transport,
        }
    }
}

/// Sessions are equal when they share identity and the same transport.
impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.account_id == other.account_id
            && self.datacenter_id == other.datacenter_id
            && self.testing_environment == other.testing_environment
            && self.api == other.api
            && Arc::ptr_eq(&self.transport, &other.transport)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.account_id)
            .field("datacenter_id", &self.datacenter_id)
            .field("testing_environment", &self.testing_environment)
            .field("api_id", &self.api.api_id)
            .finish_non_exhaustive()
    }
}
