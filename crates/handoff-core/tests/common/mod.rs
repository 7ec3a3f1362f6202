//! Common test utilities for `Handoff` integration tests.
//!
//! Every mock writes to a shared [`Journal`] so tests can check the order in
//! which collaborators were touched.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use handoff_core::handoff::{
    AccountCommitter, AccountRecord, AccountRegistry, AuthorizedState, DatacenterMigrator,
    PostLoginSettings, SessionStore, TokenExporter, UpdateSink,
};
use handoff_core::rpc::{
    AuthorizationResult, Call, Connector, LoginToken, Response, RpcError, Transport, UpdateBatch,
    User,
};
use handoff_core::session::{AccountId, ApiCredentials, DatacenterId, Session, UserId};
use handoff_core::token::TokenInfo;
use handoff_core::{Error, Result};

/// Something a collaborator observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A remote call on the transport of a datacenter
    Call(DatacenterId, Call),
    /// The connector established a transport
    Connected(DatacenterId),
    /// The store recorded a datacenter move
    DatacenterRecorded(AccountId, DatacenterId),
    /// The store wrote the authorized state
    AuthorizedStateSet(AccountId, AuthorizedState, PostLoginSettings),
    /// The registry switched the active account
    Switched(AccountId),
}

/// Ordered log shared by all mocks of one test.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, matches: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(matches)
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }

    pub fn commits(&self) -> Vec<(AccountId, AuthorizedState, PostLoginSettings)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::AuthorizedStateSet(id, state, settings) => Some((id, state, settings)),
                _ => None,
            })
            .collect()
    }
}

/// Transport that replays queued replies and records every call.
pub struct ScriptedTransport {
    datacenter_id: DatacenterId,
    journal: Journal,
    replies: Mutex<VecDeque<std::result::Result<Response, RpcError>>>,
}

impl ScriptedTransport {
    pub fn new(datacenter_id: DatacenterId, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            datacenter_id,
            journal: journal.clone(),
            replies: Mutex::new(VecDeque::new()),
        })
    }

    /// Queue the reply to the next call.
    pub fn push_reply(&self, reply: std::result::Result<Response, RpcError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Calls this transport received.
    pub fn calls(&self) -> Vec<Call> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Call(dc, call) if dc == self.datacenter_id => Some(call),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, call: Call) -> std::result::Result<Response, RpcError> {
        self.journal.push(Event::Call(self.datacenter_id, call));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Transport("no scripted reply".to_string())))
    }
}

/// Connector over a fixed set of scripted datacenters.
pub struct MockConnector {
    journal: Journal,
    transports: Mutex<HashMap<DatacenterId, Arc<ScriptedTransport>>>,
}

impl MockConnector {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            transports: Mutex::new(HashMap::new()),
        })
    }

    /// Make `datacenter_id` reachable, returning its transport.
    pub fn add_datacenter(&self, datacenter_id: DatacenterId) -> Arc<ScriptedTransport> {
        let transport = ScriptedTransport::new(datacenter_id, &self.journal);
        self.transports
            .lock()
            .unwrap()
            .insert(datacenter_id, Arc::clone(&transport));
        transport
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        datacenter_id: DatacenterId,
        _testing_environment: bool,
    ) -> std::result::Result<Arc<dyn Transport>, RpcError> {
        let transport = self
            .transports
            .lock()
            .unwrap()
            .get(&datacenter_id)
            .cloned()
            .ok_or_else(|| RpcError::Transport(format!("{datacenter_id} unreachable")))?;
        self.journal.push(Event::Connected(datacenter_id));
        Ok(transport)
    }
}

/// Session store that records writes and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    journal: Journal,
    pub fail_datacenter: bool,
    pub fail_authorized_state: bool,
}

impl RecordingStore {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn set_datacenter(&self, account: AccountId, datacenter_id: DatacenterId) -> Result<()> {
        if self.fail_datacenter {
            return Err(Error::AccountDbError("disk full".to_string()));
        }
        self.journal
            .push(Event::DatacenterRecorded(account, datacenter_id));
        Ok(())
    }

    async fn set_authorized_state(
        &self,
        account: AccountId,
        state: AuthorizedState,
        settings: PostLoginSettings,
    ) -> Result<()> {
        if self.fail_authorized_state {
            return Err(Error::AccountDbError("disk full".to_string()));
        }
        self.journal
            .push(Event::AuthorizedStateSet(account, state, settings));
        Ok(())
    }
}

/// Registry that only switches to accounts whose state was written first.
#[derive(Default)]
pub struct RecordingRegistry {
    journal: Journal,
    pub fail: bool,
}

impl RecordingRegistry {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: false,
        }
    }
}

#[async_trait]
impl AccountRegistry for RecordingRegistry {
    async fn switch_to_authorized_account(&self, account: AccountId) -> Result<AccountRecord> {
        if self.fail {
            return Err(Error::Internal("registry unavailable".to_string()));
        }
        let (_, state, _) = self
            .journal
            .commits()
            .into_iter()
            .rev()
            .find(|(id, _, _)| *id == account)
            .ok_or(Error::AccountNotAuthorized(account))?;
        self.journal.push(Event::Switched(account));
        Ok(AccountRecord {
            id: account,
            user_id: state.user_id,
            datacenter_id: state.datacenter_id,
            testing_environment: state.testing_environment,
            authorized_at: Utc::now(),
        })
    }
}

/// Update sink that keeps every batch.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<UpdateBatch>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<UpdateBatch> {
        self.batches.lock().unwrap().clone()
    }
}

impl UpdateSink for RecordingSink {
    fn add_updates(&self, batch: UpdateBatch) {
        self.batches.lock().unwrap().push(batch);
    }
}

/// A logged-out device wired to mocks.
pub struct Harness {
    pub journal: Journal,
    pub home: Arc<ScriptedTransport>,
    pub connector: Arc<MockConnector>,
    pub session: Session,
    fail_store: bool,
    fail_registry: bool,
}

impl Harness {
    pub fn new(home_dc: i32) -> Self {
        let journal = Journal::default();
        let home = ScriptedTransport::new(DatacenterId(home_dc), &journal);
        let connector = MockConnector::new(&journal);
        let session = Session::new(
            AccountId::new(),
            DatacenterId(home_dc),
            false,
            api(),
            Arc::clone(&home) as Arc<dyn Transport>,
        );
        Self {
            journal,
            home,
            connector,
            session,
            fail_store: false,
            fail_registry: false,
        }
    }

    pub fn failing_store(mut self) -> Self {
        self.fail_store = true;
        self
    }

    pub fn failing_registry(mut self) -> Self {
        self.fail_registry = true;
        self
    }

    fn store(&self) -> Arc<RecordingStore> {
        Arc::new(RecordingStore {
            journal: self.journal.clone(),
            fail_datacenter: self.fail_store,
            fail_authorized_state: self.fail_store,
        })
    }

    pub fn migrator(&self) -> DatacenterMigrator {
        DatacenterMigrator::new(Arc::clone(&self.connector) as Arc<dyn Connector>, self.store())
    }

    pub fn committer(&self) -> AccountCommitter {
        let registry = Arc::new(RecordingRegistry {
            journal: self.journal.clone(),
            fail: self.fail_registry,
        });
        AccountCommitter::new(self.store(), registry, "9.9.9")
    }

    pub fn exporter(&self) -> TokenExporter {
        TokenExporter::new(self.migrator(), self.committer())
    }
}

pub fn api() -> ApiCredentials {
    ApiCredentials {
        api_id: 2040,
        api_hash: "b18441a1ff607e10a989891a5462e627".to_string(),
    }
}

pub fn user(id: i64) -> User {
    User {
        id: UserId(id),
        display_name: format!("User {id}"),
    }
}

pub fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

pub fn token_reply(expires: i64, token: &[u8]) -> std::result::Result<Response, RpcError> {
    Ok(Response::LoginToken(LoginToken::Token {
        expires: timestamp(expires),
        token: token.to_vec(),
    }))
}

pub fn migrate_reply(dc: i32, token: &[u8]) -> std::result::Result<Response, RpcError> {
    Ok(Response::LoginToken(LoginToken::MigrateTo {
        dc_id: DatacenterId(dc),
        token: token.to_vec(),
    }))
}

pub fn success_reply(user_id: i64) -> std::result::Result<Response, RpcError> {
    Ok(Response::LoginToken(LoginToken::Success(
        AuthorizationResult::Authorized(user(user_id)),
    )))
}

pub fn sign_up_reply() -> std::result::Result<Response, RpcError> {
    Ok(Response::LoginToken(LoginToken::Success(
        AuthorizationResult::SignUpRequired,
    )))
}

pub fn remote_error(message: &str) -> std::result::Result<Response, RpcError> {
    Err(RpcError::Remote {
        code: 400,
        message: message.to_string(),
    })
}

pub fn transport_error() -> std::result::Result<Response, RpcError> {
    Err(RpcError::Transport("connection reset".to_string()))
}

pub fn token_info() -> TokenInfo {
    TokenInfo {
        datacenter_id: DatacenterId(2),
        auth_key_id: -7_211_443_223_019_288_467,
        device_model: "Pixel 8".to_string(),
        platform: "Android".to_string(),
        system_version: "SDK 34".to_string(),
        api_id: 6,
        app_name: "Handoff Android".to_string(),
        app_version: "10.14.5".to_string(),
        ip: "203.0.113.7".to_string(),
        region: "Lisbon, Portugal".to_string(),
    }
}
