//! Local account database for Handoff.
//!
//! Every account slot on this device, logged out or logged in, is one entry
//! in a JSON file. [`AccountStore`] implements both [`SessionStore`] and
//! [`AccountRegistry`], so the handoff can run end to end without an
//! external storage engine.
//!
//! ## Transactions
//!
//! Mutations run against a copy of the database under a lock. The copy is
//! written to a staging file, flushed, synced and renamed over the database,
//! and only then replaces the in-memory state. A failed write leaves both
//! untouched. The async [`SessionStore`] and [`AccountRegistry`] methods run
//! their transaction on the blocking pool.

use std::ffi::OsString;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handoff::{
    AccountRecord, AccountRegistry, AuthorizedState, PostLoginSettings, SessionStore,
};
use crate::session::{AccountId, DatacenterId, UserId};

/// Current version of the database format
const DATABASE_VERSION: u32 = 1;

/// One account slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAccount {
    /// Account identifier
    pub id: AccountId,
    /// Datacenter the session lives on
    pub datacenter_id: DatacenterId,
    /// Whether the account targets the testing environment
    pub testing_environment: bool,
    /// When the slot was created
    pub created_at: DateTime<Utc>,
    /// Authorized state, once logged in
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authorized: Option<AuthorizedState>,
    /// Settings written at login
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub settings: Option<PostLoginSettings>,
    /// When the account was authorized
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authorized_at: Option<DateTime<Utc>>,
}

impl StoredAccount {
    /// Create a logged-out account slot.
    #[must_use]
    pub fn new(datacenter_id: DatacenterId, testing_environment: bool) -> Self {
        Self {
            id: AccountId::new(),
            datacenter_id,
            testing_environment,
            created_at: Utc::now(),
            authorized: None,
            settings: None,
            authorized_at: None,
        }
    }

    /// Whether the account has been logged in.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorized.is_some()
    }

    /// Registry view of a logged-in account.
    #[must_use]
    pub fn record(&self) -> Option<AccountRecord> {
        let state = self.authorized.as_ref()?;
        Some(AccountRecord {
            id: self.id,
            user_id: state.user_id,
            datacenter_id: state.datacenter_id,
            testing_environment: state.testing_environment,
            authorized_at: self.authorized_at.unwrap_or(self.created_at),
        })
    }
}

/// Serializable form of the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountDatabase {
    /// Version of the database format
    version: u32,
    /// Currently active account
    #[serde(skip_serializing_if = "Option::is_none", default)]
    active: Option<AccountId>,
    /// All account slots
    accounts: Vec<StoredAccount>,
}

impl Default for AccountDatabase {
    fn default() -> Self {
        Self {
            version: DATABASE_VERSION,
            active: None,
            accounts: Vec::new(),
        }
    }
}

impl AccountDatabase {
    fn find_mut(&mut self, id: AccountId) -> Result<&mut StoredAccount> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(Error::AccountNotFound(id))
    }
}

/// JSON-file account database.
///
/// The state lives behind an `Arc` so the async methods can hand a
/// transaction to the blocking pool.
#[derive(Debug)]
pub struct AccountStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    /// Path to the database file
    path: PathBuf,
    /// In-memory state, replaced only after a successful write
    db: Mutex<AccountDatabase>,
}

impl AccountStore {
    fn with_database(path: PathBuf, db: AccountDatabase) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path,
                db: Mutex::new(db),
            }),
        }
    }

    /// Load the account store from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded.
    pub fn load() -> Result<Self> {
        let path = Self::default_path().unwrap_or_else(|| PathBuf::from("accounts.json"));
        Self::load_from(path)
    }

    /// Load from the location named in `config`, or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded.
    pub fn load_with_config(config: &Config) -> Result<Self> {
        match &config.storage.accounts_path {
            Some(path) => Self::load_from(path.clone()),
            None => Self::load(),
        }
    }

    /// Load from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or was
    /// written by a newer format version.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::with_database(path, AccountDatabase::default()));
        }

        let file = fs::File::open(&path).map_err(|e| {
            Error::AccountDbError(format!(
                "Failed to open account database at {}: {}",
                path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        let db: AccountDatabase = serde_json::from_reader(reader).map_err(|e| {
            Error::AccountDbError(format!(
                "Failed to parse account database at {}: {}",
                path.display(),
                e
            ))
        })?;

        if db.version > DATABASE_VERSION {
            return Err(Error::AccountDbError(format!(
                "account database version {} is newer than supported version {}",
                db.version, DATABASE_VERSION
            )));
        }

        tracing::debug!(
            "Loaded {} accounts from {}",
            db.accounts.len(),
            path.display()
        );

        Ok(Self::with_database(path, db))
    }

    /// Get the default account database path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "handoff", "Handoff")
            .map(|dirs| dirs.data_dir().join("accounts.json"))
    }

    /// Get the path to the account database file.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.inner.path
    }

    fn lock(&self) -> MutexGuard<'_, AccountDatabase> {
        self.inner.lock()
    }

    /// Run `f` as one transaction on the blocking pool.
    async fn transaction_blocking<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut AccountDatabase) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.transaction(f))
            .await
            .map_err(|e| Error::Internal(format!("account database task failed: {e}")))?
    }

    /// Register a new logged-out account slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be saved.
    pub fn create_unauthorized(
        &self,
        datacenter_id: DatacenterId,
        testing_environment: bool,
    ) -> Result<AccountId> {
        let account = StoredAccount::new(datacenter_id, testing_environment);
        let id = account.id;
        self.inner.transaction(|db| {
            db.accounts.push(account);
            Ok(())
        })?;
        tracing::debug!("Created account slot {} on {}", id, datacenter_id);
        Ok(id)
    }

    /// List all account slots.
    #[must_use]
    pub fn list(&self) -> Vec<StoredAccount> {
        self.lock().accounts.clone()
    }

    /// Find an account by ID.
    #[must_use]
    pub fn find(&self, id: AccountId) -> Option<StoredAccount> {
        self.lock().accounts.iter().find(|a| a.id == id).cloned()
    }

    /// The active account, if one is set and logged in.
    #[must_use]
    pub fn active(&self) -> Option<AccountRecord> {
        let db = self.lock();
        let active = db.active?;
        db.accounts
            .iter()
            .find(|a| a.id == active)
            .and_then(StoredAccount::record)
    }

    /// Users logged in on this device.
    #[must_use]
    pub fn authorized_user_ids(&self) -> Vec<UserId> {
        self.lock()
            .accounts
            .iter()
            .filter_map(|a| a.authorized.as_ref().map(|s| s.user_id))
            .collect()
    }

    /// Remove an account slot. Clears the active account if it was this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be saved.
    pub fn remove(&self, id: AccountId) -> Result<bool> {
        if self.find(id).is_none() {
            return Ok(false);
        }
        self.inner.transaction(|db| {
            db.accounts.retain(|a| a.id != id);
            if db.active == Some(id) {
                db.active = None;
            }
            Ok(true)
        })
    }
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, AccountDatabase> {
        // The guarded value is only ever replaced wholesale, so it is
        // consistent even if a holder panicked.
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("accounts.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Persist `db` by writing a staging file and renaming it over the
    /// database. The previous file stays intact until the rename.
    fn write(&self, db: &AccountDatabase) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::AccountDbError(format!(
                    "Failed to create account database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let staging = self.staging_path();
        let result = Self::write_file(&staging, db).and_then(|()| {
            fs::rename(&staging, &self.path).map_err(|e| {
                Error::AccountDbError(format!(
                    "Failed to replace account database at {}: {}",
                    self.path.display(),
                    e
                ))
            })
        });

        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn write_file(path: &Path, db: &AccountDatabase) -> Result<()> {
        let file = fs::File::create(path).map_err(|e| write_error("create", path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, db).map_err(|e| write_error("write", path, e))?;
        writer.flush().map_err(|e| write_error("flush", path, e))?;

        let file = writer
            .into_inner()
            .map_err(|e| write_error("flush", path, e.into_error()))?;
        file.sync_all().map_err(|e| write_error("sync", path, e))
    }

    /// Run `f` as one transaction.
    fn transaction<R>(&self, f: impl FnOnce(&mut AccountDatabase) -> Result<R>) -> Result<R> {
        let mut guard = self.lock();
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        self.write(&draft)?;
        *guard = draft;
        Ok(result)
    }
}

fn write_error(step: &str, path: &Path, e: impl std::fmt::Display) -> Error {
    Error::AccountDbError(format!(
        "Failed to {} account database at {}: {}",
        step,
        path.display(),
        e
    ))
}

#[async_trait]
impl SessionStore for AccountStore {
    async fn set_datacenter(&self, account: AccountId, datacenter_id: DatacenterId) -> Result<()> {
        self.transaction_blocking(move |db| {
            db.find_mut(account)?.datacenter_id = datacenter_id;
            Ok(())
        })
        .await
    }

    async fn set_authorized_state(
        &self,
        account: AccountId,
        state: AuthorizedState,
        settings: PostLoginSettings,
    ) -> Result<()> {
        self.transaction_blocking(move |db| {
            let stored = db.find_mut(account)?;
            stored.datacenter_id = state.datacenter_id;
            stored.testing_environment = state.testing_environment;
            stored.authorized = Some(state);
            stored.settings = Some(settings);
            stored.authorized_at = Some(Utc::now());
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl AccountRegistry for AccountStore {
    async fn switch_to_authorized_account(&self, account: AccountId) -> Result<AccountRecord> {
        self.transaction_blocking(move |db| {
            let record = db
                .find_mut(account)?
                .record()
                .ok_or(Error::AccountNotAuthorized(account))?;
            db.active = Some(account);
            Ok(record)
        })
        .await
    }
}
