//! Session store: the single owner of the bearer credential.
//!
//! The credential is persisted under a fixed key so it survives restarts.
//! Every change bumps an `epoch` and is broadcast on a watch channel, so
//! dependents can tear down their state and in-flight work can tell whether
//! the identity it started under is still current.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use filevault_core::constants::CREDENTIAL_KEY;
use filevault_core::{UserProfile, VaultError, VaultResult};
use tokio::fs;
use tokio::sync::{watch, Mutex};

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Durable client-local key/value store used as an opaque credential cache.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self, key: &str) -> VaultResult<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> VaultResult<()>;
    async fn remove(&self, key: &str) -> VaultResult<()>;
}

/// JSON object on disk, one entry per key.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> VaultResult<HashMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| {
                VaultError::Storage(format!(
                    "Corrupt credentials file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> VaultResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn save(&self, key: &str, value: &str) -> VaultResult<()> {
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> VaultResult<()> {
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

/// Process-local store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> VaultResult<()> {
        self.inner
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> VaultResult<()> {
        self.inner.lock().await.remove(key);
        Ok(())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    Logout,
    /// The backend rejected the credential with 401.
    Expired,
    /// The persisted credential failed the startup profile check.
    Invalid,
}

/// Authentication state derived from the credential.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Immutable view of the session at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub credential: Option<Credential>,
    pub profile: Option<UserProfile>,
    pub ended: Option<SessionEndReason>,
}

impl SessionSnapshot {
    pub fn state(&self) -> SessionState {
        if self.credential.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }
}

/// Shared handle to the session. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("snapshot", &*self.tx.borrow())
            .finish()
    }
}

impl Session {
    /// Initialize from the persisted credential, if any.
    pub async fn restore(store: Arc<dyn CredentialStore>) -> VaultResult<Self> {
        let credential = store.load(CREDENTIAL_KEY).await?.map(Credential::new);
        if credential.is_some() {
            tracing::debug!("Restored persisted credential");
        }
        let (tx, _rx) = watch::channel(SessionSnapshot {
            epoch: 0,
            credential,
            profile: None,
            ended: None,
        });
        Ok(Self {
            store,
            tx: Arc::new(tx),
        })
    }

    /// Session backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot {
            epoch: 0,
            credential: None,
            profile: None,
            ended: None,
        });
        Self {
            store: Arc::new(MemoryCredentialStore::default()),
            tx: Arc::new(tx),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.tx.borrow().credential.clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.tx.borrow().profile.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.tx.borrow().epoch
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().credential.is_some()
    }

    /// Receive every subsequent session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Persist and activate a credential. Replaces any previous one.
    pub async fn set_credential(&self, credential: Credential) -> VaultResult<()> {
        self.activate(credential, None).await
    }

    /// Persist a credential together with the profile returned at login.
    pub async fn authenticate(&self, credential: Credential, profile: UserProfile) -> VaultResult<()> {
        self.activate(credential, Some(profile)).await
    }

    async fn activate(&self, credential: Credential, profile: Option<UserProfile>) -> VaultResult<()> {
        self.store.save(CREDENTIAL_KEY, credential.expose()).await?;
        self.tx.send_modify(|s| {
            s.epoch += 1;
            s.credential = Some(credential);
            s.profile = profile;
            s.ended = None;
        });
        tracing::info!(epoch = self.epoch(), "Session authenticated");
        Ok(())
    }

    /// Attach the profile fetched for the credential of `epoch`.
    /// Returns false (and changes nothing) if the session moved on meanwhile.
    pub fn set_profile(&self, epoch: u64, profile: UserProfile) -> bool {
        self.tx.send_if_modified(|s| {
            if s.epoch == epoch && s.credential.is_some() {
                s.profile = Some(profile);
                true
            } else {
                false
            }
        })
    }

    /// Drop the credential everywhere and notify dependents.
    ///
    /// In-memory state is cleared before the persisted copy, so the session is
    /// unauthenticated even when removing the persisted copy fails.
    pub async fn clear(&self, reason: SessionEndReason) -> VaultResult<()> {
        self.tx.send_modify(|s| {
            s.epoch += 1;
            s.credential = None;
            s.profile = None;
            s.ended = Some(reason);
        });
        tracing::info!(?reason, epoch = self.epoch(), "Session cleared");
        self.store.remove(CREDENTIAL_KEY).await
    }

    /// Clear the session only if it is still the one identified by `epoch`.
    ///
    /// A rejection for a credential that has since been replaced must not log out
    /// the new identity. Returns whether the session was cleared.
    pub async fn expire_if_current(&self, epoch: u64) -> VaultResult<bool> {
        let cleared = self.tx.send_if_modified(|s| {
            if s.epoch == epoch && s.credential.is_some() {
                s.epoch += 1;
                s.credential = None;
                s.profile = None;
                s.ended = Some(SessionEndReason::Expired);
                true
            } else {
                false
            }
        });
        if cleared {
            tracing::warn!("Credential rejected by backend, session expired");
            self.store.remove(CREDENTIAL_KEY).await?;
        }
        Ok(cleared)
    }
}
