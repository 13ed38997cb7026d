//! Persistence collaborators: profile, policy, and history stores.
//!
//! The pipeline core never persists anything itself. Profiles and policies
//! are read fresh through these traits on every assessment (no caching, so
//! a just-saved policy always applies), and history records are appended
//! after terminal non-blocked decisions.

use crate::error::StoreError;
use crate::types::policy::Policy;
use crate::types::profile::UserProfile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Read/write access to user behavioral profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
    async fn put(&self, profile: &UserProfile) -> Result<(), StoreError>;
}

/// Read/write access to user policy sets.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Policy>, StoreError>;
    async fn put(&self, user_id: &str, policy: &Policy) -> Result<(), StoreError>;
}

/// One recorded transaction, appended after a terminal non-blocked decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub amount: f64,
    pub location: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub z_score: f64,
}

/// Append-only transaction history. Failures are logged by the caller and
/// never revert an already-rendered decision.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn append(&self, user_id: &str, record: &HistoryRecord) -> Result<(), StoreError>;
}

fn safe_file_stem(user_id: &str) -> String {
    user_id.replace(['/', '\\'], "_")
}

/// File-backed profile store: one JSON document per user under a root
/// directory.
pub struct JsonProfileStore {
    root: PathBuf,
}

impl JsonProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", safe_file_stem(user_id)))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        read_json(&self.path_for(user_id))
    }

    async fn put(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let path = self.path_for(&profile.user_id);
        write_json(&path, profile)?;
        debug!(user_id = %profile.user_id, path = %path.display(), "profile saved");
        Ok(())
    }
}

/// File-backed policy store: one JSON document per user.
pub struct JsonPolicyStore {
    root: PathBuf,
}

impl JsonPolicyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", safe_file_stem(user_id)))
    }
}

#[async_trait]
impl PolicyStore for JsonPolicyStore {
    async fn get(&self, user_id: &str) -> Result<Option<Policy>, StoreError> {
        read_json(&self.path_for(user_id))
    }

    async fn put(&self, user_id: &str, policy: &Policy) -> Result<(), StoreError> {
        let path = self.path_for(user_id);
        write_json(&path, policy)?;
        debug!(user_id = %user_id, path = %path.display(), "policies saved");
        Ok(())
    }
}

/// Append-only JSON-lines history log, one file per user.
pub struct JsonHistoryRecorder {
    root: PathBuf,
}

impl JsonHistoryRecorder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", safe_file_stem(user_id)))
    }
}

#[async_trait]
impl HistoryRecorder for JsonHistoryRecorder {
    async fn append(&self, user_id: &str, record: &HistoryRecord) -> Result<(), StoreError> {
        use std::io::Write;

        let path = self.path_for(user_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// In-memory profile store for tests and embedded use.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        let store = Self::new();
        store
            .profiles
            .write()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
        store
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.read().unwrap().get(user_id).cloned())
    }

    async fn put(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .unwrap()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

/// In-memory policy store for tests and embedded use.
#[derive(Default)]
pub struct MemoryPolicyStore {
    policies: RwLock<HashMap<String, Policy>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(user_id: &str, policy: Policy) -> Self {
        let store = Self::new();
        store
            .policies
            .write()
            .unwrap()
            .insert(user_id.to_string(), policy);
        store
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn get(&self, user_id: &str) -> Result<Option<Policy>, StoreError> {
        Ok(self.policies.read().unwrap().get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, policy: &Policy) -> Result<(), StoreError> {
        self.policies
            .write()
            .unwrap()
            .insert(user_id.to_string(), policy.clone());
        Ok(())
    }
}

/// In-memory history recorder for tests and embedded use.
#[derive(Default)]
pub struct MemoryHistoryRecorder {
    records: RwLock<Vec<(String, HistoryRecord)>>,
}

impl MemoryHistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, HistoryRecord)> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl HistoryRecorder for MemoryHistoryRecorder {
    async fn append(&self, user_id: &str, record: &HistoryRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap()
            .push((user_id.to_string(), record.clone()));
        Ok(())
    }
}
