use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::domain::{AccountRecord, Uid};
use thiserror::Error;
use tracing::info;

const BUILTIN_USERS: &str = include_str!("../data/users.json");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read user store '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid user store JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("user store key '{key}' does not match record uid '{uid}'")]
    KeyMismatch { key: String, uid: Uid },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no account for card {0}")]
    NotFound(Uid),
}

/// Read-only UID to account table. Cloning shares the table.
#[derive(Debug, Clone)]
pub struct UserStore {
    accounts: Arc<HashMap<String, AccountRecord>>,
}

impl UserStore {
    /// The demo accounts compiled into the crate.
    pub fn builtin() -> Result<Self, StoreError> {
        Self::from_json_str(BUILTIN_USERS)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json_str(&raw)?;
        info!(path = %path.display(), accounts = store.len(), "loaded user store");
        Ok(store)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        let parsed: BTreeMap<String, AccountRecord> = serde_json::from_str(raw)?;
        let mut accounts = HashMap::with_capacity(parsed.len());
        for (key, record) in parsed {
            if key != record.uid.as_str() {
                return Err(StoreError::KeyMismatch {
                    key,
                    uid: record.uid,
                });
            }
            accounts.insert(key, record);
        }
        Ok(Self {
            accounts: Arc::new(accounts),
        })
    }

    /// Exact-match lookup; no normalization is applied to `uid`.
    pub fn resolve(&self, uid: &str) -> Result<&AccountRecord, LookupError> {
        self.accounts
            .get(uid)
            .ok_or_else(|| LookupError::NotFound(Uid::from(uid)))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn uids(&self) -> Vec<Uid> {
        let mut uids: Vec<Uid> = self.accounts.values().map(|r| r.uid.clone()).collect();
        uids.sort();
        uids
    }

    pub fn records(&self) -> impl Iterator<Item = &AccountRecord> {
        self.accounts.values()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
