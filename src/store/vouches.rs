//! File-backed vouch store.
//!
//! The whole map lives in memory and is rewritten to disk after every
//! mutation. A user missing from the map and a user with an empty list are
//! the same thing to every reader.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::record::VouchRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid vouch index {index} (user has {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

type VouchMap = BTreeMap<String, Vec<VouchRecord>>;

/// Vouch store bound to its backing file.
#[derive(Debug)]
pub struct VouchStore {
    path: PathBuf,
    vouches: VouchMap,
}

impl VouchStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store without touching disk. Content
    /// that is not a JSON object is discarded and an empty store is written
    /// back in its place.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            tracing::info!("No vouch store at {}, starting empty", path.display());
            return Ok(Self {
                path,
                vouches: VouchMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        match parse_vouches(&content) {
            Some(vouches) => {
                tracing::info!(
                    "Loaded {} vouches for {} users from {}",
                    vouches.values().map(Vec::len).sum::<usize>(),
                    vouches.len(),
                    path.display()
                );
                Ok(Self { path, vouches })
            }
            None => {
                tracing::warn!(
                    "Failed to parse {}, resetting to an empty store",
                    path.display()
                );
                let store = Self {
                    path,
                    vouches: VouchMap::new(),
                };
                store.persist()?;
                Ok(store)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a vouch for `user_id` and persist.
    pub fn append(&mut self, user_id: &str, record: VouchRecord) -> Result<()> {
        self.mutate(|map| {
            map.entry(user_id.to_string()).or_default().push(record);
            Ok(())
        })
    }

    /// Append several vouches for `user_id` with a single write.
    pub fn append_all(&mut self, user_id: &str, records: Vec<VouchRecord>) -> Result<usize> {
        let added = records.len();
        self.mutate(|map| {
            map.entry(user_id.to_string()).or_default().extend(records);
            Ok(added)
        })
    }

    /// Remove the vouch at 1-based `index` and persist, returning it.
    pub fn remove_at(&mut self, user_id: &str, index: usize) -> Result<VouchRecord> {
        self.mutate(|map| {
            let list = map.get_mut(user_id);
            let len = list.as_ref().map_or(0, |l| l.len());
            match list {
                Some(list) if (1..=len).contains(&index) => Ok(list.remove(index - 1)),
                _ => Err(StoreError::InvalidIndex { index, len }),
            }
        })
    }

    /// Empty the user's list and persist, returning how many were removed.
    pub fn clear(&mut self, user_id: &str) -> Result<usize> {
        self.mutate(|map| {
            let removed = map.get(user_id).map_or(0, Vec::len);
            map.insert(user_id.to_string(), Vec::new());
            Ok(removed)
        })
    }

    pub fn count_of(&self, user_id: &str) -> usize {
        self.vouches.get(user_id).map_or(0, Vec::len)
    }

    pub fn list_of(&self, user_id: &str) -> &[VouchRecord] {
        self.vouches
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Users with at least one vouch, with their counts.
    pub fn users(&self) -> Vec<(&str, usize)> {
        self.vouches
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(id, list)| (id.as_str(), list.len()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.vouches.values().map(Vec::len).sum()
    }

    /// Overwrite the backing file with the full map.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.vouches)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!("Persisted vouch store to {}", self.path.display());
        Ok(())
    }

    /// Apply `f`, then persist. Failed mutations or writes leave the map as it was.
    fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut VouchMap) -> Result<T>,
    {
        let snapshot = self.vouches.clone();
        let out = match f(&mut self.vouches) {
            Ok(out) => out,
            Err(e) => {
                self.vouches = snapshot;
                return Err(e);
            }
        };
        if let Err(e) = self.persist() {
            tracing::error!("Failed to persist vouch store: {}", e);
            self.vouches = snapshot;
            return Err(e);
        }
        Ok(out)
    }
}

/// Parse the store file. `None` means the content is unusable as a whole.
///
/// Individual users whose value is not a list of records are dropped so one
/// bad entry does not cost everyone else their vouches.
fn parse_vouches(content: &str) -> Option<VouchMap> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    let object = match value {
        serde_json::Value::Object(object) => object,
        _ => return None,
    };

    let mut vouches = VouchMap::new();
    for (user_id, entry) in object {
        match Vec::<VouchRecord>::deserialize(entry) {
            Ok(list) => {
                vouches.insert(user_id, list);
            }
            Err(e) => {
                tracing::warn!("Dropping malformed vouches for user {}: {}", user_id, e);
            }
        }
    }
    Some(vouches)
}
