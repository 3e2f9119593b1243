//! Thin wrapper over the sled backend.

use std::path::Path;

use sled::{Batch, Db, IVec, Tree};

use crate::error::{StoreError, StoreResult};

const DB_DIR: &str = "sct.db";

/// An ordered byte-key/byte-value store.
///
/// Wraps a single sled tree. sled holds a lock file for the lifetime of the
/// handle, so opening the same directory from a second process fails fast.
/// Read-only intent is enforced here: mutating calls on a read-only handle
/// return [`StoreError::ReadOnly`] before touching the backend.
#[derive(Clone)]
pub struct KvStore {
    db: Db,
    tree: Tree,
    read_only: bool,
}

impl KvStore {
    /// Opens (or creates) the store inside `path`.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool) -> StoreResult<Self> {
        let db_path = path.as_ref().join(DB_DIR);
        let db = sled::Config::new()
            .path(&db_path)
            .open()
            .map_err(|source| StoreError::Open {
                path: db_path.display().to_string(),
                source,
            })?;
        let tree = db.open_tree("components")?;
        Ok(Self {
            db,
            tree,
            read_only,
        })
    }

    /// Returns true if the store was opened read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Fetches the value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> StoreResult<Option<IVec>> {
        Ok(self.tree.get(key)?)
    }

    /// Applies a batch of writes atomically.
    ///
    /// Callers submit keys in strictly increasing order per batch; sled
    /// applies the whole batch or none of it.
    pub fn apply_batch(&self, batch: Batch) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.tree.apply_batch(batch)?;
        Ok(())
    }

    /// Lazily iterates every `(key, value)` pair whose key starts with
    /// `prefix`, in key order.
    pub fn scan_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> impl Iterator<Item = StoreResult<(IVec, IVec)>> + 'a {
        self.tree
            .scan_prefix(prefix)
            .map(|entry| entry.map_err(StoreError::from))
    }

    /// Counts the keys under `prefix`.
    pub fn count_prefix(&self, prefix: &[u8]) -> StoreResult<usize> {
        let mut count = 0;
        for entry in self.scan_prefix(prefix) {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Flushes buffered writes to disk and asks the backend to reclaim
    /// space. sled compacts incrementally, so this is a flush barrier.
    pub fn compact(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Flushes and releases the store. Also runs on drop; an explicit call
    /// surfaces flush errors instead of swallowing them.
    pub fn close(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("read_only", &self.read_only)
            .field("len", &self.tree.len())
            .finish()
    }
}
