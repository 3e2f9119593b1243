//! File-backed store versioning.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Schema version this build reads and writes.
pub const CURRENT_VERSION: f32 = 0.1;

/// Backend identifier written into new descriptors.
pub const STORE_TYPE: &str = "sled";

const DESCRIPTOR_NAME: &str = "sctdb.json";

/// A simple structure for file-backed datastore versioning and
/// configuration, persisted as `sctdb.json` next to the backend's files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    /// Schema version of the store layout.
    #[serde(rename = "version")]
    pub version: f32,
    /// Name of the key-value backend holding the data.
    #[serde(rename = "storeType")]
    pub store_type: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Descriptor {
    /// Opens the descriptor in `path`, creating one with the current version
    /// if none exists yet.
    pub fn create_or_open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let filename = path.join(DESCRIPTOR_NAME);

        if !filename.exists() {
            let descriptor = Descriptor {
                version: CURRENT_VERSION,
                store_type: STORE_TYPE.to_string(),
                path: path.to_path_buf(),
            };
            descriptor.save()?;
            return Ok(descriptor);
        }

        let data = fs::read(&filename)?;
        let mut descriptor: Descriptor = serde_json::from_slice(&data)?;
        descriptor.path = path.to_path_buf();
        Ok(descriptor)
    }

    /// Writes the descriptor to the filesystem.
    pub fn save(&self) -> StoreResult<()> {
        let filename = self.path.join(DESCRIPTOR_NAME);
        let data = serde_json::to_vec(self)?;
        fs::write(filename, data)?;
        Ok(())
    }

    /// Fails with [`StoreError::SchemaMismatch`] unless the descriptor
    /// version equals [`CURRENT_VERSION`].
    pub fn check_version(&self) -> StoreResult<()> {
        if self.version != CURRENT_VERSION {
            return Err(StoreError::SchemaMismatch {
                found: self.version,
                expected: CURRENT_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let created = Descriptor::create_or_open(dir.path()).unwrap();
        assert_eq!(created.version, CURRENT_VERSION);
        assert_eq!(created.store_type, STORE_TYPE);
        assert!(created.check_version().is_ok());

        let reopened = Descriptor::create_or_open(dir.path()).unwrap();
        assert_eq!(reopened.version, CURRENT_VERSION);
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DESCRIPTOR_NAME),
            r#"{"version": 99.0, "storeType": "sled"}"#,
        )
        .unwrap();

        let descriptor = Descriptor::create_or_open(dir.path()).unwrap();
        assert!(matches!(
            descriptor.check_version(),
            Err(StoreError::SchemaMismatch { .. })
        ));
    }
}
