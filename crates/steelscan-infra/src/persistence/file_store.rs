//! File-based key-value store
//!
//! One pretty-printed JSON document per key in the store directory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use steelscan_domain::repository::{KeyValueStore, StoreKey};
use steelscan_types::{Result, StoreError};
use tracing::debug;

pub struct FileKeyValueStore {
    store_dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open (and create if needed) a store directory
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        Ok(Self { store_dir })
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: StoreKey) -> PathBuf {
        self.store_dir.join(format!("{}.json", key.as_str()))
    }

    fn io_error(key: StoreKey, err: impl ToString) -> StoreError {
        StoreError::Io {
            key: key.as_str().to_string(),
            message: err.to_string(),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn load(&self, key: StoreKey) -> std::result::Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(key, e)),
        };

        let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            StoreError::Corrupted {
                key: key.as_str().to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Some(value))
    }

    fn save(&mut self, key: StoreKey, value: &Value) -> std::result::Result<(), StoreError> {
        let path = self.path_for(key);
        // Write beside the target, then rename over it
        let tmp_path = path.with_extension("json.tmp");

        let file = File::create(&tmp_path).map_err(|e| Self::io_error(key, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| Self::io_error(key, e))?;
        writer.flush().map_err(|e| Self::io_error(key, e))?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| Self::io_error(key, e))?;
        debug!(key = %key, path = %path.display(), "collection saved");
        Ok(())
    }
}
