//! Directory-Backed State Store
//!
//! Stores one file per key under a root directory so separate processes
//! (the driver, a CLI supplying input, a status poller) can share run
//! state on one machine.
//!
//! Writes go through a temporary file and a rename, so readers never see
//! a half-written value. `take` renames the file away before reading it,
//! which means two processes can never consume the same input.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use super::{StateStore, StoreError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("Opened file store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_key(key))
    }

    fn scratch_path(&self, key: &str, suffix: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(
            ".{}.{}.{}.{}",
            encode_key(key),
            std::process::id(),
            n,
            suffix
        ))
    }
}

/// Maps a key to a file name. Anything outside `[A-Za-z0-9_-]` is
/// percent-encoded so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-' => name.push(byte as char),
            _ => name.push_str(&format!("%{:02X}", byte)),
        }
    }
    name
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let temp = self.scratch_path(key, "tmp");
        fs::write(&temp, value)?;
        if let Err(e) = fs::rename(&temp, self.path_for(key)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let claimed = self.scratch_path(key, "taken");
        match fs::rename(self.path_for(key), &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let content = fs::read_to_string(&claimed)?;
        fs::remove_file(&claimed)?;
        Ok(Some(content))
    }
}
