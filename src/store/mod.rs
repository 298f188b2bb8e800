//! Run State Store
//!
//! The shared key-value register every worker and user-facing process
//! reads run progress from. The driver is the only writer of status;
//! other processes write pending input and the stop flag.
//!
//! # Components
//!
//! - [`StateStore`]: raw key-value backend trait
//! - [`RunStore`]: typed client scoped to one run
//! - [`MemoryStore`]: in-process backend
//! - [`FileStore`]: directory-backed backend usable across processes

pub mod client;
pub mod file;
pub mod memory;

use std::io;

use thiserror::Error;

pub use client::{RunStore, StatusRecord};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by state store access.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A shared last-writer-wins key-value register.
///
/// Implementations must give read-your-writes consistency for a single key.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Reads a value and removes it.
    ///
    /// The default is a plain get followed by delete; backends that can
    /// do better should make this atomic.
    fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self.get(key)?;
        if value.is_some() {
            self.delete(key)?;
        }
        Ok(value)
    }
}
