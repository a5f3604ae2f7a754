//! In-process credential store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use lovan_types::error::StoreError;

use super::store::CredentialStore;

/// Keeps the credential blob in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    blob: Mutex<Option<String>>,
    fail_reads: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a blob already stored.
    pub fn with_blob(blob: &str) -> Self {
        Self {
            blob: Mutex::new(Some(blob.to_string())),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Current blob contents.
    pub fn blob(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }

    /// Make subsequent loads fail, simulating an unreadable store.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        let guard = self.blob.lock().map_err(|_| StoreError::Unavailable)?;
        Ok(guard.clone())
    }

    async fn save(&self, blob: &str) -> Result<(), StoreError> {
        let mut guard = self.blob.lock().map_err(|_| StoreError::Unavailable)?;
        *guard = Some(blob.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        let mut guard = self.blob.lock().map_err(|_| StoreError::Unavailable)?;
        *guard = None;
        Ok(())
    }
}
