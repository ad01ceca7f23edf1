//! Repository passphrase storage.

use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::RwLock;
use zeroize::Zeroizing;

/// Store for repository passphrases, keyed by service and account
pub trait SecretStore: Send + Sync {
    fn set_password(&self, service: &str, account: &str, secret: &str) -> Result<()>;
    fn get_password(&self, service: &str, account: &str) -> Result<Option<String>>;
    /// Returns whether an entry was removed
    fn delete_password(&self, service: &str, account: &str) -> Result<bool>;
}

/// Process-local store; secrets are wiped from memory when replaced or
/// dropped
#[derive(Default)]
pub struct MemoryKeyring {
    entries: RwLock<HashMap<(String, String), Zeroizing<String>>>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("MemoryKeyring").field("entries", &count).finish()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::SecretStore {
        reason: "keyring lock poisoned".to_string(),
    }
}

impl SecretStore for MemoryKeyring {
    fn set_password(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            (service.to_string(), account.to_string()),
            Zeroizing::new(secret.to_string()),
        );
        Ok(())
    }

    fn get_password(&self, service: &str, account: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .get(&(service.to_string(), account.to_string()))
            .map(|secret| secret.as_str().to_string()))
    }

    fn delete_password(&self, service: &str, account: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries
            .remove(&(service.to_string(), account.to_string()))
            .is_some())
    }
}
