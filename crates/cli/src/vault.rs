// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential vault holding secure property values of config layers.
//!
//! Each layer file owns one vault entry, keyed by its path, whose secret is
//! a JSON object mapping a property's JSON path to its value.

use std::collections::HashMap;

use keyring::Entry;
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// Keyring service name for secure config values.
pub const VAULT_SERVICE: &str = "Zowe";

/// Storage for per-layer secure values.
pub trait CredentialVault: Send + Sync + std::fmt::Debug {
    /// Secure values for the layer at `key`, or an empty map.
    fn load(&self, key: &str) -> anyhow::Result<Map<String, Value>>;
    /// Replace the secure values for `key`. An empty map removes the entry.
    fn store(&self, key: &str, values: &Map<String, Value>) -> anyhow::Result<()>;
    /// Whether secure values are moved out of layer files on save.
    fn enabled(&self) -> bool {
        true
    }
}

/// Vault backed by the operating system credential store.
#[derive(Debug, Clone)]
pub struct KeyringVault {
    service: String,
}

impl Default for KeyringVault {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringVault {
    pub fn new() -> Self {
        Self { service: VAULT_SERVICE.to_owned() }
    }
}

impl CredentialVault for KeyringVault {
    fn load(&self, key: &str) -> anyhow::Result<Map<String, Value>> {
        let entry = Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(secret) => Ok(serde_json::from_str(&secret)?),
            Err(keyring::Error::NoEntry) => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &str, values: &Map<String, Value>) -> anyhow::Result<()> {
        let entry = Entry::new(&self.service, key)?;
        if values.is_empty() {
            return match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e.into()),
            };
        }
        entry.set_password(&serde_json::to_string(values)?)?;
        tracing::debug!(layer = key, count = values.len(), "stored secure values");
        Ok(())
    }
}

/// Process-local vault, used when secure storage is disabled and in tests.
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Mutex<HashMap<String, Map<String, Value>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of layers holding secure values.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CredentialVault for MemoryVault {
    fn load(&self, key: &str) -> anyhow::Result<Map<String, Value>> {
        Ok(self.entries.lock().get(key).cloned().unwrap_or_default())
    }

    fn store(&self, key: &str, values: &Map<String, Value>) -> anyhow::Result<()> {
        let mut entries = self.entries.lock();
        if values.is_empty() {
            entries.remove(key);
        } else {
            entries.insert(key.to_owned(), values.clone());
        }
        Ok(())
    }
}

/// Vault used when secure storage is turned off. Secure values stay in the
/// layer files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledVault;

impl CredentialVault for DisabledVault {
    fn load(&self, _key: &str) -> anyhow::Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn store(&self, _key: &str, _values: &Map<String, Value>) -> anyhow::Result<()> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}
