// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named connection profiles and the authoritative in-memory profile table.
//!
//! The table is rebuilt from the config layers on every refresh. Tree nodes
//! and other views hold only the profile name and re-read from here after a
//! mutation.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// Type tag of the profile holding credentials shared by service profiles.
pub const BASE_TYPE: &str = "base";

/// Connection attributes of a profile after layer merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_unauthorized: Option<bool>,
    /// Extender-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileAttrs {
    /// Build from a flat map of merged property values. A known field whose
    /// value has the wrong shape is kept in `extra` instead.
    pub fn from_values(values: &IndexMap<String, Value>) -> Self {
        let mut known = Map::new();
        let mut rejected = Map::new();
        for (key, value) in values {
            let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
            match serde_json::from_value::<Self>(single) {
                Ok(_) => {
                    known.insert(key.clone(), value.clone());
                }
                Err(e) => {
                    tracing::warn!(field = %key, err = %e, "profile attribute has unexpected type");
                    rejected.insert(key.clone(), value.clone());
                }
            }
        }
        let mut attrs = serde_json::from_value::<Self>(Value::Object(known)).unwrap_or_default();
        attrs.extra.extend(rejected);
        attrs
    }

    pub fn has_credentials(&self) -> bool {
        self.user.is_some() && self.password.is_some()
    }

    pub fn has_token(&self) -> bool {
        self.token_type.is_some() || self.token_value.is_some()
    }

    /// Clear the token fields in place.
    pub fn clear_token(&mut self) {
        self.token_type = None;
        self.token_value = None;
        self.token_expiration = None;
    }
}

/// Authentication mode derived from a profile's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Basic,
    Token,
    Unset,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Token => "token",
            Self::Unset => "unset",
        }
    }

    pub fn of(attrs: &ProfileAttrs) -> Self {
        match (attrs.has_credentials(), attrs.has_token()) {
            (true, false) => Self::Basic,
            (false, true) => Self::Token,
            (true, true) => {
                tracing::warn!("profile carries both credentials and a token");
                Self::Basic
            }
            (false, false) => Self::Unset,
        }
    }
}

/// A profile as loaded from the config layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Full dotted name, e.g. `lpar1.zosmf`.
    pub name: String,
    #[serde(rename = "type")]
    pub profile_type: String,
    #[serde(default)]
    pub attrs: ProfileAttrs,
}

impl Profile {
    pub fn new(name: impl Into<String>, profile_type: impl Into<String>, attrs: ProfileAttrs) -> Self {
        Self { name: name.into(), profile_type: profile_type.into(), attrs }
    }

    pub fn auth_mode(&self) -> AuthMode {
        AuthMode::of(&self.attrs)
    }

    /// Both user and password are present.
    pub fn is_using_basic_auth(&self) -> bool {
        self.attrs.has_credentials()
    }
}

/// Authoritative in-memory profile table.
#[derive(Debug, Default)]
pub struct ProfileTable {
    inner: RwLock<TableInner>,
}

#[derive(Debug, Default)]
struct TableInner {
    profiles: IndexMap<String, Profile>,
    /// Profile type to default profile name.
    defaults: HashMap<String, String>,
}

impl ProfileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all profiles and defaults.
    pub async fn replace(&self, profiles: Vec<Profile>, defaults: HashMap<String, String>) {
        let mut inner = self.inner.write().await;
        inner.profiles = profiles.into_iter().map(|p| (p.name.clone(), p)).collect();
        inner.defaults = defaults;
    }

    pub async fn get(&self, name: &str) -> Option<Profile> {
        self.inner.read().await.profiles.get(name).cloned()
    }

    /// Look a profile up by name, optionally requiring a type.
    pub async fn load_named(&self, name: &str, profile_type: Option<&str>) -> anyhow::Result<Profile> {
        let inner = self.inner.read().await;
        inner
            .profiles
            .get(name)
            .filter(|p| profile_type.is_none_or(|t| p.profile_type == t))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Could not find profile named: {name}."))
    }

    pub async fn all(&self) -> Vec<Profile> {
        self.inner.read().await.profiles.values().cloned().collect()
    }

    pub async fn names(&self) -> Vec<String> {
        self.inner.read().await.profiles.keys().cloned().collect()
    }

    pub async fn by_type(&self, profile_type: &str) -> Vec<Profile> {
        let inner = self.inner.read().await;
        inner.profiles.values().filter(|p| p.profile_type == profile_type).cloned().collect()
    }

    pub async fn default_profile(&self, profile_type: &str) -> Option<Profile> {
        let inner = self.inner.read().await;
        let name = inner.defaults.get(profile_type)?;
        inner.profiles.get(name).cloned()
    }

    pub async fn base_profile(&self) -> Option<Profile> {
        self.default_profile(BASE_TYPE).await
    }

    /// Insert or replace a single profile.
    pub async fn upsert(&self, profile: Profile) {
        self.inner.write().await.profiles.insert(profile.name.clone(), profile);
    }

    /// Mutate a profile's attributes in place. Returns the updated profile.
    pub async fn update_attrs(
        &self,
        name: &str,
        f: impl FnOnce(&mut ProfileAttrs),
    ) -> Option<Profile> {
        let mut inner = self.inner.write().await;
        let profile = inner.profiles.get_mut(name)?;
        f(&mut profile.attrs);
        Some(profile.clone())
    }

    /// Remove a profile and any default pointing at it.
    pub async fn remove(&self, name: &str) -> Option<Profile> {
        let mut inner = self.inner.write().await;
        inner.defaults.retain(|_, v| v != name);
        inner.profiles.shift_remove(name)
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
