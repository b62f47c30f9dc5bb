// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process memory of profile reachability and per-profile validation
//! toggles.
//!
//! Status entries and toggle settings have independent lifecycles: a
//! profile with validation disabled may still carry a status recorded
//! before it was disabled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of probing a profile's target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Active,
    Inactive,
    Unverified,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unverified => "unverified",
        }
    }

    /// Parse a status string reported by an API collaborator.
    pub fn from_probe(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Unverified,
        }
    }

    pub fn validity(&self) -> Validity {
        match self {
            Self::Active => Validity::Valid,
            Self::Inactive => Validity::Invalid,
            Self::Unverified => Validity::Unverified,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state flag other components read instead of re-deriving status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Validity {
    Valid,
    Invalid,
    #[default]
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationProfile {
    pub name: String,
    pub status: ValidationStatus,
}

impl ValidationProfile {
    pub fn new(name: impl Into<String>, status: ValidationStatus) -> Self {
        Self { name: name.into(), status }
    }

    pub fn unverified(name: impl Into<String>) -> Self {
        Self::new(name, ValidationStatus::Unverified)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSetting {
    pub name: String,
    pub setting: bool,
}

/// The "for validation" list plus validation toggles.
#[derive(Debug, Default)]
pub struct ValidationCache {
    profiles: Vec<ValidationProfile>,
    settings: Vec<ValidationSetting>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status: leave an identical entry, replace a differing entry
    /// in the same slot, otherwise append.
    pub fn merge(&mut self, entry: ValidationProfile) {
        match self.profiles.iter().position(|p| p.name == entry.name) {
            Some(idx) if self.profiles[idx].status == entry.status => {}
            Some(idx) => self.profiles[idx] = entry,
            None => self.profiles.push(entry),
        }
    }

    pub fn status(&self, name: &str) -> Option<ValidationStatus> {
        self.profiles.iter().find(|p| p.name == name).map(|p| p.status)
    }

    /// The cached entry for `name` if it is recorded active.
    pub fn cached_active(&self, name: &str) -> Option<ValidationProfile> {
        self.profiles
            .iter()
            .find(|p| p.name == name && p.status == ValidationStatus::Active)
            .cloned()
    }

    /// Drop every status entry for `name` so the next check re-probes.
    pub fn purge(&mut self, name: &str) {
        self.profiles.retain(|p| p.name != name);
    }

    /// Forget all statuses. Settings survive.
    pub fn clear_statuses(&mut self) {
        self.profiles.clear();
    }

    pub fn profiles(&self) -> &[ValidationProfile] {
        &self.profiles
    }

    pub fn setting(&self, name: &str) -> Option<bool> {
        self.settings.iter().find(|s| s.name == name).map(|s| s.setting)
    }

    /// Insert or replace in place the toggle for `name`.
    pub fn set_setting(&mut self, name: &str, setting: bool) -> ValidationSetting {
        let entry = ValidationSetting { name: name.to_owned(), setting };
        match self.settings.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.setting = setting,
            None => self.settings.push(entry.clone()),
        }
        entry
    }

    pub fn settings(&self) -> &[ValidationSetting] {
        &self.settings
    }

    /// Remove all knowledge of `name`, used when the profile is deleted.
    pub fn forget(&mut self, name: &str) {
        self.purge(name);
        self.settings.retain(|s| s.name != name);
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
