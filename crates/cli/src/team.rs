// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered team configuration.
//!
//! Loads every candidate layer, answers "where does this profile live" and
//! "which value of each property wins", and applies mutations to one active
//! layer at a time. Secure property values are kept in memory alongside
//! plaintext ones and split out to the [`CredentialVault`] on save.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::layer::{ConfigLayer, LayerRoots};
use crate::profile::BASE_TYPE;
use crate::vault::CredentialVault;

/// Where a profile object physically lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLocation {
    /// Dotted JSON path of the profile object, e.g. `profiles.lpar1`.
    pub json_loc: String,
    /// Layer file holding it.
    pub os_loc: PathBuf,
    pub global: bool,
    pub user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgLoc {
    /// Dotted JSON path of the property, e.g. `profiles.lpar1.properties.user`.
    pub json_loc: String,
    pub os_loc: PathBuf,
}

/// One resolved profile property and the location it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownArg {
    pub arg_name: String,
    pub arg_value: Value,
    pub arg_loc: ArgLoc,
    pub secure: bool,
}

/// A typed profile found in some layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub name: String,
    pub profile_type: String,
}

/// JSON path of the profile object for a dotted profile name.
pub fn profile_json_loc(name: &str) -> String {
    name.split('.').map(|part| format!("profiles.{part}")).collect::<Vec<_>>().join(".")
}

#[derive(Debug)]
pub struct TeamConfig {
    roots: LayerRoots,
    /// Highest precedence first.
    layers: Vec<ConfigLayer>,
    dirty: Vec<bool>,
    /// Layers whose vault entry could not be read. Saving them would
    /// replace the entry with a partial set.
    unreadable: Vec<bool>,
    active: usize,
    vault: Arc<dyn CredentialVault>,
}

impl TeamConfig {
    /// Read all candidate layers under `roots`.
    pub fn load(roots: LayerRoots, vault: Arc<dyn CredentialVault>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut unreadable = Vec::new();
        for (path, global, user) in roots.candidates() {
            let mut layer = ConfigLayer::load(path, global, user)?;
            let mut failed = false;
            if layer.exists {
                let key = layer.path.to_string_lossy().into_owned();
                match vault.load(&key) {
                    Ok(values) => {
                        for (path, value) in values {
                            set_path(&mut layer.properties, &path, value);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(layer = %key, err = %e, "failed to read secure values");
                        failed = true;
                    }
                }
            }
            layers.push(layer);
            unreadable.push(failed);
        }
        let active = layers.iter().position(|l| l.exists && !l.user).unwrap_or(0);
        let dirty = vec![false; layers.len()];
        Ok(Self { roots, layers, dirty, unreadable, active, vault })
    }

    pub fn roots(&self) -> &LayerRoots {
        &self.roots
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Layers that exist on disk, highest precedence first.
    pub fn existing_layers(&self) -> Vec<ConfigLayer> {
        self.layers.iter().filter(|l| l.exists).cloned().collect()
    }

    pub fn active_layer(&self) -> &ConfigLayer {
        &self.layers[self.active]
    }

    /// Select the layer subsequent mutations apply to.
    pub fn activate(&mut self, user: bool, global: bool) -> anyhow::Result<()> {
        match self.layers.iter().position(|l| l.user == user && l.global == global) {
            Some(idx) => {
                self.active = idx;
                Ok(())
            }
            None => anyhow::bail!("no {} config layer is available", scope_name(user, global)),
        }
    }

    /// All typed profiles across layers, with higher layers deciding the type.
    pub fn all_profiles(&self) -> Vec<ProfileEntry> {
        let mut found: IndexMap<String, String> = IndexMap::new();
        for layer in self.layers.iter().rev().filter(|l| l.exists) {
            if let Some(profiles) = layer.properties.get("profiles") {
                collect_profiles(profiles, None, &mut found);
            }
        }
        found.into_iter().map(|(name, profile_type)| ProfileEntry { name, profile_type }).collect()
    }

    /// Profile type to default profile name, merged by precedence.
    pub fn defaults(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for layer in self.layers.iter().rev().filter(|l| l.exists) {
            if let Some(Value::Object(defaults)) = layer.properties.get("defaults") {
                for (ty, name) in defaults {
                    if let Some(name) = name.as_str() {
                        out.insert(ty.clone(), name.to_owned());
                    }
                }
            }
        }
        out
    }

    pub fn default_base(&self) -> Option<String> {
        self.defaults().remove(BASE_TYPE)
    }

    /// Highest-precedence layer location of the profile object.
    pub fn profile_location(&self, name: &str) -> Option<ProfileLocation> {
        let json_loc = profile_json_loc(name);
        self.layers
            .iter()
            .filter(|l| l.exists)
            .find(|l| get_path(&l.properties, &json_loc).is_some_and(Value::is_object))
            .map(|l| ProfileLocation {
                json_loc: json_loc.clone(),
                os_loc: l.path.clone(),
                global: l.global,
                user: l.user,
            })
    }

    pub fn profile_type(&self, name: &str) -> Option<String> {
        let json_loc = format!("{}.type", profile_json_loc(name));
        self.layers
            .iter()
            .filter(|l| l.exists)
            .find_map(|l| get_path(&l.properties, &json_loc).and_then(Value::as_str))
            .map(str::to_owned)
    }

    /// Resolve every property of the profile. The default base profile is
    /// applied first, then parent profiles, then the profile itself; lower
    /// layers first within each.
    pub fn merge_args(&self, name: &str) -> Vec<KnownArg> {
        let mut chain = Vec::new();
        if let Some(base) = self.default_base() {
            if base != name && !name.starts_with(&format!("{base}.")) {
                chain.push(base);
            }
        }
        let parts: Vec<&str> = name.split('.').collect();
        for depth in 1..=parts.len() {
            chain.push(parts[..depth].join("."));
        }

        let mut args: IndexMap<String, KnownArg> = IndexMap::new();
        for profile in &chain {
            let json_loc = profile_json_loc(profile);
            for layer in self.layers.iter().rev().filter(|l| l.exists) {
                let Some(obj) = get_path(&layer.properties, &json_loc) else { continue };
                let secure = string_list(obj.get("secure"));
                let Some(Value::Object(props)) = obj.get("properties") else { continue };
                for (arg_name, arg_value) in props {
                    args.insert(
                        arg_name.clone(),
                        KnownArg {
                            arg_name: arg_name.clone(),
                            arg_value: arg_value.clone(),
                            arg_loc: ArgLoc {
                                json_loc: format!("{json_loc}.properties.{arg_name}"),
                                os_loc: layer.path.clone(),
                            },
                            secure: secure.contains(arg_name),
                        },
                    );
                }
            }
        }
        args.into_values().collect()
    }

    /// Merged property values of the profile.
    pub fn merged_values(&self, name: &str) -> IndexMap<String, Value> {
        self.merge_args(name).into_iter().map(|a| (a.arg_name, a.arg_value)).collect()
    }

    /// Secure property names declared on the profile or its parents.
    pub fn secure_props(&self, name: &str) -> Vec<String> {
        let parts: Vec<&str> = name.split('.').collect();
        let mut out: Vec<String> = Vec::new();
        for depth in 1..=parts.len() {
            let json_loc = profile_json_loc(&parts[..depth].join("."));
            for layer in self.layers.iter().filter(|l| l.exists) {
                let Some(obj) = get_path(&layer.properties, &json_loc) else { continue };
                for prop in string_list(obj.get("secure")) {
                    if !out.contains(&prop) {
                        out.push(prop);
                    }
                }
            }
        }
        out
    }

    /// Read a value from the active layer.
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.layers[self.active].properties, path)
    }

    /// Set a value in the active layer.
    pub fn set(&mut self, path: &str, value: Value) {
        set_path(&mut self.layers[self.active].properties, path, value);
        self.dirty[self.active] = true;
    }

    /// Delete a value from the active layer. Returns whether it existed.
    pub fn delete(&mut self, path: &str) -> bool {
        let removed = delete_path(&mut self.layers[self.active].properties, path);
        if removed {
            self.dirty[self.active] = true;
        }
        removed
    }

    /// Set one property of a profile in the layer that holds it, adding
    /// it to or removing it from the profile's secure list.
    pub fn update_property(
        &mut self,
        name: &str,
        property: &str,
        value: Value,
        secure: bool,
    ) -> anyhow::Result<()> {
        let loc = self
            .profile_location(name)
            .ok_or_else(|| anyhow::anyhow!("Could not find profile named: {name}."))?;
        self.activate(loc.user, loc.global)?;
        self.set(&format!("{}.properties.{property}", loc.json_loc), value);
        let secure_path = format!("{}.secure", loc.json_loc);
        let mut list = string_list(self.get(&secure_path));
        let listed = list.iter().any(|p| p == property);
        if secure && !listed {
            list.push(property.to_owned());
            self.set(&secure_path, list_value(&list));
        } else if !secure && listed {
            list.retain(|p| p != property);
            self.set(&secure_path, list_value(&list));
        }
        Ok(())
    }

    /// Remove a profile object and any default naming it from its layer.
    pub fn delete_profile(&mut self, name: &str) -> anyhow::Result<ProfileLocation> {
        let loc = self
            .profile_location(name)
            .ok_or_else(|| anyhow::anyhow!("Could not find profile named: {name}."))?;
        self.activate(loc.user, loc.global)?;
        self.delete(&loc.json_loc);
        let stale: Vec<String> = match self.get("defaults") {
            Some(Value::Object(defaults)) => defaults
                .iter()
                .filter(|(_, v)| v.as_str() == Some(name))
                .map(|(k, _)| k.clone())
                .collect(),
            _ => Vec::new(),
        };
        for ty in stale {
            self.delete(&format!("defaults.{ty}"));
        }
        Ok(loc)
    }

    /// Merge `incoming` into the active layer. Values already present win.
    pub fn merge(&mut self, incoming: &Value) {
        let layer = &mut self.layers[self.active];
        merge_missing(&mut layer.properties, incoming);
        self.dirty[self.active] = true;
    }

    /// Write every modified layer, moving secure values into the vault.
    /// Fails without writing anything if a modified layer's secure values
    /// could not be read at load time.
    pub fn save(&mut self) -> anyhow::Result<()> {
        let extract = self.vault.enabled();
        if extract {
            if let Some(idx) = (0..self.layers.len()).find(|&i| self.dirty[i] && self.unreadable[i]) {
                anyhow::bail!(
                    "secure values of {} could not be read; not saving over them",
                    self.layers[idx].path.display()
                );
            }
        }
        for idx in 0..self.layers.len() {
            if !self.dirty[idx] {
                continue;
            }
            let layer = &mut self.layers[idx];
            let mut plain = layer.properties.clone();
            let mut secrets = Map::new();
            let mut secure_paths = Vec::new();
            if let Some(profiles) = layer.properties.get("profiles").filter(|_| extract) {
                collect_secure_paths(profiles, "profiles", &mut secure_paths);
            }
            for path in secure_paths {
                if let Some(value) = get_path(&plain, &path).cloned() {
                    delete_path(&mut plain, &path);
                    secrets.insert(path, value);
                }
            }
            layer.write(&plain)?;
            let key = layer.path.to_string_lossy().into_owned();
            self.vault.store(&key, &secrets)?;
            tracing::debug!(layer = %key, secure = secrets.len(), "saved config layer");
            self.dirty[idx] = false;
        }
        Ok(())
    }
}

fn scope_name(user: bool, global: bool) -> &'static str {
    match (global, user) {
        (true, true) => "global user",
        (true, false) => "global team",
        (false, true) => "project user",
        (false, false) => "project team",
    }
}

fn collect_profiles(profiles: &Value, prefix: Option<&str>, out: &mut IndexMap<String, String>) {
    let Value::Object(map) = profiles else { return };
    for (key, obj) in map {
        let name = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        if let Some(ty) = obj.get("type").and_then(Value::as_str) {
            out.insert(name.clone(), ty.to_owned());
        }
        if let Some(nested) = obj.get("profiles") {
            collect_profiles(nested, Some(&name), out);
        }
    }
}

fn collect_secure_paths(profiles: &Value, prefix: &str, out: &mut Vec<String>) {
    let Value::Object(map) = profiles else { return };
    for (key, obj) in map {
        let loc = format!("{prefix}.{key}");
        for prop in string_list(obj.get("secure")) {
            out.push(format!("{loc}.properties.{prop}"));
        }
        if let Some(nested) = obj.get("profiles") {
            collect_secure_paths(nested, &format!("{loc}.profiles"), out);
        }
    }
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => {
            items.iter().filter_map(Value::as_str).map(str::to_owned).collect()
        }
        _ => Vec::new(),
    }
}

pub(crate) fn list_value(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

pub(crate) fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, key| node.get(key))
}

pub(crate) fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { return };
        if keys.peek().is_none() {
            map.insert(key.to_owned(), value);
            return;
        }
        node = map.entry(key.to_owned()).or_insert_with(|| Value::Object(Map::new()));
    }
}

pub(crate) fn delete_path(root: &mut Value, path: &str) -> bool {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (parent, leaf),
        None => ("", path),
    };
    let container = if parent.is_empty() {
        Some(root)
    } else {
        parent.split('.').try_fold(root, |node, key| node.get_mut(key))
    };
    match container {
        Some(Value::Object(map)) => map.shift_remove(leaf).is_some(),
        _ => false,
    }
}

fn merge_missing(target: &mut Value, incoming: &Value) {
    let (Value::Object(target), Value::Object(incoming)) = (target, incoming) else { return };
    for (key, value) in incoming {
        match target.get_mut(key) {
            Some(existing) if existing.is_object() && value.is_object() => {
                merge_missing(existing, value)
            }
            Some(_) => {}
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "team_tests.rs"]
mod tests;
