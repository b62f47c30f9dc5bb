// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The profile engine: the in-memory profile table, the validation cache,
//! and the operations UI actions call before touching a profile.
//!
//! Authentication switching lives in [`crate::auth`], config layer
//! operations in [`crate::resolver`], and the shared error path in
//! [`crate::handling`]; all are methods on [`Profiles`].

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::context::ExplorerContext;
use crate::error::ConfigError;
use crate::event::ProfileEvent;
use crate::gui::{InputOptions, OPERATION_CANCELLED};
use crate::profile::{Profile, ProfileAttrs, ProfileTable, BASE_TYPE};
use crate::schema::ProfileTypeConfig;
use crate::team::TeamConfig;
use crate::tree::TreeKind;
use crate::validation::{ValidationCache, ValidationProfile, ValidationSetting, ValidationStatus, Validity};

pub const CREATE_CONFIG_ITEM: &str = "+ Create a New Team Configuration File";
pub const EDIT_CONFIG_ITEM: &str = "Edit Team Configuration File";

/// User and password collected by a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

pub struct Profiles {
    pub(crate) ctx: Arc<ExplorerContext>,
    pub(crate) table: ProfileTable,
    pub(crate) validation: RwLock<ValidationCache>,
    valid_profile: RwLock<Validity>,
    pub(crate) extender_types: RwLock<Vec<ProfileTypeConfig>>,
}

impl std::fmt::Debug for Profiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiles").field("ctx", &self.ctx).finish()
    }
}

impl Profiles {
    pub fn new(ctx: Arc<ExplorerContext>) -> Self {
        Self {
            ctx,
            table: ProfileTable::new(),
            validation: RwLock::new(ValidationCache::new()),
            valid_profile: RwLock::new(Validity::default()),
            extender_types: RwLock::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &ExplorerContext {
        &self.ctx
    }

    pub fn table(&self) -> &ProfileTable {
        &self.table
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.ctx.events.subscribe()
    }

    /// Fresh read of every config layer.
    pub fn team_config(&self) -> Result<TeamConfig, ConfigError> {
        TeamConfig::load(self.ctx.settings.roots.clone(), Arc::clone(&self.ctx.vault))
    }

    /// Resolve one profile from the layers.
    fn resolve(team: &TeamConfig, name: &str, profile_type: &str) -> Profile {
        Profile::new(name, profile_type, ProfileAttrs::from_values(&team.merged_values(name)))
    }

    /// Rebuild the profile table from disk and forget cached statuses.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let team = self.team_config()?;
        let mut types = self.ctx.register.registered_types();
        types.push(BASE_TYPE.to_owned());
        let profiles: Vec<Profile> = team
            .all_profiles()
            .into_iter()
            .filter(|entry| types.contains(&entry.profile_type))
            .map(|entry| Self::resolve(&team, &entry.name, &entry.profile_type))
            .collect();
        let count = profiles.len();
        for profile in &profiles {
            self.ctx.trees.sync_profile(profile);
        }
        self.table.replace(profiles, team.defaults()).await;
        self.validation.write().await.clear_statuses();
        info!(profiles = count, "profile table refreshed");
        self.ctx.emit(ProfileEvent::Reload);
        Ok(())
    }

    pub async fn load_named_profile(&self, name: &str, profile_type: Option<&str>) -> anyhow::Result<Profile> {
        self.table.load_named(name, profile_type).await
    }

    pub async fn default_profile(&self, profile_type: &str) -> Option<Profile> {
        self.table.default_profile(profile_type).await
    }

    /// Re-read one profile from disk into the table and every tree node.
    pub async fn update_cached_profile(&self, name: &str) -> anyhow::Result<Option<Profile>> {
        let team = self.team_config()?;
        let Some(profile_type) = team.profile_type(name) else {
            self.table.remove(name).await;
            return Ok(None);
        };
        let profile = Self::resolve(&team, name, &profile_type);
        self.table.upsert(profile.clone()).await;
        self.ctx.trees.sync_profile(&profile);
        Ok(Some(profile))
    }

    /// Token auth: the profile lists `tokenValue` as secure and is not basic,
    /// or the default base profile does and this profile is not basic.
    /// Basic means the profile lists both `user` and `password` as secure.
    pub async fn is_using_token_auth(&self, name: &str) -> anyhow::Result<bool> {
        let team = self.team_config()?;
        let secure = team.secure_props(name);
        let base_secure = team.default_base().map(|b| team.secure_props(&b)).unwrap_or_default();
        Ok(using_token_auth(&secure, &base_secure))
    }

    pub async fn secure_props_for_profile(&self, name: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.team_config()?.secure_props(name))
    }

    /// Decide, before running an operation, whether the profile is usable:
    /// log in for a token profile without a token, prompt for missing
    /// credentials of a basic profile, else probe.
    pub async fn check_current_profile(&self, profile: &Profile) -> ValidationProfile {
        let name = profile.name.as_str();
        let uses_token = match self.is_using_token_auth(name).await {
            Ok(v) => v,
            Err(e) => {
                warn!(profile = name, err = %e, "could not read secure properties");
                false
            }
        };

        let result = if uses_token && profile.attrs.token_value.is_none() {
            self.validation.write().await.purge(name);
            if self.sso_login(name).await {
                match self.update_cached_profile(name).await {
                    Ok(Some(reloaded)) => self.get_profile_setting(&reloaded).await,
                    Ok(None) => ValidationProfile::unverified(name),
                    Err(e) => {
                        self.error_handling(&e, Some(name), None).await;
                        ValidationProfile::unverified(name)
                    }
                }
            } else {
                ValidationProfile::unverified(name)
            }
        } else if !uses_token && (profile.attrs.user.is_none() || profile.attrs.password.is_none()) {
            self.validation.write().await.purge(name);
            match self.prompt_credentials(name, false).await {
                Some(creds) => {
                    let mut updated = profile.clone();
                    updated.attrs.user = Some(creds.user);
                    updated.attrs.password = Some(creds.password);
                    self.get_profile_setting(&updated).await
                }
                None => ValidationProfile::unverified(name),
            }
        } else {
            self.get_profile_setting(profile).await
        };

        *self.valid_profile.write().await = result.status.validity();
        result
    }

    /// Status of the last [`Profiles::check_current_profile`].
    pub async fn valid_profile(&self) -> Validity {
        *self.valid_profile.read().await
    }

    /// Honor a disabled validation toggle, else probe.
    pub async fn get_profile_setting(&self, profile: &Profile) -> ValidationProfile {
        let disabled = self.validation.read().await.setting(&profile.name) == Some(false);
        if disabled {
            let entry = ValidationProfile::unverified(&profile.name);
            self.validation.write().await.merge(entry.clone());
            return entry;
        }
        self.validate_profiles(profile).await
    }

    /// Probe the profile's host unless it is already known active.
    pub async fn validate_profiles(&self, profile: &Profile) -> ValidationProfile {
        let name = profile.name.as_str();
        if let Some(hit) = self.validation.read().await.cached_active(name) {
            debug!(profile = name, "validation cache hit");
            return hit;
        }

        let api = self.ctx.register.common_api(&profile.profile_type);
        let status = match api {
            Some(api) if api.supports_status() => {
                let progress = self.ctx.gui.begin_progress(&format!("Validating {name} Profile."));
                let outcome = tokio::select! {
                    biased;
                    _ = progress.cancelled() => None,
                    res = api.get_status(profile, &profile.profile_type) => Some(res),
                };
                progress.cancel();
                match outcome {
                    None => {
                        info!(profile = name, "validation cancelled");
                        self.ctx.gui.show_message(&format!("Validating {name} was cancelled."), &[]).await;
                        return ValidationProfile::unverified(name);
                    }
                    Some(Ok(reported)) => {
                        reported.as_deref().map_or(ValidationStatus::Unverified, ValidationStatus::from_probe)
                    }
                    Some(Err(e)) => {
                        self.error_handling(&e, Some(name), Some("Validating profile")).await;
                        ValidationStatus::Inactive
                    }
                }
            }
            _ => ValidationStatus::Unverified,
        };

        let entry = ValidationProfile::new(name, status);
        self.validation.write().await.merge(entry.clone());
        self.ctx.trees.for_each_node(name, |node| node.status = Some(status));
        debug!(profile = name, %status, "validated profile");
        entry
    }

    /// Insert or replace the validation toggle for `name`.
    pub async fn validation_array_setup(&self, name: &str, setting: bool) -> ValidationSetting {
        self.validation.write().await.set_setting(name, setting)
    }

    /// Turn validation off for every node showing `name`, in every tree.
    pub async fn disable_validation(&self, name: &str) -> ValidationSetting {
        self.ctx.trees.for_each_node(name, |node| node.validation_enabled = false);
        self.validation_array_setup(name, false).await
    }

    /// Turn validation on for every node showing `name`, in every tree.
    pub async fn enable_validation(&self, name: &str) -> ValidationSetting {
        self.ctx.trees.for_each_node(name, |node| node.validation_enabled = true);
        self.validation_array_setup(name, true).await
    }

    pub async fn validation_setting(&self, name: &str) -> Option<bool> {
        self.validation.read().await.setting(name)
    }

    pub async fn validation_status(&self, name: &str) -> Option<ValidationStatus> {
        self.validation.read().await.status(name)
    }

    /// Ask for user then password, both non-empty.
    pub async fn login_credential_prompt(&self) -> Option<Credentials> {
        let gui = &self.ctx.gui;
        let user = gui
            .input(&InputOptions {
                placeholder: Some("User Name".to_owned()),
                ..InputOptions::new("Enter the user name for the connection.")
            })
            .await
            .filter(|u| !u.is_empty())?;
        let password = gui
            .input(&InputOptions {
                placeholder: Some("Password".to_owned()),
                ..InputOptions::new("Enter the password for the connection.").password()
            })
            .await
            .filter(|p| !p.is_empty())?;
        Some(Credentials { user, password })
    }

    /// Collect and store user and password for `name`. Fields already set
    /// are kept unless `re_prompt`. Returns `None` if the user cancels.
    pub async fn prompt_credentials(&self, name: &str, re_prompt: bool) -> Option<Credentials> {
        let gui = &self.ctx.gui;
        let Some(profile) = self.table.get(name).await else {
            gui.error_message(&format!("Could not find profile named: {name}."), &[]).await;
            return None;
        };

        let user = match profile.attrs.user.clone().filter(|_| !re_prompt) {
            Some(user) => Some(user),
            None => gui
                .input(&InputOptions::new("Enter the user name for the connection.").value(profile.attrs.user.clone()))
                .await
                .filter(|u| !u.is_empty()),
        };
        let password = match (&user, profile.attrs.password.clone().filter(|_| !re_prompt)) {
            (None, _) => None,
            (Some(_), Some(password)) => Some(password),
            (Some(_), None) => gui
                .input(&InputOptions::new("Enter the password for the connection.").password())
                .await
                .filter(|p| !p.is_empty()),
        };
        let (Some(user), Some(password)) = (user, password) else {
            gui.show_message(OPERATION_CANCELLED, &[]).await;
            return None;
        };

        let secure = self.ctx.settings.secure_credentials;
        let stored = self.team_config().map_err(anyhow::Error::new).and_then(|mut team| {
            team.update_property(name, "user", Value::String(user.clone()), secure)?;
            team.update_property(name, "password", Value::String(password.clone()), secure)?;
            team.save()
        });
        if let Err(e) = stored {
            warn!(profile = name, err = %e, "failed to store credentials");
            gui.error_message(&format!("Unable to store credentials for profile {name}. {e}"), &[]).await;
            return None;
        }

        let (u, p) = (user.clone(), password.clone());
        if let Some(updated) = self
            .table
            .update_attrs(name, move |attrs| {
                attrs.user = Some(u);
                attrs.password = Some(p);
            })
            .await
        {
            self.ctx.trees.sync_profile(&updated);
        }
        self.validation.write().await.purge(name);
        if secure {
            self.ctx.emit(ProfileEvent::Update { profile: name.to_owned() });
        }
        info!(profile = name, "credentials updated");
        Some(Credentials { user, password })
    }

    /// Open the layer file that holds `name`. Returns whether one was found.
    pub async fn open_config_for_profile(&self, name: &str) -> bool {
        let location = self.team_config().ok().and_then(|team| team.profile_location(name));
        match location {
            Some(loc) => {
                self.ctx.gui.open_file(&loc.os_loc, None).await;
                true
            }
            None => false,
        }
    }

    pub async fn edit_session(&self, name: &str) -> bool {
        self.open_config_for_profile(name).await
    }

    /// Delete a profile from its layer, the table, every tree, and the
    /// validation lists. With no name the user picks one.
    pub async fn delete_profile(&self, name: Option<&str>) -> bool {
        let gui = &self.ctx.gui;
        let name = match name {
            Some(name) => name.to_owned(),
            None => {
                let names = self.table.names().await;
                if names.is_empty() {
                    gui.show_message("No profiles available", &[]).await;
                    return false;
                }
                match gui.pick("Select the profile you want to delete", &names).await {
                    Some(name) => name,
                    None => {
                        gui.show_message(OPERATION_CANCELLED, &[]).await;
                        return false;
                    }
                }
            }
        };

        let question = format!("Are you sure you want to permanently delete {name}");
        if gui.warning_modal(&question, &["Delete"]).await.as_deref() != Some("Delete") {
            gui.show_message(OPERATION_CANCELLED, &[]).await;
            return false;
        }

        let deleted = self.team_config().map_err(anyhow::Error::new).and_then(|mut team| {
            team.delete_profile(&name)?;
            team.save()
        });
        if let Err(e) = deleted {
            self.error_handling(&e, Some(&name), Some("Deleting profile")).await;
            return false;
        }
        self.table.remove(&name).await;
        self.ctx.trees.remove_profile(&name);
        self.validation.write().await.forget(&name);
        self.ctx.emit(ProfileEvent::Delete { profile: name.clone() });
        info!(profile = %name, "profile deleted");
        gui.show_message(&format!("Profile {name} was deleted."), &[]).await;
        true
    }

    /// Add `name` to the tree of `kind` if the tree supports its type.
    pub async fn add_session(&self, kind: TreeKind, name: &str) -> anyhow::Result<bool> {
        let profile = self.load_named_profile(name, None).await?;
        if !self.ctx.register.types_for(kind).contains(&profile.profile_type) {
            return Ok(false);
        }
        Ok(self.ctx.trees.get(kind).is_some_and(|tree| tree.add(profile)))
    }

    /// Ensure every tree shows the default profile of `profile_type`, or of
    /// each type it supports when no type is given.
    pub async fn add_session_for_type(&self, profile_type: Option<&str>) -> usize {
        let mut added = 0;
        for tree in self.ctx.trees.all() {
            let supported = self.ctx.register.types_for(tree.kind());
            let types: Vec<String> = match profile_type {
                Some(ty) if supported.iter().any(|t| t == ty) => vec![ty.to_owned()],
                Some(_) => Vec::new(),
                None => supported,
            };
            for ty in types {
                let Some(profile) = self.table.default_profile(&ty).await else { continue };
                if tree.add(profile) {
                    added += 1;
                }
            }
        }
        debug!(added, "added default sessions");
        added
    }

    /// Let the user add a profile to the tree of `kind`, or create or edit
    /// a config file instead. Returns the added profile name.
    pub async fn create_zowe_session(&self, kind: TreeKind, add_to_all_trees: bool) -> Option<String> {
        let gui = &self.ctx.gui;
        let types = self.ctx.register.types_for(kind);
        let tree = self.ctx.trees.get(kind)?;
        let mut items: Vec<String> = self
            .table
            .all()
            .await
            .into_iter()
            .filter(|p| types.contains(&p.profile_type) && !tree.contains(&p.name))
            .map(|p| p.name)
            .collect();
        items.push(CREATE_CONFIG_ITEM.to_owned());
        items.push(EDIT_CONFIG_ITEM.to_owned());

        let placeholder = "Choose \"Create new...\" to define or select a profile to add to the tree";
        let Some(choice) = gui.pick(placeholder, &items).await else {
            gui.show_message(OPERATION_CANCELLED, &[]).await;
            return None;
        };
        match choice.as_str() {
            CREATE_CONFIG_ITEM => {
                self.create_zowe_schema().await;
                None
            }
            EDIT_CONFIG_ITEM => {
                self.edit_zowe_config_file().await;
                None
            }
            name => {
                let kinds: Vec<TreeKind> = if add_to_all_trees { TreeKind::ALL.to_vec() } else { vec![kind] };
                for k in kinds {
                    if let Err(e) = self.add_session(k, name).await {
                        self.error_handling(&e, Some(name), Some("Adding session")).await;
                        return None;
                    }
                }
                Some(name.to_owned())
            }
        }
    }
}

/// Decide token auth from the secure lists of a profile and its base.
pub fn using_token_auth(secure: &[String], base_secure: &[String]) -> bool {
    let has = |list: &[String], prop: &str| list.iter().any(|p| p == prop);
    let basic = has(secure, "user") && has(secure, "password");
    if has(secure, "tokenValue") {
        return !basic;
    }
    has(base_secure, "tokenValue") && !basic
}

#[cfg(test)]
#[path = "profiles_tests.rs"]
mod tests;
