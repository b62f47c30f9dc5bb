// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config layer operations: list existing layers, create a team config
//! from the known profile types, open layers for manual editing, and keep
//! `zowe.schema.json` current when extenders register new types.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::gui::OPERATION_CANCELLED;
use crate::layer::{write_json_atomic, ConfigLayer, SCHEMA_FILE, TEAM_CONFIG, USER_CONFIG};
use crate::profiles::Profiles;
use crate::schema::{all_types, build_config, build_schema, strip_secure, ProfileTypeConfig};

pub const GLOBAL_ITEM: &str = "Global: in the Zowe home directory";
pub const PROJECT_ITEM: &str = "Project: in the current working directory";
pub const CREATE_NEW_ITEM: &str = "Create New";
pub const MANUAL_EDIT_MSG: &str = "The Team configuration file has been opened in the editor. \
     Editing or removal of profiles will need to be done manually.";

/// Answer of [`Profiles::check_existing_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingConfig {
    /// No layer lives at the target; creation may proceed.
    None,
    /// A layer exists and the user accepted altering it. Holds its file name.
    Overwrite(String),
    /// The user declined; the existing file was opened instead.
    Abort,
}

/// Where a config is placed or edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Project,
}

impl Profiles {
    /// Layers that exist on disk, highest precedence first.
    pub fn get_config_layers(&self) -> anyhow::Result<Vec<ConfigLayer>> {
        Ok(self.team_config()?.existing_layers())
    }

    async fn config_scope_prompt(&self, placeholder: &str) -> Option<ConfigScope> {
        let items = [GLOBAL_ITEM.to_owned(), PROJECT_ITEM.to_owned()];
        match self.ctx.gui.pick(placeholder, &items).await.as_deref() {
            Some(GLOBAL_ITEM) => Some(ConfigScope::Global),
            Some(PROJECT_ITEM) => Some(ConfigScope::Project),
            _ => None,
        }
    }

    /// Ask before altering a layer that already lives in `root`.
    pub async fn check_existing_config(&self, root: &Path) -> anyhow::Result<ExistingConfig> {
        let found = self.get_config_layers()?.into_iter().find(|layer| layer.path.parent() == Some(root));
        let Some(layer) = found else { return Ok(ExistingConfig::None) };

        let message = format!(
            "A Team Configuration File already exists in this location\n{}\n\
             Continuing may alter the existing file, would you like to proceed?",
            layer.path.display()
        );
        if self.ctx.gui.warning_modal(&message, &[CREATE_NEW_ITEM]).await.is_some() {
            return Ok(ExistingConfig::Overwrite(layer.file_name()));
        }
        self.ctx.gui.open_file(&layer.path, None).await;
        Ok(ExistingConfig::Abort)
    }

    /// Create (or extend) a team config holding a profile per known type,
    /// then open it. Returns the written file.
    pub async fn create_zowe_schema(&self) -> Option<PathBuf> {
        match self.create_zowe_schema_inner().await {
            Ok(path) => path,
            Err(e) => {
                self.error_handling(&e, None, Some("Creating team configuration")).await;
                None
            }
        }
    }

    async fn create_zowe_schema_inner(&self) -> anyhow::Result<Option<PathBuf>> {
        let gui = &self.ctx.gui;
        let roots = self.ctx.settings.roots.clone();
        let mut global = true;
        if roots.project.is_some() {
            let Some(scope) = self.config_scope_prompt("Select the location where the config file will be initialized").await
            else {
                gui.show_message(OPERATION_CANCELLED, &[]).await;
                return Ok(None);
            };
            global = scope == ConfigScope::Global;
        }
        let root = roots
            .root(global)
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow::anyhow!("no config root is available"))?;

        let user = match self.check_existing_config(&root).await? {
            ExistingConfig::Abort => return Ok(None),
            ExistingConfig::Overwrite(name) => name.contains("user"),
            ExistingConfig::None => false,
        };

        let types = all_types(&self.extender_types.read().await);
        let mut config = build_config(&types, global, true);
        if !self.ctx.settings.secure_credentials {
            strip_secure(&mut config);
        }

        let mut team = self.team_config()?;
        team.activate(user, global)?;
        team.merge(&config);
        team.save()?;
        write_json_atomic(&root.join(SCHEMA_FILE), &build_schema(&types))?;
        info!(root = %root.display(), global, user, "team configuration written");

        self.refresh().await?;
        let path = root.join(if user { USER_CONFIG } else { TEAM_CONFIG });
        gui.open_file(&path, None).await;
        Ok(Some(path))
    }

    /// Open existing layers for manual editing. With several layers the
    /// user picks the scope. Returns the files opened.
    pub async fn edit_zowe_config_file(&self) -> Vec<PathBuf> {
        let gui = &self.ctx.gui;
        let layers = match self.get_config_layers() {
            Ok(layers) => layers,
            Err(e) => {
                self.error_handling(&e, None, Some("Editing team configuration")).await;
                return Vec::new();
            }
        };
        let chosen: Vec<PathBuf> = match layers.as_slice() {
            [] => {
                debug!("no config layers to edit");
                return Vec::new();
            }
            [only] => vec![only.path.clone()],
            _ => match self.config_scope_prompt("Select the location of the config file to edit").await {
                Some(scope) => {
                    let global = scope == ConfigScope::Global;
                    layers.iter().filter(|l| l.global == global).map(|l| l.path.clone()).collect()
                }
                None => {
                    gui.show_message(OPERATION_CANCELLED, &[]).await;
                    return Vec::new();
                }
            },
        };
        for path in &chosen {
            gui.open_file(path, None).await;
        }
        if !chosen.is_empty() {
            gui.show_message(MANUAL_EDIT_MSG, &[]).await;
        }
        chosen
    }

    /// Record extender profile types. A type already known is replaced.
    pub async fn register_extender_types(&self, configs: Vec<ProfileTypeConfig>) {
        let mut known = self.extender_types.write().await;
        for config in configs {
            debug!(profile_type = %config.profile_type, "registering extender profile type");
            match known.iter_mut().find(|t| t.profile_type == config.profile_type) {
                Some(slot) => *slot = config,
                None => known.push(config),
            }
        }
    }

    /// Rewrite the schema file next to every existing team layer. Returns
    /// the files written.
    pub async fn write_schemas(&self) -> anyhow::Result<Vec<PathBuf>> {
        let types = all_types(&self.extender_types.read().await);
        let schema = build_schema(&types);
        let mut written = Vec::new();
        for layer in self.get_config_layers()?.into_iter().filter(|l| !l.user) {
            let Some(dir) = layer.path.parent() else { continue };
            let path = dir.join(SCHEMA_FILE);
            if let Err(e) = write_json_atomic(&path, &schema) {
                warn!(path = %path.display(), err = %e, "failed to update schema");
                return Err(e);
            }
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
