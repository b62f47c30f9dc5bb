// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands driving the profile engine through a terminal [`Gui`].
//!
//! Results go to stdout; prompts and messages go through the GUI.
//!
//! [`Gui`]: crate::gui::Gui

pub mod term;

use std::io::Write;

use crate::auth::SwitchOutcome;
use crate::layer::config_location;
use crate::refresh::SessionRefresher;
use crate::validation::ValidationStatus;

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// List the config layers that exist on disk.
    Layers,
    /// Print the config file of the project root, or the global root.
    Locate {
        #[arg(long)]
        global: bool,
    },
    /// Create a team configuration file.
    Init,
    /// Open config layers for editing.
    Edit,
    /// List loaded profiles.
    List {
        /// Only profiles of this type.
        #[arg(long = "type")]
        profile_type: Option<String>,
    },
    /// Check that a profile can reach its host.
    Check {
        name: String,
        /// Skip the status probe for this profile.
        #[arg(long)]
        no_validate: bool,
    },
    /// Log in to the profile's authentication service.
    Login { name: String },
    /// Log out of the profile's authentication service.
    Logout { name: String },
    /// Switch a profile between basic and token authentication.
    SwitchAuth { name: String },
    /// Delete a profile, picking one when no name is given.
    Delete { name: Option<String> },
}

/// Run a subcommand, printing results to stdout. Returns the exit code.
pub async fn run(command: &Command, refresher: &SessionRefresher) -> i32 {
    let mut stdout = std::io::stdout();
    match execute(command, refresher, &mut stdout).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

/// Run a subcommand against `out`. Engine failures are reported through the
/// GUI and turn into a non-zero code; `Err` is reserved for output failures.
pub async fn execute(command: &Command, refresher: &SessionRefresher, out: &mut dyn Write) -> anyhow::Result<i32> {
    let profiles = refresher.profiles();
    let code = match command {
        Command::Layers => match profiles.get_config_layers() {
            Ok(layers) => {
                for layer in layers {
                    let scope = if layer.global { "global" } else { "project" };
                    let kind = if layer.user { "user" } else { "team" };
                    writeln!(out, "{}\t{scope}\t{kind}", layer.path.display())?;
                }
                0
            }
            Err(e) => {
                profiles.error_handling(&e, None, Some("Listing config layers")).await;
                1
            }
        },
        Command::Locate { global } => {
            let roots = &profiles.context().settings.roots;
            match roots.root(*global).and_then(config_location) {
                Some(path) => {
                    writeln!(out, "{}", path.display())?;
                    0
                }
                None => 1,
            }
        }
        Command::Init => match profiles.create_zowe_schema().await {
            Some(path) => {
                writeln!(out, "{}", path.display())?;
                0
            }
            None => 1,
        },
        Command::Edit => {
            let opened = profiles.edit_zowe_config_file().await;
            for path in &opened {
                writeln!(out, "{}", path.display())?;
            }
            i32::from(opened.is_empty())
        }
        Command::List { profile_type } => {
            let listed = match profile_type {
                Some(t) => profiles.table().by_type(t).await,
                None => profiles.table().all().await,
            };
            for profile in listed {
                let is_default = profiles
                    .default_profile(&profile.profile_type)
                    .await
                    .is_some_and(|d| d.name == profile.name);
                let marker = if is_default { "\tdefault" } else { "" };
                let auth = profile.auth_mode().as_str();
                writeln!(out, "{}\t{}\t{auth}{marker}", profile.name, profile.profile_type)?;
            }
            0
        }
        Command::Check { name, no_validate } => {
            let profile = match profiles.load_named_profile(name, None).await {
                Ok(p) => p,
                Err(e) => {
                    profiles.error_handling(&e, Some(name), Some("Checking profile")).await;
                    return Ok(1);
                }
            };
            if *no_validate {
                profiles.disable_validation(name).await;
            }
            let result = profiles.check_current_profile(&profile).await;
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
            i32::from(result.status == ValidationStatus::Inactive)
        }
        Command::Login { name } => i32::from(!profiles.sso_login(name).await),
        Command::Logout { name } => i32::from(!profiles.sso_logout(name).await),
        Command::SwitchAuth { name } => {
            let outcome = profiles.handle_switch_authentication(name).await;
            writeln!(out, "{}", serde_json::to_string(&outcome)?)?;
            match outcome {
                SwitchOutcome::Switched(_) | SwitchOutcome::Declined => 0,
                SwitchOutcome::Cancelled | SwitchOutcome::Failed => 1,
            }
        }
        Command::Delete { name } => i32::from(!profiles.delete_profile(name.as_deref()).await),
    };
    tracing::debug!(?command, code, "command finished");
    Ok(code)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
