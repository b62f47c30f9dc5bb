// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication switching: SSO login and logout, and moving a profile
//! between basic and token authentication.
//!
//! Gateway tokens (type prefixed `apimlAuthenticationToken`) are obtained
//! once and stored on the default base profile shared by service profiles.
//! Any other token is stored on the profile that logged in.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{CommonApi, Session};
use crate::event::ProfileEvent;
use crate::gui::OPERATION_CANCELLED;
use crate::profile::{AuthMode, Profile};
use crate::profiles::Profiles;
use crate::secure::{self, is_gateway_token};

/// Result of [`Profiles::handle_switch_authentication`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "mode", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// The user dismissed a prompt.
    Cancelled,
    /// The user answered "No" to the confirmation.
    Declined,
    Switched(AuthMode),
    Failed,
}

impl Profiles {
    fn api_for(&self, profile: &Profile) -> anyhow::Result<Arc<dyn CommonApi>> {
        self.ctx
            .register
            .common_api(&profile.profile_type)
            .ok_or_else(|| anyhow::anyhow!("no API registered for profile type {}", profile.profile_type))
    }

    /// Store a token on `name`, secure unless secure storage is disabled.
    fn store_token(&self, name: &str, token_type: &str, token: String) -> anyhow::Result<()> {
        let mut team = self.team_config()?;
        team.update_property(name, "tokenType", Value::String(token_type.to_owned()), false)?;
        team.update_property(name, "tokenValue", Value::String(token), self.ctx.settings.secure_credentials)?;
        team.save()
    }

    /// Prompt for credentials and log in as this profile. `Ok(false)` if the
    /// user cancelled.
    pub async fn login_with_regular_profile(
        &self,
        profile: &Profile,
        api: &dyn CommonApi,
        token_type: &str,
    ) -> anyhow::Result<bool> {
        let Some(creds) = self.login_credential_prompt().await else { return Ok(false) };
        let mut session = Session::from_profile(profile);
        session.user = Some(creds.user);
        session.password = Some(creds.password);
        session.token_type = Some(token_type.to_owned());
        session.token_value = None;
        let token = api.login(&session).await?;
        self.store_token(&profile.name, token_type, token)?;
        self.update_cached_profile(&profile.name).await?;
        info!(profile = %profile.name, token_type, "logged in with profile credentials");
        Ok(true)
    }

    /// Prompt for credentials and log in to the gateway, storing the token on
    /// the default base profile. `Ok(false)` if the user cancelled.
    pub async fn login_with_base_profile(
        &self,
        profile: &Profile,
        api: &dyn CommonApi,
        token_type: &str,
    ) -> anyhow::Result<bool> {
        let base = self
            .table
            .base_profile()
            .await
            .ok_or_else(|| anyhow::anyhow!("No base profile found to store the gateway token"))?;
        let Some(creds) = self.login_credential_prompt().await else { return Ok(false) };
        let session = gateway_session(&base, profile, token_type, Some((creds.user, creds.password)));
        let token = api.login(&session).await?;
        self.store_token(&base.name, token_type, token)?;
        self.update_cached_profile(&base.name).await?;
        self.update_cached_profile(&profile.name).await?;
        info!(profile = %profile.name, base = %base.name, "logged in to gateway");
        Ok(true)
    }

    /// Obtain a token for `name`. Returns whether the login succeeded.
    pub async fn sso_login(&self, name: &str) -> bool {
        let gui = &self.ctx.gui;
        let Some(profile) = self.table.get(name).await else {
            gui.error_message(&format!("Could not find profile named: {name}."), &[]).await;
            return false;
        };
        let api = match self.api_for(&profile) {
            Ok(api) => api,
            Err(e) => {
                gui.error_message(&format!("Unable to log in with {name}. {e}"), &[]).await;
                return false;
            }
        };
        let basic_only = match self.secure_props_for_profile(name).await {
            Ok(secure) => secure.iter().any(|p| p == "user") && secure.iter().any(|p| p == "password"),
            Err(_) => false,
        };
        if basic_only {
            gui.show_message(
                "This profile is using basic authentication and does not support token authentication.",
                &[],
            )
            .await;
            return false;
        }
        let token_type = match api.token_type_name(&profile).await {
            Ok(token_type) => token_type,
            Err(e) => {
                warn!(profile = name, err = %e, "token type lookup failed");
                gui.show_message(&format!("Error getting supported tokenType value for profile {name}"), &[])
                    .await;
                return false;
            }
        };

        let result = if is_gateway_token(&token_type) {
            self.login_with_base_profile(&profile, api.as_ref(), &token_type).await
        } else {
            self.login_with_regular_profile(&profile, api.as_ref(), &token_type).await
        };
        match result {
            Ok(true) => {
                self.validation.write().await.purge(name);
                gui.show_message(&format!("Login to authentication service was successful for {name}."), &[])
                    .await;
                true
            }
            Ok(false) => {
                gui.show_message(OPERATION_CANCELLED, &[]).await;
                false
            }
            Err(e) => {
                warn!(profile = name, err = %e, "login failed");
                gui.error_message(&format!("Unable to log in with {name}. {e}"), &[]).await;
                false
            }
        }
    }

    /// Discard the token of `name`. Returns whether the logout succeeded.
    pub async fn sso_logout(&self, name: &str) -> bool {
        let gui = &self.ctx.gui;
        let result = self.logout_inner(name).await;
        match result {
            Ok(()) => {
                self.validation.write().await.purge(name);
                gui.show_message(&format!("Logout from authentication service was successful for {name}."), &[])
                    .await;
                true
            }
            Err(e) => {
                warn!(profile = name, err = %e, "logout failed");
                gui.error_message(&format!("Unable to log out with {name}. {e}"), &[]).await;
                false
            }
        }
    }

    async fn logout_inner(&self, name: &str) -> anyhow::Result<()> {
        let profile = self.load_named_profile(name, None).await?;
        let api = self.api_for(&profile)?;
        let token_type = match profile.attrs.token_type.clone() {
            Some(token_type) => token_type,
            None => api.token_type_name(&profile).await?,
        };
        if is_gateway_token(&token_type) {
            let base = self
                .table
                .base_profile()
                .await
                .ok_or_else(|| anyhow::anyhow!("No base profile holds the gateway token"))?;
            let session = gateway_session(&base, &profile, &token_type, None);
            api.logout(&session).await?;
            secure::remove_token(&mut self.team_config()?, &base.name)?;
            self.update_cached_profile(&base.name).await?;
        } else {
            let session = Session::from_profile(&profile);
            api.logout(&session).await?;
            secure::remove_token(&mut self.team_config()?, name)?;
        }
        self.update_cached_profile(name).await?;
        info!(profile = name, token_type, "logged out");
        Ok(())
    }

    /// Move `name` between basic and token authentication after a yes/no
    /// confirmation.
    pub async fn handle_switch_authentication(&self, name: &str) -> SwitchOutcome {
        let gui = &self.ctx.gui;
        let answer = gui
            .pick("Do you wish to change the Authentication", &["Yes".to_owned(), "No".to_owned()])
            .await;
        match answer.as_deref() {
            None => {
                gui.show_message(OPERATION_CANCELLED, &[]).await;
                return SwitchOutcome::Cancelled;
            }
            Some("Yes") => {}
            Some(_) => return SwitchOutcome::Declined,
        }

        let unable = format!("Unable to Switch Authentication for profile {name}.");
        let Some(profile) = self.table.get(name).await else {
            gui.error_message(&unable, &[]).await;
            return SwitchOutcome::Failed;
        };
        let api = match self.api_for(&profile) {
            Ok(api) => api,
            Err(_) => {
                gui.error_message(&unable, &[]).await;
                return SwitchOutcome::Failed;
            }
        };
        let api_token_type = match api.token_type_name(&profile).await {
            Ok(token_type) => token_type,
            Err(e) => {
                warn!(profile = name, err = %e, "token type lookup failed");
                gui.error_message(&format!("Cannot switch to Token-based Authentication for profile {name}."), &[])
                    .await;
                return SwitchOutcome::Failed;
            }
        };
        let uses_token = self.is_using_token_auth(name).await.unwrap_or(false);

        if !uses_token && profile.is_using_basic_auth() {
            self.switch_to_token(&profile, api.as_ref(), &api_token_type).await
        } else if uses_token {
            let token_type = profile.attrs.token_type.clone().unwrap_or(api_token_type);
            self.switch_to_basic(name, &token_type).await
        } else {
            gui.error_message(&unable, &[]).await;
            SwitchOutcome::Failed
        }
    }

    async fn switch_to_token(&self, profile: &Profile, api: &dyn CommonApi, token_type: &str) -> SwitchOutcome {
        let gui = &self.ctx.gui;
        let name = profile.name.as_str();
        let failed = format!("Unable to switch to Token-based authentication for profile {name}.");
        let login = if is_gateway_token(token_type) {
            self.login_with_base_profile(profile, api, token_type).await
        } else {
            self.login_with_regular_profile(profile, api, token_type).await
        };
        match login {
            Ok(true) => {}
            Ok(false) => {
                gui.show_message(OPERATION_CANCELLED, &[]).await;
                return SwitchOutcome::Cancelled;
            }
            Err(e) => {
                warn!(profile = name, err = %e, "token login failed");
                gui.error_message(&failed, &[]).await;
                return SwitchOutcome::Failed;
            }
        }

        let cleared = self
            .team_config()
            .map_err(anyhow::Error::new)
            .and_then(|mut team| secure::basic_auth_clear_secure_array(&mut team, name, token_type));
        if let Err(e) = cleared {
            warn!(profile = name, err = %e, "failed to clear credentials");
            gui.error_message(&failed, &[]).await;
            return SwitchOutcome::Failed;
        }
        if let Some(updated) = self
            .table
            .update_attrs(name, |attrs| {
                attrs.user = None;
                attrs.password = None;
            })
            .await
        {
            self.ctx.trees.sync_profile(&updated);
        }
        self.validation.write().await.purge(name);
        self.ctx.emit(ProfileEvent::Update { profile: name.to_owned() });
        gui.show_message(
            &format!("Login using token-based authentication service was successful for profile {name}."),
            &[],
        )
        .await;
        SwitchOutcome::Switched(AuthMode::Token)
    }

    async fn switch_to_basic(&self, name: &str, token_type: &str) -> SwitchOutcome {
        let gui = &self.ctx.gui;
        if self.prompt_credentials(name, true).await.is_none() {
            return SwitchOutcome::Cancelled;
        }
        let cleared = self
            .team_config()
            .map_err(anyhow::Error::new)
            .and_then(|mut team| secure::token_auth_clear_secure_array(&mut team, name, Some(token_type)));
        if let Err(e) = cleared {
            warn!(profile = name, err = %e, "failed to clear token");
            gui.error_message(&format!("Unable to switch to Basic authentication for profile {name}."), &[])
                .await;
            return SwitchOutcome::Failed;
        }
        if is_gateway_token(token_type) {
            if let Some(base) = self.table.base_profile().await {
                if let Err(e) = self.update_cached_profile(&base.name).await {
                    warn!(profile = %base.name, err = %e, "failed to reload base profile");
                }
            }
        }
        if let Err(e) = self.update_cached_profile(name).await {
            warn!(profile = name, err = %e, "failed to reload profile");
        }
        self.validation.write().await.purge(name);
        self.ctx.emit(ProfileEvent::Update { profile: name.to_owned() });
        gui.show_message(&format!("Login using basic authentication was successful for profile {name}."), &[])
            .await;
        SwitchOutcome::Switched(AuthMode::Basic)
    }
}

/// Session for the gateway: the base profile's host and port, falling back
/// to the service profile's.
fn gateway_session(
    base: &Profile,
    service: &Profile,
    token_type: &str,
    creds: Option<(String, String)>,
) -> Session {
    let mut session = Session::from_profile(base);
    let fallback = Session::from_profile(service);
    if session.hostname.is_empty() {
        session.hostname = fallback.hostname;
        session.port = fallback.port;
    }
    session.token_type = Some(token_type.to_owned());
    session.base_path = None;
    if let Some((user, password)) = creds {
        session.user = Some(user);
        session.password = Some(password);
        session.token_value = None;
    }
    session
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
