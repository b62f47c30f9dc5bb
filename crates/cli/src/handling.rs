// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error path. Every failure ends in a message, a prompt, or an
//! opened config file, and the caller gets a plain `bool` back.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error};

use crate::error::{classify, ApiError, ErrorCode};
use crate::layer::config_location;
use crate::profiles::Profiles;

pub const LOGIN_ITEM: &str = "Log in to Authentication Service";
pub const UPDATE_CREDENTIALS_ITEM: &str = "Update Credentials";
pub const SHOW_CONFIG_ITEM: &str = "Show Config";
pub const TOKEN_EXPIRED: &str = "Token is not valid or expired.";

static PARSE_FILE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Error parsing JSON in the file '(.+?)'").ok());
static PARSE_POSITION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Line (\d+), Column (\d+)").ok());

/// File and position extracted from a config parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrorLocation {
    pub path: Option<PathBuf>,
    pub position: Option<(usize, usize)>,
}

/// Pull the offending file and position out of a parse error message.
pub fn parse_config_error(details: &str) -> ConfigErrorLocation {
    let path = PARSE_FILE
        .as_ref()
        .and_then(|re| re.captures(details))
        .and_then(|c| c.get(1))
        .map(|m| PathBuf::from(m.as_str()));
    let position = PARSE_POSITION.as_ref().and_then(|re| re.captures(details)).and_then(|c| {
        let line = c.get(1)?.as_str().parse().ok()?;
        let column = c.get(2)?.as_str().parse().ok()?;
        Some((line, column))
    });
    ConfigErrorLocation { path, position }
}

/// First line of an error chain, for display.
fn single_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

impl Profiles {
    /// Route an error to the right recovery. Returns true only when the
    /// recovery (login or credential update) succeeded.
    pub async fn error_handling(
        &self,
        err: &anyhow::Error,
        profile: Option<&str>,
        more_info: Option<&str>,
    ) -> bool {
        let code = classify(err);
        if code == ErrorCode::Cancelled {
            debug!(profile = profile.unwrap_or_default(), "operation cancelled");
            return false;
        }
        error!(
            profile = profile.unwrap_or_default(),
            info = more_info.unwrap_or_default(),
            code = %code,
            err = ?err,
            "{}",
            single_line(&format!("{err:#}"))
        );

        let gui = &self.ctx.gui;
        match code {
            ErrorCode::MissingHost => {
                gui.error_message("Required parameter 'host' must not be blank.", &[]).await;
                if let Some(name) = profile {
                    self.open_config_for_profile(name).await;
                }
                false
            }
            ErrorCode::Unauthorized => match profile {
                Some(name) => self.prompt_for_authentication(err, name).await,
                None => {
                    gui.error_message(single_line(&format!("{err:#}")), &[]).await;
                    false
                }
            },
            ErrorCode::NotFound => {
                if let Some(name) = profile {
                    self.open_config_for_profile(name).await;
                }
                false
            }
            ErrorCode::ConfigParse => {
                self.show_config_error(&format!("{err:#}")).await;
                false
            }
            _ => {
                let text = format!("{err:#}");
                let message = match more_info {
                    Some(info) => format!("{info} {}", single_line(&text)),
                    None => single_line(&text).to_owned(),
                };
                gui.error_message(&message, &[]).await;
                false
            }
        }
    }

    /// Offer SSO login when the failure points at a token, otherwise offer a
    /// credential update.
    async fn prompt_for_authentication(&self, err: &anyhow::Error, name: &str) -> bool {
        let gui = &self.ctx.gui;
        let details = err
            .downcast_ref::<ApiError>()
            .and_then(|api| api.additional_details.clone())
            .unwrap_or_default();
        let uses_token = self.is_using_token_auth(name).await.unwrap_or(false);

        if details.contains(TOKEN_EXPIRED) || uses_token {
            let message = format!(
                "Your connection is no longer active for profile '{name}'. \
                 Please log in to an authentication service to restore the connection."
            );
            if gui.show_message(&message, &[LOGIN_ITEM]).await.as_deref() == Some(LOGIN_ITEM) {
                return self.sso_login(name).await;
            }
            return false;
        }

        let message = format!(
            "Invalid Credentials for profile '{name}'. \
             Please ensure the username and password are valid or this may lead to a lock-out."
        );
        if gui.error_message(&message, &[UPDATE_CREDENTIALS_ITEM]).await.as_deref()
            == Some(UPDATE_CREDENTIALS_ITEM)
        {
            return self.prompt_credentials(name, true).await.is_some();
        }
        false
    }

    /// Report a config parse error and offer to open the offending file at
    /// the failing position.
    pub async fn show_config_error(&self, details: &str) {
        let gui = &self.ctx.gui;
        let parsed = parse_config_error(details);
        let roots = &self.ctx.settings.roots;
        let path = parsed.path.or_else(|| {
            let global = details.contains(".zowe") || roots.project.is_none();
            roots.root(global).and_then(config_location)
        });
        let message = "Error encountered when loading your Zowe config. Click \"Show Config\" for more details.";
        if gui.error_message(message, &[SHOW_CONFIG_ITEM]).await.as_deref() == Some(SHOW_CONFIG_ITEM) {
            if let Some(path) = path {
                gui.open_file(&path, parsed.position).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "handling_tests.rs"]
mod tests;
