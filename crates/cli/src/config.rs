// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::context::Settings;
use crate::layer::LayerRoots;

/// Output format of the tracing subscriber.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("invalid log format: {other}"),
        }
    }
}

/// Mainframe explorer profile manager.
#[derive(Debug, Parser)]
#[command(name = "mfx", version, about)]
pub struct Config {
    /// Zowe home directory holding the global config layers.
    #[arg(long, env = "ZOWE_CLI_HOME")]
    pub home: Option<PathBuf>,

    /// Workspace folder holding the project config layers.
    #[arg(long, env = "MFX_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Keep secure property values in the OS credential vault.
    #[arg(long, env = "MFX_SECURE_CREDENTIALS", default_value_t = true, action = ArgAction::Set)]
    pub secure_credentials: bool,

    /// Timeout for status probes and authentication calls.
    #[arg(long, env = "MFX_STATUS_TIMEOUT_SECS", default_value = "30")]
    pub status_timeout_secs: u64,

    /// Log format (json or text).
    #[arg(long, env = "MFX_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MFX_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Validate option combinations. Call after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.home.as_ref().is_some_and(|h| h.as_os_str().is_empty()) {
            anyhow::bail!("--home must not be empty");
        }
        self.log_format()?;
        if self.status_timeout_secs == 0 {
            anyhow::bail!("--status-timeout-secs must be greater than zero");
        }
        if let Some(ref ws) = self.workspace {
            if !ws.is_dir() {
                anyhow::bail!("workspace {} is not a directory", ws.display());
            }
        }
        Ok(())
    }

    pub fn log_format(&self) -> anyhow::Result<LogFormat> {
        self.log_format.parse()
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    /// Global config root: `--home`, else `$HOME/.zowe`.
    pub fn home_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(ref home) = self.home {
            return Ok(home.clone());
        }
        match std::env::var_os("HOME") {
            Some(user_home) if !user_home.is_empty() => Ok(PathBuf::from(user_home).join(".zowe")),
            _ => anyhow::bail!("cannot locate the Zowe home directory; set --home or ZOWE_CLI_HOME"),
        }
    }

    /// Runtime subset handed to the profile engine.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings {
            roots: LayerRoots { project: self.workspace.clone(), global: self.home_dir()? },
            secure_credentials: self.secure_credentials,
        })
    }

    /// Build a minimal `Config` for tests (`layers` command, temp-free home).
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            home: Some(PathBuf::from("/tmp/mfx-test/.zowe")),
            workspace: None,
            secure_credentials: false,
            status_timeout_secs: 1,
            log_format: "text".into(),
            log_level: "debug".into(),
            command: Command::Layers,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
