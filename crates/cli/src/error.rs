// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::gui::OPERATION_CANCELLED;

/// Error kinds the shared error-handling path routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    ConfigParse,
    MissingHost,
    Unauthorized,
    NotFound,
    Unsupported,
    Cancelled,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ConfigParse => 400,
            Self::MissingHost => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Unsupported => 501,
            Self::Cancelled => 499,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigParse => "CONFIG_PARSE",
            Self::MissingHost => "MISSING_HOST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::Unsupported => "UNSUPPORTED",
            Self::Cancelled => "CANCELLED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a mainframe API collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,
    /// HTTP status of the failed request, when there was one.
    pub error_code: Option<u16>,
    pub additional_details: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), error_code: None, additional_details: None }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.error_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.additional_details = Some(details.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(ref details) = self.additional_details {
            write!(f, " {details}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Failure to read or parse a config layer.
#[derive(Debug)]
pub enum ConfigError {
    Parse { path: PathBuf, line: usize, column: usize, message: String },
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { path, line, column, message } => write!(
                f,
                "Error parsing JSON in the file '{}': Line {line}, Column {column}: {message}",
                path.display()
            ),
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

/// Error text that signals a profile reference could not be resolved.
pub const PROFILE_NOT_FOUND: &str = "Could not find profile";

/// Decide which error-handling route an error takes.
pub fn classify(err: &anyhow::Error) -> ErrorCode {
    if let Some(config) = err.downcast_ref::<ConfigError>() {
        return match config {
            ConfigError::Parse { .. } => ErrorCode::ConfigParse,
            ConfigError::Io { .. } => ErrorCode::Internal,
        };
    }
    let text = format!("{err:#}");
    if let Some(api) = err.downcast_ref::<ApiError>() {
        match api.error_code {
            Some(401) => return ErrorCode::Unauthorized,
            Some(404) => return ErrorCode::NotFound,
            Some(501) => return ErrorCode::Unsupported,
            Some(499) => return ErrorCode::Cancelled,
            _ => {}
        }
    }
    if text.contains(OPERATION_CANCELLED) {
        ErrorCode::Cancelled
    } else if text.contains("Error parsing JSON in the file") {
        ErrorCode::ConfigParse
    } else if text.contains("hostname") {
        ErrorCode::MissingHost
    } else if text.contains("All configured authentication methods failed") {
        ErrorCode::Unauthorized
    } else if text.contains(PROFILE_NOT_FOUND) {
        ErrorCode::NotFound
    } else {
        ErrorCode::Internal
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
