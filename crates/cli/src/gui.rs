// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host user-interface seam.
//!
//! Every prompt returns plain data, with `None` meaning the user dismissed
//! it, so any host (an IDE extension, a terminal, a test script) can drive
//! the profile engine.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Message shown when the user dismisses a prompt.
pub const OPERATION_CANCELLED: &str = "Operation Cancelled";

/// Options for a single-line text prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    pub prompt: String,
    pub placeholder: Option<String>,
    /// Pre-filled value.
    pub value: Option<String>,
    /// Mask the typed text.
    pub password: bool,
}

impl InputOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), ..Self::default() }
    }

    pub fn password(mut self) -> Self {
        self.password = true;
        self
    }

    pub fn value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }
}

#[async_trait]
pub trait Gui: Send + Sync {
    /// Informational message. Returns the chosen item, if any were offered.
    async fn show_message(&self, message: &str, items: &[&str]) -> Option<String>;

    /// Error message. Returns the chosen item, if any were offered.
    async fn error_message(&self, message: &str, items: &[&str]) -> Option<String>;

    /// Modal message that must be answered with one of `items`.
    async fn warning_modal(&self, message: &str, items: &[&str]) -> Option<String>;

    /// Choose one of `items`.
    async fn pick(&self, placeholder: &str, items: &[String]) -> Option<String>;

    /// Prompt for a line of text.
    async fn input(&self, options: &InputOptions) -> Option<String>;

    /// Open a file for editing, optionally at a 1-based line and column.
    async fn open_file(&self, path: &Path, position: Option<(usize, usize)>);

    /// Show a cancellable progress indication. The token is cancelled if the
    /// user cancels; the caller cancels it when the work finishes.
    fn begin_progress(&self, title: &str) -> CancellationToken;
}
