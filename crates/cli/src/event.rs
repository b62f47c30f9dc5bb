// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Profile change notification for extenders holding cached copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProfileEvent {
    Update { profile: String },
    Delete { profile: String },
    /// The profile table was rebuilt from disk.
    Reload,
}
