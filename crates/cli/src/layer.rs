// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical config layers: discovery, parsing, and atomic writes.
//!
//! A root directory holds up to two layers, the team file
//! `zowe.config.json` and the user file `zowe.config.user.json`. The
//! project root (the open workspace) and the global root (the home
//! directory) give four candidates, ordered by precedence.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

pub const TEAM_CONFIG: &str = "zowe.config.json";
pub const USER_CONFIG: &str = "zowe.config.user.json";
pub const SCHEMA_FILE: &str = "zowe.schema.json";

/// One physical config file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigLayer {
    pub path: PathBuf,
    pub exists: bool,
    pub global: bool,
    pub user: bool,
    pub properties: Value,
}

impl ConfigLayer {
    /// A layer with no file behind it yet.
    pub fn empty(path: PathBuf, global: bool, user: bool) -> Self {
        Self { path, exists: false, global, user, properties: empty_properties() }
    }

    /// Read the layer at `path`. A missing file yields an empty layer.
    pub fn load(path: PathBuf, global: bool, user: bool) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::empty(path, global, user));
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let properties = parse_layer(&path, &text)?;
        Ok(Self { path, exists: true, global, user, properties })
    }

    /// Write `properties` to disk and mark the layer as existing.
    pub fn write(&mut self, properties: &Value) -> anyhow::Result<()> {
        write_json_atomic(&self.path, properties)?;
        self.exists = true;
        Ok(())
    }

    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

/// Write pretty JSON to `path` atomically (write tmp + rename), creating
/// parent directories.
pub fn write_json_atomic(path: &Path, value: &Value) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Skeleton content of a new layer.
pub fn empty_properties() -> Value {
    let mut map = Map::new();
    map.insert("profiles".to_owned(), Value::Object(Map::new()));
    map.insert("defaults".to_owned(), Value::Object(Map::new()));
    Value::Object(map)
}

/// Parse layer JSON, reporting the position of malformed content.
pub fn parse_layer(path: &Path, text: &str) -> Result<Value, ConfigError> {
    if text.trim().is_empty() {
        return Ok(empty_properties());
    }
    let value: Value = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(ConfigError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: "config root must be an object".to_owned(),
        });
    }
    Ok(value)
}

/// Project and global directories searched for layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRoots {
    pub project: Option<PathBuf>,
    pub global: PathBuf,
}

impl LayerRoots {
    /// Candidate `(path, global, user)` triples, highest precedence first.
    pub fn candidates(&self) -> Vec<(PathBuf, bool, bool)> {
        let mut out = Vec::with_capacity(4);
        if let Some(ref project) = self.project {
            out.push((project.join(USER_CONFIG), false, true));
            out.push((project.join(TEAM_CONFIG), false, false));
        }
        out.push((self.global.join(USER_CONFIG), true, true));
        out.push((self.global.join(TEAM_CONFIG), true, false));
        out
    }

    pub fn root(&self, global: bool) -> Option<&Path> {
        if global {
            Some(&self.global)
        } else {
            self.project.as_deref()
        }
    }
}

/// Locate the config file under `root`: user config first, then team
/// config, else `None`.
pub fn config_location(root: &Path) -> Option<PathBuf> {
    [USER_CONFIG, TEAM_CONFIG].into_iter().map(|name| root.join(name)).find(|p| p.is_file())
}

#[cfg(test)]
#[path = "layer_tests.rs"]
mod tests;
