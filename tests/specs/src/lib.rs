// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Runs the real `mfx` binary as a subprocess against a temporary Zowe
//! home, with stdin closed so every prompt is dismissed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Upper bound for one CLI invocation.
pub const TIMEOUT: Duration = Duration::from_secs(20);

/// Resolve the path to the compiled `mfx` binary.
pub fn mfx_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("mfx")
}

/// Captured result of one invocation.
#[derive(Debug)]
pub struct Outcome {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

/// Temporary home (and optional workspace) the binary runs against.
pub struct MfxHome {
    dir: tempfile::TempDir,
    workspace: bool,
}

impl MfxHome {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join(".zowe"))?;
        Ok(Self { dir, workspace: false })
    }

    /// Also pass a workspace folder.
    pub fn with_workspace() -> anyhow::Result<Self> {
        let mut home = Self::new()?;
        std::fs::create_dir_all(home.dir.path().join("ws"))?;
        home.workspace = true;
        Ok(home)
    }

    pub fn global_root(&self) -> PathBuf {
        self.dir.path().join(".zowe")
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace.then(|| self.dir.path().join("ws"))
    }

    /// Write a global layer file.
    pub fn write_global(&self, file: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.global_root().join(file);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Run `mfx <args>` with secure storage off and a text log on stderr.
    pub async fn run(&self, args: &[&str]) -> anyhow::Result<Outcome> {
        let mut cmd = Command::new(mfx_binary());
        cmd.env("ZOWE_CLI_HOME", self.global_root())
            .env("MFX_SECURE_CREDENTIALS", "false")
            .env("MFX_LOG_LEVEL", "warn")
            .env_remove("MFX_WORKSPACE")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ws) = self.workspace_root() {
            cmd.arg("--workspace").arg(ws);
        }
        cmd.args(args);

        let output = tokio::time::timeout(TIMEOUT, cmd.output())
            .await
            .map_err(|_| anyhow::anyhow!("mfx {args:?} timed out"))??;
        Ok(Outcome {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
