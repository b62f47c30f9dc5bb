// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that run the real `mfx` binary against a
//! temporary Zowe home.

use mfx::layer::{SCHEMA_FILE, TEAM_CONFIG};
use mfx_specs::MfxHome;

#[tokio::test]
async fn empty_home_has_no_layers() -> anyhow::Result<()> {
    let home = MfxHome::new()?;

    let out = home.run(&["layers"]).await?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert!(out.stdout.is_empty());

    let out = home.run(&["locate", "--global"]).await?;
    assert_eq!(out.code, Some(1));
    Ok(())
}

#[tokio::test]
async fn init_creates_global_config() -> anyhow::Result<()> {
    let home = MfxHome::new()?;
    let config = home.global_root().join(TEAM_CONFIG);

    let out = home.run(&["init"]).await?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(out.stdout.trim_end(), config.display().to_string());
    assert!(home.global_root().join(SCHEMA_FILE).is_file());

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config)?)?;
    assert!(written["profiles"]["global_base"].is_object());

    let out = home.run(&["layers"]).await?;
    assert_eq!(out.lines(), vec![format!("{}\tglobal\tteam", config.display())]);

    let out = home.run(&["locate", "--global"]).await?;
    assert_eq!(out.stdout.trim_end(), config.display().to_string());
    Ok(())
}

#[tokio::test]
async fn list_shows_profiles_and_defaults() -> anyhow::Result<()> {
    let home = MfxHome::new()?;
    let config = serde_json::json!({
        "profiles": {
            "lpar1": { "type": "zosmf", "properties": { "host": "mvs1", "user": "ibmuser", "password": "pw" } },
            "lpar2": { "type": "zosmf", "properties": { "host": "mvs2" } }
        },
        "defaults": { "zosmf": "lpar2" }
    });
    home.write_global(TEAM_CONFIG, &config.to_string())?;

    let out = home.run(&["list", "--type", "zosmf"]).await?;
    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    assert_eq!(out.lines(), vec!["lpar1\tzosmf\tbasic", "lpar2\tzosmf\tunset\tdefault"]);
    Ok(())
}

#[tokio::test]
async fn malformed_layer_is_reported() -> anyhow::Result<()> {
    let home = MfxHome::new()?;
    let path = home.write_global(TEAM_CONFIG, "{ \"profiles\": { ,\n}")?;

    let out = home.run(&["locate", "--global"]).await?;
    assert_eq!(out.code, Some(0));
    assert_eq!(out.stdout.trim_end(), path.display().to_string());
    assert!(
        out.stderr.contains("Error encountered when loading your Zowe config"),
        "stderr: {}",
        out.stderr
    );
    Ok(())
}

#[tokio::test]
async fn dismissed_prompts_fail_cleanly() -> anyhow::Result<()> {
    let home = MfxHome::new()?;

    let out = home.run(&["delete"]).await?;
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("No profiles available"), "stderr: {}", out.stderr);

    let out = home.run(&["check", "nope"]).await?;
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_options_exit_two() -> anyhow::Result<()> {
    let home = MfxHome::new()?;
    let out = home.run(&["--log-format", "xml", "layers"]).await?;
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("invalid log format: xml"));
    Ok(())
}

#[tokio::test]
async fn workspace_without_config_locates_nothing() -> anyhow::Result<()> {
    let home = MfxHome::with_workspace()?;
    let out = home.run(&["locate"]).await?;
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.is_empty());
    Ok(())
}
