// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::{Config, LogFormat};
use crate::command::Command;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn defaults_with_explicit_home() -> anyhow::Result<()> {
    let config = parse(&["mfx", "--home", "/u/ibmuser/.zowe", "list"]);
    config.validate()?;
    assert!(config.secure_credentials);
    assert_eq!(config.status_timeout(), Duration::from_secs(30));
    assert_eq!(config.log_format()?, LogFormat::Text);
    assert!(matches!(config.command, Command::List { .. }));

    let settings = config.settings()?;
    assert_eq!(settings.roots.global, PathBuf::from("/u/ibmuser/.zowe"));
    assert_eq!(settings.roots.project, None);
    assert!(settings.secure_credentials);
    Ok(())
}

#[test]
fn workspace_becomes_project_root() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ws = dir.path().to_string_lossy().into_owned();
    let config = parse(&["mfx", "--home", "/h", "--workspace", &ws, "--secure-credentials", "false", "layers"]);
    config.validate()?;
    let settings = config.settings()?;
    assert_eq!(settings.roots.project.as_deref(), Some(dir.path()));
    assert!(!settings.secure_credentials);
    Ok(())
}

#[yare::parameterized(
    empty_home     = { &["mfx", "--home", "", "layers"], "--home must not be empty" },
    bad_log_format = { &["mfx", "--home", "/h", "--log-format", "xml", "layers"], "invalid log format: xml" },
    zero_timeout   = { &["mfx", "--home", "/h", "--status-timeout-secs", "0", "layers"], "greater than zero" },
    missing_ws     = { &["mfx", "--home", "/h", "--workspace", "/no/such/ws", "layers"], "is not a directory" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    crate::assert_err_contains!(config.validate(), expected_substr);
}

#[yare::parameterized(
    text  = { "text", LogFormat::Text },
    json  = { "json", LogFormat::Json },
    upper = { "JSON", LogFormat::Json },
)]
fn log_format_parses(input: &str, expected: LogFormat) {
    assert_eq!(input.parse::<LogFormat>().ok(), Some(expected));
}

#[test]
fn subcommand_arguments() {
    let config = parse(&["mfx", "--home", "/h", "check", "lpar1", "--no-validate"]);
    match config.command {
        Command::Check { name, no_validate } => {
            assert_eq!(name, "lpar1");
            assert!(no_validate);
        }
        other => panic!("unexpected command {other:?}"),
    }
    let config = parse(&["mfx", "--home", "/h", "delete"]);
    assert!(matches!(config.command, Command::Delete { name: None }));
}

#[test]
#[serial_test::serial]
fn home_defaults_under_user_home() -> anyhow::Result<()> {
    let saved = std::env::var_os("HOME");
    std::env::set_var("HOME", "/home/ibmuser");
    let config = parse(&["mfx", "layers"]);
    let home = config.home_dir();
    match saved {
        Some(v) => std::env::set_var("HOME", v),
        None => std::env::remove_var("HOME"),
    }
    // ZOWE_CLI_HOME from the test environment wins over $HOME.
    if config.home.is_none() {
        assert_eq!(home?, PathBuf::from("/home/ibmuser/.zowe"));
    }
    Ok(())
}

#[test]
fn test_fixture_is_valid() -> anyhow::Result<()> {
    Config::test().validate()
}
