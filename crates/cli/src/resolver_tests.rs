// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use indexmap::IndexMap;
use serde_json::{json, Value};

use super::*;
use crate::layer::config_location;
use crate::schema::PropertySchema;
use crate::test_support::{EnvBuilder, GuiCall, TestEnv};

fn simple_config(name: &str) -> Value {
    json!({
        "profiles": { name: { "type": "zosmf", "properties": { "host": "mvs1" }, "secure": [] } },
        "defaults": { "zosmf": name }
    })
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn picks(env: &TestEnv) -> usize {
    env.gui.calls().iter().filter(|c| matches!(c, GuiCall::Pick(_))).count()
}

#[tokio::test]
async fn config_layers_lists_existing_only() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).project(simple_config("p")).build().await?;
    let layers = env.profiles.get_config_layers()?;
    let paths: Vec<_> = layers.iter().map(|l| l.path.clone()).collect();
    let project = env.roots().project.clone().unwrap_or_default();
    assert_eq!(paths, vec![project.join(TEAM_CONFIG), env.roots().global.join(TEAM_CONFIG)]);
    assert!(!layers[0].global);
    assert!(layers[1].global);
    Ok(())
}

#[tokio::test]
async fn existing_config_declined_opens_file() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).build().await?;
    let root = env.roots().global.clone();
    let before = std::fs::read(root.join(TEAM_CONFIG))?;
    env.gui.answer(None);

    assert_eq!(env.profiles.check_existing_config(&root).await?, ExistingConfig::Abort);
    assert_eq!(env.gui.opened(), vec![root.join(TEAM_CONFIG)]);
    assert_eq!(std::fs::read(root.join(TEAM_CONFIG))?, before);
    Ok(())
}

#[tokio::test]
async fn existing_config_accepted_names_file() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).build().await?;
    env.gui.answer(Some(CREATE_NEW_ITEM));
    let root = env.roots().global.clone();

    let answer = env.profiles.check_existing_config(&root).await?;
    assert_eq!(answer, ExistingConfig::Overwrite(TEAM_CONFIG.to_owned()));
    assert!(env.gui.opened().is_empty());
    Ok(())
}

#[tokio::test]
async fn no_existing_config_needs_no_prompt() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).workspace().build().await?;
    let project = env.roots().project.clone().unwrap_or_default();
    assert_eq!(env.profiles.check_existing_config(&project).await?, ExistingConfig::None);
    assert!(env.gui.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn create_without_workspace_targets_global() -> anyhow::Result<()> {
    let env = EnvBuilder::new().build().await?;

    let written = env.profiles.create_zowe_schema().await;
    let expected = env.roots().global.join(TEAM_CONFIG);
    assert_eq!(written.as_deref(), Some(expected.as_path()));
    assert_eq!(picks(&env), 0, "no location prompt without a workspace");
    assert_eq!(env.gui.opened(), vec![expected.clone()]);

    let config = read_json(&expected)?;
    assert_eq!(config["defaults"]["base"], json!("global_base"));
    assert_eq!(config["profiles"]["zosmf"]["properties"]["port"], json!(443));
    assert_eq!(config["profiles"]["zosmf"]["secure"], json!(["user", "password"]));
    assert_eq!(config["autoStore"], json!(true));
    assert!(env.roots().global.join(SCHEMA_FILE).is_file());
    assert!(env.profiles.table().get("zosmf").await.is_some());
    Ok(())
}

#[tokio::test]
async fn create_in_project_when_chosen() -> anyhow::Result<()> {
    let env = EnvBuilder::new().workspace().build().await?;
    env.gui.answer(Some(PROJECT_ITEM));

    let written = env.profiles.create_zowe_schema().await;
    let project = env.roots().project.clone().unwrap_or_default();
    assert_eq!(written, Some(project.join(TEAM_CONFIG)));
    let config = read_json(&project.join(TEAM_CONFIG))?;
    assert_eq!(config["defaults"]["base"], json!("project_base"));
    assert!(!env.roots().global.join(TEAM_CONFIG).exists());
    Ok(())
}

#[tokio::test]
async fn create_location_prompt_cancelled() -> anyhow::Result<()> {
    let env = EnvBuilder::new().workspace().build().await?;
    env.gui.answer(None);

    assert_eq!(env.profiles.create_zowe_schema().await, None);
    assert_eq!(env.gui.messages(), vec![OPERATION_CANCELLED.to_owned()]);
    assert!(env.profiles.get_config_layers()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_strips_secure_without_vault() -> anyhow::Result<()> {
    let env = EnvBuilder::new().secure_credentials(false).build().await?;

    let written = env.profiles.create_zowe_schema().await;
    let config = read_json(&written.unwrap_or_default())?;
    assert_eq!(config["autoStore"], json!(false));
    for (name, profile) in config["profiles"].as_object().cloned().unwrap_or_default() {
        assert!(profile.get("secure").is_none(), "{name} kept a secure list");
    }
    Ok(())
}

#[tokio::test]
async fn create_over_declined_existing_config_aborts() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).build().await?;
    let path = env.roots().global.join(TEAM_CONFIG);
    let before = std::fs::read(&path)?;
    env.gui.answer(None);

    assert_eq!(env.profiles.create_zowe_schema().await, None);
    assert_eq!(std::fs::read(&path)?, before);
    assert_eq!(env.gui.opened(), vec![path]);
    assert!(!env.roots().global.join(SCHEMA_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn create_merges_into_existing_user_layer() -> anyhow::Result<()> {
    let env = EnvBuilder::new().build().await?;
    let user_path = env.roots().global.join(USER_CONFIG);
    std::fs::write(&user_path, serde_json::to_string(&simple_config("mine"))?)?;
    env.gui.answer(Some(CREATE_NEW_ITEM));

    assert_eq!(env.profiles.create_zowe_schema().await, Some(user_path.clone()));
    let config = read_json(&user_path)?;
    assert_eq!(config["defaults"]["zosmf"], json!("mine"), "existing values win");
    assert!(config["profiles"]["global_base"].is_object());
    assert!(config["profiles"]["mine"].is_object());
    assert!(!env.roots().global.join(TEAM_CONFIG).exists());
    Ok(())
}

#[tokio::test]
async fn edit_single_layer_opens_directly() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).build().await?;
    let opened = env.profiles.edit_zowe_config_file().await;
    assert_eq!(opened, vec![env.roots().global.join(TEAM_CONFIG)]);
    assert_eq!(picks(&env), 0);
    assert_eq!(env.gui.messages(), vec![MANUAL_EDIT_MSG.to_owned()]);
    Ok(())
}

#[tokio::test]
async fn edit_several_layers_asks_for_scope() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).project(simple_config("p")).build().await?;
    env.gui.answer(Some(PROJECT_ITEM));

    let opened = env.profiles.edit_zowe_config_file().await;
    let project = env.roots().project.clone().unwrap_or_default();
    assert_eq!(opened, vec![project.join(TEAM_CONFIG)]);

    env.gui.answer(None);
    assert!(env.profiles.edit_zowe_config_file().await.is_empty());
    assert!(env.gui.messages().contains(&OPERATION_CANCELLED.to_owned()));
    Ok(())
}

#[tokio::test]
async fn extender_types_reach_schema_files() -> anyhow::Result<()> {
    let env = EnvBuilder::new().global(simple_config("g")).build().await?;
    let mut properties = IndexMap::new();
    properties.insert(
        "privateKey".to_owned(),
        PropertySchema {
            kind: "string".to_owned(),
            description: Some("Path to a private key".to_owned()),
            secure: false,
            include_in_template: false,
            default: None,
        },
    );
    let ssh = ProfileTypeConfig { profile_type: "ssh".to_owned(), title: None, properties };
    env.profiles.register_extender_types(vec![ssh.clone()]).await;
    env.profiles.register_extender_types(vec![ssh]).await;
    assert_eq!(env.profiles.extender_types.read().await.len(), 1);

    let written = env.profiles.write_schemas().await?;
    assert_eq!(written, vec![env.roots().global.join(SCHEMA_FILE)]);
    let schema = read_json(&written[0])?;
    assert!(schema["properties"]["defaults"]["properties"]["ssh"].is_object());
    Ok(())
}

#[test]
fn location_prefers_user_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join(TEAM_CONFIG), "{}")?;
    assert_eq!(config_location(dir.path()), Some(dir.path().join(TEAM_CONFIG)));
    std::fs::write(dir.path().join(USER_CONFIG), "{}")?;
    assert_eq!(config_location(dir.path()), Some(dir.path().join(USER_CONFIG)));
    Ok(())
}
