// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::Ordering;

use serde_json::{json, Value};

use super::*;
use crate::error::ApiError;
use crate::layer::TEAM_CONFIG;
use crate::test_support::{EnvBuilder, GuiCall, MockApi, TestEnv};

const GATEWAY: &str = "apimlAuthenticationToken";

fn basic_config() -> Value {
    json!({
        "profiles": {
            "sestest": {
                "type": "zosmf",
                "properties": { "host": "lpar.example.com", "port": 1443, "user": "ibmuser", "password": "sys1" },
                "secure": ["user", "password"]
            },
            "base": {
                "type": "base",
                "properties": { "host": "gateway.example.com", "port": 7554 },
                "secure": []
            }
        },
        "defaults": { "zosmf": "sestest", "base": "base" }
    })
}

fn leaf_token_config() -> Value {
    json!({
        "profiles": {
            "sestest": {
                "type": "zosmf",
                "properties": { "host": "lpar.example.com", "tokenType": "LtpaToken2", "tokenValue": "old-tok" },
                "secure": ["tokenValue"]
            },
            "base": { "type": "base", "properties": {}, "secure": [] }
        },
        "defaults": { "zosmf": "sestest", "base": "base" }
    })
}

fn gateway_token_config() -> Value {
    json!({
        "profiles": {
            "sestest": {
                "type": "zosmf",
                "properties": { "host": "lpar.example.com", "basePath": "/ibmzosmf/api/v1" },
                "secure": []
            },
            "base": {
                "type": "base",
                "properties": {
                    "host": "gateway.example.com",
                    "tokenType": GATEWAY,
                    "tokenValue": "gw-tok",
                    "tokenExpiration": "2026-12-31"
                },
                "secure": ["tokenValue"]
            }
        },
        "defaults": { "zosmf": "sestest", "base": "base" }
    })
}

async fn env_with(config: Value, api: MockApi) -> anyhow::Result<TestEnv> {
    EnvBuilder::new().global(config).api(api).build().await
}

fn config_bytes(env: &TestEnv) -> anyhow::Result<Vec<u8>> {
    Ok(std::fs::read(env.roots().global.join(TEAM_CONFIG))?)
}

#[tokio::test]
async fn switch_to_gateway_token_moves_token_to_base() -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::with_token_type(Some(GATEWAY))).await?;
    env.gui.answer(Some("Yes")).answer(Some("ibmuser")).answer(Some("sys1"));

    let outcome = env.profiles.handle_switch_authentication("sestest").await;
    assert_eq!(outcome, SwitchOutcome::Switched(AuthMode::Token));

    let team = env.team()?;
    assert_eq!(team.get("profiles.sestest.secure"), Some(&json!([])));
    let leaf = team.merged_values("sestest");
    assert!(leaf.get("user").is_none());
    assert!(leaf.get("password").is_none());
    assert_eq!(team.merged_values("base").get("tokenValue"), Some(&json!("tok-1")));

    let cached = env.profile("sestest").await?;
    assert_eq!(cached.attrs.user, None);
    assert_eq!(cached.attrs.password, None);

    let session = env.api.last_session.lock().clone();
    assert_eq!(session.map(|s| s.hostname), Some("gateway.example.com".to_owned()));
    assert!(env
        .gui
        .messages()
        .contains(&"Login using token-based authentication service was successful for profile sestest.".to_owned()));
    Ok(())
}

#[tokio::test]
async fn switch_to_profile_token_keeps_token_on_leaf() -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::default()).await?;
    env.gui.answer(Some("Yes")).answer(Some("ibmuser")).answer(Some("sys1"));

    let outcome = env.profiles.handle_switch_authentication("sestest").await;
    assert_eq!(outcome, SwitchOutcome::Switched(AuthMode::Token));

    let team = env.team()?;
    assert_eq!(team.get("profiles.sestest.secure"), Some(&json!(["tokenValue"])));
    let leaf = team.merged_values("sestest");
    assert_eq!(leaf.get("tokenValue"), Some(&json!("tok-1")));
    assert!(leaf.get("user").is_none());
    assert!(env.profiles.is_using_token_auth("sestest").await?);
    Ok(())
}

#[tokio::test]
async fn switch_to_basic_clears_leaf_token() -> anyhow::Result<()> {
    let env = env_with(leaf_token_config(), MockApi::default()).await?;
    let mut events = env.profiles.subscribe();
    env.gui.answer(Some("Yes")).answer(Some("newuser")).answer(Some("newpass"));

    let outcome = env.profiles.handle_switch_authentication("sestest").await;
    assert_eq!(outcome, SwitchOutcome::Switched(AuthMode::Basic));

    let team = env.team()?;
    assert_eq!(team.get("profiles.sestest.secure"), Some(&json!(["user", "password"])));
    let leaf = team.merged_values("sestest");
    assert!(leaf.get("tokenValue").is_none());
    assert!(leaf.get("tokenType").is_none());
    assert_eq!(leaf.get("user"), Some(&json!("newuser")));

    let cached = env.profile("sestest").await?;
    assert_eq!(cached.attrs.token_value, None);
    assert_eq!(cached.attrs.password.as_deref(), Some("newpass"));
    assert!(!env.profiles.is_using_token_auth("sestest").await?);

    let mut saw_update = false;
    while let Ok(event) = events.try_recv() {
        saw_update |= event == ProfileEvent::Update { profile: "sestest".to_owned() };
    }
    assert!(saw_update);
    Ok(())
}

#[tokio::test]
async fn switch_to_basic_clears_gateway_token_on_base() -> anyhow::Result<()> {
    let env = env_with(gateway_token_config(), MockApi::with_token_type(Some(GATEWAY))).await?;
    env.gui.answer(Some("Yes")).answer(Some("newuser")).answer(Some("newpass"));

    let outcome = env.profiles.handle_switch_authentication("sestest").await;
    assert_eq!(outcome, SwitchOutcome::Switched(AuthMode::Basic));

    let team = env.team()?;
    assert_eq!(team.get("profiles.sestest.secure"), Some(&json!(["user", "password"])));
    assert_eq!(team.get("profiles.base.secure"), Some(&json!([])));
    let base = team.merged_values("base");
    for field in ["tokenType", "tokenValue", "tokenExpiration"] {
        assert!(base.get(field).is_none(), "{field} left on base");
    }
    assert_eq!(base.get("host"), Some(&json!("gateway.example.com")));
    assert_eq!(env.profile("base").await?.attrs.token_value, None);
    Ok(())
}

async fn assert_unconfirmed(answer: Option<&str>, expected: SwitchOutcome) -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::default()).await?;
    let before = config_bytes(&env)?;
    env.gui.answer(answer);

    assert_eq!(env.profiles.handle_switch_authentication("sestest").await, expected);
    assert_eq!(config_bytes(&env)?, before);
    assert_eq!(env.api.login_calls(), 0);
    assert!(env.profile("sestest").await?.is_using_basic_auth());
    Ok(())
}

#[tokio::test]
async fn dismissed_confirmation_is_a_no_op() -> anyhow::Result<()> {
    assert_unconfirmed(None, SwitchOutcome::Cancelled).await
}

#[tokio::test]
async fn declined_confirmation_is_a_no_op() -> anyhow::Result<()> {
    assert_unconfirmed(Some("No"), SwitchOutcome::Declined).await
}

#[tokio::test]
async fn cancelled_credentials_leave_file_untouched() -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::default()).await?;
    let before = config_bytes(&env)?;
    env.gui.answer(Some("Yes")).answer(None);

    assert_eq!(env.profiles.handle_switch_authentication("sestest").await, SwitchOutcome::Cancelled);
    assert_eq!(config_bytes(&env)?, before);
    assert!(env.gui.messages().contains(&OPERATION_CANCELLED.to_owned()));
    Ok(())
}

#[tokio::test]
async fn unknown_token_type_refuses_switch() -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::with_token_type(None)).await?;
    let before = config_bytes(&env)?;
    env.gui.answer(Some("Yes"));

    assert_eq!(env.profiles.handle_switch_authentication("sestest").await, SwitchOutcome::Failed);
    assert_eq!(env.gui.errors(), vec!["Cannot switch to Token-based Authentication for profile sestest.".to_owned()]);
    assert_eq!(config_bytes(&env)?, before);
    Ok(())
}

#[tokio::test]
async fn failed_login_reports_and_keeps_state() -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::default()).await?;
    *env.api.login_reply.lock() = Err(ApiError::new("Unauthorized").with_status(401));
    let before = config_bytes(&env)?;
    env.gui.answer(Some("Yes")).answer(Some("ibmuser")).answer(Some("bad"));

    assert_eq!(env.profiles.handle_switch_authentication("sestest").await, SwitchOutcome::Failed);
    assert_eq!(
        env.gui.errors(),
        vec!["Unable to switch to Token-based authentication for profile sestest.".to_owned()]
    );
    assert_eq!(config_bytes(&env)?, before);
    Ok(())
}

#[tokio::test]
async fn sso_login_refuses_basic_profile() -> anyhow::Result<()> {
    let env = env_with(basic_config(), MockApi::default()).await?;
    assert!(!env.profiles.sso_login("sestest").await);
    assert_eq!(env.api.login_calls(), 0);
    assert_eq!(
        env.gui.messages(),
        vec!["This profile is using basic authentication and does not support token authentication.".to_owned()]
    );
    Ok(())
}

#[tokio::test]
async fn sso_login_reports_missing_token_type() -> anyhow::Result<()> {
    let env = env_with(leaf_token_config(), MockApi::with_token_type(None)).await?;
    assert!(!env.profiles.sso_login("sestest").await);
    assert_eq!(env.gui.messages(), vec!["Error getting supported tokenType value for profile sestest".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn sso_login_stores_profile_token() -> anyhow::Result<()> {
    let env = env_with(leaf_token_config(), MockApi::default()).await?;
    env.gui.answer(Some("ibmuser")).answer(Some("sys1"));

    assert!(env.profiles.sso_login("sestest").await);
    let session = env.api.last_session.lock().clone();
    assert_eq!(session.as_ref().and_then(|s| s.user.clone()).as_deref(), Some("ibmuser"));
    assert_eq!(session.and_then(|s| s.token_value), None);
    assert_eq!(env.profile("sestest").await?.attrs.token_value.as_deref(), Some("tok-1"));
    assert!(env.gui.messages().contains(&"Login to authentication service was successful for sestest.".to_owned()));
    let inputs = env.gui.calls().into_iter().filter(|c| matches!(c, GuiCall::Input(_))).count();
    assert_eq!(inputs, 2);
    Ok(())
}

#[tokio::test]
async fn sso_login_failure_is_reported() -> anyhow::Result<()> {
    let env = env_with(leaf_token_config(), MockApi::default()).await?;
    *env.api.login_reply.lock() = Err(ApiError::new("bad credentials").with_status(401));
    env.gui.answer(Some("ibmuser")).answer(Some("nope"));

    assert!(!env.profiles.sso_login("sestest").await);
    assert_eq!(env.gui.errors(), vec!["Unable to log in with sestest. bad credentials".to_owned()]);
    assert_eq!(env.profile("sestest").await?.attrs.token_value.as_deref(), Some("old-tok"));
    Ok(())
}

#[tokio::test]
async fn sso_logout_removes_profile_token() -> anyhow::Result<()> {
    let env = env_with(leaf_token_config(), MockApi::default()).await?;
    assert!(env.profiles.sso_logout("sestest").await);

    assert_eq!(env.api.logout_calls.load(Ordering::SeqCst), 1);
    let team = env.team()?;
    assert!(team.merged_values("sestest").get("tokenValue").is_none());
    assert_eq!(team.get("profiles.sestest.secure"), Some(&json!([])));
    assert_eq!(env.profile("sestest").await?.attrs.token_value, None);
    assert!(env
        .gui
        .messages()
        .contains(&"Logout from authentication service was successful for sestest.".to_owned()));
    Ok(())
}

#[tokio::test]
async fn sso_logout_clears_gateway_token_on_base() -> anyhow::Result<()> {
    let env = env_with(gateway_token_config(), MockApi::with_token_type(Some(GATEWAY))).await?;
    assert!(env.profiles.sso_logout("sestest").await);

    let session = env.api.last_session.lock().clone();
    assert_eq!(session.map(|s| s.hostname), Some("gateway.example.com".to_owned()));
    let team = env.team()?;
    assert!(team.merged_values("base").get("tokenValue").is_none());
    assert_eq!(env.profile("base").await?.attrs.token_value, None);
    assert_eq!(env.profile("sestest").await?.attrs.token_value, None);
    Ok(())
}

#[test]
fn gateway_session_prefers_base_host() {
    let base = Profile::new("base", "base", crate::profile::ProfileAttrs::default());
    let service = Profile::new(
        "sestest",
        "zosmf",
        crate::profile::ProfileAttrs {
            host: Some("lpar".to_owned()),
            port: Some(1443),
            base_path: Some("/ibmzosmf/api/v1".to_owned()),
            ..Default::default()
        },
    );
    let session = gateway_session(&base, &service, GATEWAY, Some(("u".to_owned(), "p".to_owned())));
    assert_eq!(session.hostname, "lpar");
    assert_eq!(session.port, 1443);
    assert_eq!(session.base_path, None);
    assert_eq!(session.token_type.as_deref(), Some(GATEWAY));
    assert_eq!(session.user.as_deref(), Some("u"));
}
