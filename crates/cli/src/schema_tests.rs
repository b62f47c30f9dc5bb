// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;

fn ssh_type() -> ProfileTypeConfig {
    let mut properties = IndexMap::new();
    properties.insert(
        "port".to_owned(),
        PropertySchema {
            kind: "number".to_owned(),
            description: None,
            secure: false,
            include_in_template: true,
            default: Some(json!(22)),
        },
    );
    properties.insert(
        "privateKey".to_owned(),
        PropertySchema {
            kind: "string".to_owned(),
            description: None,
            secure: true,
            include_in_template: false,
            default: None,
        },
    );
    ProfileTypeConfig { profile_type: "ssh".to_owned(), title: None, properties }
}

#[test]
fn build_config_creates_profile_per_type() {
    let config = build_config(&all_types(&[ssh_type()]), true, false);
    assert_eq!(config["defaults"]["base"], json!("global_base"));
    assert_eq!(config["defaults"]["ssh"], json!("ssh"));
    assert_eq!(config["profiles"]["zosmf"]["properties"], json!({"port": 443, "rejectUnauthorized": true}));
    assert_eq!(config["profiles"]["zosmf"]["secure"], json!(["user", "password"]));
    assert_eq!(config["profiles"]["ssh"]["secure"], json!(["privateKey"]));
    assert_eq!(config["autoStore"], json!(true));
}

#[test]
fn project_config_uses_project_base() {
    let config = build_config(&core_types(), false, true);
    assert_eq!(config["defaults"]["base"], json!("project_base"));
    assert!(config["profiles"]["project_base"].is_object());
}

#[test]
fn strip_secure_removes_nested_lists() {
    let mut config = json!({
        "profiles": {
            "lpar": { "secure": ["user"], "profiles": { "zosmf": { "type": "zosmf", "secure": ["password"] } } }
        },
        "autoStore": true
    });
    strip_secure(&mut config);
    assert_eq!(
        config,
        json!({ "profiles": { "lpar": { "profiles": { "zosmf": { "type": "zosmf" } } } }, "autoStore": false })
    );
}

#[test]
fn schema_lists_types_and_secure_props() {
    let schema = build_schema(&all_types(&[ssh_type()]));
    let profile = &schema["properties"]["profiles"]["patternProperties"]["^\\S*$"];
    assert_eq!(profile["properties"]["type"]["enum"], json!(["zosmf", "base", "ssh"]));
    let ssh = &profile["allOf"][3];
    assert_eq!(ssh["if"]["properties"]["type"]["const"], json!("ssh"));
    assert_eq!(ssh["then"]["properties"]["secure"]["items"]["enum"], json!(["privateKey"]));
    assert!(schema["properties"]["defaults"]["properties"]["ssh"].is_object());
}

#[test]
fn extender_type_replaces_core_type_of_same_name() {
    let mut custom = ssh_type();
    custom.profile_type = "zosmf".to_owned();
    let types = all_types(&[custom]);
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].secure_props(), vec!["privateKey".to_owned()]);
}
