// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profile type schemas, the starter config they produce, and the JSON
//! schema document written next to team config files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::profile::BASE_TYPE;

/// Schema of one profile property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_in_template: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    fn new(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            description: Some(description.to_owned()),
            secure: false,
            include_in_template: false,
            default: None,
        }
    }

    fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    fn template(mut self, default: Value) -> Self {
        self.include_in_template = true;
        self.default = Some(default);
        self
    }
}

/// A registered profile type and its property schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTypeConfig {
    #[serde(rename = "type")]
    pub profile_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
}

impl ProfileTypeConfig {
    pub fn secure_props(&self) -> Vec<String> {
        self.properties.iter().filter(|(_, s)| s.secure).map(|(n, _)| n.clone()).collect()
    }
}

/// Built-in `zosmf` and `base` profile types.
pub fn core_types() -> Vec<ProfileTypeConfig> {
    let mut zosmf = IndexMap::new();
    zosmf.insert("host".to_owned(), PropertySchema::new("string", "The z/OSMF server host name."));
    zosmf.insert(
        "port".to_owned(),
        PropertySchema::new("number", "The z/OSMF server port.").template(json!(443)),
    );
    zosmf.insert("user".to_owned(), PropertySchema::new("string", "Mainframe user name.").secure());
    zosmf.insert("password".to_owned(), PropertySchema::new("string", "Mainframe password.").secure());
    zosmf.insert(
        "rejectUnauthorized".to_owned(),
        PropertySchema::new("boolean", "Reject self-signed certificates.").template(json!(true)),
    );
    zosmf.insert("basePath".to_owned(), PropertySchema::new("string", "API gateway base path."));
    zosmf.insert("protocol".to_owned(), PropertySchema::new("string", "Connection protocol."));
    zosmf.insert("encoding".to_owned(), PropertySchema::new("string", "Default data set encoding."));

    let mut base = IndexMap::new();
    base.insert("host".to_owned(), PropertySchema::new("string", "Host name of the service."));
    base.insert("port".to_owned(), PropertySchema::new("number", "Port of the service."));
    base.insert("user".to_owned(), PropertySchema::new("string", "User name to authenticate.").secure());
    base.insert("password".to_owned(), PropertySchema::new("string", "Password to authenticate.").secure());
    base.insert(
        "rejectUnauthorized".to_owned(),
        PropertySchema::new("boolean", "Reject self-signed certificates.").template(json!(true)),
    );
    base.insert("tokenType".to_owned(), PropertySchema::new("string", "Type of token to get and use."));
    base.insert(
        "tokenValue".to_owned(),
        PropertySchema::new("string", "Value of the token to authenticate.").secure(),
    );
    base.insert(
        "tokenExpiration".to_owned(),
        PropertySchema::new("string", "Expiration date of the token."),
    );

    vec![
        ProfileTypeConfig {
            profile_type: "zosmf".to_owned(),
            title: Some("z/OSMF Profile".to_owned()),
            properties: zosmf,
        },
        ProfileTypeConfig {
            profile_type: BASE_TYPE.to_owned(),
            title: Some("Base Profile".to_owned()),
            properties: base,
        },
    ]
}

/// Build a starter config holding one profile per type and a base profile.
/// With `populate`, every property carrying a default is written; otherwise
/// only template properties are.
pub fn build_config(types: &[ProfileTypeConfig], global: bool, populate: bool) -> Value {
    let base_name = if global { "global_base" } else { "project_base" };
    let mut profiles = Map::new();
    let mut defaults = Map::new();
    for ty in types {
        let name =
            if ty.profile_type == BASE_TYPE { base_name.to_owned() } else { ty.profile_type.clone() };
        let mut properties = Map::new();
        for (prop, schema) in &ty.properties {
            if schema.secure || !(populate || schema.include_in_template) {
                continue;
            }
            if let Some(ref default) = schema.default {
                properties.insert(prop.clone(), default.clone());
            }
        }
        let secure: Vec<Value> = ty.secure_props().into_iter().map(Value::String).collect();
        profiles.insert(
            name.clone(),
            json!({ "type": ty.profile_type, "properties": properties, "secure": secure }),
        );
        defaults.insert(ty.profile_type.clone(), Value::String(name));
    }
    json!({
        "$schema": format!("./{}", crate::layer::SCHEMA_FILE),
        "profiles": profiles,
        "defaults": defaults,
        "autoStore": true,
    })
}

/// Remove every `secure` list and force `autoStore` off. Used when no
/// credential vault is available.
pub fn strip_secure(config: &mut Value) {
    if let Some(profiles) = config.get_mut("profiles") {
        strip_profiles(profiles);
    }
    if let Value::Object(map) = config {
        map.insert("autoStore".to_owned(), Value::Bool(false));
    }
}

fn strip_profiles(profiles: &mut Value) {
    let Value::Object(map) = profiles else { return };
    for obj in map.values_mut() {
        if let Value::Object(inner) = obj {
            inner.shift_remove("secure");
            if let Some(nested) = inner.get_mut("profiles") {
                strip_profiles(nested);
            }
        }
    }
}

/// JSON schema document describing configs for the given types.
pub fn build_schema(types: &[ProfileTypeConfig]) -> Value {
    let names: Vec<&str> = types.iter().map(|t| t.profile_type.as_str()).collect();
    let mut conditions = vec![json!({
        "if": { "properties": { "type": false } },
        "then": { "properties": { "properties": { "title": "Missing profile type" } } }
    })];
    let mut default_props = Map::new();
    for ty in types {
        let mut props = Map::new();
        for (name, schema) in &ty.properties {
            let mut entry = json!({ "type": schema.kind });
            if let Some(ref description) = schema.description {
                entry["description"] = json!(description);
            }
            if let Some(ref default) = schema.default {
                entry["default"] = default.clone();
            }
            props.insert(name.clone(), entry);
        }
        conditions.push(json!({
            "if": { "properties": { "type": { "const": ty.profile_type } } },
            "then": {
                "properties": {
                    "properties": {
                        "type": "object",
                        "title": ty.title.clone().unwrap_or_else(|| ty.profile_type.clone()),
                        "properties": props
                    },
                    "secure": { "items": { "enum": ty.secure_props() } }
                }
            }
        }));
        default_props.insert(
            ty.profile_type.clone(),
            json!({ "description": format!("Default {} profile", ty.profile_type), "type": "string" }),
        );
    }
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$version": "1.0",
        "type": "object",
        "description": "Zowe configuration",
        "properties": {
            "profiles": {
                "type": "object",
                "description": "Mapping of profile names to profile configurations",
                "patternProperties": {
                    "^\\S*$": {
                        "type": "object",
                        "description": "Profile configuration object",
                        "properties": {
                            "type": { "description": "Profile type", "type": "string", "enum": names },
                            "properties": { "description": "Profile properties object", "type": "object" },
                            "profiles": { "description": "Optional subprofile configurations", "type": "object", "$ref": "#/properties/profiles" },
                            "secure": { "description": "Secure property names", "type": "array", "items": { "type": "string" }, "uniqueItems": true }
                        },
                        "allOf": conditions
                    }
                }
            },
            "defaults": {
                "type": "object",
                "description": "Mapping of profile types to default profile names",
                "properties": default_props
            },
            "autoStore": {
                "type": "boolean",
                "description": "If true, values you enter when prompted are stored for future use"
            }
        }
    })
}

/// Core types followed by extender types, without duplicate type names.
pub fn all_types(extenders: &[ProfileTypeConfig]) -> Vec<ProfileTypeConfig> {
    let mut out = core_types();
    for ty in extenders {
        match out.iter_mut().find(|t| t.profile_type == ty.profile_type) {
            Some(existing) => *existing = ty.clone(),
            None => out.push(ty.clone()),
        }
    }
    out
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
