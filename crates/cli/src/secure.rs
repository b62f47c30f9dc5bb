// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rewrites a profile's secure property list and removes stale auth fields
//! when the profile changes authentication mode.
//!
//! Only values set at the profile's own location are deleted; inherited
//! values are left to the profile that owns them. All deletes run before the
//! secure list is set, followed by one save.

use crate::team::{list_value, string_list, KnownArg, ProfileLocation, TeamConfig};

/// Token types issued by the shared API gateway start with this.
pub const GATEWAY_TOKEN_PREFIX: &str = "apimlAuthenticationToken";

pub const TOKEN_FIELDS: [&str; 3] = ["tokenType", "tokenValue", "tokenExpiration"];
pub const CREDENTIAL_FIELDS: [&str; 2] = ["user", "password"];

pub fn is_gateway_token(token_type: &str) -> bool {
    token_type.starts_with(GATEWAY_TOKEN_PREFIX)
}

fn locate(team: &TeamConfig, name: &str) -> anyhow::Result<ProfileLocation> {
    team.profile_location(name)
        .ok_or_else(|| anyhow::anyhow!("Could not find profile named: {name}."))
}

/// Delete each of `fields` that was set at `loc` itself. Each field is
/// handled independently since any of them may be absent.
fn delete_own_fields(
    team: &mut TeamConfig,
    args: &[KnownArg],
    loc: &ProfileLocation,
    fields: &[&str],
) -> anyhow::Result<()> {
    team.activate(loc.user, loc.global)?;
    for field in fields {
        let own = format!("{}.properties.{field}", loc.json_loc);
        match args.iter().find(|a| a.arg_name == *field) {
            Some(arg) if arg.arg_loc.json_loc == own && arg.arg_loc.os_loc == loc.os_loc => {
                team.delete(&own);
            }
            Some(arg) => {
                tracing::debug!(field, from = %arg.arg_loc.json_loc, "skipping inherited field");
            }
            None => {}
        }
    }
    Ok(())
}

fn set_secure(team: &mut TeamConfig, loc: &ProfileLocation, list: &[String]) -> anyhow::Result<()> {
    team.activate(loc.user, loc.global)?;
    team.set(&format!("{}.secure", loc.json_loc), list_value(list));
    Ok(())
}

fn without(list: Vec<String>, fields: &[&str]) -> Vec<String> {
    list.into_iter().filter(|p| !fields.contains(&p.as_str())).collect()
}

/// Rewrite the leaf profile after a switch from basic to token auth.
pub fn basic_auth_clear_secure_array(
    team: &mut TeamConfig,
    name: &str,
    token_type: &str,
) -> anyhow::Result<()> {
    let loc = locate(team, name)?;
    let args = team.merge_args(name);
    delete_own_fields(team, &args, &loc, &CREDENTIAL_FIELDS)?;
    let secure = if is_gateway_token(token_type) { vec![] } else { vec!["tokenValue".to_owned()] };
    set_secure(team, &loc, &secure)?;
    team.save()?;
    tracing::info!(profile = name, token_type, "cleared basic credentials");
    Ok(())
}

/// Rewrite after a switch from token to basic auth. Gateway tokens live on
/// the default base profile, which loses its token fields; the leaf always
/// ends up listing `user` and `password` as secure.
pub fn token_auth_clear_secure_array(
    team: &mut TeamConfig,
    name: &str,
    token_type: Option<&str>,
) -> anyhow::Result<()> {
    let loc = locate(team, name)?;
    let args = team.merge_args(name);

    let base = match token_type.filter(|t| is_gateway_token(t)) {
        Some(_) => {
            let base_name = team
                .default_base()
                .ok_or_else(|| anyhow::anyhow!("no base profile holds the gateway token"))?;
            let base_loc = locate(team, &base_name)?;
            let base_args = team.merge_args(&base_name);
            delete_own_fields(team, &base_args, &base_loc, &TOKEN_FIELDS)?;
            Some(base_loc)
        }
        None => None,
    };
    delete_own_fields(team, &args, &loc, &TOKEN_FIELDS)?;

    if let Some(base_loc) = base {
        team.activate(base_loc.user, base_loc.global)?;
        let trimmed = without(string_list(team.get(&format!("{}.secure", base_loc.json_loc))), &TOKEN_FIELDS);
        set_secure(team, &base_loc, &trimmed)?;
    }
    set_secure(team, &loc, &["user".to_owned(), "password".to_owned()])?;
    team.save()?;
    tracing::info!(profile = name, "cleared token fields");
    Ok(())
}

/// Remove a profile's own token fields and drop them from its secure list.
pub fn remove_token(team: &mut TeamConfig, name: &str) -> anyhow::Result<()> {
    let loc = locate(team, name)?;
    let args = team.merge_args(name);
    delete_own_fields(team, &args, &loc, &TOKEN_FIELDS)?;
    let trimmed = without(string_list(team.get(&format!("{}.secure", loc.json_loc))), &TOKEN_FIELDS);
    set_secure(team, &loc, &trimmed)?;
    team.save()
}

#[cfg(test)]
#[path = "secure_tests.rs"]
mod tests;
