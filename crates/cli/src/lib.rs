// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod api;
pub mod auth;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod gui;
pub mod handling;
pub mod layer;
pub mod profile;
pub mod profiles;
pub mod refresh;
pub mod resolver;
pub mod schema;
pub mod secure;
pub mod team;
pub mod test_support;
pub mod tree;
pub mod validation;
pub mod vault;
