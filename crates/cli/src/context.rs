// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborators shared by every profile-engine component.
//!
//! One context is built per host process and handed to the components that
//! need it, so there is exactly one authoritative profile table without any
//! global state.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::api::ApiRegister;
use crate::event::ProfileEvent;
use crate::gui::Gui;
use crate::layer::LayerRoots;
use crate::tree::TreeProviders;
use crate::vault::CredentialVault;

/// Runtime settings the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub roots: LayerRoots,
    /// Whether secure property values go to the OS credential vault.
    pub secure_credentials: bool,
}

pub struct ExplorerContext {
    pub settings: Settings,
    pub gui: Arc<dyn Gui>,
    pub register: Arc<ApiRegister>,
    pub trees: TreeProviders,
    pub vault: Arc<dyn CredentialVault>,
    pub events: broadcast::Sender<ProfileEvent>,
}

impl std::fmt::Debug for ExplorerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerContext")
            .field("settings", &self.settings)
            .field("register", &self.register)
            .finish()
    }
}

impl ExplorerContext {
    pub fn new(
        settings: Settings,
        gui: Arc<dyn Gui>,
        register: Arc<ApiRegister>,
        trees: TreeProviders,
        vault: Arc<dyn CredentialVault>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { settings, gui, register, trees, vault, events }
    }

    /// Broadcast a profile event. Having no subscribers is fine.
    pub fn emit(&self, event: ProfileEvent) {
        let _ = self.events.send(event);
    }
}
