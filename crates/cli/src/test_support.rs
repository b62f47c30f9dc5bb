// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: builders, mocks, and assertion helpers.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiRegister, CommonApi, Session};
use crate::context::{ExplorerContext, Settings};
use crate::error::ApiError;
use crate::gui::{Gui, InputOptions};
use crate::layer::{LayerRoots, TEAM_CONFIG};
use crate::profile::Profile;
use crate::profiles::Profiles;
use crate::team::TeamConfig;
use crate::tree::{TreeKind, TreeProviders};
use crate::vault::MemoryVault;

/// Install the ring crypto provider once per process.
pub fn ensure_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// A recorded interaction with [`MockGui`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCall {
    Message(String),
    Error(String),
    Modal(String),
    Pick(String),
    Input(String),
    Open(PathBuf),
    Progress(String),
}

/// Scripted GUI. Every prompt (pick, input, modal, and messages offering
/// items) consumes the next queued answer; an empty queue dismisses.
#[derive(Debug, Default)]
pub struct MockGui {
    calls: Mutex<Vec<GuiCall>>,
    answers: Mutex<VecDeque<Option<String>>>,
    cancel_progress: AtomicBool,
}

impl MockGui {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer. `None` dismisses the prompt.
    pub fn answer(&self, answer: Option<&str>) -> &Self {
        self.answers.lock().push_back(answer.map(str::to_owned));
        self
    }

    /// Make every progress indication report user cancellation.
    pub fn cancel_progress(&self) {
        self.cancel_progress.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GuiCall> {
        self.calls.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.filter(|c| match c {
            GuiCall::Message(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.filter(|c| match c {
            GuiCall::Error(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.filter(|c| match c {
            GuiCall::Open(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn pending_answers(&self) -> usize {
        self.answers.lock().len()
    }

    fn filter<T>(&self, f: impl Fn(&GuiCall) -> Option<T>) -> Vec<T> {
        self.calls.lock().iter().filter_map(f).collect()
    }

    fn record(&self, call: GuiCall) {
        self.calls.lock().push(call);
    }

    fn next_answer(&self) -> Option<String> {
        self.answers.lock().pop_front().flatten()
    }
}

#[async_trait]
impl Gui for MockGui {
    async fn show_message(&self, message: &str, items: &[&str]) -> Option<String> {
        self.record(GuiCall::Message(message.to_owned()));
        if items.is_empty() {
            return None;
        }
        self.next_answer()
    }

    async fn error_message(&self, message: &str, items: &[&str]) -> Option<String> {
        self.record(GuiCall::Error(message.to_owned()));
        if items.is_empty() {
            return None;
        }
        self.next_answer()
    }

    async fn warning_modal(&self, message: &str, _items: &[&str]) -> Option<String> {
        self.record(GuiCall::Modal(message.to_owned()));
        self.next_answer()
    }

    async fn pick(&self, placeholder: &str, _items: &[String]) -> Option<String> {
        self.record(GuiCall::Pick(placeholder.to_owned()));
        self.next_answer()
    }

    async fn input(&self, options: &InputOptions) -> Option<String> {
        self.record(GuiCall::Input(options.prompt.clone()));
        self.next_answer()
    }

    async fn open_file(&self, path: &Path, _position: Option<(usize, usize)>) {
        self.record(GuiCall::Open(path.to_path_buf()));
    }

    fn begin_progress(&self, title: &str) -> CancellationToken {
        self.record(GuiCall::Progress(title.to_owned()));
        let token = CancellationToken::new();
        if self.cancel_progress.load(Ordering::SeqCst) {
            token.cancel();
        }
        token
    }
}

/// Scripted status probe reply.
#[derive(Debug, Clone)]
pub enum StatusReply {
    Active,
    Inactive,
    Unknown,
    Fail(ApiError),
    /// Never completes.
    Hang,
}

/// Scripted mainframe API with call counters.
#[derive(Debug)]
pub struct MockApi {
    pub supports_status: bool,
    pub status: Mutex<StatusReply>,
    /// `None` makes token type lookup fail.
    pub token_type: Option<String>,
    pub login_reply: Mutex<Result<String, ApiError>>,
    pub status_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub last_session: Mutex<Option<Session>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            supports_status: true,
            status: Mutex::new(StatusReply::Active),
            token_type: Some("LtpaToken2".to_owned()),
            login_reply: Mutex::new(Ok("tok-1".to_owned())),
            status_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            last_session: Mutex::new(None),
        }
    }
}

impl MockApi {
    pub fn with_token_type(token_type: Option<&str>) -> Self {
        Self { token_type: token_type.map(str::to_owned), ..Self::default() }
    }

    pub fn set_status(&self, reply: StatusReply) {
        *self.status.lock() = reply;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommonApi for MockApi {
    fn supports_status(&self) -> bool {
        self.supports_status
    }

    async fn get_status(&self, _profile: &Profile, _profile_type: &str) -> anyhow::Result<Option<String>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.status.lock().clone();
        match reply {
            StatusReply::Active => Ok(Some("active".to_owned())),
            StatusReply::Inactive => Ok(Some("inactive".to_owned())),
            StatusReply::Unknown => Ok(None),
            StatusReply::Fail(err) => Err(err.into()),
            StatusReply::Hang => std::future::pending().await,
        }
    }

    async fn token_type_name(&self, _profile: &Profile) -> anyhow::Result<String> {
        self.token_type.clone().ok_or_else(|| ApiError::new("token type not supported").into())
    }

    async fn login(&self, session: &Session) -> anyhow::Result<String> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_session.lock() = Some(session.clone());
        self.login_reply.lock().clone().map_err(Into::into)
    }

    async fn logout(&self, session: &Session) -> anyhow::Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_session.lock() = Some(session.clone());
        Ok(())
    }
}

/// Builder for a profile engine over a temporary home directory.
pub struct EnvBuilder {
    global: Option<Value>,
    project: Option<Value>,
    with_project: bool,
    secure_credentials: bool,
    api: MockApi,
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { global: None, project: None, with_project: false, secure_credentials: true, api: MockApi::default() }
    }

    /// Content of the global team config.
    pub fn global(mut self, config: Value) -> Self {
        self.global = Some(config);
        self
    }

    /// Content of the project team config. Implies an open workspace.
    pub fn project(mut self, config: Value) -> Self {
        self.project = Some(config);
        self.with_project = true;
        self
    }

    /// Open an empty workspace.
    pub fn workspace(mut self) -> Self {
        self.with_project = true;
        self
    }

    pub fn secure_credentials(mut self, enabled: bool) -> Self {
        self.secure_credentials = enabled;
        self
    }

    pub fn api(mut self, api: MockApi) -> Self {
        self.api = api;
        self
    }

    /// Write the configs, register the mock API for `zosmf` in every tree,
    /// and load the profile table.
    pub async fn build(self) -> anyhow::Result<TestEnv> {
        let dir = tempfile::tempdir()?;
        let global = dir.path().join("home").join(".zowe");
        std::fs::create_dir_all(&global)?;
        let project = if self.with_project {
            let ws = dir.path().join("workspace");
            std::fs::create_dir_all(&ws)?;
            Some(ws)
        } else {
            None
        };
        if let Some(config) = self.global {
            std::fs::write(global.join(TEAM_CONFIG), serde_json::to_string_pretty(&config)?)?;
        }
        if let (Some(config), Some(ws)) = (self.project, project.as_ref()) {
            std::fs::write(ws.join(TEAM_CONFIG), serde_json::to_string_pretty(&config)?)?;
        }

        let gui = Arc::new(MockGui::new());
        let api = Arc::new(self.api);
        let register = Arc::new(ApiRegister::new());
        register.register("zosmf", api.clone(), &TreeKind::ALL);
        let vault = Arc::new(MemoryVault::new());
        let settings = Settings {
            roots: LayerRoots { project, global },
            secure_credentials: self.secure_credentials,
        };
        let ctx = Arc::new(ExplorerContext::new(
            settings,
            gui.clone(),
            register,
            TreeProviders::standard(),
            vault.clone(),
        ));
        let profiles = Arc::new(Profiles::new(ctx));
        profiles.refresh().await?;
        Ok(TestEnv { _dir: dir, profiles, gui, api, vault })
    }
}

pub struct TestEnv {
    _dir: tempfile::TempDir,
    pub profiles: Arc<Profiles>,
    pub gui: Arc<MockGui>,
    pub api: Arc<MockApi>,
    pub vault: Arc<MemoryVault>,
}

impl TestEnv {
    pub fn roots(&self) -> &LayerRoots {
        &self.profiles.context().settings.roots
    }

    /// Fresh read of the layers.
    pub fn team(&self) -> anyhow::Result<TeamConfig> {
        Ok(self.profiles.team_config()?)
    }

    pub async fn profile(&self, name: &str) -> anyhow::Result<Profile> {
        self.profiles.load_named_profile(name, None).await
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
