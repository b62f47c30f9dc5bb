// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session refresh coordination.
//!
//! Every request to re-read the config layers goes through one FIFO queue
//! drained by a single task, so concurrent extender registrations rebuild
//! the profile table one after another instead of racing on it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::profiles::Profiles;
use crate::schema::ProfileTypeConfig;

/// Something whose state is rebuilt from disk.
#[async_trait]
pub trait Reload: Send + Sync {
    async fn reload(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl Reload for Profiles {
    async fn reload(&self) -> anyhow::Result<()> {
        self.refresh().await
    }
}

type Job = oneshot::Sender<anyhow::Result<()>>;

/// Unbounded FIFO of refresh requests with a single consumer.
#[derive(Debug, Clone)]
pub struct RefreshQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl RefreshQueue {
    /// Spawn the consumer task. It stops when `shutdown` fires or every
    /// queue handle is dropped.
    pub fn spawn(target: Arc<dyn Reload>, shutdown: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    job = rx.recv() => {
                        let Some(done) = job else { break };
                        let result = target.reload().await;
                        if let Err(ref e) = result {
                            warn!(err = %e, "queued refresh failed");
                        }
                        let _ = done.send(result);
                    }
                }
            }
            debug!("refresh queue stopped");
        });
        Self { tx }
    }

    /// Enqueue a refresh and wait for it to run.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx.send(done).map_err(|_| anyhow::anyhow!("refresh queue is closed"))?;
        wait.await.map_err(|_| anyhow::anyhow!("refresh queue dropped the request"))?
    }
}

/// Reloads profiles through the queue and then makes sure every tree
/// shows a session for the reloaded type.
#[derive(Debug, Clone)]
pub struct SessionRefresher {
    profiles: Arc<Profiles>,
    queue: RefreshQueue,
}

impl SessionRefresher {
    pub fn new(profiles: Arc<Profiles>, shutdown: CancellationToken) -> Self {
        let queue = RefreshQueue::spawn(profiles.clone(), shutdown);
        Self { profiles, queue }
    }

    pub fn profiles(&self) -> &Arc<Profiles> {
        &self.profiles
    }

    /// Queue a refresh, then add the default session of `profile_type` (or
    /// of every supported type) to each tree missing it. Returns the
    /// number of sessions added.
    pub async fn reload_profiles(&self, profile_type: Option<&str>) -> anyhow::Result<usize> {
        self.queue.refresh().await?;
        let added = self.profiles.add_session_for_type(profile_type).await;
        info!(profile_type = profile_type.unwrap_or("*"), added, "profiles reloaded");
        Ok(added)
    }

    /// Register an extender's profile types: record their schemas, rewrite
    /// the schema files, and reload.
    pub async fn init_for_zowe(
        &self,
        profile_type: &str,
        configs: Vec<ProfileTypeConfig>,
    ) -> anyhow::Result<usize> {
        if !configs.is_empty() {
            self.profiles.register_extender_types(configs).await;
            if let Err(e) = self.profiles.write_schemas().await {
                self.profiles
                    .context()
                    .gui
                    .error_message(&format!("Failed to update Zowe schema: {e}"), &[])
                    .await;
            }
        }
        self.reload_profiles(Some(profile_type)).await
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
