// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mfx::api::{ApiRegister, HttpCommonApi};
use mfx::command::term::TermGui;
use mfx::config::{Config, LogFormat};
use mfx::context::ExplorerContext;
use mfx::error::{classify, ErrorCode};
use mfx::profiles::Profiles;
use mfx::refresh::SessionRefresher;
use mfx::tree::{TreeKind, TreeProviders};
use mfx::vault::{CredentialVault, DisabledVault, KeyringVault};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    match run(config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("fatal: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries command output.
    match config.log_format() {
        Ok(LogFormat::Json) => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(config: Config) -> anyhow::Result<i32> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let settings = config.settings()?;
    let shutdown = CancellationToken::new();
    let gui = Arc::new(TermGui::stdio());

    // Each Ctrl-C dismisses the pending prompt and cancels running validations.
    {
        let gui = Arc::clone(&gui);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                info!("received SIGINT");
                gui.interrupt();
            }
        });
    }

    let vault: Arc<dyn CredentialVault> =
        if settings.secure_credentials { Arc::new(KeyringVault::new()) } else { Arc::new(DisabledVault) };
    let register = Arc::new(ApiRegister::new());
    register.register("zosmf", Arc::new(HttpCommonApi::new(config.status_timeout())), &TreeKind::ALL);

    let ctx = Arc::new(ExplorerContext::new(
        settings,
        gui,
        register,
        TreeProviders::standard(),
        vault,
    ));
    let profiles = Arc::new(Profiles::new(ctx));
    let refresher = SessionRefresher::new(Arc::clone(&profiles), shutdown.clone());

    match refresher.reload_profiles(None).await {
        Ok(added) => info!(added, "profiles loaded"),
        // Layer commands still work against a broken config.
        Err(e) if classify(&e) == ErrorCode::ConfigParse => profiles.show_config_error(&e.to_string()).await,
        Err(e) => {
            profiles.error_handling(&e, None, Some("Loading profiles")).await;
        }
    }

    let code = mfx::command::run(&config.command, &refresher).await;
    shutdown.cancel();
    Ok(code)
}
