//! Filedrop's backend web server.

use std::sync::Arc;

use anyhow::Context;
use filedrop::{admin::StaticKey, config::Config, router, storage::StorageDir, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// # Errors
///
/// See implementation.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    if config.uses_default_admin_key() {
        tracing::warn!("running with the built-in admin key; set `ADMIN_KEY` to change it");
    }

    let storage = StorageDir::initialize(&config.storage_dir)
        .await
        .with_context(|| {
            format!(
                "failed to initialize storage directory `{}`",
                config.storage_dir.display()
            )
        })?;

    tracing::info!(root = %storage.root().display(), "storage directory ready");

    let state = AppState {
        storage,
        authenticator: Arc::new(StaticKey::new(&config.admin_key)),
    };

    let listener = TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("failed to bind `{}`", config.address))?;

    tracing::info!(address = %config.address, "listening");

    axum::serve(listener, router::build(&config, state)).await?;

    Ok(())
}
