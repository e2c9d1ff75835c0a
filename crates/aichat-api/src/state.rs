//! Application state shared across CLI commands and HTTP handlers.
//!
//! `AppState` is immutable once built and cheap to clone: the relay holds
//! no per-request state and every field sits behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use aichat_core::chat::{ChatRelay, RelaySettings};
use aichat_core::session::SessionGate;
use aichat_infra::config::load_config;
use aichat_infra::filesystem::resolve_data_dir;
use aichat_infra::llm::GeminiProviderFactory;
use aichat_infra::secret::EnvCredentialSource;
use aichat_infra::session::FileSessionStorage;
use aichat_types::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load `config.toml` and wire the relay.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        tracing::debug!(
            data_dir = %data_dir.display(),
            model = %config.model.name,
            "loaded configuration"
        );

        let factory = GeminiProviderFactory::new(
            config.model.name.clone(),
            config.model.base_url.clone(),
        );
        let relay = ChatRelay::new(
            Arc::new(EnvCredentialSource::google()),
            Arc::new(factory),
            RelaySettings::from(&config.model),
        );

        Ok(Self {
            relay: Arc::new(relay),
            config: Arc::new(config),
            data_dir,
        })
    }

    /// Session gate over `{data_dir}/session.json`, restored from disk.
    pub async fn session_gate(&self) -> anyhow::Result<SessionGate<FileSessionStorage>> {
        let mut gate = SessionGate::new(FileSessionStorage::new(&self.data_dir));
        gate.restore().await?;
        Ok(gate)
    }
}
