use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use tiendy_agent::{
    FailoverExtractor, HttpLlmClient, KeywordExtractor, LlmError, LlmExtractor,
    RuleBasedClassifier,
};
use tiendy_backend::{BackendClient, BackendError};
use tiendy_bot::{DialogueRouter, SessionMonitor};
use tiendy_core::config::{AppConfig, ConfigError, LoadOptions};
use tiendy_store::{Stores, SystemClock};
use tiendy_whatsapp::{CloudApiMessenger, SendError};

pub struct Application {
    pub config: AppConfig,
    pub router: Arc<DialogueRouter>,
    pub monitor: Arc<SessionMonitor>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("messenger client construction failed: {0}")]
    Messenger(#[from] SendError),
    #[error("backend client construction failed: {0}")]
    Backend(#[from] BackendError),
    #[error("llm client construction failed: {0}")]
    Llm(#[from] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let clock = Arc::new(SystemClock);
    let stores = Arc::new(Stores::new(clock.clone()));
    let messenger = Arc::new(CloudApiMessenger::new(&config.whatsapp)?);
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    let extractor = Arc::new(FailoverExtractor::new(
        LlmExtractor::new(HttpLlmClient::new(&config.llm)?),
        KeywordExtractor,
    ));

    let router = Arc::new(DialogueRouter::new(
        stores.clone(),
        messenger.clone(),
        Arc::new(RuleBasedClassifier),
        extractor,
        backend.clone(),
        backend.clone(),
        backend,
    ));
    let monitor = Arc::new(SessionMonitor::new(stores, messenger, clock));

    info!(event_name = "system.bootstrap.ready", "application bootstrap complete");
    Ok(Application { config, router, monitor })
}
