//! MLOps Codex Client Implementation

use crate::config::ClientConfig;
use crate::error::{Result, SdkError};
use mlops_codex_core::application::{
    AdminClient, Authenticator, ModelClient, PollOptions, PreprocessingClient, RequestExecutor,
    Session, TrainingClient,
};
use mlops_codex_core::domain::Credentials;
use mlops_codex_core::port::{HttpTransport, SystemTimeProvider, TimeProvider};
use mlops_codex_infra_http::ReqwestTransport;
use std::sync::Arc;
use tracing::info;

/// MLOps Codex Client
///
/// Owns one authenticated session and hands out the orchestrators that
/// share it. The token is fetched lazily on the first call and reused
/// until its TTL expires.
///
/// # Example
///
/// ```no_run
/// use mlops_codex_sdk::{ClientConfig, Credentials, MlopsCodexClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MlopsCodexClient::connect(
///     ClientConfig::default(),
///     Credentials::new("ds@acme.io", "secret", "acme"),
/// )?;
/// for group in client.admin().list_groups().await? {
///     println!("{}", group.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MlopsCodexClient {
    session: Arc<Session>,
    config: ClientConfig,
}

impl MlopsCodexClient {
    /// Build a client over the real network
    ///
    /// # Errors
    /// - SdkError::Transport if the HTTP client cannot be created
    pub fn connect(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        Ok(Self::with_transport(
            config,
            credentials,
            transport,
            Arc::new(SystemTimeProvider),
        ))
    }

    /// Load config from files and `MLOPS_CODEX_*`, credentials included
    ///
    /// # Errors
    /// - SdkError::MissingCredentials unless login, password and tenant are all set
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::load(None)?;
        let credentials = config.credentials.clone().ok_or_else(|| {
            SdkError::MissingCredentials(
                "set MLOPS_CODEX_LOGIN, MLOPS_CODEX_PASSWORD and MLOPS_CODEX_TENANT".to_string(),
            )
        })?;
        Self::connect(config, credentials)
    }

    /// Wire the client over any transport and clock
    pub fn with_transport(
        config: ClientConfig,
        credentials: Credentials,
        transport: Arc<dyn HttpTransport>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let executor = Arc::new(RequestExecutor::new(transport, config.base_url.clone()));
        let authenticator = Arc::new(Authenticator::new(
            executor.clone(),
            time_provider,
            config.token_ttl,
        ));
        let session = Arc::new(Session::new(executor, authenticator, credentials));

        info!(base_url = %config.base_url, "MLOps Codex client ready");
        Self { session, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Log in now instead of on the first call
    pub async fn authenticate(&self) -> Result<()> {
        self.session.authenticate().await?;
        Ok(())
    }

    pub fn admin(&self) -> AdminClient {
        AdminClient::new(self.session.clone())
    }

    pub fn training(&self) -> TrainingClient {
        TrainingClient::new(self.session.clone())
    }

    pub fn models(&self) -> ModelClient {
        ModelClient::new(self.session.clone())
    }

    pub fn preprocessing(&self) -> PreprocessingClient {
        PreprocessingClient::new(self.session.clone())
    }

    /// Poll options at the configured interval, no deadline, no cancellation
    pub fn poll_options(&self) -> PollOptions {
        PollOptions::every(self.config.poll_interval)
    }
}
