// Model Hosting Orchestrator

use crate::application::endpoints::ApiOperation;
use crate::application::poller::{self, PollOptions, StatusPayload};
use crate::application::session::Session;
use crate::domain::{ModelHandle, ModelState, TerminalStatus};
use crate::error::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ModelClient {
    session: Arc<Session>,
}

impl ModelClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Ask the platform to build and serve the model (202 Accepted)
    pub async fn host(&self, model: &ModelHandle) -> Result<()> {
        self.session
            .call(ApiOperation::HostModel {
                group: &model.group,
                model_hash: &model.model_hash,
                operation: model.operation,
            })
            .await?;
        info!(
            group = %model.group,
            model_hash = %model.model_hash,
            operation = %model.operation,
            "Model host requested"
        );
        Ok(())
    }

    /// Current host status
    pub async fn status(&self, model: &ModelHandle) -> Result<StatusPayload<ModelState>> {
        let body = self
            .session
            .call_json(ApiOperation::ModelStatus {
                group: &model.group,
                model_hash: &model.model_hash,
            })
            .await?;
        StatusPayload::from_json(body, ModelState::parse)
    }

    /// Poll until the model settles; failure states are returned, not raised
    pub async fn wait_ready(
        &self,
        model: &ModelHandle,
        options: &PollOptions,
    ) -> Result<StatusPayload<ModelState>> {
        let payload = poller::wait(|| self.status(model), ModelState::TERMINAL, options).await?;
        if payload.status.is_success() {
            info!(model_hash = %model.model_hash, status = %payload.status, "Model is ready");
        } else {
            warn!(
                model_hash = %model.model_hash,
                status = %payload.status,
                message = payload.message.as_deref().unwrap_or(""),
                "Model did not become ready"
            );
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::test_support::session;
    use crate::domain::OperationKind;
    use crate::error::CodexError;
    use crate::port::http_transport::mocks::ScriptedTransport;
    use crate::port::http_transport::HttpMethod;
    use serde_json::json;
    use std::time::Duration;

    fn handle() -> ModelHandle {
        ModelHandle {
            model_hash: "M1".into(),
            name: "churn-model".into(),
            group: "teama".into(),
            operation: OperationKind::Sync,
        }
    }

    #[tokio::test]
    async fn test_host_expects_accepted() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(HttpMethod::Get, "/model/sync/host/teama/M1", 202, json!({}));
        let models = ModelClient::new(session(transport.clone()));
        models.host(&handle()).await.unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.on(HttpMethod::Get, "/model/sync/host/teama/M1", 200, json!({}));
        let models = ModelClient::new(session(transport));
        assert!(matches!(
            models.host(&handle()).await,
            Err(CodexError::Api { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_ready_polls_until_terminal() {
        let transport = Arc::new(ScriptedTransport::new());
        for status in ["Building", "Building", "Deployed"] {
            transport.on(
                HttpMethod::Get,
                "/model/status/teama/M1",
                200,
                json!({"Status": status}),
            );
        }
        let models = ModelClient::new(session(transport.clone()));

        let payload = models
            .wait_ready(&handle(), &PollOptions::every(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(payload.status, ModelState::Deployed);
        assert_eq!(transport.count(HttpMethod::Get, "/model/status/teama/M1"), 3);
    }

    #[tokio::test]
    async fn test_failed_model_state_is_returned() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            HttpMethod::Get,
            "/model/status/teama/M1",
            200,
            json!({"Status": "FailedRecovery", "Message": "image build failed"}),
        );
        let models = ModelClient::new(session(transport));

        let payload = models
            .wait_ready(&handle(), &PollOptions::every(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(payload.status, ModelState::FailedRecovery);
        assert_eq!(payload.message.as_deref(), Some("image build failed"));
    }
}
