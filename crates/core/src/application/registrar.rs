// Execution Registrar - create resources, start and trigger executions

use crate::application::endpoints::ApiOperation;
use crate::application::session::Session;
use crate::domain::ExecutionId;
use crate::error::{CodexError, Result};
use crate::port::http_transport::{MultipartForm, RequestBody};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct Registrar {
    session: Arc<Session>,
}

impl Registrar {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Create a resource and return the hash found under `hash_field`
    ///
    /// # Errors
    /// - InvalidResponse if the body carries no non-empty `hash_field`
    pub async fn register(
        &self,
        operation: ApiOperation<'_>,
        body: RequestBody,
        hash_field: &str,
    ) -> Result<String> {
        let response = self
            .session
            .call_with(operation, body, Vec::new())
            .await?
            .json()?;

        let hash = response
            .get(hash_field)
            .and_then(Value::as_str)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                CodexError::invalid_response(hash_field, "missing from registration response")
            })?;

        info!(
            operation = operation.name(),
            hash = %hash,
            message = %message(&response).unwrap_or_default(),
            "Resource registered"
        );
        Ok(hash.to_string())
    }

    /// Upload every artifact of one run in a single multipart request
    ///
    /// # Errors
    /// - InvalidResponse unless the body carries an `ExecutionId` > 0
    pub async fn start_execution(
        &self,
        operation: ApiOperation<'_>,
        form: MultipartForm,
    ) -> Result<ExecutionId> {
        let response = self
            .session
            .call_with(operation, RequestBody::Multipart(form), Vec::new())
            .await?
            .json()?;

        let execution_id = execution_id(&response)?;
        info!(
            operation = operation.name(),
            execution_id,
            message = %message(&response).unwrap_or_default(),
            "Execution uploaded"
        );
        Ok(execution_id)
    }

    /// Move an uploaded execution into the running pipeline
    pub async fn trigger(&self, operation: ApiOperation<'_>) -> Result<()> {
        let response = self.session.call_json(operation).await?;
        info!(
            operation = operation.name(),
            message = %message(&response).unwrap_or_default(),
            "Execution triggered"
        );
        Ok(())
    }
}

/// `ExecutionId` as number or numeric string, strictly positive
pub fn execution_id(response: &Value) -> Result<ExecutionId> {
    let raw = response
        .get("ExecutionId")
        .ok_or_else(|| CodexError::invalid_response("ExecutionId", "missing"))?;

    let id = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(CodexError::invalid_response(
            "ExecutionId",
            format!("expected a positive integer, got {raw}"),
        )),
    }
}

/// The platform's `Message` field, when present
pub fn message(response: &Value) -> Option<String> {
    response
        .get("Message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::test_support::session;
    use crate::port::http_transport::mocks::ScriptedTransport;
    use crate::port::http_transport::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_execution_id_parsing() {
        assert_eq!(execution_id(&json!({"ExecutionId": 12})).unwrap(), 12);
        assert_eq!(execution_id(&json!({"ExecutionId": "7"})).unwrap(), 7);
        assert!(execution_id(&json!({"ExecutionId": 0})).is_err());
        assert!(execution_id(&json!({"ExecutionId": -3})).is_err());
        assert!(execution_id(&json!({"Message": "ok"})).is_err());
    }

    #[tokio::test]
    async fn test_register_extracts_hash() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            HttpMethod::Post,
            "/training/register/teama",
            201,
            json!({"TrainingHash": "T1", "Message": "created"}),
        );
        let registrar = Registrar::new(session(transport.clone()));

        let hash = registrar
            .register(
                ApiOperation::RegisterTraining { group: "teama" },
                RequestBody::Form(vec![("experiment_name".into(), "churn".into())]),
                "TrainingHash",
            )
            .await
            .unwrap();
        assert_eq!(hash, "T1");
    }

    #[tokio::test]
    async fn test_register_without_hash_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            HttpMethod::Post,
            "/training/register/teama",
            201,
            json!({"Message": "created"}),
        );
        let registrar = Registrar::new(session(transport));

        let err = registrar
            .register(
                ApiOperation::RegisterTraining { group: "teama" },
                RequestBody::Empty,
                "TrainingHash",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CodexError::InvalidResponse { ref field, .. } if field == "TrainingHash"));
    }

    #[tokio::test]
    async fn test_register_expects_created() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            HttpMethod::Post,
            "/training/register/teama",
            200,
            json!({"TrainingHash": "T1"}),
        );
        let registrar = Registrar::new(session(transport));

        let err = registrar
            .register(
                ApiOperation::RegisterTraining { group: "teama" },
                RequestBody::Empty,
                "TrainingHash",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CodexError::Api { status: 200, .. }));
    }
}
