// Preprocessing Orchestrator
//
// register -> host -> (wait ready) -> run sync | run async -> (poll)

use crate::application::admin::AdminClient;
use crate::application::endpoints::ApiOperation;
use crate::application::poller::{self, PollOptions, StatusPayload};
use crate::application::registrar::{self, Registrar};
use crate::application::session::Session;
use crate::application::uploader::{
    attach_extras, attach_file, attach_optional, resolve_file_or_dataset,
};
use crate::domain::{
    normalize_group_name, ExecutionId, ExecutionStatus, ModelState, OperationKind,
    PreprocessingHandle, PreprocessingScript, PreprocessingSummary, PythonVersion, TerminalStatus,
};
use crate::error::{CodexError, Result};
use crate::port::http_transport::{MultipartForm, RequestBody};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Field holding an uploaded dataset for async runs
pub const DATASET_FIELD: &str = "dataset";

/// Field holding a stored dataset hash for async runs
pub const DATASET_HASH_FIELD: &str = "dataset_hash";

/// Result of an async run: its id, plus the final payload when waited on
#[derive(Debug, Clone)]
pub struct AsyncRun {
    pub execution_id: ExecutionId,
    pub outcome: Option<StatusPayload<ExecutionStatus>>,
}

pub struct PreprocessingClient {
    session: Arc<Session>,
    registrar: Registrar,
    admin: AdminClient,
}

impl PreprocessingClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            registrar: Registrar::new(session.clone()),
            admin: AdminClient::new(session.clone()),
            session,
        }
    }

    /// Register a script; returns its handle (not hosted yet)
    ///
    /// Files are checked before any request. The normalized group must be
    /// listed by the platform, otherwise this fails with a group error.
    pub async fn register(&self, script: &PreprocessingScript) -> Result<PreprocessingHandle> {
        script.validate()?;
        let python = PythonVersion::parse(&script.python_version)?;

        let mut form = MultipartForm::new()
            .text("name", script.name.as_str())
            .text("script_reference", script.script_reference.as_str())
            .text("python_version", python.as_platform_token())
            .text("operation", script.operation.as_str());
        attach_file(&mut form, "source", &script.source)?;
        attach_file(&mut form, "requirements", &script.requirements)?;
        attach_optional(&mut form, "schema", script.schema.as_deref())?;
        attach_optional(&mut form, "env", script.env.as_deref())?;
        attach_extras(&mut form, &script.extras)?;

        let group = normalize_group_name(&script.group);
        self.admin.ensure_group_exists(&group).await?;

        let script_hash = self
            .registrar
            .register(
                ApiOperation::RegisterPreprocessing { group: &group },
                RequestBody::Multipart(form),
                "Hash",
            )
            .await
            .map_err(|e| match e {
                CodexError::InvalidResponse { .. } => CodexError::Preprocessing(format!(
                    "Script '{}' was not registered: the platform returned no hash.",
                    script.name
                )),
                other => other,
            })?;

        Ok(PreprocessingHandle {
            script_hash,
            group,
            operation: script.operation,
            python_version: Some(python.as_platform_token().to_string()),
        })
    }

    /// Ask the platform to build and serve the script (202 Accepted)
    pub async fn host(&self, handle: &PreprocessingHandle) -> Result<()> {
        self.session
            .call(ApiOperation::HostPreprocessing {
                group: &handle.group,
                script_hash: &handle.script_hash,
                operation: handle.operation,
            })
            .await?;
        info!(
            group = %handle.group,
            script_hash = %handle.script_hash,
            operation = %handle.operation,
            "Preprocessing host requested"
        );
        Ok(())
    }

    pub async fn host_status(
        &self,
        handle: &PreprocessingHandle,
    ) -> Result<StatusPayload<ModelState>> {
        let body = self
            .session
            .call_json(ApiOperation::PreprocessingHostStatus {
                group: &handle.group,
                script_hash: &handle.script_hash,
            })
            .await?;
        StatusPayload::from_json(body, ModelState::parse)
    }

    /// Poll the host status until it settles; failure states are returned
    pub async fn wait_ready(
        &self,
        handle: &PreprocessingHandle,
        options: &PollOptions,
    ) -> Result<StatusPayload<ModelState>> {
        let payload =
            poller::wait(|| self.host_status(handle), ModelState::TERMINAL, options).await?;
        if !payload.status.is_success() {
            warn!(
                script_hash = %handle.script_hash,
                status = %payload.status,
                "Preprocessing script did not become ready"
            );
        }
        Ok(payload)
    }

    pub async fn logs(&self, handle: &PreprocessingHandle) -> Result<Value> {
        self.session
            .call_json(ApiOperation::PreprocessingLogs {
                group: &handle.group,
                script_hash: &handle.script_hash,
            })
            .await
    }

    pub async fn describe(&self, handle: &PreprocessingHandle) -> Result<Value> {
        self.session
            .call_json(ApiOperation::DescribePreprocessing {
                group: &handle.group,
                script_hash: &handle.script_hash,
            })
            .await
    }

    /// Registered scripts of one operation kind
    pub async fn search(&self, operation: OperationKind) -> Result<Vec<PreprocessingSummary>> {
        let query = vec![("operation".to_string(), operation.as_str().to_string())];
        let body = self
            .session
            .call_with(ApiOperation::SearchPreprocessing, RequestBody::Empty, query)
            .await?
            .json()?;
        let results = body
            .get("Results")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(results)?)
    }

    /// Handle of a script already registered under `name`, if any
    pub async fn find_existing(
        &self,
        name: &str,
        operation: OperationKind,
    ) -> Result<Option<PreprocessingHandle>> {
        let found = self
            .search(operation)
            .await?
            .into_iter()
            .find(|s| s.name.as_deref() == Some(name))
            .map(|s| s.into_handle(operation));
        Ok(found)
    }

    /// Run a Sync script on one JSON input, authenticated by group token
    pub async fn run_sync(
        &self,
        handle: &PreprocessingHandle,
        input: &Value,
        group_token: &str,
    ) -> Result<Value> {
        require_operation(handle, OperationKind::Sync)?;
        let response = self
            .session
            .call_with(
                ApiOperation::RunPreprocessing {
                    group: &handle.group,
                    script_hash: &handle.script_hash,
                    operation: OperationKind::Sync,
                    group_token,
                },
                RequestBody::Json(input.clone()),
                Vec::new(),
            )
            .await?;
        response.json()
    }

    /// Start an Async run on a file or dataset hash
    ///
    /// With `wait`, polls until the run ends. A Failed run is returned in
    /// `outcome`, not raised.
    pub async fn run_async(
        &self,
        handle: &PreprocessingHandle,
        input: &str,
        group_token: &str,
        wait: Option<&PollOptions>,
    ) -> Result<AsyncRun> {
        require_operation(handle, OperationKind::Async)?;
        if input.trim().is_empty() {
            return Err(CodexError::Input(
                "Async preprocessing needs a dataset file or dataset hash.".to_string(),
            ));
        }

        let mut form = MultipartForm::new();
        resolve_file_or_dataset(input, &mut form, DATASET_FIELD, DATASET_HASH_FIELD)?;

        let response = self
            .session
            .call_with(
                ApiOperation::RunPreprocessing {
                    group: &handle.group,
                    script_hash: &handle.script_hash,
                    operation: OperationKind::Async,
                    group_token,
                },
                RequestBody::Multipart(form),
                Vec::new(),
            )
            .await?
            .json()?;
        let execution_id = registrar::execution_id(&response)?;
        info!(
            group = %handle.group,
            script_hash = %handle.script_hash,
            execution_id,
            "Async preprocessing started"
        );

        let outcome = match wait {
            Some(options) => Some(
                poller::wait(
                    || self.execution_status(handle, execution_id),
                    ExecutionStatus::TERMINAL,
                    options,
                )
                .await?,
            ),
            None => None,
        };
        if let Some(payload) = &outcome {
            if !payload.status.is_success() {
                warn!(
                    execution_id,
                    message = payload.message.as_deref().unwrap_or(""),
                    "Async preprocessing failed"
                );
            }
        }

        Ok(AsyncRun {
            execution_id,
            outcome,
        })
    }

    pub async fn execution_status(
        &self,
        handle: &PreprocessingHandle,
        execution_id: ExecutionId,
    ) -> Result<StatusPayload<ExecutionStatus>> {
        let body = self
            .session
            .call_json(ApiOperation::PreprocessingExecutionStatus {
                group: &handle.group,
                execution_id,
            })
            .await?;
        StatusPayload::from_json(body, ExecutionStatus::parse)
    }
}

fn require_operation(handle: &PreprocessingHandle, expected: OperationKind) -> Result<()> {
    if handle.operation == expected {
        return Ok(());
    }
    Err(CodexError::Preprocessing(format!(
        "Script {} is {}; this call needs a {} script.",
        handle.script_hash, handle.operation, expected
    )))
}
