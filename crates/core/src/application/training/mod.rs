// Training Orchestrator
//
// Experiment -> upload (execution id) -> execute -> poll -> promote -> host

pub mod assemblers;

use crate::application::admin::AdminClient;
use crate::application::endpoints::ApiOperation;
use crate::application::model::ModelClient;
use crate::application::poller::{self, PollOptions, StatusPayload};
use crate::application::registrar::Registrar;
use crate::application::session::Session;
use crate::application::uploader::{attach_extras, attach_file, attach_optional};
use crate::domain::{
    normalize_group_name, ExecutionId, ExecutionStatus, Experiment, ExperimentQuery,
    ExperimentSummary, ModelHandle, ModelType, PromoteRequest, TerminalStatus, TrainingExecution,
    TrainingHash, TrainingRun,
};
use crate::error::{CodexError, Result};
use crate::port::http_transport::{MultipartForm, RequestBody};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// What to do when an identical experiment already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationMode {
    /// Search first and reuse a match
    #[default]
    ReuseExisting,
    /// Always register a new experiment
    Force,
}

pub struct TrainingClient {
    session: Arc<Session>,
    registrar: Registrar,
    models: ModelClient,
    admin: AdminClient,
}

impl TrainingClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            registrar: Registrar::new(session.clone()),
            models: ModelClient::new(session.clone()),
            admin: AdminClient::new(session.clone()),
            session,
        }
    }

    pub fn models(&self) -> &ModelClient {
        &self.models
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    pub async fn search_experiments(
        &self,
        query: &ExperimentQuery,
    ) -> Result<Vec<ExperimentSummary>> {
        let body = self
            .session
            .call_with(ApiOperation::SearchTraining, RequestBody::Empty, query.to_query())
            .await?
            .json()?;

        let results = match body {
            Value::Object(mut map) => map
                .remove("Results")
                .unwrap_or_else(|| Value::Array(Vec::new())),
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        Ok(serde_json::from_value(results)?)
    }

    /// Hash of an experiment with the same name, model type and group
    pub async fn find_experiment(
        &self,
        name: &str,
        model_type: ModelType,
        group: &str,
    ) -> Result<Option<TrainingHash>> {
        let query = ExperimentQuery {
            name: Some(name.to_string()),
            group: Some(group.to_string()),
            model_type: Some(model_type),
        };
        let found = self
            .search_experiments(&query)
            .await?
            .into_iter()
            .find(|e| e.matches(name, model_type, group))
            .map(|e| e.training_hash);
        Ok(found)
    }

    /// Register a new experiment unconditionally
    pub async fn register_experiment(
        &self,
        name: &str,
        model_type: ModelType,
        group: &str,
    ) -> Result<Experiment> {
        let body = RequestBody::Form(vec![
            ("experiment_name".to_string(), name.to_string()),
            ("model_type".to_string(), model_type.as_str().to_string()),
        ]);
        let training_hash = self
            .registrar
            .register(ApiOperation::RegisterTraining { group }, body, "TrainingHash")
            .await
            .map_err(|e| match e {
                CodexError::InvalidResponse { .. } => CodexError::Training(format!(
                    "Experiment '{name}' was not registered: the platform returned no training hash."
                )),
                other => other,
            })?;

        Ok(Experiment {
            training_hash,
            experiment_name: name.to_string(),
            model_type,
            group: group.to_string(),
        })
    }

    /// Reuse or create the experiment `name` in `group`
    ///
    /// `model_type` is checked before any request is sent. `group` is
    /// normalized and must be listed by the platform.
    ///
    /// # Errors
    /// - Input for an unknown model type or an empty name or group
    /// - Group when the normalized group does not exist
    pub async fn setup_experiment(
        &self,
        name: &str,
        model_type: &str,
        group: &str,
        mode: RegistrationMode,
    ) -> Result<Experiment> {
        let model_type = ModelType::parse(model_type)?;
        let group = normalize_group_name(group);
        if name.trim().is_empty() || group.is_empty() {
            return Err(CodexError::Input(
                "experiment_name and group are mandatory.".to_string(),
            ));
        }
        let group = group.as_str();
        self.admin.ensure_group_exists(group).await?;

        if mode == RegistrationMode::ReuseExisting {
            if let Some(training_hash) = self.find_experiment(name, model_type, group).await? {
                info!(
                    group = %group,
                    training_hash = %training_hash,
                    "Reusing existing experiment"
                );
                return Ok(Experiment {
                    training_hash,
                    experiment_name: name.to_string(),
                    model_type,
                    group: group.to_string(),
                });
            }
        }
        self.register_experiment(name, model_type, group).await
    }

    /// Load a registered experiment by hash
    pub async fn load_experiment(&self, group: &str, training_hash: &str) -> Result<Experiment> {
        let body = self
            .session
            .call_json(ApiOperation::DescribeTraining {
                group,
                training_hash,
            })
            .await
            .map_err(|e| match e {
                CodexError::NotFound { .. } => {
                    CodexError::Training(format!("Experiment \"{training_hash}\" not found."))
                }
                other => other,
            })?;

        let description = body.get("Description").unwrap_or(&body);
        let experiment_name = description
            .get("ExperimentName")
            .and_then(Value::as_str)
            .ok_or_else(|| CodexError::invalid_response("ExperimentName", "missing"))?;
        let model_type = description
            .get("ModelType")
            .and_then(Value::as_str)
            .ok_or_else(|| CodexError::invalid_response("ModelType", "missing"))
            .and_then(ModelType::parse)?;

        Ok(Experiment {
            training_hash: training_hash.to_string(),
            experiment_name: experiment_name.to_string(),
            model_type,
            group: group.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Executions
    // ------------------------------------------------------------------

    /// Upload and trigger one run; optionally wait for it to finish
    ///
    /// # Errors
    /// - Local precondition errors before any request
    /// - TrainExecution if `wait` is given and the run ends Failed
    /// - TriggerFailed carrying the execution id when the upload went through
    ///   but the trigger did not; the execution stays Uploaded on the platform
    pub async fn run(
        &self,
        experiment: &Experiment,
        run: &TrainingRun,
        wait: Option<&PollOptions>,
    ) -> Result<TrainingExecution> {
        let form = assemblers::assemble(run)?;

        let execution_id = self
            .registrar
            .start_execution(
                ApiOperation::UploadTraining {
                    group: &experiment.group,
                    training_hash: &experiment.training_hash,
                },
                form,
            )
            .await?;
        let mut execution = TrainingExecution::uploaded(experiment.clone(), execution_id);

        if let Err(e) = self.trigger(&execution).await {
            warn!(
                execution_id,
                error = %e,
                "Execution uploaded but not triggered; it can be executed again"
            );
            return Err(CodexError::TriggerFailed {
                execution_id,
                source: Box::new(e),
            });
        }
        execution.advance(ExecutionStatus::Requested)?;
        info!(
            group = %experiment.group,
            training_hash = %experiment.training_hash,
            execution_id,
            training_type = run.training_type(),
            "Training execution started"
        );

        if let Some(options) = wait {
            self.wait_execution(&mut execution, options).await?;
        }
        Ok(execution)
    }

    /// (Re-)trigger an uploaded execution
    pub async fn trigger(&self, execution: &TrainingExecution) -> Result<()> {
        self.registrar
            .trigger(ApiOperation::ExecuteTraining {
                group: &execution.experiment.group,
                training_hash: &execution.experiment.training_hash,
                execution_id: execution.execution_id,
            })
            .await
    }

    /// One status reading
    pub async fn status(
        &self,
        group: &str,
        execution_id: ExecutionId,
    ) -> Result<StatusPayload<ExecutionStatus>> {
        let body = self
            .session
            .call_json(ApiOperation::TrainingStatus {
                group,
                execution_id,
            })
            .await?;
        StatusPayload::from_json(body, ExecutionStatus::parse)
    }

    /// Rebuild an execution handle from its id and current status
    pub async fn load_execution(
        &self,
        experiment: Experiment,
        execution_id: ExecutionId,
    ) -> Result<TrainingExecution> {
        let payload = self.status(&experiment.group, execution_id).await?;
        let mut execution = TrainingExecution::uploaded(experiment, execution_id);
        execution.advance(payload.status)?;
        execution.failure_message = payload.message;
        Ok(execution)
    }

    /// Refresh the local status with one reading
    pub async fn refresh(&self, execution: &mut TrainingExecution) -> Result<ExecutionStatus> {
        let payload = self
            .status(&execution.experiment.group, execution.execution_id)
            .await?;
        execution.advance(payload.status)?;
        if payload.status == ExecutionStatus::Failed {
            execution.failure_message = payload.message;
        }
        Ok(execution.status)
    }

    /// Poll until Succeeded or Failed
    ///
    /// # Errors
    /// - TrainExecution when the run ends Failed (carrying its message)
    pub async fn wait_execution(
        &self,
        execution: &mut TrainingExecution,
        options: &PollOptions,
    ) -> Result<StatusPayload<ExecutionStatus>> {
        let group = execution.experiment.group.clone();
        let execution_id = execution.execution_id;

        let payload = poller::wait(
            || self.status(&group, execution_id),
            ExecutionStatus::TERMINAL,
            options,
        )
        .await?;
        execution.advance(payload.status)?;

        if payload.status.is_success() {
            info!(execution_id, "Training execution succeeded");
            return Ok(payload);
        }

        warn!(
            execution_id,
            message = payload.message.as_deref().unwrap_or(""),
            "Training execution failed"
        );
        execution.failure_message = payload.message.clone();
        Err(CodexError::TrainExecution {
            execution_id,
            message: payload.message,
        })
    }

    // ------------------------------------------------------------------
    // Promotion
    // ------------------------------------------------------------------

    /// Turn a succeeded execution into a hosted model
    ///
    /// The execution must be Succeeded locally; anything else fails before
    /// any request is sent. Once the promotion is accepted, host and wait
    /// errors come back as Hosting with the new model hash.
    pub async fn promote(
        &self,
        execution: &TrainingExecution,
        request: &PromoteRequest,
        options: &PollOptions,
    ) -> Result<ModelHandle> {
        if execution.status != ExecutionStatus::Succeeded {
            return Err(CodexError::Training(format!(
                "Training execution {} is {}; its status must be Succeeded to promote.",
                execution.execution_id, execution.status
            )));
        }
        request.validate()?;
        let form = promote_form(request)?;

        let experiment = &execution.experiment;
        let model_hash = self
            .registrar
            .register(
                ApiOperation::PromoteTraining {
                    group: &experiment.group,
                    training_hash: &experiment.training_hash,
                    execution_id: execution.execution_id,
                },
                RequestBody::Multipart(form),
                "ModelHash",
            )
            .await?;

        let model = ModelHandle {
            model_hash,
            name: request.model_name.clone(),
            group: experiment.group.clone(),
            operation: request.operation,
        };
        info!(
            execution_id = execution.execution_id,
            model_hash = %model.model_hash,
            "Training execution promoted"
        );

        let hosting_failed = |e: CodexError| CodexError::Hosting {
            model_hash: model.model_hash.clone(),
            source: Box::new(e),
        };
        self.models.host(&model).await.map_err(hosting_failed)?;
        if request.wait_complete {
            let payload = self
                .models
                .wait_ready(&model, options)
                .await
                .map_err(hosting_failed)?;
            if !payload.status.is_success() {
                return Err(CodexError::Training(format!(
                    "Model {} ended in state {}: {}",
                    model.model_hash,
                    payload.status,
                    payload.message.as_deref().unwrap_or("check the logs")
                )));
            }
        }
        Ok(model)
    }
}

fn promote_form(request: &PromoteRequest) -> Result<MultipartForm> {
    let mut form = MultipartForm::new()
        .text("name", request.model_name.as_str())
        .text("model_reference", request.model_reference.as_str())
        .text("operation", request.operation.as_str());
    if let Some(input_type) = &request.input_type {
        form.set_text("input_type", input_type.as_str());
    }

    attach_file(&mut form, "source", &request.source)?;
    attach_optional(&mut form, "schema", request.schema.as_deref())?;
    attach_optional(&mut form, "requirements", request.requirements.as_deref())?;
    attach_optional(&mut form, "env", request.env.as_deref())?;
    attach_extras(&mut form, &request.extras)?;
    Ok(form)
}
