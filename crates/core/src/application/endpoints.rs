// Platform endpoints - the fixed set of operations the client may call

use crate::domain::{ExecutionId, OperationKind};
use crate::port::http_transport::HttpMethod;

pub const LOGIN_PATH: &str = "/login";

/// Every authenticated call the client knows how to make
///
/// Each variant fixes its method, path and expected success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation<'a> {
    ListGroups,
    CreateGroup,
    RefreshGroupToken {
        group: &'a str,
    },
    RegisterTraining {
        group: &'a str,
    },
    SearchTraining,
    DescribeTraining {
        group: &'a str,
        training_hash: &'a str,
    },
    UploadTraining {
        group: &'a str,
        training_hash: &'a str,
    },
    ExecuteTraining {
        group: &'a str,
        training_hash: &'a str,
        execution_id: ExecutionId,
    },
    TrainingStatus {
        group: &'a str,
        execution_id: ExecutionId,
    },
    PromoteTraining {
        group: &'a str,
        training_hash: &'a str,
        execution_id: ExecutionId,
    },
    HostModel {
        group: &'a str,
        model_hash: &'a str,
        operation: OperationKind,
    },
    ModelStatus {
        group: &'a str,
        model_hash: &'a str,
    },
    RegisterPreprocessing {
        group: &'a str,
    },
    HostPreprocessing {
        group: &'a str,
        script_hash: &'a str,
        operation: OperationKind,
    },
    PreprocessingHostStatus {
        group: &'a str,
        script_hash: &'a str,
    },
    PreprocessingLogs {
        group: &'a str,
        script_hash: &'a str,
    },
    DescribePreprocessing {
        group: &'a str,
        script_hash: &'a str,
    },
    SearchPreprocessing,
    /// Authenticated with the group token instead of the session token
    RunPreprocessing {
        group: &'a str,
        script_hash: &'a str,
        operation: OperationKind,
        group_token: &'a str,
    },
    PreprocessingExecutionStatus {
        group: &'a str,
        execution_id: ExecutionId,
    },
}

impl<'a> ApiOperation<'a> {
    pub fn method(&self) -> HttpMethod {
        match self {
            ApiOperation::CreateGroup
            | ApiOperation::RegisterTraining { .. }
            | ApiOperation::UploadTraining { .. }
            | ApiOperation::PromoteTraining { .. }
            | ApiOperation::RegisterPreprocessing { .. }
            | ApiOperation::RunPreprocessing { .. } => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    pub fn path(&self) -> String {
        match *self {
            ApiOperation::ListGroups | ApiOperation::CreateGroup => "/groups".to_string(),
            ApiOperation::RefreshGroupToken { group } => format!("/groups/refresh/{group}"),
            ApiOperation::RegisterTraining { group } => format!("/training/register/{group}"),
            ApiOperation::SearchTraining => "/training/search".to_string(),
            ApiOperation::DescribeTraining {
                group,
                training_hash,
            } => format!("/training/describe/{group}/{training_hash}"),
            ApiOperation::UploadTraining {
                group,
                training_hash,
            } => format!("/training/upload/{group}/{training_hash}"),
            ApiOperation::ExecuteTraining {
                group,
                training_hash,
                execution_id,
            } => format!("/training/execute/{group}/{training_hash}/{execution_id}"),
            ApiOperation::TrainingStatus {
                group,
                execution_id,
            } => format!("/training/status/{group}/{execution_id}"),
            ApiOperation::PromoteTraining {
                group,
                training_hash,
                execution_id,
            } => format!("/training/promote/{group}/{training_hash}/{execution_id}"),
            ApiOperation::HostModel {
                group,
                model_hash,
                operation,
            } => format!(
                "/model/{}/host/{group}/{model_hash}",
                operation.path_segment()
            ),
            ApiOperation::ModelStatus { group, model_hash } => {
                format!("/model/status/{group}/{model_hash}")
            }
            ApiOperation::RegisterPreprocessing { group } => {
                format!("/preprocessing/register/{group}")
            }
            ApiOperation::HostPreprocessing {
                group,
                script_hash,
                operation,
            } => format!(
                "/preprocessing/{}/host/{group}/{script_hash}",
                operation.path_segment()
            ),
            ApiOperation::PreprocessingHostStatus { group, script_hash } => {
                format!("/preprocessing/status/{group}/{script_hash}")
            }
            ApiOperation::PreprocessingLogs { group, script_hash } => {
                format!("/preprocessing/logs/{group}/{script_hash}")
            }
            ApiOperation::DescribePreprocessing { group, script_hash } => {
                format!("/preprocessing/describe/{group}/{script_hash}")
            }
            ApiOperation::SearchPreprocessing => "/preprocessing/search".to_string(),
            ApiOperation::RunPreprocessing {
                group,
                script_hash,
                operation,
                ..
            } => format!(
                "/preprocessing/{}/run/{group}/{script_hash}",
                operation.path_segment()
            ),
            ApiOperation::PreprocessingExecutionStatus {
                group,
                execution_id,
            } => format!("/preprocessing/async/status/{group}/{execution_id}"),
        }
    }

    pub fn expected_status(&self) -> u16 {
        match self {
            ApiOperation::CreateGroup
            | ApiOperation::RefreshGroupToken { .. }
            | ApiOperation::RegisterTraining { .. }
            | ApiOperation::UploadTraining { .. }
            | ApiOperation::PromoteTraining { .. }
            | ApiOperation::RegisterPreprocessing { .. } => 201,
            ApiOperation::HostModel { .. } | ApiOperation::HostPreprocessing { .. } => 202,
            _ => 200,
        }
    }

    /// Value of the `Neomaril-Method` tracing header
    pub fn name(&self) -> &'static str {
        match self {
            ApiOperation::ListGroups => "list_groups",
            ApiOperation::CreateGroup => "create_group",
            ApiOperation::RefreshGroupToken { .. } => "refresh_group_token",
            ApiOperation::RegisterTraining { .. } => "register_training",
            ApiOperation::SearchTraining => "search_training",
            ApiOperation::DescribeTraining { .. } => "describe_training",
            ApiOperation::UploadTraining { .. } => "upload_training",
            ApiOperation::ExecuteTraining { .. } => "execute_training",
            ApiOperation::TrainingStatus { .. } => "training_status",
            ApiOperation::PromoteTraining { .. } => "promote_training",
            ApiOperation::HostModel { .. } => "host_model",
            ApiOperation::ModelStatus { .. } => "model_status",
            ApiOperation::RegisterPreprocessing { .. } => "register_preprocessing",
            ApiOperation::HostPreprocessing { .. } => "host_preprocessing",
            ApiOperation::PreprocessingHostStatus { .. } => "preprocessing_host_status",
            ApiOperation::PreprocessingLogs { .. } => "preprocessing_logs",
            ApiOperation::DescribePreprocessing { .. } => "describe_preprocessing",
            ApiOperation::SearchPreprocessing => "search_preprocessing",
            ApiOperation::RunPreprocessing { .. } => "run_preprocessing",
            ApiOperation::PreprocessingExecutionStatus { .. } => "preprocessing_execution_status",
        }
    }

    /// Group token this call must carry, if any
    pub fn group_token(&self) -> Option<&'a str> {
        match *self {
            ApiOperation::RunPreprocessing { group_token, .. } => Some(group_token),
            _ => None,
        }
    }
}
