// Domain Layer - Pure entities, status machines and local validation

pub mod artifact;
pub mod credentials;
pub mod error;
pub mod group;
pub mod model;
pub mod preprocessing;
pub mod python;
pub mod status;
pub mod training;

// Re-exports
pub use artifact::{validate_extension, Artifact, DatasetHash, FileOrHash};
pub use credentials::Credentials;
pub use error::DomainError;
pub use group::{normalize_group_name, GroupName, GroupSummary, GroupToken};
pub use model::{ModelHandle, ModelHash, OperationKind, PromoteRequest};
pub use preprocessing::{
    PreprocessingHandle, PreprocessingScript, PreprocessingSummary, ScriptHash,
};
pub use python::PythonVersion;
pub use status::{ExecutionStatus, ModelState, TerminalStatus};
pub use training::{
    AutoMlTraining, CustomTraining, ExecutionId, Experiment, ExperimentQuery, ExperimentSummary,
    ExternalTraining, ModelType, TrainingExecution, TrainingHash, TrainingRun,
};
