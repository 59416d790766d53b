// Training Domain Model

use crate::domain::artifact::{
    is_blank, is_blank_path, require_fields, validate_extension, FileOrHash,
};
use crate::domain::error::DomainError;
use crate::domain::group::GroupName;
use crate::domain::python::PythonVersion;
use crate::domain::status::{ExecutionStatus, TerminalStatus};
use crate::error::{CodexError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server-assigned training hash
pub type TrainingHash = String;

/// Server-assigned execution id (always > 0)
pub type ExecutionId = u64;

pub const SOURCE_EXTENSIONS: &[&str] = &["py", "ipynb"];
pub const REQUIREMENTS_EXTENSIONS: &[&str] = &["txt"];
pub const ENV_EXTENSIONS: &[&str] = &["env"];

/// Kind of model an experiment trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    Classification,
    Regression,
    Unsupervised,
}

impl ModelType {
    /// Case-insensitive parse ("regression" -> Regression)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "classification" => Ok(ModelType::Classification),
            "regression" => Ok(ModelType::Regression),
            "unsupervised" => Ok(ModelType::Unsupervised),
            _ => Err(CodexError::Input(format!(
                "Invalid model type '{}'. Valid types are: Classification, Regression, Unsupervised",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Classification => "Classification",
            ModelType::Regression => "Regression",
            ModelType::Unsupervised => "Unsupervised",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered training experiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub training_hash: TrainingHash,
    pub experiment_name: String,
    pub model_type: ModelType,
    pub group: GroupName,
}

/// Entry returned by the experiment search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperimentSummary {
    #[serde(rename = "TrainingHash")]
    pub training_hash: TrainingHash,
    #[serde(rename = "ExperimentName")]
    pub experiment_name: String,
    #[serde(rename = "GroupName", alias = "Group")]
    pub group: GroupName,
    #[serde(rename = "ModelType", default)]
    pub model_type: Option<String>,
}

impl ExperimentSummary {
    /// Same name, model type, and group
    pub fn matches(&self, name: &str, model_type: ModelType, group: &str) -> bool {
        self.experiment_name == name
            && self.group == group
            && self
                .model_type
                .as_deref()
                .map_or(false, |t| t.eq_ignore_ascii_case(model_type.as_str()))
    }
}

/// Filters for the experiment search endpoint (all optional)
#[derive(Debug, Clone, Default)]
pub struct ExperimentQuery {
    pub name: Option<String>,
    pub group: Option<GroupName>,
    pub model_type: Option<ModelType>,
}

impl ExperimentQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(name) = &self.name {
            query.push(("name".to_string(), name.clone()));
        }
        if let Some(group) = &self.group {
            query.push(("group".to_string(), group.clone()));
        }
        if let Some(model_type) = self.model_type {
            query.push(("model_type".to_string(), model_type.as_str().to_string()));
        }
        query
    }
}

/// One run of an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExecution {
    pub experiment: Experiment,
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
    pub failure_message: Option<String>,
}

impl TrainingExecution {
    /// Create the execution record right after the upload assigned its id
    pub fn uploaded(experiment: Experiment, execution_id: ExecutionId) -> Self {
        Self {
            experiment,
            execution_id,
            status: ExecutionStatus::Uploaded,
            failure_message: None,
        }
    }

    /// Move to a status observed on the server (forward only)
    pub fn advance(&mut self, next: ExecutionStatus) -> std::result::Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Which training flavour a run uses, with its inputs
#[derive(Debug, Clone)]
pub enum TrainingRun {
    Custom(CustomTraining),
    AutoMl(AutoMlTraining),
    External(ExternalTraining),
}

impl TrainingRun {
    /// Value of the `training_type` form field
    pub fn training_type(&self) -> &'static str {
        match self {
            TrainingRun::Custom(_) => "Custom",
            TrainingRun::AutoMl(_) => "AutoML",
            TrainingRun::External(_) => "External",
        }
    }

    pub fn run_name(&self) -> &str {
        match self {
            TrainingRun::Custom(c) => &c.run_name,
            TrainingRun::AutoMl(a) => &a.run_name,
            TrainingRun::External(e) => &e.run_name,
        }
    }

    /// Local checks that must pass before any request is sent
    pub fn validate(&self) -> Result<()> {
        match self {
            TrainingRun::Custom(c) => c.validate(),
            TrainingRun::AutoMl(a) => a.validate(),
            TrainingRun::External(e) => e.validate(),
        }
    }
}

/// User-provided training script
#[derive(Debug, Clone, Default)]
pub struct CustomTraining {
    pub run_name: String,
    pub description: Option<String>,
    /// Name of the entrypoint function inside `source`
    pub training_reference: String,
    /// "3.8" | "3.9" | "3.10"
    pub python_version: String,
    /// Path to a local file, or a dataset hash
    pub input_data: String,
    pub source: PathBuf,
    pub requirements: PathBuf,
    pub env: Option<PathBuf>,
    pub extras: Vec<PathBuf>,
}

impl CustomTraining {
    fn validate(&self) -> Result<()> {
        require_fields(&[
            ("run_name", !is_blank(&self.run_name)),
            ("source_file", !is_blank_path(&self.source)),
            ("requirements_file", !is_blank_path(&self.requirements)),
            ("training_reference", !is_blank(&self.training_reference)),
            ("python_version", !is_blank(&self.python_version)),
            ("input_data", !is_blank(&self.input_data)),
        ])?;
        validate_extension(&self.source, SOURCE_EXTENSIONS)?;
        validate_extension(&self.requirements, REQUIREMENTS_EXTENSIONS)?;
        if let Some(env) = &self.env {
            validate_extension(env, ENV_EXTENSIONS)?;
        }
        PythonVersion::parse(&self.python_version)?;
        Ok(())
    }
}

/// Platform-driven AutoML search
#[derive(Debug, Clone, Default)]
pub struct AutoMlTraining {
    pub run_name: String,
    pub description: Option<String>,
    /// Path to a local file, or a dataset hash
    pub input_data: String,
    /// JSON configuration of the search
    pub configuration: PathBuf,
}

impl AutoMlTraining {
    fn validate(&self) -> Result<()> {
        require_fields(&[
            ("run_name", !is_blank(&self.run_name)),
            ("configuration_file", !is_blank_path(&self.configuration)),
            ("input_data", !is_blank(&self.input_data)),
        ])
    }
}

/// Training done elsewhere, registered with its results
#[derive(Debug, Clone, Default)]
pub struct ExternalTraining {
    pub run_name: String,
    pub description: Option<String>,
    pub features: FileOrHash,
    pub target: FileOrHash,
    pub output: FileOrHash,
    pub metrics: Option<PathBuf>,
    pub parameters: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub requirements: Option<PathBuf>,
    pub python_version: String,
}

impl ExternalTraining {
    fn validate(&self) -> Result<()> {
        require_fields(&[("run_name", !is_blank(&self.run_name))])?;
        self.features.resolve("features")?;
        self.target.resolve("target")?;
        self.output.resolve("output")?;
        if let Some(req) = &self.requirements {
            validate_extension(req, REQUIREMENTS_EXTENSIONS)?;
        }
        PythonVersion::parse(&self.python_version)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment() -> Experiment {
        Experiment {
            training_hash: "T1".into(),
            experiment_name: "churn".into(),
            model_type: ModelType::Classification,
            group: "teama".into(),
        }
    }

    fn custom() -> CustomTraining {
        CustomTraining {
            run_name: "first".into(),
            training_reference: "train_model".into(),
            python_version: "3.9".into(),
            input_data: "D123".into(),
            source: "app.py".into(),
            requirements: "requirements.txt".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_model_type_parse() {
        assert_eq!(ModelType::parse("regression").unwrap(), ModelType::Regression);
        assert_eq!(ModelType::parse("Classification").unwrap(), ModelType::Classification);
        assert!(ModelType::parse("Ranking").is_err());
    }

    #[test]
    fn test_execution_lifecycle() {
        let mut exec = TrainingExecution::uploaded(experiment(), 3);
        assert_eq!(exec.status, ExecutionStatus::Uploaded);

        exec.advance(ExecutionStatus::Requested).unwrap();
        exec.advance(ExecutionStatus::Running).unwrap();
        exec.advance(ExecutionStatus::Succeeded).unwrap();
        assert!(exec.is_finished());

        // No resurrection
        assert!(exec.advance(ExecutionStatus::Running).is_err());
        assert_eq!(exec.status, ExecutionStatus::Succeeded);
    }

    #[test]
    fn test_custom_validation() {
        assert!(TrainingRun::Custom(custom()).validate().is_ok());

        let mut missing = custom();
        missing.training_reference = String::new();
        assert!(matches!(
            TrainingRun::Custom(missing).validate(),
            Err(CodexError::Input(_))
        ));

        let mut bad_python = custom();
        bad_python.python_version = "3.7".into();
        assert!(matches!(
            TrainingRun::Custom(bad_python).validate(),
            Err(CodexError::PythonVersion(_))
        ));

        let mut bad_source = custom();
        bad_source.source = "app.rb".into();
        assert!(matches!(
            TrainingRun::Custom(bad_source).validate(),
            Err(CodexError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_automl_requires_configuration() {
        let run = TrainingRun::AutoMl(AutoMlTraining {
            run_name: "auto".into(),
            input_data: "D1".into(),
            ..Default::default()
        });
        assert!(matches!(run.validate(), Err(CodexError::Input(_))));
    }

    #[test]
    fn test_external_mutual_exclusivity() {
        let run = TrainingRun::External(ExternalTraining {
            run_name: "ext".into(),
            features: FileOrHash {
                file: Some("features.csv".into()),
                hash: Some("D9".into()),
            },
            target: FileOrHash::hash("D10"),
            output: FileOrHash::hash("D11"),
            python_version: "3.10".into(),
            ..Default::default()
        });
        let err = run.validate().unwrap_err();
        assert!(err.to_string().contains("features"));
    }

    #[test]
    fn test_summary_matching() {
        let summary: ExperimentSummary = serde_json::from_value(serde_json::json!({
            "TrainingHash": "T9",
            "ExperimentName": "churn",
            "GroupName": "teama",
            "ModelType": "Classification"
        }))
        .unwrap();
        assert!(summary.matches("churn", ModelType::Classification, "teama"));
        assert!(!summary.matches("churn", ModelType::Regression, "teama"));
        assert!(!summary.matches("churn", ModelType::Classification, "teamb"));
    }

    #[test]
    fn test_query_skips_unset_filters() {
        let query = ExperimentQuery {
            name: Some("churn".into()),
            model_type: Some(ModelType::Regression),
            ..Default::default()
        };
        assert_eq!(
            query.to_query(),
            vec![
                ("name".to_string(), "churn".to_string()),
                ("model_type".to_string(), "Regression".to_string())
            ]
        );
    }

    #[test]
    fn test_training_type_tags() {
        assert_eq!(TrainingRun::Custom(custom()).training_type(), "Custom");
        assert_eq!(
            TrainingRun::AutoMl(AutoMlTraining::default()).training_type(),
            "AutoML"
        );
        assert_eq!(
            TrainingRun::External(ExternalTraining::default()).training_type(),
            "External"
        );
    }
}
