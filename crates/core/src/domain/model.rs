// Model Hosting Domain Model

use crate::domain::artifact::{is_blank, validate_extension};
use crate::domain::group::GroupName;
use crate::domain::training::{ENV_EXTENSIONS, REQUIREMENTS_EXTENSIONS, SOURCE_EXTENSIONS};
use crate::error::{CodexError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server-assigned model hash
pub type ModelHash = String;

pub const SCHEMA_EXTENSIONS: &[&str] = &["json", "xml", "csv", "parquet"];

/// How a model or preprocessing script is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Sync,
    Async,
}

impl OperationKind {
    /// Title-case value sent in forms ("Sync")
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Sync => "Sync",
            OperationKind::Async => "Async",
        }
    }

    /// Lower-case URL segment ("sync")
    pub fn path_segment(&self) -> &'static str {
        match self {
            OperationKind::Sync => "sync",
            OperationKind::Async => "async",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sync" => Ok(OperationKind::Sync),
            "async" => Ok(OperationKind::Async),
            _ => Err(CodexError::Input(format!(
                "Invalid operation '{}'. Use Sync or Async",
                s
            ))),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle to a model created by promoting a training execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHandle {
    pub model_hash: ModelHash,
    pub name: String,
    pub group: GroupName,
    pub operation: OperationKind,
}

/// Everything needed to turn a succeeded execution into a model
#[derive(Debug, Clone)]
pub struct PromoteRequest {
    pub model_name: String,
    /// Name of the scoring function inside `source`
    pub model_reference: String,
    pub source: PathBuf,
    /// Input sample; required for Sync models
    pub schema: Option<PathBuf>,
    pub operation: OperationKind,
    /// Required for Async models
    pub input_type: Option<String>,
    pub requirements: Option<PathBuf>,
    pub env: Option<PathBuf>,
    pub extras: Vec<PathBuf>,
    /// Block until the hosted model reaches a terminal state
    pub wait_complete: bool,
}

impl PromoteRequest {
    pub fn new(
        model_name: impl Into<String>,
        model_reference: impl Into<String>,
        source: impl Into<PathBuf>,
        operation: OperationKind,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            model_reference: model_reference.into(),
            source: source.into(),
            schema: None,
            operation,
            input_type: None,
            requirements: None,
            env: None,
            extras: Vec::new(),
            wait_complete: false,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<PathBuf>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.model_name) || is_blank(&self.model_reference) {
            return Err(CodexError::Input(
                "model_name and model_reference are mandatory to promote.".to_string(),
            ));
        }
        validate_extension(&self.source, SOURCE_EXTENSIONS)?;

        match self.operation {
            OperationKind::Async => {
                if self.input_type.as_deref().map_or(true, is_blank) {
                    return Err(CodexError::Input(
                        "For asynchronous models, you must provide the 'input_type' argument."
                            .to_string(),
                    ));
                }
            }
            OperationKind::Sync => {
                if self.schema.is_none() {
                    return Err(CodexError::Input(
                        "For synchronous models, you must provide a schema file.".to_string(),
                    ));
                }
            }
        }

        if let Some(schema) = &self.schema {
            validate_extension(schema, SCHEMA_EXTENSIONS)?;
        }
        if let Some(req) = &self.requirements {
            validate_extension(req, REQUIREMENTS_EXTENSIONS)?;
        }
        if let Some(env) = &self.env {
            validate_extension(env, ENV_EXTENSIONS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_requires_input_type() {
        let req = PromoteRequest::new("m", "score", "app.py", OperationKind::Async);
        assert!(matches!(req.validate(), Err(CodexError::Input(_))));

        let req = req.with_input_type("json|csv|parquet");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_sync_requires_schema_with_allowed_extension() {
        let req = PromoteRequest::new("m", "score", "app.py", OperationKind::Sync);
        assert!(matches!(req.validate(), Err(CodexError::Input(_))));

        let bad = req.clone().with_schema("schema.yaml");
        assert!(matches!(
            bad.validate(),
            Err(CodexError::InvalidExtension { .. })
        ));

        for ext in ["json", "xml", "csv", "parquet"] {
            let ok = req.clone().with_schema(format!("schema.{ext}"));
            assert!(ok.validate().is_ok(), "{ext} should be accepted");
        }
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!(OperationKind::parse("sync").unwrap(), OperationKind::Sync);
        assert_eq!(OperationKind::parse("ASYNC").unwrap(), OperationKind::Async);
        assert_eq!(OperationKind::Async.path_segment(), "async");
        assert!(OperationKind::parse("batch").is_err());
    }
}
